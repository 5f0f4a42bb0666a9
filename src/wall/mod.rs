/// Wall state module
///
/// - Photo record and print geometry (photo.rs)
/// - Capture/eject session state machine (session.rs)
/// - Ordered photo collection with z-order (collection.rs)
/// - Durable wall snapshot (store.rs)

pub mod collection;
pub mod photo;
pub mod session;
pub mod store;
