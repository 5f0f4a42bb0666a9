/// Durable wall snapshot
///
/// One JSON document holding the ordered list of placed photos, written
/// after every wall mutation and read once at startup. The store never
/// raises: corrupt or missing content loads as an empty wall, and write
/// failures only log; the in-memory wall stays authoritative for the
/// session.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::errors::StoreError;
use crate::wall::collection::WallCollection;

const APP_DIR: &str = "polawall";
const SNAPSHOT_FILE: &str = "wall.json";

/// Serialize a wall for storage. Development states normalize to
/// "instant" at the type level, so the snapshot always describes
/// finished prints.
pub fn to_snapshot_json(wall: &WallCollection) -> Result<String, serde_json::Error> {
    serde_json::to_string(wall)
}

/// Tolerant snapshot parse: anything that is not a valid photo list
/// (an object, garbage, a half-written file) yields an empty wall.
pub fn from_snapshot_json(json: &str) -> WallCollection {
    match serde_json::from_str::<Vec<crate::wall::photo::Photo>>(json) {
        Ok(photos) => WallCollection::from_photos(photos),
        Err(e) => {
            warn!(error = %e, "Wall snapshot is malformed, starting with an empty wall");
            WallCollection::default()
        }
    }
}

/// File-backed snapshot store
pub struct WallStore {
    path: PathBuf,
}

impl WallStore {
    /// Store at the platform data directory:
    /// - Linux: ~/.local/share/polawall/wall.json
    /// - macOS: ~/Library/Application Support/polawall/wall.json
    /// - Windows: %APPDATA%\polawall\wall.json
    pub fn at_default_location() -> Self {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(SNAPSHOT_FILE);
        Self { path }
    }

    /// Store at an explicit path (tests)
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read the wall once at startup. Missing or unreadable file, or a
    /// malformed photo list, all come back as an empty wall.
    pub fn load(&self) -> WallCollection {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => {
                let wall = from_snapshot_json(&json);
                debug!(path = %self.path.display(), photos = wall.len(), "Loaded wall snapshot");
                wall
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => WallCollection::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read wall snapshot");
                WallCollection::default()
            }
        }
    }

    /// Persist the current wall. Best effort: failures are logged and
    /// swallowed (last write wins, next mutation retries anyway).
    pub fn save(&self, wall: &WallCollection) {
        if let Err(e) = self.try_save(wall) {
            warn!(path = %self.path.display(), error = %e, "Cannot write wall snapshot");
        }
    }

    fn try_save(&self, wall: &WallCollection) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = to_snapshot_json(wall)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::still::JpegPayload;
    use crate::develop::{DevelopmentState, FilterKind};
    use crate::wall::photo::Photo;
    use cgmath::Point2;

    fn developing_photo(x: f32) -> Photo {
        let mut photo = Photo::new(JpegPayload(vec![1, 2, 3]), FilterKind::Cool);
        photo.position = Point2::new(x, 40.0);
        photo.development = DevelopmentState::Developing(55);
        photo
    }

    #[test]
    fn test_round_trip_normalizes_development() {
        let wall = WallCollection::default()
            .add_front(developing_photo(10.0))
            .add_front(developing_photo(200.0));

        let json = to_snapshot_json(&wall).unwrap();
        let restored = from_snapshot_json(&json);

        assert_eq!(restored.len(), 2);
        for (restored, original) in restored.iter().zip(wall.iter()) {
            assert_eq!(restored.id, original.id);
            assert_eq!(restored.position, original.position);
            assert_eq!(restored.filter, original.filter);
            assert_eq!(restored.image_data, original.image_data);
            // The only difference: development reads back fully developed
            assert_eq!(restored.development, DevelopmentState::Instant);
        }
    }

    #[test]
    fn test_malformed_snapshot_yields_empty_wall() {
        // A JSON object instead of an array
        assert!(from_snapshot_json("{\"not\": \"a wall\"}").is_empty());
        assert!(from_snapshot_json("totally broken").is_empty());
        assert!(from_snapshot_json("[{\"id\": 7}]").is_empty());
    }

    #[test]
    fn test_empty_array_is_a_valid_empty_wall() {
        assert!(from_snapshot_json("[]").is_empty());
    }

    #[test]
    fn test_missing_file_loads_as_empty_wall() {
        let dir = tempfile::tempdir().unwrap();
        let store = WallStore::at(dir.path().join("nothing-here.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = WallStore::at(dir.path().join("nested").join("wall.json"));

        let wall = WallCollection::default().add_front(developing_photo(5.0));
        store.save(&wall);

        let restored = store.load();
        assert_eq!(restored.len(), 1);
        assert_eq!(
            restored.iter().next().unwrap().development,
            DevelopmentState::Instant
        );
    }
}
