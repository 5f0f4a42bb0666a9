/// The wall: an ordered collection of placed photos
///
/// Order is z-order; the last photo is topmost. Ids are unique within
/// the collection. Every mutation produces a fresh snapshot instead of
/// mutating in place, which keeps persistence trivial (serialize the
/// snapshot you just installed) and makes the ops easy to test.

use cgmath::Point2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::wall::photo::Photo;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WallCollection {
    photos: Vec<Photo>,
}

impl WallCollection {
    /// Build from loaded records, dropping any id duplicates (first one
    /// wins) so the uniqueness invariant holds even for tampered data.
    pub fn from_photos(photos: Vec<Photo>) -> Self {
        let mut seen = Vec::new();
        let mut unique = Vec::new();
        for photo in photos {
            if seen.contains(&photo.id) {
                tracing::warn!(id = %photo.id, "Dropping duplicate photo id from snapshot");
                continue;
            }
            seen.push(photo.id);
            unique.push(photo);
        }
        Self { photos: unique }
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Bottom-to-top iteration (painting order)
    pub fn iter(&self) -> impl Iterator<Item = &Photo> {
        self.photos.iter()
    }

    pub fn get(&self, id: Uuid) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == id)
    }

    /// Append a photo at the front of the z-order.
    /// A duplicate id leaves the collection unchanged.
    pub fn add_front(&self, photo: Photo) -> Self {
        if self.get(photo.id).is_some() {
            tracing::warn!(id = %photo.id, "Refusing to add duplicate photo");
            return self.clone();
        }
        let mut photos = self.photos.clone();
        photos.push(photo);
        Self { photos }
    }

    /// Promote a photo to the front of the z-order, preserving the
    /// relative order of the rest. Unknown ids are a no-op.
    pub fn bring_to_front(&self, id: Uuid) -> Self {
        let mut photos = self.photos.clone();
        if let Some(index) = photos.iter().position(|p| p.id == id) {
            let photo = photos.remove(index);
            photos.push(photo);
        }
        Self { photos }
    }

    /// Reposition a photo (drag); z-order is untouched
    pub fn move_to(&self, id: Uuid, position: Point2<f32>) -> Self {
        let mut photos = self.photos.clone();
        if let Some(photo) = photos.iter_mut().find(|p| p.id == id) {
            photo.position = position;
        }
        Self { photos }
    }

    pub fn remove(&self, id: Uuid) -> Self {
        let photos = self
            .photos
            .iter()
            .filter(|p| p.id != id)
            .cloned()
            .collect();
        Self { photos }
    }

    pub fn clear(&self) -> Self {
        Self::default()
    }

    /// Advance development on every still-developing photo
    pub fn tick_development(&self) -> Self {
        let photos = self
            .photos
            .iter()
            .cloned()
            .map(|mut photo| {
                photo.development = photo.development.tick();
                photo
            })
            .collect();
        Self { photos }
    }

    pub fn any_developing(&self) -> bool {
        self.photos.iter().any(|p| p.development.is_developing())
    }

    /// Topmost photo under the given wall-space point
    pub fn hit_test(&self, point: Point2<f32>) -> Option<&Photo> {
        self.photos.iter().rev().find(|p| p.contains(point))
    }
}
