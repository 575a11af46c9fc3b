//! Placed-object arena: every sticker dropped on the surface lives here,
//! identified by a stable `Uuid` and carrying its own pose and raster.
//! At most one object is active at a time; activity is owned state on the
//! scene, never a global.

use egui::{Pos2, Vec2};
use image::RgbaImage;
use uuid::Uuid;

use crate::ops::pose::{Pose, compose_transform};

/// One sticker on the drop surface.
pub struct PlacedObject {
    pub id: Uuid,
    pub pose: Pose,
    /// The filtered raster, or the original while filtering is in flight or
    /// has failed. Replaced wholesale, never edited in place.
    pub image: RgbaImage,
    /// True once the background chroma-key job has landed successfully.
    pub filtered: bool,
    /// GPU texture cache for painting; dropped whenever `image` changes.
    pub texture: Option<egui::TextureHandle>,
    /// On-screen extent at scale 1, fixed when the object is dropped. The
    /// filter may swap in a raster at a reduced resolution; the display size
    /// never follows it, so a completing filter job cannot resize the object.
    display_size: Vec2,
}

impl PlacedObject {
    /// New object at `pos` with the default pose (scale 1, rotation 0).
    pub fn new(pos: Pos2, image: RgbaImage) -> Self {
        let display_size = Vec2::new(image.width() as f32, image.height() as f32);
        Self {
            id: Uuid::new_v4(),
            pose: Pose::at(pos),
            image,
            filtered: false,
            texture: None,
            display_size,
        }
    }

    /// Unscaled display size of the object, independent of the current
    /// raster's resolution.
    pub fn size(&self) -> Vec2 {
        self.display_size
    }

    /// Swap in a new raster (typically the filtered one) and invalidate the
    /// texture cache. The display size is untouched: a downscaled raster
    /// paints stretched back to the original extent.
    pub fn set_image(&mut self, image: RgbaImage, filtered: bool) {
        self.image = image;
        self.filtered = filtered;
        self.texture = None;
    }

    /// Rotation-aware hit test in surface coordinates: the point is mapped
    /// through the inverse pose transform and compared against the unscaled
    /// half extents.
    pub fn hit_test(&self, point: Pos2) -> bool {
        let Some(inv) = compose_transform(&self.pose).inverse() else {
            return false;
        };
        let local = inv.apply(point);
        let half = self.size() * 0.5;
        local.x.abs() <= half.x && local.y.abs() <= half.y
    }
}

/// All placed objects plus the single active selection. Paint order equals
/// insertion order, so later objects draw (and hit-test) on top.
#[derive(Default)]
pub struct Scene {
    pub objects: Vec<PlacedObject>,
    pub active_id: Option<Uuid>,
}

impl Scene {
    pub fn insert(&mut self, object: PlacedObject) -> Uuid {
        let id = object.id;
        self.objects.push(object);
        id
    }

    /// Remove an object; clears the selection if it pointed at it.
    pub fn remove(&mut self, id: Uuid) -> Option<PlacedObject> {
        let idx = self.objects.iter().position(|o| o.id == id)?;
        if self.active_id == Some(id) {
            self.active_id = None;
        }
        Some(self.objects.remove(idx))
    }

    pub fn get(&self, id: Uuid) -> Option<&PlacedObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut PlacedObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Exclusive selection: selecting one object deselects any other.
    pub fn select(&mut self, id: Uuid) {
        if self.get(id).is_some() {
            self.active_id = Some(id);
        }
    }

    pub fn deselect(&mut self) {
        self.active_id = None;
    }

    pub fn active(&self) -> Option<&PlacedObject> {
        self.active_id.and_then(|id| self.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut PlacedObject> {
        let id = self.active_id?;
        self.get_mut(id)
    }

    /// Topmost object under `point`, respecting each object's rotation.
    pub fn topmost_hit(&self, point: Pos2) -> Option<Uuid> {
        self.objects
            .iter()
            .rev()
            .find(|o| o.hit_test(point))
            .map(|o| o.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj_at(x: f32, y: f32, w: u32, h: u32) -> PlacedObject {
        PlacedObject::new(Pos2::new(x, y), RgbaImage::new(w, h))
    }

    #[test]
    fn selection_is_exclusive() {
        let mut scene = Scene::default();
        let a = scene.insert(obj_at(0.0, 0.0, 10, 10));
        let b = scene.insert(obj_at(50.0, 50.0, 10, 10));
        scene.select(a);
        assert_eq!(scene.active_id, Some(a));
        scene.select(b);
        assert_eq!(scene.active_id, Some(b));
        scene.deselect();
        assert!(scene.active().is_none());
    }

    #[test]
    fn selecting_unknown_id_is_ignored() {
        let mut scene = Scene::default();
        let a = scene.insert(obj_at(0.0, 0.0, 10, 10));
        scene.select(a);
        scene.select(Uuid::new_v4());
        assert_eq!(scene.active_id, Some(a));
    }

    #[test]
    fn remove_clears_matching_selection() {
        let mut scene = Scene::default();
        let a = scene.insert(obj_at(0.0, 0.0, 10, 10));
        scene.select(a);
        assert!(scene.remove(a).is_some());
        assert!(scene.active_id.is_none());
        assert!(scene.remove(a).is_none());
    }

    #[test]
    fn set_image_keeps_display_size() {
        let mut obj = obj_at(0.0, 0.0, 2000, 500);
        obj.set_image(RgbaImage::new(1024, 256), true);
        assert_eq!(obj.size(), Vec2::new(2000.0, 500.0));
        assert_eq!(obj.image.dimensions(), (1024, 256));
        // Hit testing keeps using the original extents too.
        assert!(obj.hit_test(Pos2::new(999.0, 249.0)));
        assert!(!obj.hit_test(Pos2::new(1001.0, 0.0)));
    }

    #[test]
    fn hit_test_uses_scaled_extents() {
        let mut obj = obj_at(100.0, 100.0, 40, 20);
        assert!(obj.hit_test(Pos2::new(119.0, 109.0)));
        assert!(!obj.hit_test(Pos2::new(121.0, 100.0)));
        obj.pose.scale = 2.0;
        assert!(obj.hit_test(Pos2::new(139.0, 100.0)));
    }

    #[test]
    fn hit_test_honors_rotation() {
        // A wide, short object rotated 90°: a point above the pivot that the
        // unrotated rect would miss is now inside, and vice versa.
        let mut obj = obj_at(0.0, 0.0, 100, 10);
        assert!(!obj.hit_test(Pos2::new(0.0, 30.0)));
        assert!(obj.hit_test(Pos2::new(30.0, 0.0)));
        obj.pose.rotation_deg = 90.0;
        assert!(obj.hit_test(Pos2::new(0.0, 30.0)));
        assert!(!obj.hit_test(Pos2::new(30.0, 0.0)));
    }

    #[test]
    fn topmost_hit_prefers_later_objects() {
        let mut scene = Scene::default();
        let _bottom = scene.insert(obj_at(0.0, 0.0, 20, 20));
        let top = scene.insert(obj_at(5.0, 5.0, 20, 20));
        assert_eq!(scene.topmost_hit(Pos2::new(5.0, 5.0)), Some(top));
        assert_eq!(scene.topmost_hit(Pos2::new(500.0, 500.0)), None);
    }
}
