//! Selection/Drop controller — the one place that decides which object is
//! active, how contact points become gestures, when a drop creates an object
//! and when a drag destroys one.
//!
//! DESIGN
//! ======
//! All positions handed to this module are drop-surface-local; the app layer
//! converts from screen space per event because the surface can move or
//! resize between events. The controller owns the scene and the current
//! gesture session and nothing else; filter jobs run elsewhere and report
//! back through `apply_filter_result`, keyed by object id so a result for an
//! object deleted in the meantime is silently discarded.

use egui::{Pos2, Rect};
use image::RgbaImage;
use uuid::Uuid;

use crate::config::EditorConfig;
use crate::log_warn;
use crate::ops::chroma_key::FilterOutcome;
use crate::ops::pose::{
    GestureSession, apply_rotation_step, apply_scale_step, begin_gesture, end_gesture,
    update_gesture,
};
use crate::scene::{PlacedObject, Scene};

/// Discrete commands from the button strip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlCommand {
    RotateStep,
    GrowStep,
    ShrinkStep,
}

pub struct SceneController {
    pub scene: Scene,
    pub config: EditorConfig,
    session: Option<GestureSession>,
    /// The object the current gesture is manipulating. Kept separately from
    /// the selection: deselection must not tear a live gesture apart.
    gesture_target: Option<Uuid>,
}

impl SceneController {
    pub fn new(config: EditorConfig) -> Self {
        Self { scene: Scene::default(), config, session: None, gesture_target: None }
    }

    pub fn gesture_active(&self) -> bool {
        self.session.is_some()
    }

    // -- object lifecycle ---------------------------------------------------

    /// Place a new object at `surface_pos` with the default pose and select
    /// it. The raster is the unfiltered original: the object appears
    /// immediately and the filtered image is swapped in when the background
    /// job completes.
    pub fn drop_ingredient(&mut self, surface_pos: Pos2, image: RgbaImage) -> Uuid {
        let id = self.scene.insert(PlacedObject::new(surface_pos, image));
        self.scene.select(id);
        id
    }

    /// Deliver a finished filter job. Returns false when the object no
    /// longer exists (deleted while the job ran) and the result was dropped.
    pub fn apply_filter_result(&mut self, id: Uuid, outcome: FilterOutcome) -> bool {
        let Some(obj) = self.scene.get_mut(id) else {
            return false;
        };
        match outcome {
            FilterOutcome::Filtered(image) => obj.set_image(image, true),
            FilterOutcome::Unfiltered { reason, .. } => {
                // Keep the raw raster the object was created with.
                log_warn!("chroma-key skipped for object {}: {}", id, reason);
            }
        }
        true
    }

    // -- contact handling -----------------------------------------------------

    /// The set of contact points changed (a press or a release). An empty
    /// set ends the gesture; `panel_rect` is the ingredient panel's rect in
    /// surface coordinates, used for the drag-back-to-delete test.
    pub fn contacts_changed(&mut self, contacts: &[Pos2], panel_rect: Option<Rect>) {
        if contacts.is_empty() {
            self.finish_gesture(panel_rect);
            return;
        }

        match (self.session, self.gesture_target) {
            (Some(_), Some(id)) => {
                // Finger count changed mid-gesture: recapture anchors from
                // the current contacts (2→1 downgrade, 1→2 upgrade).
                if let Some(obj) = self.scene.get(id) {
                    self.session = begin_gesture(&obj.pose, contacts);
                } else {
                    // Target vanished under the gesture.
                    self.session = None;
                    self.gesture_target = None;
                }
            }
            _ => {
                // Fresh press: the first contact decides the target.
                if let Some(id) = self.scene.topmost_hit(contacts[0]) {
                    self.scene.select(id);
                    self.gesture_target = Some(id);
                    self.session = self
                        .scene
                        .get(id)
                        .and_then(|obj| begin_gesture(&obj.pose, contacts));
                } else {
                    // Empty-surface press deselects.
                    self.scene.deselect();
                    self.session = None;
                    self.gesture_target = None;
                }
            }
        }
    }

    /// Contact points moved without changing count.
    pub fn contacts_moved(&mut self, contacts: &[Pos2]) {
        let (Some(session), Some(id)) = (&mut self.session, self.gesture_target) else {
            return;
        };
        let Some(obj) = self.scene.get_mut(id) else {
            return;
        };
        update_gesture(session, &mut obj.pose, contacts, self.config.scale_limits());
    }

    /// Last contact lifted: snap (when configured) and run the
    /// drag-back-to-delete test against the ingredient panel.
    fn finish_gesture(&mut self, panel_rect: Option<Rect>) {
        let target = self.gesture_target.take();
        let had_session = self.session.take().is_some();
        let Some(id) = target else {
            return;
        };
        if !had_session {
            return;
        }
        let Some(obj) = self.scene.get_mut(id) else {
            return;
        };
        end_gesture(&mut obj.pose, self.config.snap_rotation_deg);

        if let Some(panel) = panel_rect
            && rect_contains_inclusive(panel, obj.pose.pos)
        {
            self.scene.remove(id);
        }
    }

    // -- discrete controls ----------------------------------------------------

    /// Apply a button command to the active object; no-op when nothing is
    /// selected.
    pub fn control(&mut self, command: ControlCommand) {
        let step = self.config.rotation_step_deg;
        let grow = self.config.grow_factor;
        let shrink = self.config.shrink_factor();
        let limits = self.config.scale_limits();
        let Some(obj) = self.scene.active_mut() else {
            return;
        };
        match command {
            ControlCommand::RotateStep => apply_rotation_step(&mut obj.pose, step),
            ControlCommand::GrowStep => apply_scale_step(&mut obj.pose, grow, limits),
            ControlCommand::ShrinkStep => apply_scale_step(&mut obj.pose, shrink, limits),
        }
    }
}

/// Inclusive containment: a center sitting exactly on the panel boundary
/// counts as inside (and therefore deletes the object).
fn rect_contains_inclusive(rect: Rect, p: Pos2) -> bool {
    p.x >= rect.min.x && p.x <= rect.max.x && p.y >= rect.min.y && p.y <= rect.max.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::chroma_key::{ChromaKeyParams, filter_ingredient};

    fn pos(x: f32, y: f32) -> Pos2 {
        Pos2::new(x, y)
    }

    fn white_square(side: u32) -> RgbaImage {
        RgbaImage::from_pixel(side, side, image::Rgba([255, 255, 255, 255]))
    }

    fn controller() -> SceneController {
        SceneController::new(EditorConfig::default())
    }

    #[test]
    fn drop_creates_selected_object_with_default_pose() {
        let mut c = controller();
        let id = c.drop_ingredient(pos(100.0, 100.0), white_square(40));
        assert_eq!(c.scene.active_id, Some(id));
        let obj = c.scene.get(id).unwrap();
        assert_eq!(obj.pose.pos, pos(100.0, 100.0));
        assert_eq!(obj.pose.scale, 1.0);
        assert_eq!(obj.pose.rotation_deg, 0.0);
        assert!(!obj.filtered);
    }

    #[test]
    fn buttons_act_on_active_object_only() {
        let mut c = controller();
        c.control(ControlCommand::RotateStep); // nothing selected: no-op
        let id = c.drop_ingredient(pos(50.0, 50.0), white_square(20));

        c.control(ControlCommand::GrowStep);
        assert!((c.scene.get(id).unwrap().pose.scale - 1.1).abs() < 1e-6);
        c.control(ControlCommand::ShrinkStep);
        assert!((c.scene.get(id).unwrap().pose.scale - 1.0).abs() < 1e-6);
        c.control(ControlCommand::RotateStep);
        assert!((c.scene.get(id).unwrap().pose.rotation_deg - 15.0).abs() < 1e-6);

        c.scene.deselect();
        c.control(ControlCommand::GrowStep);
        assert!((c.scene.get(id).unwrap().pose.scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn press_on_object_selects_press_on_empty_deselects() {
        let mut c = controller();
        let a = c.drop_ingredient(pos(50.0, 50.0), white_square(20));
        let b = c.drop_ingredient(pos(200.0, 200.0), white_square(20));
        assert_eq!(c.scene.active_id, Some(b));

        c.contacts_changed(&[pos(50.0, 50.0)], None);
        assert_eq!(c.scene.active_id, Some(a));
        c.contacts_changed(&[], None);

        c.contacts_changed(&[pos(400.0, 400.0)], None);
        assert!(c.scene.active_id.is_none());
        assert!(!c.gesture_active());
    }

    #[test]
    fn drag_moves_object_by_pointer_delta() {
        let mut c = controller();
        let id = c.drop_ingredient(pos(100.0, 100.0), white_square(40));
        // Grab near a corner, not the center; the grab offset must hold.
        c.contacts_changed(&[pos(110.0, 95.0)], None);
        c.contacts_moved(&[pos(210.0, 145.0)]);
        assert_eq!(c.scene.get(id).unwrap().pose.pos, pos(200.0, 150.0));
        c.contacts_changed(&[], None);
        assert!(!c.gesture_active());
        // Object survives: nowhere near a panel.
        assert!(c.scene.get(id).is_some());
    }

    #[test]
    fn pinch_on_object_scales_and_rotates() {
        let mut c = controller();
        let id = c.drop_ingredient(pos(100.0, 100.0), white_square(40));
        c.contacts_changed(&[pos(100.0, 100.0)], None);
        // Second finger lands.
        c.contacts_changed(&[pos(90.0, 100.0), pos(110.0, 100.0)], None);
        // Spread ×1.5 and twist 90°.
        c.contacts_moved(&[pos(100.0, 85.0), pos(100.0, 115.0)]);
        let pose = c.scene.get(id).unwrap().pose;
        assert!((pose.scale - 1.5).abs() < 1e-4);
        assert!((pose.rotation_deg - 90.0).abs() < 1e-3);
    }

    #[test]
    fn coincident_pinch_contacts_leave_scale_unchanged() {
        let mut c = controller();
        let id = c.drop_ingredient(pos(100.0, 100.0), white_square(40));
        c.contacts_changed(&[pos(100.0, 100.0)], None);
        c.contacts_changed(&[pos(100.0, 100.0), pos(100.0, 100.0)], None);
        c.contacts_moved(&[pos(100.0, 100.0), pos(100.0, 100.0)]);
        assert_eq!(c.scene.get(id).unwrap().pose.scale, 1.0);
    }

    #[test]
    fn drag_into_panel_deletes_boundary_inclusive() {
        let panel = Rect::from_min_max(pos(0.0, 0.0), pos(50.0, 50.0));

        // Center dragged exactly onto the boundary: deleted.
        let mut c = controller();
        let id = c.drop_ingredient(pos(200.0, 200.0), white_square(40));
        c.contacts_changed(&[pos(200.0, 200.0)], Some(panel));
        c.contacts_moved(&[pos(50.0, 25.0)]);
        c.contacts_changed(&[], Some(panel));
        assert!(c.scene.get(id).is_none());

        // Center one unit outside: kept.
        let mut c = controller();
        let id = c.drop_ingredient(pos(200.0, 200.0), white_square(40));
        c.contacts_changed(&[pos(200.0, 200.0)], Some(panel));
        c.contacts_moved(&[pos(51.0, 25.0)]);
        c.contacts_changed(&[], Some(panel));
        assert!(c.scene.get(id).is_some());
    }

    #[test]
    fn filter_result_for_deleted_object_is_discarded() {
        let mut c = controller();
        let id = c.drop_ingredient(pos(10.0, 10.0), white_square(8));
        let outcome = filter_ingredient(&white_square(8), &ChromaKeyParams::default());
        c.scene.remove(id);
        assert!(!c.apply_filter_result(id, outcome));
    }

    #[test]
    fn filter_result_swaps_image_and_marks_filtered() {
        let mut c = controller();
        let id = c.drop_ingredient(pos(10.0, 10.0), white_square(8));
        let outcome = filter_ingredient(&white_square(8), &ChromaKeyParams::default());
        assert!(c.apply_filter_result(id, outcome));
        let obj = c.scene.get(id).unwrap();
        assert!(obj.filtered);
        assert!(obj.image.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn downscaled_filter_result_does_not_resize_object() {
        let mut c = controller();
        let image = RgbaImage::from_pixel(2000, 500, image::Rgba([255, 255, 255, 255]));
        let id = c.drop_ingredient(pos(300.0, 300.0), image.clone());
        let size_before = c.scene.get(id).unwrap().size();

        // Filter bound is 1024: the raster shrinks, the object must not.
        let outcome = filter_ingredient(&image, &ChromaKeyParams::default());
        assert!(c.apply_filter_result(id, outcome));

        let obj = c.scene.get(id).unwrap();
        assert!(obj.filtered);
        assert_eq!(obj.image.dimensions(), (1024, 256));
        assert_eq!(obj.size(), size_before);
        assert_eq!(obj.pose.scale, 1.0);
    }

    #[test]
    fn unfiltered_result_keeps_original_image() {
        let mut c = controller();
        let id = c.drop_ingredient(pos(10.0, 10.0), white_square(8));
        let outcome = FilterOutcome::Unfiltered {
            image: RgbaImage::new(0, 0),
            reason: "test".to_string(),
        };
        assert!(c.apply_filter_result(id, outcome));
        let obj = c.scene.get(id).unwrap();
        assert!(!obj.filtered);
        assert_eq!(obj.image.dimensions(), (8, 8));
    }

    /// End-to-end: drop, grow, rotate, drag into the panel, gone.
    #[test]
    fn drop_step_and_delete_scenario() {
        let panel = Rect::from_min_max(pos(0.0, 0.0), pos(50.0, 50.0));
        let mut c = controller();
        let id = c.drop_ingredient(pos(100.0, 100.0), white_square(40));
        let pose = c.scene.get(id).unwrap().pose;
        assert_eq!((pose.pos, pose.scale, pose.rotation_deg), (pos(100.0, 100.0), 1.0, 0.0));

        c.control(ControlCommand::GrowStep);
        assert!((c.scene.get(id).unwrap().pose.scale - 1.1).abs() < 1e-6);

        c.config.rotation_step_deg = 30.0;
        c.control(ControlCommand::RotateStep);
        assert!((c.scene.get(id).unwrap().pose.rotation_deg - 30.0).abs() < 1e-6);

        c.contacts_changed(&[pos(100.0, 100.0)], Some(panel));
        c.contacts_moved(&[pos(5.0, 5.0)]);
        c.contacts_changed(&[], Some(panel));
        assert!(c.scene.get(id).is_none());
        assert!(c.scene.active_id.is_none());
    }
}
