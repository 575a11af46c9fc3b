//! CollageFE application shell: egui layout, translation of pointer/touch
//! input into surface-local contact lists for the controller, and the
//! background chroma-key pipeline.

use std::sync::mpsc;

use eframe::egui;
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use image::RgbaImage;
use uuid::Uuid;

use crate::components::controls::ControlsPanel;
use crate::components::ingredients::IngredientsPanel;
use crate::config::EditorConfig;
use crate::controller::SceneController;
use crate::log_info;
use crate::ops::chroma_key::{FilterOutcome, filter_ingredient};
use crate::ops::pose::{compose_transform, style_transform};
use crate::scene::PlacedObject;

// ============================================================================
// ASYNC FILTER PIPELINE — background chroma-key with channel completion
// ============================================================================

/// Result delivered from a background chroma-key job. Identified by object
/// id, not index: the object may have been deleted while the job ran.
pub struct FilterJobResult {
    pub object_id: Uuid,
    pub outcome: FilterOutcome,
}

// ============================================================================
// APPLICATION
// ============================================================================

pub struct CollageFEApp {
    controller: SceneController,
    ingredients: IngredientsPanel,
    controls: ControlsPanel,

    filter_sender: mpsc::Sender<FilterJobResult>,
    filter_receiver: mpsc::Receiver<FilterJobResult>,
    pending_filter_jobs: usize,

    /// Drop-surface rect in screen coordinates, refreshed every frame — the
    /// surface can move when panels resize, so it is never cached across
    /// operations.
    surface_rect: Option<Rect>,
    /// Live touch contacts in screen coordinates, ordered by arrival.
    touch_points: Vec<(u64, Pos2)>,
    /// True while a mouse press that started on the surface is being dragged.
    mouse_gesture: bool,
}

impl CollageFEApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: EditorConfig) -> Self {
        let (filter_sender, filter_receiver) = mpsc::channel();
        Self {
            controller: SceneController::new(config),
            ingredients: IngredientsPanel::default(),
            controls: ControlsPanel,
            filter_sender,
            filter_receiver,
            pending_filter_jobs: 0,
            surface_rect: None,
            touch_points: Vec::new(),
            mouse_gesture: false,
        }
    }

    // -- background filtering -------------------------------------------------

    /// Run the chroma-key filter for a freshly dropped object off the UI
    /// thread. A panicking job resolves to `Unfiltered` with the original
    /// raster, so the drop can never end up without an image.
    fn spawn_filter_job(&mut self, object_id: Uuid, image: RgbaImage) {
        let sender = self.filter_sender.clone();
        let params = self.controller.config.chroma;
        let fallback = image.clone();
        self.pending_filter_jobs += 1;
        rayon::spawn(move || {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                filter_ingredient(&image, &params)
            }))
            .unwrap_or_else(|_| FilterOutcome::Unfiltered {
                image: fallback,
                reason: "filter job panicked".to_string(),
            });
            let _ = sender.send(FilterJobResult { object_id, outcome });
        });
    }

    fn poll_filter_results(&mut self) {
        while let Ok(result) = self.filter_receiver.try_recv() {
            self.pending_filter_jobs = self.pending_filter_jobs.saturating_sub(1);
            if !self.controller.apply_filter_result(result.object_id, result.outcome) {
                log_info!(
                    "filter result for {} discarded (object deleted)",
                    result.object_id
                );
            }
        }
    }

    // -- coordinate plumbing ----------------------------------------------------

    fn surface_local(&self, screen: Pos2) -> Option<Pos2> {
        let rect = self.surface_rect?;
        Some(Pos2::new(screen.x - rect.min.x, screen.y - rect.min.y))
    }

    /// The ingredient panel's rect translated into surface coordinates, for
    /// the drag-back-to-delete test.
    fn panel_rect_local(&self) -> Option<Rect> {
        let surface = self.surface_rect?;
        let panel = self.ingredients.last_panel_rect?;
        Some(panel.translate(-surface.min.to_vec2()))
    }

    // -- input translation -------------------------------------------------------

    /// Dropping a dragged ingredient thumbnail: on release over the surface,
    /// create the object and kick off its filter job.
    fn handle_ingredient_drop(&mut self, ctx: &egui::Context) {
        let Some(idx) = self.ingredients.dragging else {
            return;
        };
        let released = ctx.input(|i| i.pointer.any_released());
        if !released {
            return;
        }
        self.ingredients.dragging = None;

        let Some(pos) = ctx.input(|i| i.pointer.latest_pos()) else {
            return;
        };
        let over_surface = self.surface_rect.is_some_and(|r| r.contains(pos));
        if !over_surface {
            return;
        }
        let Some(local) = self.surface_local(pos) else {
            return;
        };
        let Some((name, image)) = self
            .ingredients
            .ingredients
            .get(idx)
            .map(|i| (i.name.clone(), i.image.clone()))
        else {
            return;
        };
        let id = self.controller.drop_ingredient(local, image.clone());
        log_info!("dropped {} at ({:.0}, {:.0})", name, local.x, local.y);
        self.spawn_filter_job(id, image);
    }

    /// Touch contacts drive the controller directly; each event updates the
    /// ordered contact list and reports a change or a move. Same ownership
    /// rules as the mouse path: a thumbnail drag owns the pointer, and only
    /// touches that begin on the drop surface become contacts.
    fn handle_touch_input(&mut self, ctx: &egui::Context) {
        if self.ingredients.dragging.is_some() {
            if !self.touch_points.is_empty() {
                self.touch_points.clear();
                self.controller.contacts_changed(&[], self.panel_rect_local());
            }
            return;
        }
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            if let egui::Event::Touch { id, phase, pos, .. } = event {
                self.route_touch(id.0, phase, pos);
            }
        }
    }

    /// One touch event in screen coordinates. A touch that starts outside
    /// the drop surface (over a panel or the button strip) is never tracked;
    /// its later moves and its release are dropped with it. A tracked touch
    /// keeps driving its gesture even when it wanders off the surface.
    fn route_touch(&mut self, id: u64, phase: egui::TouchPhase, pos: Pos2) {
        if self.ingredients.dragging.is_some() {
            return;
        }
        match phase {
            egui::TouchPhase::Start => {
                if !self.surface_rect.is_some_and(|r| r.contains(pos)) {
                    return;
                }
                self.touch_points.retain(|(tid, _)| *tid != id);
                self.touch_points.push((id, pos));
                let contacts = self.local_contacts();
                self.controller.contacts_changed(&contacts, self.panel_rect_local());
            }
            egui::TouchPhase::Move => {
                let Some(entry) =
                    self.touch_points.iter_mut().find(|(tid, _)| *tid == id)
                else {
                    return;
                };
                entry.1 = pos;
                let contacts = self.local_contacts();
                self.controller.contacts_moved(&contacts);
            }
            egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                let tracked = self.touch_points.len();
                self.touch_points.retain(|(tid, _)| *tid != id);
                if self.touch_points.len() == tracked {
                    return;
                }
                let contacts = self.local_contacts();
                self.controller.contacts_changed(&contacts, self.panel_rect_local());
            }
        }
    }

    fn local_contacts(&self) -> Vec<Pos2> {
        self.touch_points
            .iter()
            .filter_map(|(_, pos)| self.surface_local(*pos))
            .collect()
    }

    /// Mouse input as a single-contact gesture. Skipped entirely while touch
    /// contacts exist: egui synthesizes pointer events from the first touch
    /// and routing both would double-drive the controller.
    fn handle_mouse_input(&mut self, ctx: &egui::Context) {
        if !self.touch_points.is_empty() {
            self.mouse_gesture = false;
            return;
        }
        // A thumbnail drag owns the pointer until it is released.
        if self.ingredients.dragging.is_some() {
            return;
        }

        let pressed = ctx.input(|i| i.pointer.primary_pressed());
        let down = ctx.input(|i| i.pointer.primary_down());
        let released = ctx.input(|i| i.pointer.primary_released());
        let hover = ctx.input(|i| i.pointer.latest_pos());

        if pressed
            && let Some(pos) = hover
            && self.surface_rect.is_some_and(|r| r.contains(pos))
            && !ctx.is_pointer_over_area()
            && let Some(local) = self.surface_local(pos)
        {
            self.mouse_gesture = true;
            self.controller.contacts_changed(&[local], self.panel_rect_local());
        }

        if down
            && self.mouse_gesture
            && let Some(pos) = hover
            && let Some(local) = self.surface_local(pos)
        {
            self.controller.contacts_moved(&[local]);
        }

        if released && self.mouse_gesture {
            self.mouse_gesture = false;
            self.controller.contacts_changed(&[], self.panel_rect_local());
        }
    }

    // -- painting -------------------------------------------------------------

    fn paint_surface(&mut self, ui: &mut egui::Ui) {
        let rect = ui.available_rect_before_wrap();
        self.surface_rect = Some(rect);
        let painter = ui.painter_at(rect);

        // Base: the board everything is placed on.
        painter.rect_filled(rect, 0.0, Color32::from_gray(32));
        let base_radius = rect.width().min(rect.height()) * 0.42;
        painter.circle_filled(rect.center(), base_radius, Color32::from_rgb(222, 184, 135));
        painter.circle_stroke(
            rect.center(),
            base_radius,
            Stroke::new(base_radius * 0.06, Color32::from_rgb(180, 134, 86)),
        );

        // Upload any missing textures before painting.
        for obj in &mut self.controller.scene.objects {
            if obj.texture.is_none() {
                let color_image = egui::ColorImage::from_rgba_unmultiplied(
                    [obj.image.width() as usize, obj.image.height() as usize],
                    obj.image.as_raw(),
                );
                obj.texture = Some(ui.ctx().load_texture(
                    format!("object-{}", obj.id),
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }

        let origin = rect.min.to_vec2();
        let active_id = self.controller.scene.active_id;
        for obj in &self.controller.scene.objects {
            paint_object(&painter, obj, origin, active_id == Some(obj.id));
        }

        // Expand the surface so later widgets don't overlap it.
        ui.allocate_rect(rect, egui::Sense::hover());
    }
}

/// Paint one placed object as a rotated textured quad, plus the selection
/// outline when it is active.
fn paint_object(painter: &egui::Painter, obj: &PlacedObject, origin: Vec2, active: bool) {
    let Some(texture) = obj.texture.as_ref() else {
        return;
    };
    let center = obj.pose.pos + origin;
    let size = obj.size() * obj.pose.scale;
    let quad = Rect::from_center_size(center, size);

    let mut mesh = egui::Mesh::with_texture(texture.id());
    mesh.add_rect_with_uv(
        quad,
        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
        Color32::WHITE,
    );
    mesh.rotate(
        egui::emath::Rot2::from_angle(obj.pose.rotation_deg.to_radians()),
        center,
    );
    painter.add(egui::Shape::mesh(mesh));

    if active {
        // Outline the rotated extents through the composed transform.
        let transform = compose_transform(&obj.pose);
        let half = obj.size() * 0.5;
        let corners = [
            Pos2::new(-half.x, -half.y),
            Pos2::new(half.x, -half.y),
            Pos2::new(half.x, half.y),
            Pos2::new(-half.x, half.y),
        ];
        let points: Vec<Pos2> = corners
            .iter()
            .map(|c| transform.apply(*c) + origin)
            .collect();
        painter.add(egui::Shape::closed_line(
            points,
            Stroke::new(2.0, Color32::from_rgb(255, 152, 0)),
        ));
    }
}

impl eframe::App for CollageFEApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // --- Poll async filter results ---
        self.poll_filter_results();
        if self.pending_filter_jobs > 0 {
            ctx.request_repaint();
        }

        // --- Panels ---
        egui::SidePanel::left("ingredients-panel")
            .resizable(false)
            .default_width(120.0)
            .show(ctx, |ui| {
                self.ingredients.show(ui);
            });

        egui::TopBottomPanel::bottom("controls-panel").show(ctx, |ui| {
            let has_active = self.controller.scene.active_id.is_some();
            if let Some(command) = self.controls.show(ui, has_active) {
                self.controller.control(command);
            }
            if let Some(obj) = self.controller.scene.active() {
                let style = style_transform(&obj.pose, obj.size());
                ui.weak(format!(
                    "left {:.0}  top {:.0}  rotation {:.0}°  scale {:.2}",
                    style.left, style.top, style.rotation_deg, style.scale
                ));
            }
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.paint_surface(ui);
            });

        // --- Input → controller (surface rect is fresh from this frame) ---
        self.handle_ingredient_drop(ctx);
        self.handle_touch_input(ctx);
        self.handle_mouse_input(ctx);

        // Keep painting while a gesture is live so motion stays smooth.
        if self.controller.gesture_active() {
            ctx.request_repaint();
        }
    }
}
