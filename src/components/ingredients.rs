//! Ingredient side panel: the source images that can be dragged onto the
//! drop surface. The panel records its own screen rect every frame — the
//! controller needs it for the drag-back-to-delete test, and the panel may
//! scroll or resize between frames.

use eframe::egui;
use egui::{Color32, Pos2, Rect, TextureHandle, Vec2};
use image::{Rgba, RgbaImage};

use crate::log_warn;

const THUMB_SIZE: f32 = 64.0;

/// One source image available for placement. `image` keeps the full
/// resolution original; the filter runs on a copy at drop time.
pub struct Ingredient {
    pub name: String,
    pub image: RgbaImage,
    pub texture: Option<TextureHandle>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        Self { name: name.into(), image, texture: None }
    }
}

pub struct IngredientsPanel {
    pub ingredients: Vec<Ingredient>,
    /// Panel rect in screen coordinates, refreshed each frame.
    pub last_panel_rect: Option<Rect>,
    /// Index of the ingredient currently being dragged toward the surface.
    pub dragging: Option<usize>,
}

impl Default for IngredientsPanel {
    fn default() -> Self {
        Self {
            ingredients: builtin_ingredients(),
            last_panel_rect: None,
            dragging: None,
        }
    }
}

impl IngredientsPanel {
    /// Draw the panel. Starts a drag when a thumbnail is grabbed; the app
    /// layer watches for the release because it lands outside this panel.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.heading("Ingredients");
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (idx, ingredient) in self.ingredients.iter_mut().enumerate() {
                let texture = ingredient.texture.get_or_insert_with(|| {
                    upload_texture(ui.ctx(), &ingredient.name, &ingredient.image)
                });

                ui.vertical_centered(|ui| {
                    let sized = egui::load::SizedTexture::from_handle(texture);
                    let response = ui
                        .add(
                            egui::Image::from_texture(sized)
                                .fit_to_exact_size(thumb_size(&ingredient.image)),
                        )
                        .interact(egui::Sense::drag())
                        .on_hover_text(format!("Drag {} onto the canvas", ingredient.name));
                    if response.drag_started() {
                        self.dragging = Some(idx);
                    }
                    ui.small(ingredient.name.as_str());
                });
                ui.add_space(6.0);
            }

            ui.separator();
            if ui.button("Add ingredient…").clicked() {
                self.pick_ingredient_files();
            }
        });

        self.last_panel_rect = Some(ui.min_rect());

        // Floating preview under the pointer while a drag is in flight.
        if let Some(idx) = self.dragging
            && let Some(pos) = ui.ctx().input(|i| i.pointer.latest_pos())
            && let Some(texture) = self.ingredients.get(idx).and_then(|i| i.texture.as_ref())
        {
            let size = thumb_size(&self.ingredients[idx].image);
            let painter = ui.ctx().layer_painter(egui::LayerId::new(
                egui::Order::Tooltip,
                egui::Id::new("ingredient-drag-preview"),
            ));
            painter.image(
                texture.id(),
                Rect::from_center_size(pos, size),
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::from_white_alpha(180),
            );
        }
    }

    /// Open a native file dialog and append every decodable image.
    fn pick_ingredient_files(&mut self) {
        let Some(paths) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "webp", "bmp"])
            .pick_files()
        else {
            return;
        };
        for path in paths {
            match image::open(&path) {
                Ok(img) => {
                    let name = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "ingredient".to_string());
                    self.ingredients.push(Ingredient::new(name, img.into_rgba8()));
                }
                Err(e) => {
                    log_warn!("ingredient: cannot load {}: {}", path.display(), e);
                }
            }
        }
    }
}

fn thumb_size(image: &RgbaImage) -> Vec2 {
    let (w, h) = (image.width() as f32, image.height() as f32);
    if w <= 0.0 || h <= 0.0 {
        return Vec2::splat(THUMB_SIZE);
    }
    let ratio = THUMB_SIZE / w.max(h);
    Vec2::new(w * ratio, h * ratio)
}

fn upload_texture(ctx: &egui::Context, name: &str, image: &RgbaImage) -> TextureHandle {
    let color_image = egui::ColorImage::from_rgba_unmultiplied(
        [image.width() as usize, image.height() as usize],
        image.as_raw(),
    );
    ctx.load_texture(name.to_string(), color_image, egui::TextureOptions::LINEAR)
}

/// Built-in ingredients: simple shapes rendered onto a white background, so
/// the chroma-key filter has something to key out even before the user adds
/// their own images.
fn builtin_ingredients() -> Vec<Ingredient> {
    vec![
        Ingredient::new("Pepperoni", disc_on_white(96, Rgba([196, 58, 48, 255]))),
        Ingredient::new("Olive", disc_on_white(64, Rgba([62, 80, 44, 255]))),
        Ingredient::new("Cheese", square_on_white(80, Rgba([244, 202, 104, 255]))),
        Ingredient::new("Basil", disc_on_white(72, Rgba([88, 150, 70, 255]))),
    ]
}

fn disc_on_white(side: u32, color: Rgba<u8>) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(side, side, Rgba([255, 255, 255, 255]));
    let center = side as f32 / 2.0;
    let radius = side as f32 * 0.42;
    for (x, y, px) in img.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        if (dx * dx + dy * dy).sqrt() <= radius {
            *px = color;
        }
    }
    img
}

fn square_on_white(side: u32, color: Rgba<u8>) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(side, side, Rgba([255, 255, 255, 255]));
    let margin = side / 6;
    for (x, y, px) in img.enumerate_pixels_mut() {
        if x >= margin && x < side - margin && y >= margin && y < side - margin {
            *px = color;
        }
    }
    img
}
