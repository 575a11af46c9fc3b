//! Bottom control strip: the three discrete commands that act on the active
//! object. The strip only reports what was clicked; the controller decides
//! whether anything is selected to receive it.

use eframe::egui;

use crate::controller::ControlCommand;

#[derive(Default)]
pub struct ControlsPanel;

impl ControlsPanel {
    /// Draw the strip and return the command clicked this frame, if any.
    pub fn show(&mut self, ui: &mut egui::Ui, has_active: bool) -> Option<ControlCommand> {
        let mut command = None;
        ui.horizontal(|ui| {
            ui.add_space(8.0);
            if ui
                .add_enabled(has_active, egui::Button::new("⟳ Rotate"))
                .on_hover_text("Rotate the selected item by one step")
                .clicked()
            {
                command = Some(ControlCommand::RotateStep);
            }
            if ui
                .add_enabled(has_active, egui::Button::new("＋ Bigger"))
                .on_hover_text("Grow the selected item")
                .clicked()
            {
                command = Some(ControlCommand::GrowStep);
            }
            if ui
                .add_enabled(has_active, egui::Button::new("－ Smaller"))
                .on_hover_text("Shrink the selected item")
                .clicked()
            {
                command = Some(ControlCommand::ShrinkStep);
            }
            if !has_active {
                ui.add_space(12.0);
                ui.weak("Select an item on the canvas to transform it");
            }
        });
        command
    }
}
