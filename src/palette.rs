//! Draggable node palette shown in the top panel. Each entry is a
//! colored chip that carries its node type as a drag payload; the
//! canvas materializes a node when the payload is dropped on it.

use crate::node_types::{self, NodeKind};
use egui::{Color32, FontId, RichText, Vec2};

use crate::editor::style::EditorStyle;

/// Drag payload handed from a palette chip to the canvas.
#[derive(Clone, Copy, Debug)]
pub struct PalettePayload {
    pub node_type: NodeKind,
}

/// One draggable chip. The chip stays in place while dragging; egui
/// renders a ghost copy under the cursor.
pub fn palette_entry(ui: &mut egui::Ui, kind: NodeKind, style: &EditorStyle) {
    let desc = node_types::descriptor(kind);
    let color = style.node_color(kind.type_id());
    let id = ui.id().with("palette").with(kind.type_id());

    ui.dnd_drag_source(id, PalettePayload { node_type: kind }, |ui| {
        egui::Frame::new()
            .fill(color.gamma_multiply(0.25))
            .stroke(egui::Stroke::new(1.0, color))
            .corner_radius(4.0)
            .inner_margin(egui::Margin::symmetric(8, 4))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let (dot, _) = ui.allocate_exact_size(Vec2::splat(8.0), egui::Sense::hover());
                    ui.painter().circle_filled(dot.center(), 4.0, color);
                    ui.label(
                        RichText::new(desc.title)
                            .font(FontId::proportional(13.0))
                            .color(Color32::WHITE),
                    );
                });
            });
    })
    .response
    .on_hover_text(format!(
        "Drag onto the canvas to add a {} node",
        desc.title
    ));
}

/// The full palette row, one chip per registered type.
pub fn palette_row(ui: &mut egui::Ui, style: &EditorStyle) {
    ui.horizontal_wrapped(|ui| {
        for kind in NodeKind::ALL {
            palette_entry(ui, kind, style);
        }
    });
}
