//! Infinite-canvas graph editor: pan/zoom, node dragging, wire
//! creation between ports, and drag-and-drop node placement from the
//! palette. All user actions are collected while drawing and applied
//! to the [`PipelineGraph`] at the end of the frame.

pub mod node_widget;
pub mod style;
pub mod utils;

use crate::graph::{NodeInstance, PipelineGraph};
use crate::palette::PalettePayload;
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};
use std::collections::{HashMap, HashSet};

use node_widget::{draw_node, EditBuffer, NodePlan, PortEvent};
use style::EditorStyle;
use utils::{draw_bezier, hit_test_bezier};

const ZOOM_RANGE: std::ops::RangeInclusive<f32> = 0.25..=2.5;

/// An in-progress wire, anchored at an output port until it is
/// released over an input.
struct PendingConnection {
    node_id: String,
    port_id: String,
    anchor: Pos2,
}

pub struct GraphEditor {
    pan: Vec2,
    zoom: f32,
    selected: HashSet<String>,
    pending: Option<PendingConnection>,
    edit_buffer: EditBuffer,
}

impl Default for GraphEditor {
    fn default() -> Self {
        Self {
            pan: Vec2::new(40.0, 40.0),
            zoom: 1.0,
            selected: HashSet::new(),
            pending: None,
            edit_buffer: EditBuffer::default(),
        }
    }
}

impl GraphEditor {
    fn to_screen(&self, origin: Pos2, world: Pos2) -> Pos2 {
        origin + world.to_vec2() * self.zoom + self.pan
    }

    fn from_screen(&self, origin: Pos2, screen: Pos2) -> Pos2 {
        ((screen - origin - self.pan) / self.zoom).to_pos2()
    }

    pub fn show(&mut self, ui: &mut egui::Ui, graph: &mut PipelineGraph, style: &EditorStyle) {
        let canvas_rect = ui.available_rect_before_wrap();
        let origin = canvas_rect.min;
        ui.painter()
            .rect_filled(canvas_rect, 0.0, style.canvas_background);

        let background = ui.allocate_rect(canvas_rect, Sense::click_and_drag());

        // Pan with the middle button anywhere, or the primary button on
        // empty canvas (nodes claim their own drags next frame).
        let middle_down = ui.input(|i| i.pointer.middle_down());
        if background.dragged() || (middle_down && ui.rect_contains_pointer(canvas_rect)) {
            self.pan += ui.input(|i| i.pointer.delta());
        }

        // Zoom toward the cursor.
        if ui.rect_contains_pointer(canvas_rect) {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                if let Some(pointer) = ui.ctx().pointer_latest_pos() {
                    let world = self.from_screen(origin, pointer);
                    let new_zoom =
                        (self.zoom * (scroll * 0.002).exp()).clamp(*ZOOM_RANGE.start(), *ZOOM_RANGE.end());
                    self.zoom = new_zoom;
                    self.pan = pointer - origin - world.to_vec2() * self.zoom;
                }
            }
        }

        if background.clicked() {
            self.selected.clear();
            self.pending = None;
        }
        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.pending = None;
        }

        // Resolve every node to its render plan and screen rect before
        // anything is painted, so edges can be drawn underneath.
        let mut plans: HashMap<String, NodePlan> = HashMap::new();
        let mut rects: HashMap<String, Rect> = HashMap::new();
        let mut broken: Vec<(String, Rect, String)> = Vec::new();
        for node in &graph.nodes {
            let top_left = self.to_screen(origin, Pos2::new(node.position.0, node.position.1));
            match NodePlan::build(node, style) {
                Ok(plan) => {
                    let rect = Rect::from_min_size(
                        top_left,
                        Vec2::new(plan.width, plan.height) * self.zoom,
                    );
                    plans.insert(node.id.clone(), plan);
                    rects.insert(node.id.clone(), rect);
                }
                Err(err) => {
                    log::error!("cannot render node {}: {err:#}", node.id);
                    let rect = Rect::from_min_size(
                        top_left,
                        Vec2::new(160.0, 60.0) * self.zoom,
                    );
                    broken.push((node.id.clone(), rect, node.type_id.clone()));
                }
            }
        }

        // Wires.
        let edge_stroke = Stroke::new(2.0, Color32::from_gray(140));
        let mut edge_endpoints: Vec<(String, Pos2, Pos2)> = Vec::new();
        for edge in &graph.edges {
            let endpoints = (|| {
                let src_rect = rects.get(&edge.source)?;
                let dst_rect = rects.get(&edge.target)?;
                let src = plans
                    .get(&edge.source)?
                    .slot_for_handle(&edge.source_handle, false)?;
                let dst = plans
                    .get(&edge.target)?
                    .slot_for_handle(&edge.target_handle, true)?;
                Some((
                    NodePlan::port_pos(*src_rect, src, false),
                    NodePlan::port_pos(*dst_rect, dst, true),
                ))
            })();
            // An edge may reference a port that no longer exists, e.g.
            // after the text that derived it was rewritten. It stays in
            // the graph but is not drawn.
            if let Some((from, to)) = endpoints {
                draw_bezier(ui.painter(), from, to, edge_stroke);
                edge_endpoints.push((edge.id.clone(), from, to));
            }
        }

        // Right-click near a wire deletes it.
        if background.secondary_clicked() {
            if let Some(pointer) = background.interact_pointer_pos() {
                if let Some((id, _, _)) = edge_endpoints
                    .iter()
                    .find(|(_, from, to)| hit_test_bezier(pointer, *from, *to, 8.0))
                {
                    let id = id.clone();
                    graph.remove_edge(&id);
                }
            }
        }

        // Nodes, with a clipped child ui so zoomed-out blocks do not
        // bleed into the panels.
        let mut canvas_ui = ui.new_child(egui::UiBuilder::new().max_rect(canvas_rect));
        canvas_ui.set_clip_rect(canvas_rect);
        let primary_released = ui.input(|i| i.pointer.any_released());

        let mut drags: Vec<(String, Vec2)> = Vec::new();
        let mut port_events: Vec<PortEvent> = Vec::new();
        let mut edits = Vec::new();
        let mut pressed: Option<String> = None;
        for node in &graph.nodes {
            let (Some(plan), Some(rect)) = (plans.get(&node.id), rects.get(&node.id)) else {
                continue;
            };
            let response = draw_node(
                &mut canvas_ui,
                node,
                plan,
                *rect,
                style,
                self.zoom,
                self.selected.contains(&node.id),
                primary_released,
                &mut self.edit_buffer,
            );
            if response.drag_delta != Vec2::ZERO {
                drags.push((node.id.clone(), response.drag_delta));
            }
            if response.pressed {
                pressed = Some(node.id.clone());
            }
            if let Some(event) = response.port_event {
                port_events.push(event);
            }
            edits.extend(response.edits);
        }

        for (id, rect, type_id) in &broken {
            ui.painter().rect_filled(*rect, 5.0, Color32::from_rgb(80, 20, 20));
            ui.painter().rect_stroke(
                *rect,
                5.0,
                Stroke::new(1.5, Color32::RED),
                egui::StrokeKind::Middle,
            );
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                format!("{id}\nunknown type `{type_id}`"),
                egui::FontId::proportional(11.0 * self.zoom),
                Color32::WHITE,
            );
        }

        // Apply collected interactions.
        if let Some(id) = pressed {
            self.selected.clear();
            self.selected.insert(id);
        }
        for (id, delta) in drags {
            if let Some(node) = graph.nodes.iter_mut().find(|n| n.id == id) {
                node.position.0 += delta.x;
                node.position.1 += delta.y;
            }
        }
        for edit in edits {
            graph.update_node_field(&edit.node_id, &edit.field, &edit.value);
        }

        for event in port_events {
            match &self.pending {
                None if !event.is_input => {
                    let anchor = (|| {
                        let rect = rects.get(&event.node_id)?;
                        let slot = plans.get(&event.node_id)?.slot_for_handle(
                            &format!("{}-{}", event.node_id, event.port_id),
                            false,
                        )?;
                        Some(NodePlan::port_pos(*rect, slot, false))
                    })();
                    if let Some(anchor) = anchor {
                        self.pending = Some(PendingConnection {
                            node_id: event.node_id,
                            port_id: event.port_id,
                            anchor,
                        });
                    }
                }
                Some(start) if event.is_input => {
                    let connected = graph.connect(
                        &start.node_id,
                        &format!("{}-{}", start.node_id, start.port_id),
                        &event.node_id,
                        &format!("{}-{}", event.node_id, event.port_id),
                    );
                    if !connected {
                        log::debug!(
                            "rejected connection {} -> {}",
                            start.node_id,
                            event.node_id
                        );
                    }
                    self.pending = None;
                }
                _ => {}
            }
        }

        // Preview wire follows the cursor.
        if let Some(pending) = &self.pending {
            if let Some(pointer) = ui.ctx().pointer_latest_pos() {
                draw_bezier(
                    ui.painter(),
                    pending.anchor,
                    pointer,
                    Stroke::new(2.0, style.accent),
                );
            }
        }

        // Delete removes the selection and its wires.
        if ui.input(|i| i.key_pressed(egui::Key::Delete)) && !self.selected.is_empty() {
            for id in std::mem::take(&mut self.selected) {
                graph.remove_node(&id);
                self.edit_buffer.forget_node(&id);
            }
        }

        // Drops from the palette land where the cursor is.
        if let Some(payload) = background.dnd_release_payload::<PalettePayload>() {
            if let Some(pointer) = ui.ctx().pointer_latest_pos() {
                let world = self.from_screen(origin, pointer);
                let id = graph.next_node_id(payload.node_type);
                log::info!("placed {} at ({:.0}, {:.0})", id, world.x, world.y);
                graph.add_node(NodeInstance::new(
                    id,
                    payload.node_type,
                    (world.x, world.y),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_transform_round_trips() {
        let mut editor = GraphEditor::default();
        editor.pan = Vec2::new(-120.0, 35.0);
        editor.zoom = 1.7;
        let origin = Pos2::new(8.0, 24.0);
        let world = Pos2::new(300.0, -50.0);
        let back = editor.from_screen(origin, editor.to_screen(origin, world));
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn zoom_limits_are_sane() {
        assert!(*ZOOM_RANGE.start() > 0.0);
        assert!(*ZOOM_RANGE.end() > *ZOOM_RANGE.start());
    }
}
