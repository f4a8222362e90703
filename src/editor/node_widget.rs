//! Generic node renderer.
//!
//! One code path renders every node type from its registry descriptor:
//! the pure half ([`NodePlan`]) resolves the descriptor, merges static
//! and derived ports, computes dimensions and the variable summary; the
//! egui half ([`draw_node`]) paints the block and its form controls and
//! reports field edits back to the caller, which applies them to the
//! graph container in the same frame.

use crate::graph::NodeInstance;
use crate::layout;
use crate::node_types::{self, FieldKind, NodeDescriptor, NodeKind};
use crate::variables::extract_variables;
use anyhow::{Result, anyhow};
use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Vec2};
use std::collections::HashMap;

use super::style::EditorStyle;
use super::utils::lerp_color;

/// One rendered port position.
#[derive(Clone, Debug, PartialEq)]
pub struct PortSlot {
    pub port_id: String,
    /// Globally unique handle: `{nodeId}-{portId}`.
    pub handle: String,
    /// True for ports materialized from `{{variable}}` references.
    pub derived: bool,
    /// Vertical placement as a fraction of block height,
    /// `(index + 1) / (count + 1)`.
    pub fraction: f32,
}

/// Everything the painter needs for one node, recomputed from the live
/// field values on every frame.
#[derive(Clone, Debug)]
pub struct NodePlan {
    pub kind: NodeKind,
    pub width: f32,
    pub height: f32,
    /// Static inputs in descriptor order, then derived ports in
    /// first-seen order.
    pub inputs: Vec<PortSlot>,
    pub outputs: Vec<PortSlot>,
    /// `Variables: a, b` line; present only when the type derives ports
    /// and at least one variable was found.
    pub variable_summary: Option<String>,
    pub color: Color32,
}

/// Current value of a field: the stored value, or the declared default
/// when nothing has been stored yet.
pub fn field_value(node: &NodeInstance, desc: &NodeDescriptor, field: &str) -> String {
    node.data
        .get(field)
        .cloned()
        .unwrap_or_else(|| desc.field_default(field).unwrap_or("").to_string())
}

/// Input port ids for a node: static ids first, then derived names. A
/// derived name that collides with a static id is skipped so the handle
/// set stays duplicate-free.
fn input_port_ids(desc: &NodeDescriptor, derived: &[String]) -> Vec<(String, bool)> {
    let mut ids: Vec<(String, bool)> = desc
        .inputs
        .iter()
        .map(|p| (p.id.to_string(), false))
        .collect();
    for name in derived {
        if desc.inputs.iter().any(|p| p.id == name) {
            log::warn!("derived port {name} collides with a static input, skipping");
            continue;
        }
        ids.push((name.clone(), true));
    }
    ids
}

fn slots(node_id: &str, ids: Vec<(String, bool)>) -> Vec<PortSlot> {
    let count = ids.len();
    ids.into_iter()
        .enumerate()
        .map(|(i, (port_id, derived))| PortSlot {
            handle: format!("{node_id}-{port_id}"),
            port_id,
            derived,
            fraction: (i + 1) as f32 / (count + 1) as f32,
        })
        .collect()
}

impl NodePlan {
    /// Resolves the node's descriptor and derives the full render
    /// state. An unknown type id is a configuration error, not a
    /// fallback.
    pub fn build(node: &NodeInstance, style: &EditorStyle) -> Result<NodePlan> {
        let kind = NodeKind::from_type_id(&node.type_id).ok_or_else(|| {
            anyhow!("unknown node type `{}` on node {}", node.type_id, node.id)
        })?;
        let desc = node_types::descriptor(kind);

        let text = desc.text_source.map(|f| field_value(node, desc, f));
        let derived = match (&text, desc.text_source) {
            (Some(text), Some(_)) => extract_variables(text),
            _ => Vec::new(),
        };

        let inputs = slots(&node.id, input_port_ids(desc, &derived));
        let outputs = slots(
            &node.id,
            desc.outputs.iter().map(|p| (p.id.to_string(), false)).collect(),
        );

        let (width, height) = layout::node_size(desc, text.as_deref());

        let variable_summary =
            (!derived.is_empty()).then(|| format!("Variables: {}", derived.join(", ")));

        Ok(NodePlan {
            kind,
            width,
            height,
            inputs,
            outputs,
            variable_summary,
            color: style.node_color(&node.type_id),
        })
    }

    pub fn descriptor(&self) -> &'static NodeDescriptor {
        node_types::descriptor(self.kind)
    }

    /// Screen position of a port given the block's screen rect.
    pub fn port_pos(rect: Rect, slot: &PortSlot, is_input: bool) -> Pos2 {
        let x = if is_input { rect.left() } else { rect.right() };
        Pos2::new(x, rect.top() + rect.height() * slot.fraction)
    }

    pub fn slot_for_handle(&self, handle: &str, is_input: bool) -> Option<&PortSlot> {
        let side = if is_input { &self.inputs } else { &self.outputs };
        side.iter().find(|s| s.handle == handle)
    }
}

/// Transient mirror of field values being edited. Text widgets mutate
/// the buffer directly for lag-free typing; every change is pushed to
/// the graph container in the same frame, and entries that are not
/// focused are refreshed from the container so the two never drift.
#[derive(Default)]
pub struct EditBuffer {
    values: HashMap<(String, String), String>,
}

impl EditBuffer {
    /// Buffered value for a field, seeding from the store on first use.
    pub fn value_mut(&mut self, node_id: &str, field: &str, store_value: &str) -> &mut String {
        self.values
            .entry((node_id.to_string(), field.to_string()))
            .or_insert_with(|| store_value.to_string())
    }

    /// Overwrites the buffer from the store. Called each frame for
    /// every field that is not mid-edit.
    pub fn refresh(&mut self, node_id: &str, field: &str, store_value: &str) {
        if let Some(value) = self
            .values
            .get_mut(&(node_id.to_string(), field.to_string()))
        {
            if value != store_value {
                *value = store_value.to_string();
            }
        }
    }

    pub fn get(&self, node_id: &str, field: &str) -> Option<&str> {
        self.values
            .get(&(node_id.to_string(), field.to_string()))
            .map(String::as_str)
    }

    /// Drops all entries for a removed node.
    pub fn forget_node(&mut self, node_id: &str) {
        self.values.retain(|(id, _), _| id != node_id);
    }
}

/// One field change to apply to the graph container.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldEdit {
    pub node_id: String,
    pub field: String,
    pub value: String,
}

/// A port the user clicked or released on.
#[derive(Clone, Debug)]
pub struct PortEvent {
    pub node_id: String,
    pub port_id: String,
    pub is_input: bool,
}

/// What one node reported back from a frame.
#[derive(Default)]
pub struct NodeResponse {
    pub drag_delta: Vec2,
    /// Mouse went down on the block this frame (selection).
    pub pressed: bool,
    /// A port was clicked, drag-started or released on.
    pub port_event: Option<PortEvent>,
    pub edits: Vec<FieldEdit>,
}

/// Paints one node and its form controls. Interaction rects for the
/// ports are registered before the block body so port clicks never
/// start a node drag.
#[allow(clippy::too_many_arguments)]
pub fn draw_node(
    ui: &mut egui::Ui,
    node: &NodeInstance,
    plan: &NodePlan,
    rect: Rect,
    style: &EditorStyle,
    zoom: f32,
    selected: bool,
    primary_released: bool,
    buffer: &mut EditBuffer,
) -> NodeResponse {
    let mut out = NodeResponse::default();
    let desc = plan.descriptor();

    // Port interactions first, body second, widgets last (widgets sit
    // on top and consume their own clicks).
    let mut port_pressed = false;
    for (slot, is_input) in plan
        .inputs
        .iter()
        .map(|s| (s, true))
        .chain(plan.outputs.iter().map(|s| (s, false)))
    {
        let pos = NodePlan::port_pos(rect, slot, is_input);
        let port_rect = Rect::from_center_size(pos, Vec2::splat(16.0 * zoom));
        let side = if is_input { "in" } else { "out" };
        let response = ui.interact(
            port_rect,
            ui.id().with(&node.id).with(&slot.port_id).with(side),
            Sense::click_and_drag(),
        );

        if response.drag_started()
            || response.clicked()
            || (response.hovered() && primary_released)
        {
            out.port_event = Some(PortEvent {
                node_id: node.id.clone(),
                port_id: slot.port_id.clone(),
                is_input,
            });
            port_pressed = true;
        }
    }

    let body = ui.allocate_rect(rect, Sense::click_and_drag());
    if body.dragged() && !port_pressed {
        out.drag_delta = body.drag_delta() / zoom;
    }
    out.pressed = port_pressed
        || body.drag_started()
        || (body.contains_pointer() && ui.input(|i| i.pointer.primary_pressed()));

    // Frame
    if selected {
        ui.painter().rect_stroke(
            rect.expand(2.0),
            5.0,
            Stroke::new(2.0, Color32::YELLOW),
            egui::StrokeKind::Middle,
        );
    }
    let visuals = ui.style().visuals.clone();
    ui.painter().rect_filled(rect, 5.0, style.node_background);
    ui.painter().rect_stroke(
        rect,
        5.0,
        Stroke::new(1.5, plan.color),
        egui::StrokeKind::Middle,
    );

    // Header strip in the type color, with the title next to a small
    // identity dot like the palette chips.
    let header_rect = Rect::from_min_max(
        rect.min,
        Pos2::new(rect.max.x, rect.min.y + 22.0 * zoom),
    );
    ui.painter()
        .rect_filled(header_rect, 5.0, plan.color.gamma_multiply(0.35));
    ui.painter().circle_filled(
        header_rect.left_center() + Vec2::new(12.0 * zoom, 0.0),
        4.0 * zoom,
        plan.color,
    );
    ui.painter().text(
        header_rect.left_center() + Vec2::new(22.0 * zoom, 0.0),
        Align2::LEFT_CENTER,
        desc.title,
        FontId::proportional(style.font_size * zoom),
        Color32::WHITE,
    );

    // Form controls, one per declared field.
    let margin = 10.0 * zoom;
    let content_width = rect.width() - margin * 2.0;
    let mut cursor_y = header_rect.max.y + 6.0 * zoom;
    for field in desc.fields {
        ui.painter().text(
            Pos2::new(rect.min.x + margin, cursor_y),
            Align2::LEFT_TOP,
            format!("{}:", field.label),
            FontId::proportional(11.0 * zoom),
            Color32::from_gray(180),
        );
        cursor_y += 15.0 * zoom;

        let widget_height = match field.kind {
            FieldKind::TextArea => 54.0 * zoom,
            _ => 20.0 * zoom,
        };
        let widget_rect = Rect::from_min_size(
            Pos2::new(rect.min.x + margin, cursor_y),
            Vec2::new(content_width, widget_height),
        );
        let field_id = ui.id().with(&node.id).with(field.name).with("edit");

        let store_value = field_value(node, desc, field.name);
        let focused = ui.ctx().memory(|m| m.has_focus(field_id));
        if !focused {
            buffer.refresh(&node.id, field.name, &store_value);
        }
        let value = buffer.value_mut(&node.id, field.name, &store_value);

        let changed = match field.kind {
            FieldKind::Text => ui
                .put(
                    widget_rect,
                    egui::TextEdit::singleline(value)
                        .id(field_id)
                        .font(FontId::proportional(12.0 * zoom)),
                )
                .changed(),
            FieldKind::TextArea => ui
                .put(
                    widget_rect,
                    egui::TextEdit::multiline(value)
                        .id(field_id)
                        .desired_rows(3)
                        .font(FontId::proportional(12.0 * zoom)),
                )
                .changed(),
            FieldKind::Number => {
                let response = ui.put(
                    widget_rect,
                    egui::TextEdit::singleline(value)
                        .id(field_id)
                        .font(FontId::proportional(12.0 * zoom)),
                );
                if response.changed() {
                    value.retain(|c| c.is_ascii_digit() || c == '.' || c == '-');
                }
                response.changed()
            }
            FieldKind::Select(options) => {
                let mut picked = false;
                ui.scope_builder(egui::UiBuilder::new().max_rect(widget_rect), |ui| {
                    ui.style_mut().text_styles.insert(
                        egui::TextStyle::Body,
                        FontId::proportional(12.0 * zoom),
                    );
                    ui.style_mut().text_styles.insert(
                        egui::TextStyle::Button,
                        FontId::proportional(12.0 * zoom),
                    );
                    egui::ComboBox::from_id_salt(field_id)
                        .width(content_width)
                        .selected_text(value.clone())
                        .show_ui(ui, |ui| {
                            for &option in options {
                                if ui
                                    .selectable_value(value, option.to_string(), option)
                                    .clicked()
                                {
                                    picked = true;
                                }
                            }
                        });
                });
                picked
            }
        };

        if changed {
            out.edits.push(FieldEdit {
                node_id: node.id.clone(),
                field: field.name.to_string(),
                value: value.clone(),
            });
        }
        cursor_y += widget_height + 6.0 * zoom;
    }

    // Static body text.
    if let Some(body_text) = desc.body_text {
        ui.painter().text(
            Pos2::new(rect.min.x + margin, cursor_y),
            Align2::LEFT_TOP,
            body_text,
            FontId::proportional(11.0 * zoom),
            Color32::from_gray(160),
        );
    }

    // Derived-variable summary pinned to the bottom of the block.
    if let Some(summary) = &plan.variable_summary {
        ui.painter().text(
            Pos2::new(rect.min.x + margin, rect.max.y - 16.0 * zoom),
            Align2::LEFT_TOP,
            summary,
            FontId::proportional(10.0 * zoom),
            plan.color.gamma_multiply(1.2),
        );
    }

    // Port circles over everything else.
    let hover_pos = ui.ctx().pointer_latest_pos();
    for (slot, is_input) in plan
        .inputs
        .iter()
        .map(|s| (s, true))
        .chain(plan.outputs.iter().map(|s| (s, false)))
    {
        let pos = NodePlan::port_pos(rect, slot, is_input);
        let hovered = hover_pos.is_some_and(|p| p.distance(pos) < 8.0 * zoom);
        let fill = if hovered {
            lerp_color(plan.color, Color32::WHITE, 0.4)
        } else {
            plan.color
        };
        ui.painter().circle_filled(pos, 5.0 * zoom, fill);
        if slot.derived {
            // Ring marks ports that came from the text scan.
            ui.painter().circle_stroke(
                pos,
                6.5 * zoom,
                Stroke::new(1.0 * zoom, visuals.text_color()),
            );
        }
        if hovered {
            let label = if slot.derived {
                format!("Variable: {}", slot.port_id)
            } else {
                slot.port_id.clone()
            };
            ui.painter().text(
                pos + Vec2::new(0.0, -12.0 * zoom),
                Align2::CENTER_BOTTOM,
                label,
                FontId::proportional(10.0 * zoom),
                Color32::WHITE,
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_types::{FieldDescriptor, PortDescriptor};

    fn text_node(id: &str, content: &str) -> NodeInstance {
        let mut node = NodeInstance::new(id.to_string(), NodeKind::Text, (0.0, 0.0));
        node.data.insert("text".into(), content.into());
        node
    }

    #[test]
    fn static_ports_precede_derived_ports() {
        let style = EditorStyle::default();
        let mut node = NodeInstance::new("llm-1".into(), NodeKind::Llm, (0.0, 0.0));
        let plan = NodePlan::build(&node, &style).unwrap();
        let ids: Vec<_> = plan.inputs.iter().map(|s| s.port_id.as_str()).collect();
        assert_eq!(ids, ["system", "prompt"]);
        assert!(plan.inputs.iter().all(|s| !s.derived));

        node = text_node("text-1", "{{b}} and {{a}}");
        let plan = NodePlan::build(&node, &style).unwrap();
        let ids: Vec<_> = plan.inputs.iter().map(|s| s.port_id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert!(plan.inputs.iter().all(|s| s.derived));
        let out_ids: Vec<_> = plan.outputs.iter().map(|s| s.port_id.as_str()).collect();
        assert_eq!(out_ids, ["output"]);
    }

    #[test]
    fn handles_are_namespaced_by_node_id() {
        let style = EditorStyle::default();
        let plan = NodePlan::build(&text_node("text-7", "{{x}}"), &style).unwrap();
        assert_eq!(plan.inputs[0].handle, "text-7-x");
        assert_eq!(plan.outputs[0].handle, "text-7-output");
        assert!(plan.slot_for_handle("text-7-x", true).is_some());
        assert!(plan.slot_for_handle("text-7-x", false).is_none());
    }

    #[test]
    fn ports_spread_evenly() {
        let style = EditorStyle::default();
        let plan =
            NodePlan::build(&text_node("text-1", "{{a}} {{b}} {{c}}"), &style).unwrap();
        let fractions: Vec<_> = plan.inputs.iter().map(|s| s.fraction).collect();
        assert_eq!(fractions, [0.25, 0.5, 0.75]);
        // Single output lands in the middle.
        assert_eq!(plan.outputs[0].fraction, 0.5);
    }

    #[test]
    fn rebuilding_with_unchanged_values_is_identical() {
        let style = EditorStyle::default();
        let node = text_node("text-1", "{{a}} {{b}}");
        let first = NodePlan::build(&node, &style).unwrap();
        let second = NodePlan::build(&node, &style).unwrap();
        assert_eq!(first.inputs, second.inputs);
        assert_eq!(first.outputs, second.outputs);
        assert_eq!(first.variable_summary, second.variable_summary);
        assert_eq!((first.width, first.height), (second.width, second.height));
    }

    #[test]
    fn hello_name_scenario() {
        let style = EditorStyle::default();
        let plan = NodePlan::build(&text_node("text-1", "Hello {{name}}!"), &style).unwrap();
        assert_eq!(plan.inputs.len(), 1);
        assert_eq!(plan.inputs[0].port_id, "name");
        assert!(plan.inputs[0].derived);
        assert_eq!(plan.variable_summary.as_deref(), Some("Variables: name"));
        assert_eq!((plan.width, plan.height), (250.0, 150.0));
    }

    #[test]
    fn long_single_line_widens_only() {
        let style = EditorStyle::default();
        let content = "x".repeat(45);
        let plan = NodePlan::build(&text_node("text-1", &content), &style).unwrap();
        assert_eq!((plan.width, plan.height), (290.0, 150.0));
    }

    #[test]
    fn summary_absent_without_variables() {
        let style = EditorStyle::default();
        let plan = NodePlan::build(&text_node("text-1", "no references"), &style).unwrap();
        assert!(plan.variable_summary.is_none());
        // Non-deriving types never get a summary either.
        let llm = NodeInstance::new("llm-1".into(), NodeKind::Llm, (0.0, 0.0));
        assert!(NodePlan::build(&llm, &style).unwrap().variable_summary.is_none());
    }

    #[test]
    fn unknown_type_is_a_configuration_error() {
        let style = EditorStyle::default();
        let node = NodeInstance {
            id: "mystery-1".into(),
            type_id: "mystery".into(),
            position: (0.0, 0.0),
            data: HashMap::new(),
        };
        let err = NodePlan::build(&node, &style).unwrap_err();
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn color_comes_from_theme_with_accent_fallback() {
        let style = EditorStyle::default();
        let plan = NodePlan::build(&text_node("text-1", ""), &style).unwrap();
        assert_eq!(plan.color, style.node_color("text"));
        assert_eq!(style.node_color("mystery"), style.accent);
    }

    #[test]
    fn derived_name_colliding_with_static_input_is_skipped() {
        const DESC: NodeDescriptor = NodeDescriptor {
            kind: NodeKind::Filter,
            title: "Filter",
            base_width: 200.0,
            base_height: 120.0,
            fields: &[FieldDescriptor {
                name: "condition",
                label: "Condition",
                kind: FieldKind::Text,
                default_value: "",
            }],
            inputs: &[PortDescriptor { id: "input" }],
            outputs: &[],
            body_text: None,
            text_source: Some("condition"),
            dynamic_size: false,
        };
        let ids = input_port_ids(&DESC, &["input".to_string(), "extra".to_string()]);
        assert_eq!(
            ids,
            vec![("input".to_string(), false), ("extra".to_string(), true)]
        );
    }

    #[test]
    fn field_values_fall_back_to_defaults() {
        let desc = node_types::descriptor(NodeKind::Input);
        let node = NodeInstance::new("customInput-1".into(), NodeKind::Input, (0.0, 0.0));
        assert_eq!(field_value(&node, desc, "inputName"), "input_1");
        assert_eq!(field_value(&node, desc, "inputType"), "Text");
    }

    #[test]
    fn edit_buffer_round_trip_stays_in_sync() {
        use crate::graph::PipelineGraph;
        let mut graph = PipelineGraph::default();
        let id = graph.next_node_id(NodeKind::Text);
        graph.add_node(NodeInstance::new(id.clone(), NodeKind::Text, (0.0, 0.0)));
        let mut buffer = EditBuffer::default();

        // Seeded from the store (here: the declared default).
        let desc = node_types::descriptor(NodeKind::Text);
        let store = field_value(graph.node(&id).unwrap(), desc, "text");
        assert_eq!(buffer.value_mut(&id, "text", &store), "");

        // A keystroke mutates the buffer, the edit is pushed to the
        // container, and afterwards the two agree.
        let value = buffer.value_mut(&id, "text", &store);
        value.push_str("Hello {{name}}!");
        let edit = FieldEdit {
            node_id: id.clone(),
            field: "text".into(),
            value: value.clone(),
        };
        graph.update_node_field(&edit.node_id, &edit.field, &edit.value);
        assert_eq!(
            graph.node(&id).unwrap().data["text"],
            buffer.get(&id, "text").unwrap()
        );

        // No other field picked up the value.
        assert_eq!(graph.node(&id).unwrap().data.len(), 1);

        // An external change wins once the field is not being edited.
        graph.update_node_field(&id, "text", "replaced");
        buffer.refresh(&id, "text", "replaced");
        assert_eq!(buffer.get(&id, "text"), Some("replaced"));

        buffer.forget_node(&id);
        assert!(buffer.get(&id, "text").is_none());
    }
}
