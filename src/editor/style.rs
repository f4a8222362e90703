//! Editor styling: per-type accent colors and canvas constants.

use egui::Color32;
use std::collections::HashMap;

/// Visual styling for the canvas and node blocks. The color table is
/// keyed by wire type id; unknown ids fall back to `accent` so a theme
/// gap never breaks rendering.
#[derive(Clone)]
pub struct EditorStyle {
    pub node_colors: HashMap<String, Color32>,
    pub accent: Color32,
    pub canvas_background: Color32,
    pub node_background: Color32,
    pub font_size: f32,
}

impl Default for EditorStyle {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert("customInput".into(), Color32::from_rgb(16, 185, 129));
        map.insert("llm".into(), Color32::from_rgb(139, 92, 246));
        map.insert("customOutput".into(), Color32::from_rgb(245, 158, 11));
        map.insert("text".into(), Color32::from_rgb(6, 182, 212));
        map.insert("math".into(), Color32::from_rgb(239, 68, 68));
        map.insert("filter".into(), Color32::from_rgb(132, 204, 22));
        map.insert("delay".into(), Color32::from_rgb(249, 115, 22));
        map.insert("counter".into(), Color32::from_rgb(236, 72, 153));
        map.insert("logger".into(), Color32::from_rgb(107, 114, 128));
        Self {
            node_colors: map,
            accent: Color32::from_rgb(37, 99, 235),
            canvas_background: Color32::from_gray(32),
            node_background: Color32::from_gray(52),
            font_size: 14.0,
        }
    }
}

impl EditorStyle {
    /// Accent color for a node type. Never fails: unknown type ids get
    /// the default accent.
    pub fn node_color(&self, type_id: &str) -> Color32 {
        self.node_colors.get(type_id).copied().unwrap_or(self.accent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_have_their_own_color() {
        let style = EditorStyle::default();
        assert_eq!(style.node_color("text"), Color32::from_rgb(6, 182, 212));
        assert_ne!(style.node_color("text"), style.node_color("math"));
    }

    #[test]
    fn unknown_type_falls_back_to_accent() {
        let style = EditorStyle::default();
        assert_eq!(style.node_color("no-such-type"), style.accent);
        assert_eq!(style.node_color(""), style.accent);
    }
}
