//! Node block sizing.
//!
//! Most node types render at their descriptor's base dimensions no
//! matter what their fields contain. Text-bearing types grow with their
//! content so long prompts stay readable; growth is recomputed from the
//! live field value on every pass and never cached.

use crate::node_types::NodeDescriptor;

/// Width grows one step per this many characters.
const WIDTH_STEP_CHARS: usize = 20;
/// Pixels added per width step, saturating at `MAX_EXTRA_WIDTH`.
const WIDTH_STEP_PX: usize = 20;
const MAX_EXTRA_WIDTH: usize = 200;
/// Pixels added per line beyond the two the base height already fits.
const HEIGHT_PER_LINE: f32 = 20.0;

/// Computes the rendered size of a node given the current value of its
/// text source field (`None` when the type has no such field or the
/// value is absent).
pub fn node_size(desc: &NodeDescriptor, text: Option<&str>) -> (f32, f32) {
    if !desc.dynamic_size {
        return (desc.base_width, desc.base_height);
    }

    let char_count = text.map_or(0, |t| t.chars().count());
    let line_count = text.map_or(1, |t| t.split('\n').count().max(1));

    let extra_width = ((char_count / WIDTH_STEP_CHARS) * WIDTH_STEP_PX).min(MAX_EXTRA_WIDTH);
    let extra_height = line_count.saturating_sub(2) as f32 * HEIGHT_PER_LINE;

    (desc.base_width + extra_width as f32, desc.base_height + extra_height)
}
