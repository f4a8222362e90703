//! Geometry helpers for wire rendering and hit testing.

use egui::{Color32, Pos2, Stroke};

/// Control points for a connection curve; shared by drawing and hit
/// testing so the two always agree.
pub fn bezier_control_points(p1: Pos2, p2: Pos2) -> (Pos2, Pos2) {
    let control_scale = (p2.x - p1.x).abs().max(50.0) * 0.5;
    let c1 = Pos2::new(p1.x + control_scale, p1.y);
    let c2 = Pos2::new(p2.x - control_scale, p2.y);
    (c1, c2)
}

/// Draws a connection wire between two port positions.
pub fn draw_bezier(painter: &egui::Painter, p1: Pos2, p2: Pos2, stroke: Stroke) {
    let (c1, c2) = bezier_control_points(p1, p2);
    let curve = egui::epaint::CubicBezierShape::from_points_stroke(
        [p1, c1, c2, p2],
        false,
        Color32::TRANSPARENT,
        stroke,
    );
    painter.add(curve);
}

/// True when `pos` lies within `threshold` of the curve between `p1`
/// and `p2`. Samples the curve as 20 segments, which is plenty at
/// screen resolution.
pub fn hit_test_bezier(pos: Pos2, p1: Pos2, p2: Pos2, threshold: f32) -> bool {
    let (c1, c2) = bezier_control_points(p1, p2);

    let steps = 20;
    let mut prev = p1;
    for i in 1..=steps {
        let t = i as f32 / steps as f32;
        let t_inv = 1.0 - t;
        let current = (t_inv.powi(3) * p1.to_vec2()
            + 3.0 * t_inv.powi(2) * t * c1.to_vec2()
            + 3.0 * t_inv * t.powi(2) * c2.to_vec2()
            + t.powi(3) * p2.to_vec2())
        .to_pos2();

        if distance_to_segment(pos, prev, current) < threshold {
            return true;
        }
        prev = current;
    }
    false
}

pub fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    if ab.length_sq() < 1e-6 {
        return p.distance(a);
    }
    let ap = p - a;
    let t = (ap.dot(ab) / ab.length_sq()).clamp(0.0, 1.0);
    let closest = a + ab * t;
    p.distance(closest)
}

/// Interpolate between two colors; used for port hover emphasis.
pub fn lerp_color(c1: Color32, c2: Color32, t: f32) -> Color32 {
    let r = (c1.r() as f32 * (1.0 - t) + c2.r() as f32 * t) as u8;
    let g = (c1.g() as f32 * (1.0 - t) + c2.g() as f32 * t) as u8;
    let b = (c1.b() as f32 * (1.0 - t) + c2.b() as f32 * t) as u8;
    let a = (c1.a() as f32 * (1.0 - t) + c2.a() as f32 * t) as u8;
    Color32::from_rgba_premultiplied(r, g, b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_distance() {
        let a = Pos2::new(0.0, 0.0);
        let b = Pos2::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Pos2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Pos2::new(-4.0, 0.0), a, b), 4.0);
        // Degenerate segment collapses to point distance.
        assert_eq!(distance_to_segment(Pos2::new(3.0, 4.0), a, a), 5.0);
    }

    #[test]
    fn bezier_hit_near_endpoints_and_miss_far_away() {
        let p1 = Pos2::new(0.0, 0.0);
        let p2 = Pos2::new(200.0, 100.0);
        assert!(hit_test_bezier(Pos2::new(1.0, 1.0), p1, p2, 10.0));
        assert!(hit_test_bezier(Pos2::new(199.0, 99.0), p1, p2, 10.0));
        assert!(!hit_test_bezier(Pos2::new(100.0, -300.0), p1, p2, 10.0));
    }
}
