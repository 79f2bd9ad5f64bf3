//! Scalar 2D primitives shared by the renderer and the movement code.

/// 2D cross product of two vectors. Positive when (x1, y1) turns left of (x0, y0).
#[inline]
pub fn cross(x0: f32, y0: f32, x1: f32, y1: f32) -> f32 {
    x0 * y1 - x1 * y0
}

/// Whether the closed ranges [a0, a1] and [b0, b1] touch or overlap.
/// Endpoints may be given in any order.
#[inline]
pub fn overlap(a0: f32, a1: f32, b0: f32, b1: f32) -> bool {
    a0.min(a1) <= b0.max(b1) && b0.min(b1) <= a0.max(a1)
}

/// Bounding box test between segments a0-a1 and b0-b1
#[inline]
pub fn intersect_box(a0: [f32; 2], a1: [f32; 2], b0: [f32; 2], b1: [f32; 2]) -> bool {
    overlap(a0[0], a1[0], b0[0], b1[0]) && overlap(a0[1], a1[1], b0[1], b1[1])
}

/// Which side of the line a->b the point p lies on.
///
/// Sector rings wind so that interior points are negative; a positive value
/// means p is on the far side of the edge.
#[inline]
pub fn point_side(p: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f32 {
    cross(b[0] - a[0], b[1] - a[1], p[0] - a[0], p[1] - a[1])
}

/// Intersection of the infinite lines through p1-p2 and p3-p4.
///
/// The result is not clipped to either segment. Parallel lines divide by zero
/// and give non-finite components, so callers check `is_finite` or avoid them.
pub fn intersect(p1: [f32; 2], p2: [f32; 2], p3: [f32; 2], p4: [f32; 2]) -> [f32; 2] {
    let c12 = cross(p1[0], p1[1], p2[0], p2[1]);
    let c34 = cross(p3[0], p3[1], p4[0], p4[1]);
    let det = cross(p1[0] - p2[0], p1[1] - p2[1], p3[0] - p4[0], p3[1] - p4[1]);
    [
        cross(c12, p1[0] - p2[0], c34, p3[0] - p4[0]) / det,
        cross(c12, p1[1] - p2[1], c34, p3[1] - p4[1]) / det,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn overlap_counts_touching_ranges() {
        assert!(overlap(0.0, 1.0, 1.0, 2.0));
        assert!(overlap(2.0, 0.0, 1.5, 0.5));
        assert!(!overlap(0.0, 1.0, 1.01, 2.0));
    }

    #[test]
    fn box_needs_both_axes() {
        // Same x span, disjoint y
        assert!(!intersect_box([0.0, 0.0], [1.0, 1.0], [0.0, 2.0], [1.0, 3.0]));
        assert!(intersect_box([0.0, 0.0], [1.0, 1.0], [1.0, 1.0], [2.0, 0.5]));
    }

    #[test]
    fn point_side_sign_follows_winding() {
        // Edge heading -y along x = 1; interior of a clockwise ring is at x < 1
        let a = [1.0, 1.0];
        let b = [1.0, -1.0];
        assert!(point_side([0.0, 0.0], a, b) < 0.0);
        assert!(point_side([2.0, 0.0], a, b) > 0.0);
        assert_eq!(point_side([1.0, 5.0], a, b), 0.0);
    }

    #[test]
    fn intersect_crossing_diagonals() {
        let [x, y] = intersect([0.0, 0.0], [2.0, 2.0], [0.0, 2.0], [2.0, 0.0]);
        assert!((x - 1.0).abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn intersect_parallel_is_not_finite() {
        let p = intersect([0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]);
        assert!(!p[0].is_finite() || !p[1].is_finite());
    }

    proptest! {
        #[test]
        fn point_side_is_antisymmetric(
            px in -100i32..100, py in -100i32..100,
            ax in -100i32..100, ay in -100i32..100,
            bx in -100i32..100, by in -100i32..100,
        ) {
            // Integer-valued coordinates keep every product exact in f32
            let p = [px as f32, py as f32];
            let a = [ax as f32, ay as f32];
            let b = [bx as f32, by as f32];
            prop_assert_eq!(point_side(p, a, b), -point_side(p, b, a));
        }

        #[test]
        fn crossing_segments_meet_inside_both_boxes(
            cx in -10.0f32..10.0, cy in -10.0f32..10.0,
            a_angle in 0.0f32..std::f32::consts::PI,
            turn in 0.5f32..2.6,
            la0 in 1.0f32..10.0, la1 in 1.0f32..10.0,
            lb0 in 1.0f32..10.0, lb1 in 1.0f32..10.0,
        ) {
            // Two segments through a common point with a clear angle between them
            let b_angle = a_angle + turn;
            let (sa, ca) = a_angle.sin_cos();
            let (sb, cb) = b_angle.sin_cos();
            let p1 = [cx - ca * la0, cy - sa * la0];
            let p2 = [cx + ca * la1, cy + sa * la1];
            let p3 = [cx - cb * lb0, cy - sb * lb0];
            let p4 = [cx + cb * lb1, cy + sb * lb1];

            let hit = intersect(p1, p2, p3, p4);
            let tol = 1e-2;
            let inside = |q: [f32; 2], s0: [f32; 2], s1: [f32; 2]| {
                q[0] >= s0[0].min(s1[0]) - tol
                    && q[0] <= s0[0].max(s1[0]) + tol
                    && q[1] >= s0[1].min(s1[1]) - tol
                    && q[1] <= s0[1].max(s1[1]) + tol
            };
            prop_assert!(inside(hit, p1, p2), "{hit:?} outside {p1:?}-{p2:?}");
            prop_assert!(inside(hit, p3, p4), "{hit:?} outside {p3:?}-{p4:?}");
        }
    }
}
