use crate::geometry::intersect;
use crate::player::Player;

// Frustum side lines used to clip edges that pass behind the eye
const NEAR_Z: f32 = 1e-4;
const FAR_Z: f32 = 5.0;
const NEAR_SIDE: f32 = 1e-5;
const FAR_SIDE: f32 = 20.0;

/// Screen dimensions and the perspective scales derived from them.
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub width: usize,
    pub height: usize,
    pub hfov: f32, // horizontal focal factor
    pub vfov: f32, // vertical focal factor
}

impl View {
    pub fn new(width: usize, height: usize) -> Self {
        let h = height as f32;
        Self {
            width,
            height,
            hfov: 0.73 * h,
            vfov: 0.2 * h,
        }
    }

    /// Screen column of a camera-space point. Positive tx lands left of centre.
    #[inline]
    pub fn project_x(&self, p: [f32; 2]) -> i32 {
        let xscale = self.hfov / p[1];
        // Casts saturate for points hugging the near plane
        ((self.width / 2) as i32).saturating_sub((p[0] * xscale) as i32)
    }

    /// Screen row of a height relative to the eye, at depth tz.
    #[inline]
    pub fn project_y(&self, rel_z: f32, tz: f32, yaw: f32) -> i32 {
        let yscale = self.vfov / tz;
        ((self.height / 2) as i32).saturating_sub(((rel_z + tz * yaw) * yscale) as i32)
    }
}

/// Read-only snapshot of the player pose for one frame.
pub struct Camera {
    pub pos: [f32; 2],
    pub eye_z: f32,
    pub sin: f32,
    pub cos: f32,
    pub yaw: f32,
}

impl Camera {
    pub fn from_player(player: &Player) -> Self {
        Self {
            pos: player.xy(),
            eye_z: player.pos[2],
            sin: player.anglesin,
            cos: player.anglecos,
            yaw: player.yaw,
        }
    }

    /// World point to camera space as (tx, tz); +tz is forward.
    #[inline]
    pub fn world_to_camera(&self, p: [f32; 2]) -> [f32; 2] {
        let dx = p[0] - self.pos[0];
        let dy = p[1] - self.pos[1];
        [dx * self.sin - dy * self.cos, dx * self.cos + dy * self.sin]
    }
}

/// Move endpoints that sit at or behind the eye onto the frustum sides.
///
/// Returns false when the clip degenerates (parallel lines, or no candidate
/// in front of the camera) and the edge should be skipped.
pub fn clip_to_frustum(p1: &mut [f32; 2], p2: &mut [f32; 2]) -> bool {
    let a = *p1;
    let b = *p2;
    let i1 = intersect(a, b, [-NEAR_SIDE, NEAR_Z], [-FAR_SIDE, FAR_Z]);
    let i2 = intersect(a, b, [NEAR_SIDE, NEAR_Z], [FAR_SIDE, FAR_Z]);
    let pick = if i1[1] > 0.0 { i1 } else { i2 };

    if p1[1] < NEAR_Z {
        *p1 = pick;
    }
    if p2[1] < NEAR_Z {
        *p2 = pick;
    }

    let usable = |p: &[f32; 2]| p[0].is_finite() && p[1].is_finite() && p[1] > 0.0;
    usable(p1) && usable(p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(x: f32, y: f32, angle: f32) -> Camera {
        Camera::from_player(&Player::new([x, y, 6.0], angle, 0))
    }

    #[test]
    fn forward_is_positive_z() {
        let cam = camera_at(1.0, 1.0, 0.0);
        let p = cam.world_to_camera([5.0, 1.0]);
        assert!(p[0].abs() < 1e-6);
        assert!((p[1] - 4.0).abs() < 1e-6);

        // Facing +y, a point at +x is to the left
        let cam = camera_at(0.0, 0.0, std::f32::consts::FRAC_PI_2);
        let p = cam.world_to_camera([1.0, 0.0]);
        assert!((p[0] - 1.0).abs() < 1e-6);
        assert!(p[1].abs() < 1e-6);
    }

    #[test]
    fn projection_centres_straight_ahead() {
        let view = View::new(320, 200);
        assert_eq!(view.project_x([0.0, 3.0]), 160);
        assert!(view.project_x([1.0, 3.0]) < 160);
        assert!(view.project_x([-1.0, 3.0]) > 160);
        assert_eq!(view.project_y(0.0, 3.0, 0.0), 100);
        // Ceilings above the eye land above the horizon
        assert!(view.project_y(4.0, 3.0, 0.0) < 100);
    }

    #[test]
    fn pitch_offset_shifts_rows_by_depth() {
        let view = View::new(320, 200);
        // vfov is 40, so a height of 2 at depth 4 sits 20 rows above the horizon
        assert_eq!(view.project_y(2.0, 4.0, 0.0), 80);
        // The yaw term is tz * yaw before the perspective divide: 10 rows per unit
        assert_eq!(view.project_y(2.0, 4.0, 0.5), 60);
        assert_eq!(view.project_y(2.0, 4.0, -0.5), 100);
        // Same shift at any depth
        assert_eq!(view.project_y(0.0, 8.0, 0.5), 100 - 20);
        assert_eq!(view.project_y(0.0, 2.0, 0.5), 100 - 20);
    }

    #[test]
    fn clip_moves_rear_endpoint_in_front() {
        let mut p1 = [-5.0, 5.0];
        let mut p2 = [-5.0, -5.0];
        assert!(clip_to_frustum(&mut p1, &mut p2));
        assert_eq!(p1, [-5.0, 5.0]);
        assert!(p2[1] > 0.0 && p2[1] < 5.0);
        assert!((p2[0] + 5.0).abs() < 1e-3);
    }

    #[test]
    fn clip_rejects_degenerate_lines() {
        // A non-finite endpoint poisons both side-line candidates
        let mut p1 = [f32::NAN, 1.0];
        let mut p2 = [0.0, -1.0];
        assert!(!clip_to_frustum(&mut p1, &mut p2));
    }
}
