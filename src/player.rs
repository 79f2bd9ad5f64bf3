//! Player pose and the input-side helpers that feed the movement tick.

use crate::world::World;

/// View pitch added per unit/s of vertical speed.
const FALL_TILT: f32 = 0.005;

/// Body posture, selects the eye height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stance {
    #[default]
    Standing,
    Ducking,
}

/// Vertical state. Gravity only integrates while falling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Grounded,
    Falling,
}

/// Movement tunables. Distances are map units, times are seconds.
#[derive(Debug, Clone, Copy)]
pub struct MoveParams {
    pub eye_height: f32,
    pub duck_height: f32,
    /// Clearance required above the eye to fit under a lintel.
    pub head_margin: f32,
    /// Ledges up to this height above the feet can be stepped onto.
    pub knee_height: f32,
    pub gravity: f32,
    pub walk_speed: f32,
    pub jump_speed: f32,
}

impl Default for MoveParams {
    fn default() -> Self {
        Self {
            eye_height: 6.0,
            duck_height: 2.5,
            head_margin: 1.0,
            knee_height: 2.0,
            gravity: 500.0,
            walk_speed: 20.0,
            jump_speed: 50.0,
        }
    }
}

impl MoveParams {
    #[inline]
    pub fn eye_for(&self, stance: Stance) -> f32 {
        match stance {
            Stance::Standing => self.eye_height,
            Stance::Ducking => self.duck_height,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub pos: [f32; 3],
    pub velocity: [f32; 3],
    /// Facing in radians, 0 looks along +x.
    pub angle: f32,
    pub anglesin: f32,
    pub anglecos: f32,
    /// Look pitch offset used by the projection only.
    pub yaw: f32,
    /// Index of the sector containing (x, y).
    pub sector: usize,
    pub stance: Stance,
    pub motion: Motion,
    look: f32,
}

impl Player {
    pub fn new(pos: [f32; 3], angle: f32, sector: usize) -> Self {
        let mut player = Self {
            pos,
            velocity: [0.0; 3],
            angle,
            anglesin: 0.0,
            anglecos: 1.0,
            yaw: 0.0,
            sector,
            stance: Stance::Standing,
            motion: Motion::Falling,
            look: 0.0,
        };
        player.refresh_trig();
        player
    }

    /// Spawn standing on the floor of `sector`.
    pub fn spawn(
        world: &World,
        x: f32,
        y: f32,
        angle: f32,
        sector: usize,
        params: &MoveParams,
    ) -> Self {
        let z = world.sector(sector).floor + params.eye_height;
        Self::new([x, y, z], angle, sector)
    }

    #[inline]
    pub fn xy(&self) -> [f32; 2] {
        [self.pos[0], self.pos[1]]
    }

    #[inline]
    pub fn refresh_trig(&mut self) {
        let (s, c) = self.angle.sin_cos();
        self.anglesin = s;
        self.anglecos = c;
    }

    /// Apply a relative mouse delta. Vertical velocity tilts the view while airborne.
    pub fn look(&mut self, mouse_dx: f32, mouse_dy: f32) {
        self.angle += mouse_dx * 0.03;
        // Keep angle bounded to avoid float drift
        self.angle = self.angle.rem_euclid(std::f32::consts::TAU);
        self.look = (self.look - mouse_dy * 0.05).clamp(-5.0, 5.0);
        self.yaw = self.look - self.velocity[2] * FALL_TILT;
        self.refresh_trig();
    }
}

/// Directional key state as sampled by the frame driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub forward: bool,
    pub left: bool,
    pub back: bool,
    pub right: bool,
}

impl MoveKeys {
    pub fn any(&self) -> bool {
        self.forward || self.left || self.back || self.right
    }
}

/// Velocity the keys ask for, in world space.
pub fn wish_velocity(player: &Player, keys: &MoveKeys, speed: f32) -> [f32; 2] {
    let (s, c) = (player.anglesin, player.anglecos);
    let mut wish = [0.0f32; 2];
    if keys.forward {
        wish[0] += c;
        wish[1] += s;
    }
    if keys.left {
        wish[0] += s;
        wish[1] -= c;
    }
    if keys.back {
        wish[0] -= c;
        wish[1] -= s;
    }
    if keys.right {
        wish[0] -= s;
        wish[1] += c;
    }
    [wish[0] * speed, wish[1] * speed]
}

/// Ease the horizontal velocity toward `wish`. Faster response while a key is held.
pub fn approach(velocity: [f32; 2], wish: [f32; 2], pushing: bool) -> [f32; 2] {
    let accel = if pushing { 0.4 } else { 0.2 };
    [
        velocity[0] * (1.0 - accel) + wish[0] * accel,
        velocity[1] * (1.0 - accel) + wish[1] * accel,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_follows_facing() {
        let p = Player::new([0.0; 3], std::f32::consts::FRAC_PI_2, 0);
        let keys = MoveKeys {
            forward: true,
            ..Default::default()
        };
        let v = wish_velocity(&p, &keys, 10.0);
        assert!(v[0].abs() < 1e-5);
        assert!((v[1] - 10.0).abs() < 1e-5);
    }

    #[test]
    fn opposite_keys_cancel() {
        let p = Player::new([0.0; 3], 0.7, 0);
        let keys = MoveKeys {
            forward: true,
            back: true,
            left: true,
            right: true,
        };
        let v = wish_velocity(&p, &keys, 10.0);
        assert!(v[0].abs() < 1e-5 && v[1].abs() < 1e-5);
    }

    #[test]
    fn approach_blends_by_push_state() {
        assert_eq!(approach([0.0, 0.0], [10.0, 0.0], true), [4.0, 0.0]);
        assert_eq!(approach([10.0, 0.0], [0.0, 0.0], false), [8.0, 0.0]);
    }

    #[test]
    fn look_clamps_pitch_and_turns() {
        let mut p = Player::new([0.0; 3], 0.0, 0);
        p.look(10.0, 0.0);
        assert!((p.angle - 0.3).abs() < 1e-6);
        assert!((p.anglesin - 0.3f32.sin()).abs() < 1e-6);
        p.look(0.0, -1000.0);
        assert_eq!(p.yaw, 5.0);
    }
}
