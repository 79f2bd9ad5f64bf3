//! Per-tick collision: gravity against floor/ceiling, wall sliding, and
//! sector transitions through portals.

use log::trace;

use crate::geometry::{intersect_box, point_side};
use crate::player::{Motion, MoveParams, Player, Stance};
use crate::world::{Edge, World};

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// At least one edge stopped the motion and the velocity was slid.
    pub blocked: bool,
    pub changed_sector: Option<usize>,
    pub landed: bool,
    pub bumped_head: bool,
}

/// Advance the player by `dt` seconds, trying to move at `desired` (world units/s).
pub fn tick(
    player: &mut Player,
    desired: [f32; 2],
    world: &World,
    params: &MoveParams,
    dt: f32,
) -> TickReport {
    let mut report = TickReport::default();
    if dt <= 0.0 {
        return report;
    }

    let eye = params.eye_for(player.stance);
    let mut moving = desired != [0.0, 0.0];

    if player.motion == Motion::Falling {
        let sector = world.sector(player.sector);
        player.velocity[2] -= params.gravity * dt;
        let next_z = player.pos[2] + player.velocity[2] * dt;
        if player.velocity[2] < 0.0 && next_z < sector.floor + eye {
            // Landed
            player.pos[2] = sector.floor + eye;
            player.velocity[2] = 0.0;
            player.motion = Motion::Grounded;
            report.landed = true;
        } else if player.velocity[2] > 0.0 && next_z > sector.ceiling {
            player.velocity[2] = 0.0;
            report.bumped_head = true;
        }
        if player.motion == Motion::Falling {
            player.pos[2] += player.velocity[2] * dt;
            moving = true;
        }
    }

    if moving {
        let mut d = [desired[0] * dt, desired[1] * dt];
        let p = player.xy();
        let sector = world.sector(player.sector);

        for edge in sector.edges() {
            let next = [p[0] + d[0], p[1] + d[1]];
            if !crosses(p, next, &edge) {
                continue;
            }
            let (gap_low, gap_high) = match edge.neighbor {
                Some(n) => {
                    let other = world.sector(n);
                    (sector.floor.max(other.floor), sector.ceiling.min(other.ceiling))
                }
                None => (f32::INFINITY, f32::NEG_INFINITY),
            };
            let head = player.pos[2] + params.head_margin;
            let knee = player.pos[2] - eye + params.knee_height;
            if gap_high < head || gap_low > knee {
                d = slide(d, edge.start, edge.end);
                report.blocked = true;
            }
        }

        report.changed_sector = move_player(player, world, d);
        player.velocity[0] = d[0] / dt;
        player.velocity[1] = d[1] / dt;
        // Re-check the floor next tick in case we walked off a ledge
        player.motion = Motion::Falling;
    }

    report
}

/// Translate by `d`, switching sector if the step leaves through a portal.
///
/// The first qualifying edge in ring order wins.
pub fn move_player(player: &mut Player, world: &World, d: [f32; 2]) -> Option<usize> {
    let p = player.xy();
    let next = [p[0] + d[0], p[1] + d[1]];
    let entered = world
        .sector(player.sector)
        .edges()
        .filter(|edge| edge.neighbor.is_some())
        .find(|edge| crosses(p, next, edge))
        .and_then(|edge| edge.neighbor);

    if let Some(n) = entered {
        trace!("sector {} -> {}", player.sector, n);
        player.sector = n;
    }

    player.pos[0] = next[0];
    player.pos[1] = next[1];
    player.refresh_trig();
    entered
}

/// Start a jump if standing on something.
pub fn jump(player: &mut Player, params: &MoveParams) -> bool {
    if player.motion != Motion::Grounded {
        return false;
    }
    player.velocity[2] = params.jump_speed;
    player.motion = Motion::Falling;
    true
}

/// Change posture. The new eye height settles through the normal vertical pass.
pub fn set_stance(player: &mut Player, stance: Stance) {
    if player.stance != stance {
        player.stance = stance;
        player.motion = Motion::Falling;
    }
}

#[inline]
fn crosses(from: [f32; 2], to: [f32; 2], edge: &Edge) -> bool {
    intersect_box(from, to, edge.start, edge.end) && point_side(to, edge.start, edge.end) > 0.0
}

/// Keep only the part of `d` running along the edge a->b.
fn slide(d: [f32; 2], a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
    let ex = b[0] - a[0];
    let ey = b[1] - a[1];
    let len2 = ex * ex + ey * ey;
    if len2 == 0.0 {
        return [0.0, 0.0];
    }
    let t = (d[0] * ex + d[1] * ey) / len2;
    [ex * t, ey * t]
}
