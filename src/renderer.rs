//! Portal renderer.
//!
//! Sectors are drawn breadth first from the one holding the camera. Each
//! queued item carries the screen columns it may touch and, per column, the
//! rows still visible through the portals crossed to reach it. Windows only
//! ever shrink, so nearer geometry occludes farther geometry without a depth
//! buffer.

use std::collections::VecDeque;

use log::trace;

use crate::camera::{Camera, View, clip_to_frustum};
use crate::player::Player;
use crate::world::{Edge, Sector, World};

/// Upper bound on work items per frame, the root included.
pub const MAX_QUEUE: usize = 32;

#[inline]
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // 0RGB, as softbuffer expects
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
}

/// Colors for the first, interior and last pixel of a vertical span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shade {
    pub top: u32,
    pub middle: u32,
    pub bottom: u32,
}

impl Shade {
    const fn new(top: u32, middle: u32, bottom: u32) -> Self {
        Self { top, middle, bottom }
    }
}

pub const CEILING: Shade = Shade::new(
    pack_rgb(128, 128, 128),
    pack_rgb(212, 212, 212),
    pack_rgb(128, 128, 128),
);
pub const FLOOR: Shade = Shade::new(pack_rgb(0, 0, 255), pack_rgb(0, 0, 170), pack_rgb(0, 0, 255));
pub const WALL: Shade = Shade::new(pack_rgb(0, 0, 0), pack_rgb(170, 170, 170), pack_rgb(0, 0, 0));
/// Wall shading on the two columns where an edge starts and ends.
pub const WALL_EDGE: Shade = Shade::new(pack_rgb(0, 0, 0), pack_rgb(0, 0, 255), pack_rgb(0, 0, 0));

/// Receives the vertical spans of a frame. Rows are already clipped to the screen.
pub trait SpanTarget {
    /// Called before an item's spans, with its inherited window starting at column `x1`.
    fn begin_item(&mut self, _sector: usize, _x1: usize, _top: &[i32], _bottom: &[i32]) {}

    fn vline(&mut self, x: usize, y1: usize, y2: usize, shade: Shade);
}

/// Framebuffer painter.
pub struct Canvas<'a> {
    buf: &'a mut [u32],
    width: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(buf: &'a mut [u32], width: usize) -> Self {
        Self { buf, width }
    }

    pub fn clear(&mut self, color: u32) {
        self.buf.fill(color);
    }
}

impl SpanTarget for Canvas<'_> {
    fn vline(&mut self, x: usize, y1: usize, y2: usize, shade: Shade) {
        let w = self.width;
        if y1 == y2 {
            self.buf[y1 * w + x] = shade.middle;
            return;
        }
        self.buf[y1 * w + x] = shade.top;
        let mut idx = (y1 + 1) * w + x;
        for _y in (y1 + 1)..y2 {
            self.buf[idx] = shade.middle;
            idx += w;
        }
        self.buf[y2 * w + x] = shade.bottom;
    }
}

/// Counters for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub processed: usize,
    pub enqueued: usize,
    /// Portal expansions skipped because the queue cap was reached.
    pub dropped: usize,
    /// Sectors in the order they were drawn. Repeats are allowed.
    pub visited: Vec<usize>,
}

struct WorkItem {
    sector: usize,
    x1: i32,
    x2: i32,
    top: Vec<i32>,
    bottom: Vec<i32>,
}

impl WorkItem {
    #[inline]
    fn window(&self, x: i32) -> (i32, i32) {
        let i = (x - self.x1) as usize;
        (self.top[i], self.bottom[i])
    }
}

/// Screen rows of a floor/ceiling pair at the two ends of an edge.
#[derive(Clone, Copy)]
struct Rows {
    ceil: (i32, i32),
    floor: (i32, i32),
}

impl Rows {
    fn new(view: &View, cam: &Camera, sector: &Sector, tz1: f32, tz2: f32) -> Self {
        let ceil = sector.ceiling - cam.eye_z;
        let floor = sector.floor - cam.eye_z;
        Self {
            ceil: (view.project_y(ceil, tz1, cam.yaw), view.project_y(ceil, tz2, cam.yaw)),
            floor: (view.project_y(floor, tz1, cam.yaw), view.project_y(floor, tz2, cam.yaw)),
        }
    }
}

/// Draw the view from `player` into `target`.
pub fn render_frame<T: SpanTarget>(
    target: &mut T,
    view: &View,
    world: &World,
    player: &Player,
) -> FrameStats {
    let mut stats = FrameStats::default();
    if view.width == 0 || view.height == 0 {
        return stats;
    }

    let w = view.width as i32;
    let h = view.height as i32;
    let cam = Camera::from_player(player);

    let mut queue = VecDeque::with_capacity(MAX_QUEUE);
    queue.push_back(WorkItem {
        sector: player.sector,
        x1: 0,
        x2: w - 1,
        top: vec![0; view.width],
        bottom: vec![h - 1; view.width],
    });
    stats.enqueued = 1;

    while let Some(item) = queue.pop_front() {
        stats.processed += 1;
        stats.visited.push(item.sector);
        target.begin_item(item.sector, item.x1 as usize, &item.top, &item.bottom);

        let sector = world.sector(item.sector);
        for edge in sector.edges() {
            let Some(child) = draw_edge(target, view, world, &cam, sector, &item, edge) else {
                continue;
            };
            if stats.enqueued < MAX_QUEUE {
                queue.push_back(child);
                stats.enqueued += 1;
            } else {
                stats.dropped += 1;
            }
        }
    }

    trace!(
        "frame: {} items, {} dropped, sectors {:?}",
        stats.processed, stats.dropped, stats.visited
    );
    stats
}

/// Paint one edge of the item's sector. Returns the work item for the
/// sector behind it when the edge is a visible portal.
fn draw_edge<T: SpanTarget>(
    target: &mut T,
    view: &View,
    world: &World,
    cam: &Camera,
    sector: &Sector,
    item: &WorkItem,
    edge: Edge,
) -> Option<WorkItem> {
    // Walk edges right to left so front faces project with x1 < x2
    let mut p1 = cam.world_to_camera(edge.end);
    let mut p2 = cam.world_to_camera(edge.start);

    // Entirely behind the eye
    if p1[1] <= 0.0 && p2[1] <= 0.0 {
        return None;
    }
    if (p1[1] <= 0.0 || p2[1] <= 0.0) && !clip_to_frustum(&mut p1, &mut p2) {
        return None;
    }

    let x1 = view.project_x(p1);
    let x2 = view.project_x(p2);
    if x1 >= x2 || x2 < item.x1 || x1 > item.x2 {
        return None;
    }

    let own = Rows::new(view, cam, sector, p1[1], p2[1]);
    let behind = edge
        .neighbor
        .map(|n| (n, Rows::new(view, cam, world.sector(n), p1[1], p2[1])));

    let begin = x1.max(item.x1);
    let end = x2.min(item.x2);
    let h = view.height as i32;

    let span = (end - begin + 1) as usize;
    let (mut next_top, mut next_bottom) = match behind {
        Some(_) => (Vec::with_capacity(span), Vec::with_capacity(span)),
        None => (Vec::new(), Vec::new()),
    };

    for x in begin..=end {
        let (top, bottom) = item.window(x);
        if top > bottom {
            // Closed column; keep it closed for the child
            if behind.is_some() {
                next_top.push(top);
                next_bottom.push(bottom);
            }
            continue;
        }

        let cya = clamp_row(lerp_row(x, x1, x2, own.ceil), top, bottom);
        let cyb = clamp_row(lerp_row(x, x1, x2, own.floor), top, bottom);

        vline(target, view, x, top, cya - 1, CEILING);
        vline(target, view, x, cyb + 1, bottom, FLOOR);

        let shade = if x == x1 || x == x2 { WALL_EDGE } else { WALL };
        match behind {
            Some((_, far)) => {
                let cnya = clamp_row(lerp_row(x, x1, x2, far.ceil), top, bottom);
                let cnyb = clamp_row(lerp_row(x, x1, x2, far.floor), top, bottom);

                // Steps where the neighbour's opening is smaller than ours
                vline(target, view, x, cya, cnya - 1, shade);
                vline(target, view, x, cnyb + 1, cyb, shade);

                next_top.push(cya.max(cnya).clamp(top, h - 1));
                next_bottom.push(cyb.min(cnyb).clamp(0, bottom));
            }
            None => vline(target, view, x, cya, cyb, shade),
        }
    }

    let (neighbor, _) = behind?;
    (end >= begin).then(|| WorkItem {
        sector: neighbor,
        x1: begin,
        x2: end,
        top: next_top,
        bottom: next_bottom,
    })
}

/// Interpolate a row across the edge's projected columns.
#[inline]
fn lerp_row(x: i32, x1: i32, x2: i32, (ya, yb): (i32, i32)) -> i64 {
    let (x, x1, x2) = (x as i64, x1 as i64, x2 as i64);
    let (ya, yb) = (ya as i64, yb as i64);
    (x - x1) * (yb - ya) / (x2 - x1) + ya
}

#[inline]
fn clamp_row(y: i64, lo: i32, hi: i32) -> i32 {
    y.max(lo as i64).min(hi as i64) as i32
}

/// Clip a span to the screen and hand it to the target. Inverted spans draw nothing.
#[inline]
fn vline<T: SpanTarget>(target: &mut T, view: &View, x: i32, y1: i32, y2: i32, shade: Shade) {
    let h = view.height as i32;
    if y2 < y1 || y2 < 0 || y1 >= h {
        return;
    }
    let y1 = y1.max(0) as usize;
    let y2 = y2.min(h - 1) as usize;
    target.vline(x as usize, y1, y2, shade);
}
