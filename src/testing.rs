//! Small hand-built worlds shared by the unit tests.

use crate::world::{Sector, World};

/// Axis-aligned room wound clockwise. Neighbors are given as [west, north, east, south].
pub fn room(
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    floor: f32,
    ceiling: f32,
    sides: [Option<usize>; 4],
) -> Sector {
    Sector {
        floor,
        ceiling,
        vertices: vec![[x0, y0], [x0, y1], [x1, y1], [x1, y0], [x0, y0]],
        neighbors: sides.to_vec(),
    }
}

/// Two rooms side by side along x, linked through the shared edge at x = 10.
pub fn two_rooms(b_floor: f32, b_ceiling: f32) -> World {
    World::new(vec![
        room(0.0, 0.0, 10.0, 10.0, 0.0, 10.0, [None, None, Some(1), None]),
        room(10.0, 0.0, 20.0, 10.0, b_floor, b_ceiling, [Some(0), None, None, None]),
    ])
    .unwrap()
}

/// Straight chain of `count` cells, each `length` long, running along +x.
pub fn corridor(count: usize, length: f32, width: f32, floor: f32, ceiling: f32) -> World {
    let sectors = (0..count)
        .map(|i| {
            let x0 = i as f32 * length;
            let west = i.checked_sub(1);
            let east = (i + 1 < count).then_some(i + 1);
            room(x0, 0.0, x0 + length, width, floor, ceiling, [west, None, east, None])
        })
        .collect();
    World::new(sectors).unwrap()
}
