//! Software portal renderer and player movement over a 2.5D sector map.
//!
//! - `world`: sectors and their portal links
//! - `map`: text map loader
//! - `renderer`: breadth-first portal traversal into column spans
//! - `movement`: gravity, wall sliding and sector transitions
//! - `player`, `camera`, `geometry`: shared state and math

pub mod camera;
pub mod geometry;
pub mod map;
pub mod movement;
pub mod player;
pub mod renderer;
pub mod world;

#[cfg(test)]
mod testing;
