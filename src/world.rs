use std::fmt;

use log::warn;

pub struct Sector {
    pub floor: f32,
    pub ceiling: f32,
    /// Closed ring: the first point is repeated at the end.
    pub vertices: Vec<[f32; 2]>,
    /// One entry per edge, None if the edge is a solid wall.
    pub neighbors: Vec<Option<usize>>,
}

/// One side of a sector polygon, borrowed out of the ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: [f32; 2],
    pub end: [f32; 2],
    pub neighbor: Option<usize>,
}

impl Sector {
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.vertices
            .windows(2)
            .zip(&self.neighbors)
            .map(|(pair, &neighbor)| Edge {
                start: pair[0],
                end: pair[1],
                neighbor,
            })
    }

    /// Twice the signed area in a y-up frame. Negative for the clockwise
    /// winding that puts the interior on the negative side of `point_side`.
    pub fn signed_area2(&self) -> f32 {
        self.vertices
            .windows(2)
            .map(|pair| pair[0][0] * pair[1][1] - pair[1][0] * pair[0][1])
            .sum()
    }
}

/// Structural faults in a sector graph.
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    TooFewVertices { sector: usize, count: usize },
    OpenRing { sector: usize },
    NeighborCount { sector: usize, edges: usize, neighbors: usize },
    NeighborOutOfRange { sector: usize, edge: usize, neighbor: usize },
    NoSectors,
}

impl std::error::Error for MapError {}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::TooFewVertices { sector, count } => {
                write!(f, "sector {sector} has {count} vertices, needs at least 3")
            }
            MapError::OpenRing { sector } => write!(f, "sector {sector} vertex ring is not closed"),
            MapError::NeighborCount {
                sector,
                edges,
                neighbors,
            } => write!(
                f,
                "sector {sector} has {edges} edges but {neighbors} neighbor entries"
            ),
            MapError::NeighborOutOfRange {
                sector,
                edge,
                neighbor,
            } => write!(
                f,
                "sector {sector} edge {edge} links to missing sector {neighbor}"
            ),
            MapError::NoSectors => write!(f, "map defines no sectors"),
        }
    }
}

/// The sector graph. Immutable once built.
pub struct World {
    sectors: Vec<Sector>,
}

impl World {
    pub fn new(sectors: Vec<Sector>) -> Result<Self, MapError> {
        if sectors.is_empty() {
            return Err(MapError::NoSectors);
        }

        for (i, sector) in sectors.iter().enumerate() {
            let points = sector.vertices.len();
            // Ring of a triangle is four points long
            if points < 4 {
                return Err(MapError::TooFewVertices {
                    sector: i,
                    count: points.saturating_sub(1),
                });
            }
            if sector.vertices[0] != sector.vertices[points - 1] {
                return Err(MapError::OpenRing { sector: i });
            }
            if sector.neighbors.len() != points - 1 {
                return Err(MapError::NeighborCount {
                    sector: i,
                    edges: points - 1,
                    neighbors: sector.neighbors.len(),
                });
            }
            for (edge, neighbor) in sector.neighbors.iter().enumerate() {
                if let Some(n) = *neighbor {
                    if n >= sectors.len() {
                        return Err(MapError::NeighborOutOfRange {
                            sector: i,
                            edge,
                            neighbor: n,
                        });
                    }
                }
            }
            if sector.signed_area2() > 0.0 {
                warn!("sector {i} winds counter-clockwise, portals will cull as backfaces");
            }
        }

        Ok(Self { sectors })
    }

    #[inline]
    pub fn sector(&self, index: usize) -> &Sector {
        &self.sectors[index]
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}
