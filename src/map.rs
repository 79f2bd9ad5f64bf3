//! Text map loader.
//!
//! Each non-empty line is a record picked by its first character:
//!
//! ```text
//! vertex<TAB>x<TAB>y y y ...          every y pairs with x, appended to the pool
//! sector<TAB>floor ceil<TAB>v... n... vertex indices then neighbors, -1 = wall
//! player<TAB>x y<TAB>angle<TAB>sector
//! ```
//!
//! A sector's ring is closed by repeating its last vertex in front, so edge k
//! runs from vertex k-1 to vertex k and uses neighbor k.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};

use crate::world::{MapError, Sector, World};

/// Map bundled with the binary.
pub const DEMO_MAP: &str = include_str!("../maps/demo.txt");

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Malformed { line: usize, reason: &'static str },
    BadNumber { line: usize, field: String },
    VertexIndex { line: usize, index: i64 },
    PlayerSector { sector: i64 },
    MissingPlayer,
    Map(MapError),
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<MapError> for LoadError {
    fn from(e: MapError) -> Self {
        LoadError::Map(e)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "IO error: {}", e),
            LoadError::Malformed { line, reason } => write!(f, "line {}: {}", line, reason),
            LoadError::BadNumber { line, field } => {
                write!(f, "line {}: '{}' is not a number", line, field)
            }
            LoadError::VertexIndex { line, index } => {
                write!(f, "line {}: vertex {} is not defined", line, index)
            }
            LoadError::PlayerSector { sector } => {
                write!(f, "player starts in missing sector {}", sector)
            }
            LoadError::MissingPlayer => write!(f, "no player record"),
            LoadError::Map(e) => write!(f, "invalid map: {}", e),
        }
    }
}

/// Where the player starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawn {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub sector: usize,
}

pub struct MapData {
    pub world: World,
    pub spawn: Spawn,
}

pub fn load_map(path: &Path) -> Result<MapData, LoadError> {
    info!("Loading map {:?}", path);
    let text = std::fs::read_to_string(path)?;
    parse_map(&text)
}

pub fn parse_map(text: &str) -> Result<MapData, LoadError> {
    let mut pool: Vec<[f32; 2]> = Vec::new();
    let mut sectors = Vec::new();
    let mut player = None;

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let raw = raw.trim_end();
        let Some(kind) = raw.chars().next() else {
            continue;
        };
        match kind {
            'v' => parse_vertex(line, body(line, raw)?, &mut pool)?,
            's' => sectors.push(parse_sector(line, body(line, raw)?, &pool)?),
            'p' => player = Some(parse_player(line, body(line, raw)?)?),
            _ => debug!("line {}: skipping unknown record", line),
        }
    }

    let (x, y, angle, sector) = player.ok_or(LoadError::MissingPlayer)?;
    let world = World::new(sectors)?;
    if sector < 0 || sector as usize >= world.len() {
        return Err(LoadError::PlayerSector { sector });
    }

    info!("Map has {} vertices, {} sectors", pool.len(), world.len());
    Ok(MapData {
        world,
        spawn: Spawn {
            x,
            y,
            angle,
            sector: sector as usize,
        },
    })
}

/// Everything after the record keyword.
fn body(line: usize, raw: &str) -> Result<&str, LoadError> {
    raw.split_once(|c: char| c.is_ascii_whitespace())
        .map(|(_, rest)| rest)
        .ok_or(LoadError::Malformed {
            line,
            reason: "record has no fields",
        })
}

fn number<T: FromStr>(line: usize, field: &str) -> Result<T, LoadError> {
    field.parse().map_err(|_| LoadError::BadNumber {
        line,
        field: field.to_string(),
    })
}

fn parse_vertex(line: usize, body: &str, pool: &mut Vec<[f32; 2]>) -> Result<(), LoadError> {
    let mut fields = body.split('\t');
    let x_field = fields.next().map(str::trim).unwrap_or_default();
    if x_field.is_empty() {
        return Err(LoadError::Malformed {
            line,
            reason: "vertex record has no x",
        });
    }
    let x: f32 = number(line, x_field)?;
    let before = pool.len();
    for y in fields.flat_map(str::split_whitespace) {
        pool.push([x, number(line, y)?]);
    }
    if pool.len() == before {
        return Err(LoadError::Malformed {
            line,
            reason: "vertex record has no y values",
        });
    }
    Ok(())
}

fn parse_sector(line: usize, body: &str, pool: &[[f32; 2]]) -> Result<Sector, LoadError> {
    let (heights, links) = body.split_once('\t').ok_or(LoadError::Malformed {
        line,
        reason: "sector record needs heights and an index list",
    })?;

    let heights: Vec<f32> = heights
        .split_whitespace()
        .map(|h| number(line, h))
        .collect::<Result<_, _>>()?;
    let [floor, ceiling] = heights[..] else {
        return Err(LoadError::Malformed {
            line,
            reason: "sector needs exactly a floor and a ceiling height",
        });
    };

    let nums: Vec<i64> = links
        .split_whitespace()
        .map(|n| number(line, n))
        .collect::<Result<_, _>>()?;
    if nums.len() % 2 != 0 {
        return Err(LoadError::Malformed {
            line,
            reason: "vertex and neighbor lists differ in length",
        });
    }
    let (corners, links) = nums.split_at(nums.len() / 2);

    let mut vertices = Vec::with_capacity(corners.len() + 1);
    for &index in corners {
        let v = usize::try_from(index)
            .ok()
            .and_then(|i| pool.get(i))
            .ok_or(LoadError::VertexIndex { line, index })?;
        vertices.push(*v);
    }
    // Close the ring by repeating the last vertex at the front
    if let Some(&last) = vertices.last() {
        vertices.insert(0, last);
    }

    let neighbors = links.iter().map(|&n| usize::try_from(n).ok()).collect();

    Ok(Sector {
        floor,
        ceiling,
        vertices,
        neighbors,
    })
}

fn parse_player(line: usize, body: &str) -> Result<(f32, f32, f32, i64), LoadError> {
    let fields: Vec<&str> = body.split_whitespace().collect();
    let [x, y, angle, sector] = fields[..] else {
        return Err(LoadError::Malformed {
            line,
            reason: "player record needs x, y, angle and sector",
        });
    };
    Ok((
        number(line, x)?,
        number(line, y)?,
        number(line, angle)?,
        number(line, sector)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ROOMS: &str = "\
vertex\t0\t0 10
vertex\t10\t0 10
vertex\t20\t0 10
sector\t0 10\t1 3 2 0 -1 -1 1 -1
sector\t0 10\t3 5 4 2 0 -1 -1 -1
player\t5 5\t0\t0
";

    #[test]
    fn parses_rooms_and_closes_rings() {
        let map = parse_map(TWO_ROOMS).unwrap();
        assert_eq!(map.world.len(), 2);
        assert_eq!(
            map.spawn,
            Spawn {
                x: 5.0,
                y: 5.0,
                angle: 0.0,
                sector: 0
            }
        );

        let a = map.world.sector(0);
        assert_eq!(a.vertices.len(), 5);
        assert_eq!(a.vertices[0], a.vertices[4]);
        assert_eq!(a.vertices[0], [0.0, 0.0]);
        assert_eq!(a.vertices[1], [0.0, 10.0]);
        assert_eq!(a.neighbors, vec![None, None, Some(1), None]);

        // Portal edges face each other
        let east = a.edges().nth(2).unwrap();
        let west = map.world.sector(1).edges().next().unwrap();
        assert_eq!((east.start, east.end), (west.end, west.start));
    }

    #[test]
    fn skips_unknown_and_blank_lines() {
        let text = format!("# notes\n\n{}", TWO_ROOMS);
        assert!(parse_map(&text).is_ok());
    }

    #[test]
    fn bad_number_reports_line() {
        let text = TWO_ROOMS.replace("vertex\t10\t0 10", "vertex\t10\t0 ten");
        match parse_map(&text) {
            Err(LoadError::BadNumber { line, field }) => {
                assert_eq!(line, 2);
                assert_eq!(field, "ten");
            }
            other => panic!("unexpected {:?}", other.err()),
        }
    }

    #[test]
    fn uneven_index_list_is_rejected() {
        let text = TWO_ROOMS.replace("1 3 2 0 -1 -1 1 -1", "1 3 2 0 -1 -1 1");
        assert!(matches!(
            parse_map(&text),
            Err(LoadError::Malformed { line: 4, .. })
        ));
    }

    #[test]
    fn undefined_vertex_is_rejected() {
        let text = TWO_ROOMS.replace("3 5 4 2 0", "3 9 4 2 0");
        assert!(matches!(
            parse_map(&text),
            Err(LoadError::VertexIndex { line: 5, index: 9 })
        ));
    }

    #[test]
    fn structural_faults_surface_as_map_errors() {
        let text = TWO_ROOMS.replace("1 3 2 0 -1 -1 1 -1", "1 3 -1 -1");
        assert!(matches!(
            parse_map(&text),
            Err(LoadError::Map(MapError::TooFewVertices { sector: 0, .. }))
        ));

        let text = TWO_ROOMS.replace("0 -1 -1 -1\n", "0 -1 -1 7\n");
        assert!(matches!(
            parse_map(&text),
            Err(LoadError::Map(MapError::NeighborOutOfRange { neighbor: 7, .. }))
        ));
    }

    #[test]
    fn player_must_exist_and_be_placed_in_a_sector() {
        let text = TWO_ROOMS.replace("player\t5 5\t0\t0\n", "");
        assert!(matches!(parse_map(&text), Err(LoadError::MissingPlayer)));

        let text = TWO_ROOMS.replace("player\t5 5\t0\t0", "player\t5 5\t0\t4");
        assert!(matches!(
            parse_map(&text),
            Err(LoadError::PlayerSector { sector: 4 })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_map(Path::new("/nonexistent/portal/map.txt")).err();
        assert!(matches!(err, Some(LoadError::Io(_))));
    }

    #[test]
    fn demo_map_is_consistent() {
        let map = parse_map(DEMO_MAP).unwrap();
        let world = &map.world;
        for (s, sector) in world.sectors().iter().enumerate() {
            assert!(sector.signed_area2() < 0.0, "sector {s} winding");
            for edge in sector.edges() {
                let Some(t) = edge.neighbor else { continue };
                let back = world
                    .sector(t)
                    .edges()
                    .any(|e| e.neighbor == Some(s) && e.start == edge.end && e.end == edge.start);
                assert!(back, "sector {s} portal to {t} has no matching edge");
            }
        }
        assert!(map.spawn.sector < world.len());
    }
}
