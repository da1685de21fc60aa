//! Axial hex geometry used to derive the board topology.
//!
//! - `HexCoord`: one hex cell, addressed by axial (q, r)
//! - `VertexCoord`: a corner, named as the North or South pole of one hex
//! - `EdgeCoord`: a side, canonicalised to the hex with the smaller (q, r)
//!
//! Nothing outside [`crate::topology`] needs these types at runtime; the game
//! itself works on the dense ids the topology assigns.

use serde::{Deserialize, Serialize};

/// Pole of a hex that names a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VertexDirection {
    North,
    South,
}

/// Side of a hex, pointy-top orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeDirection {
    NorthEast,
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
}

impl EdgeDirection {
    /// All sides, clockwise from NorthEast
    pub const ALL: [EdgeDirection; 6] = [
        EdgeDirection::NorthEast,
        EdgeDirection::East,
        EdgeDirection::SouthEast,
        EdgeDirection::SouthWest,
        EdgeDirection::West,
        EdgeDirection::NorthWest,
    ];

    /// Walk order used by [`HexCoord::ring`]
    const RING_WALK: [EdgeDirection; 6] = [
        EdgeDirection::East,
        EdgeDirection::SouthEast,
        EdgeDirection::SouthWest,
        EdgeDirection::West,
        EdgeDirection::NorthWest,
        EdgeDirection::NorthEast,
    ];

    /// The side facing this one from the neighbouring hex
    pub const fn opposite(self) -> EdgeDirection {
        match self {
            EdgeDirection::NorthEast => EdgeDirection::SouthWest,
            EdgeDirection::East => EdgeDirection::West,
            EdgeDirection::SouthEast => EdgeDirection::NorthWest,
            EdgeDirection::SouthWest => EdgeDirection::NorthEast,
            EdgeDirection::West => EdgeDirection::East,
            EdgeDirection::NorthWest => EdgeDirection::SouthEast,
        }
    }
}

/// Axial hex coordinate. The implicit third axis is `s = -q - r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const ORIGIN: HexCoord = HexCoord::new(0, 0);

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Neighbour across the given side
    pub const fn neighbor(&self, direction: EdgeDirection) -> HexCoord {
        match direction {
            EdgeDirection::NorthEast => HexCoord::new(self.q + 1, self.r - 1),
            EdgeDirection::East => HexCoord::new(self.q + 1, self.r),
            EdgeDirection::SouthEast => HexCoord::new(self.q, self.r + 1),
            EdgeDirection::SouthWest => HexCoord::new(self.q - 1, self.r + 1),
            EdgeDirection::West => HexCoord::new(self.q - 1, self.r),
            EdgeDirection::NorthWest => HexCoord::new(self.q, self.r - 1),
        }
    }

    /// The six neighbours, in [`EdgeDirection::ALL`] order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        EdgeDirection::ALL.map(|dir| self.neighbor(dir))
    }

    /// Distance in hex steps
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Hexes at exactly `radius` steps from the origin, walking clockwise
    /// from the north-west corner.
    pub fn ring(radius: u32) -> Vec<HexCoord> {
        if radius == 0 {
            return vec![HexCoord::ORIGIN];
        }
        let mut cells = Vec::with_capacity(6 * radius as usize);
        let mut cursor = HexCoord::new(0, -(radius as i32));
        for dir in EdgeDirection::RING_WALK {
            for _ in 0..radius {
                cells.push(cursor);
                cursor = cursor.neighbor(dir);
            }
        }
        cells
    }

    /// Every hex within `radius` of the origin, centre first, then ring by ring
    pub fn spiral(radius: u32) -> Vec<HexCoord> {
        (0..=radius).flat_map(HexCoord::ring).collect()
    }

    /// Corners clockwise from North
    pub fn vertices(&self) -> [VertexCoord; 6] {
        [
            VertexCoord::new(*self, VertexDirection::North),
            VertexCoord::new(self.neighbor(EdgeDirection::NorthEast), VertexDirection::South),
            VertexCoord::new(self.neighbor(EdgeDirection::SouthEast), VertexDirection::North),
            VertexCoord::new(*self, VertexDirection::South),
            VertexCoord::new(self.neighbor(EdgeDirection::SouthWest), VertexDirection::North),
            VertexCoord::new(self.neighbor(EdgeDirection::NorthWest), VertexDirection::South),
        ]
    }

    /// Sides clockwise from NorthEast, canonicalised
    pub fn edges(&self) -> [EdgeCoord; 6] {
        EdgeDirection::ALL.map(|dir| EdgeCoord::new(*self, dir))
    }

    /// Centre in pixel space for a hex of unit radius
    pub fn to_pixel(&self) -> (f64, f64) {
        let root3 = 3.0_f64.sqrt();
        let x = root3 * self.q as f64 + root3 / 2.0 * self.r as f64;
        let y = 1.5 * self.r as f64;
        (x, y)
    }
}

/// A corner shared by up to three hexes.
///
/// Each corner is the North pole of exactly one hex or the South pole of
/// exactly one hex, so the pair is already unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexCoord {
    pub hex: HexCoord,
    pub direction: VertexDirection,
}

impl VertexCoord {
    pub const fn new(hex: HexCoord, direction: VertexDirection) -> Self {
        Self { hex, direction }
    }

    /// The three hexes meeting at this corner (some may lie off the board)
    pub fn touching_hexes(&self) -> [HexCoord; 3] {
        match self.direction {
            VertexDirection::North => [
                self.hex,
                self.hex.neighbor(EdgeDirection::NorthWest),
                self.hex.neighbor(EdgeDirection::NorthEast),
            ],
            VertexDirection::South => [
                self.hex,
                self.hex.neighbor(EdgeDirection::SouthWest),
                self.hex.neighbor(EdgeDirection::SouthEast),
            ],
        }
    }

    /// The three sides radiating from this corner
    pub fn touching_edges(&self) -> [EdgeCoord; 3] {
        match self.direction {
            VertexDirection::North => [
                EdgeCoord::new(self.hex, EdgeDirection::NorthWest),
                EdgeCoord::new(self.hex, EdgeDirection::NorthEast),
                EdgeCoord::new(self.hex.neighbor(EdgeDirection::NorthWest), EdgeDirection::East),
            ],
            VertexDirection::South => [
                EdgeCoord::new(self.hex, EdgeDirection::SouthWest),
                EdgeCoord::new(self.hex, EdgeDirection::SouthEast),
                EdgeCoord::new(self.hex.neighbor(EdgeDirection::SouthWest), EdgeDirection::East),
            ],
        }
    }
}

/// A side shared by two hexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeCoord {
    pub hex: HexCoord,
    pub direction: EdgeDirection,
}

impl EdgeCoord {
    /// Canonical form: named from whichever of the two hexes has the smaller (q, r)
    pub fn new(hex: HexCoord, direction: EdgeDirection) -> Self {
        let other = hex.neighbor(direction);
        if (hex.q, hex.r) <= (other.q, other.r) {
            Self { hex, direction }
        } else {
            Self {
                hex: other,
                direction: direction.opposite(),
            }
        }
    }

    pub fn touching_hexes(&self) -> [HexCoord; 2] {
        [self.hex, self.hex.neighbor(self.direction)]
    }

    pub fn endpoints(&self) -> [VertexCoord; 2] {
        let hex = self.hex;
        let north = VertexCoord::new(hex, VertexDirection::North);
        let south = VertexCoord::new(hex, VertexDirection::South);
        let north_east =
            VertexCoord::new(hex.neighbor(EdgeDirection::NorthEast), VertexDirection::South);
        let south_east =
            VertexCoord::new(hex.neighbor(EdgeDirection::SouthEast), VertexDirection::North);
        let south_west =
            VertexCoord::new(hex.neighbor(EdgeDirection::SouthWest), VertexDirection::North);
        let north_west =
            VertexCoord::new(hex.neighbor(EdgeDirection::NorthWest), VertexDirection::South);
        match self.direction {
            EdgeDirection::NorthEast => [north, north_east],
            EdgeDirection::East => [north_east, south_east],
            EdgeDirection::SouthEast => [south_east, south],
            EdgeDirection::SouthWest => [south, south_west],
            EdgeDirection::West => [south_west, north_west],
            EdgeDirection::NorthWest => [north_west, north],
        }
    }

    /// Midpoint in pixel space for hexes of unit radius
    pub fn to_pixel(&self) -> (f64, f64) {
        let (cx, cy) = self.hex.to_pixel();
        let (nx, ny) = self.hex.neighbor(self.direction).to_pixel();
        ((cx + nx) / 2.0, (cy + ny) / 2.0)
    }
}
