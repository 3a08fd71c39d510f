use crate::error::ZonexError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned rectangle in page space (origin top-left, y grows downward,
/// units are page points).
///
/// Always normalized: `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Region {
    /// Build a region from two opposite corners given in any order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Region {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Build a region from the press and release points of a drag.
    pub fn from_points(start: (f64, f64), end: (f64, f64)) -> Self {
        Region::new(start.0, start.1, end.0, end.1)
    }

    pub fn normalized(&self) -> Self {
        Region::new(self.x0, self.y0, self.x1, self.y1)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// True when `other` lies entirely inside this region (edges inclusive).
    pub fn contains(&self, other: &Region) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x0, self.y0, self.x1, self.y1)
    }
}

/// A single coordinate as written in a template file.
///
/// Templates written by hand sometimes quote numbers; those are accepted as
/// long as they parse. Anything else is kept as written and rejected by
/// [`Coord::value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coord {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Coord {
    /// The finite number this coordinate stands for, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Coord::Number(v) => Some(*v),
            Coord::Text(s) => s.trim().parse().ok(),
            Coord::Other(_) => None,
        }
        .filter(|v: &f64| v.is_finite())
    }
}

impl From<f64> for Coord {
    fn from(v: f64) -> Self {
        Coord::Number(v)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coord::Number(v) => write!(f, "{v}"),
            Coord::Text(s) => write!(f, "{s:?}"),
            Coord::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Region coordinates exactly as stored in a template.
///
/// Kept unresolved so that a malformed entry only fails the field or table
/// that uses it, at extraction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    /// `[x0, y0, x1, y1]`
    Corners(Vec<Coord>),
    /// `{"x0": .., "y0": .., "x1": .., "y1": ..}`
    Bounds {
        x0: Coord,
        y0: Coord,
        x1: Coord,
        y1: Coord,
    },
    Malformed(serde_json::Value),
}

impl Coordinates {
    /// Validate and normalize into a [`Region`].
    pub fn resolve(&self) -> Result<Region, ZonexError> {
        let values = match self {
            Coordinates::Corners(coords) => {
                if coords.len() != 4 {
                    return Err(self.invalid(format!(
                        "expected 4 coordinates, got {}",
                        coords.len()
                    )));
                }
                coords.iter().collect::<Vec<_>>()
            }
            Coordinates::Bounds { x0, y0, x1, y1 } => vec![x0, y0, x1, y1],
            Coordinates::Malformed(serde_json::Value::Null) => {
                return Err(self.invalid("coordinates are missing".to_string()))
            }
            Coordinates::Malformed(_) => {
                return Err(self.invalid(
                    "expected [x0, y0, x1, y1] or {x0, y0, x1, y1}".to_string(),
                ))
            }
        };

        let mut parsed = [0.0; 4];
        for (slot, coord) in parsed.iter_mut().zip(values) {
            *slot = coord
                .value()
                .ok_or_else(|| self.invalid(format!("{coord} is not a number")))?;
        }

        Ok(Region::new(parsed[0], parsed[1], parsed[2], parsed[3]))
    }

    /// Placeholder for an entry written without coordinates.
    pub fn missing() -> Self {
        Coordinates::Malformed(serde_json::Value::Null)
    }

    fn invalid(&self, reason: String) -> ZonexError {
        ZonexError::InvalidRegion {
            input: serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}")),
            reason,
        }
    }
}

impl From<Region> for Coordinates {
    fn from(region: Region) -> Self {
        Coordinates::Corners(region.to_array().iter().map(|v| Coord::Number(*v)).collect())
    }
}
