use crate::utils::error::{DispatchError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell on the delivery grid. Both coordinates lie in `MIN_COORD..=MAX_COORD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLocation", into = "RawLocation")]
pub struct Location {
    x: i32,
    y: i32,
}

pub const MIN_COORD: i32 = 1;
pub const MAX_COORD: i32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawLocation {
    x: i32,
    y: i32,
}

impl Location {
    pub fn new(x: i32, y: i32) -> Result<Self> {
        check_coord("x", x)?;
        check_coord("y", y)?;
        Ok(Self { x, y })
    }

    /// For constants: an off-grid value fails const evaluation.
    pub const fn new_const(x: i32, y: i32) -> Self {
        assert!(x >= MIN_COORD && x <= MAX_COORD, "x is off the grid");
        assert!(y >= MIN_COORD && y <= MAX_COORD, "y is off the grid");
        Self { x, y }
    }

    /// Uniformly random cell. Callers pass the RNG so seeding stays in their hands.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: rng.gen_range(MIN_COORD..=MAX_COORD),
            y: rng.gen_range(MIN_COORD..=MAX_COORD),
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    /// Manhattan distance.
    pub fn distance_to(&self, other: &Location) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

fn check_coord(field: &str, value: i32) -> Result<()> {
    if !(MIN_COORD..=MAX_COORD).contains(&value) {
        return Err(DispatchError::validation(
            field,
            format!(
                "coordinate {} is outside the grid [{}, {}]",
                value, MIN_COORD, MAX_COORD
            ),
        ));
    }
    Ok(())
}

impl TryFrom<RawLocation> for Location {
    type Error = DispatchError;

    fn try_from(raw: RawLocation) -> Result<Self> {
        Location::new(raw.x, raw.y)
    }
}

impl From<Location> for RawLocation {
    fn from(location: Location) -> Self {
        RawLocation {
            x: location.x,
            y: location.y,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
