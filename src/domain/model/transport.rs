//! Fixed catalog of courier movement profiles.
//!
//! The catalog is closed: the three entries below are the only transports
//! that exist, and lookups never register new ones.

use crate::utils::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Pedestrian,
    Bicycle,
    Car,
}

const CATALOG: [Transport; 3] = [Transport::Pedestrian, Transport::Bicycle, Transport::Car];

impl Transport {
    /// All transports, in catalog order.
    pub fn list() -> &'static [Transport] {
        &CATALOG
    }

    pub const fn id(self) -> u8 {
        match self {
            Transport::Pedestrian => 1,
            Transport::Bicycle => 2,
            Transport::Car => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Transport::Pedestrian => "pedestrian",
            Transport::Bicycle => "bicycle",
            Transport::Car => "car",
        }
    }

    /// Manhattan cells covered per tick.
    pub const fn speed(self) -> u32 {
        match self {
            Transport::Pedestrian => 1,
            Transport::Bicycle => 2,
            Transport::Car => 3,
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::list()
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| unknown_transport(name))
    }

    pub fn from_id(id: u8) -> Result<Self> {
        Self::list()
            .iter()
            .copied()
            .find(|t| t.id() == id)
            .ok_or_else(|| unknown_transport(&id.to_string()))
    }
}

fn unknown_transport(value: &str) -> DispatchError {
    let valid: Vec<&str> = Transport::list().iter().map(|t| t.name()).collect();
    DispatchError::not_found(format!(
        "unknown transport '{}'; valid transports: {}",
        value,
        valid.join(", ")
    ))
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
