use crate::domain::model::{Location, Transport};
use crate::utils::error::{DispatchError, Result};
use crate::utils::validation::validate_not_blank;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourierId(Uuid);

impl CourierId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CourierId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CourierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourierStatus {
    Free,
    Busy,
}

/// A courier on the grid.
///
/// Fields are private; state changes only through [`Courier::move_towards`],
/// [`Courier::set_busy`] and [`Courier::set_free`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Courier {
    id: CourierId,
    name: String,
    transport: Transport,
    location: Location,
    status: CourierStatus,
}

impl Courier {
    /// New courier with a fresh id, status `Free`.
    pub fn create(name: impl Into<String>, transport: Transport, location: Location) -> Result<Self> {
        let name = name.into();
        validate_not_blank("name", &name)?;

        Ok(Self {
            id: CourierId::new(),
            name,
            transport,
            location,
            status: CourierStatus::Free,
        })
    }

    pub fn id(&self) -> CourierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn status(&self) -> CourierStatus {
        self.status
    }

    pub fn is_free(&self) -> bool {
        self.status == CourierStatus::Free
    }

    /// Ticks needed to reach `target`, as a real number. Used for ranking only.
    pub fn calculate_time_to_point(&self, target: &Location) -> f64 {
        f64::from(self.location.distance_to(target)) / f64::from(self.transport.speed())
    }

    /// Advance one tick towards `target`.
    ///
    /// The tick spends a budget of `transport.speed()` cells, X axis first and
    /// then Y with whatever is left. It never overshoots the target.
    pub fn move_towards(&mut self, target: &Location) -> Result<()> {
        let mut budget = self.transport.speed() as i32;

        let dx = target.x() - self.location.x();
        let step_x = dx.abs().min(budget) * dx.signum();
        budget -= step_x.abs();

        let dy = target.y() - self.location.y();
        let step_y = dy.abs().min(budget) * dy.signum();

        self.location = Location::new(self.location.x() + step_x, self.location.y() + step_y)?;
        Ok(())
    }

    pub fn set_busy(&mut self) -> Result<()> {
        if self.status == CourierStatus::Busy {
            return Err(DispatchError::state_conflict(format!(
                "courier {} is already busy",
                self.id
            )));
        }
        self.status = CourierStatus::Busy;
        Ok(())
    }

    pub fn set_free(&mut self) -> Result<()> {
        if self.status == CourierStatus::Free {
            return Err(DispatchError::state_conflict(format!(
                "courier {} is already free",
                self.id
            )));
        }
        self.status = CourierStatus::Free;
        Ok(())
    }
}
