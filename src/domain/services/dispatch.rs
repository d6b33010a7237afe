use crate::domain::model::{Courier, Order};
use crate::utils::error::{DispatchError, Result};

/// Picks one courier for one order out of a candidate pool.
///
/// Implementations are pure: they neither mutate the order nor the couriers.
pub trait Dispatcher: Send + Sync {
    fn dispatch<'a>(&self, order: &Order, couriers: &'a [Courier]) -> Result<&'a Courier>;
}

/// Greedy minimum-time matcher.
///
/// A courier already standing on the order's cell wins outright. Otherwise the
/// smallest `calculate_time_to_point` wins, ties going to the earliest courier
/// in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestCourierDispatcher;

impl Dispatcher for NearestCourierDispatcher {
    fn dispatch<'a>(&self, order: &Order, couriers: &'a [Courier]) -> Result<&'a Courier> {
        let target = order.location();

        if let Some(on_spot) = couriers.iter().find(|c| c.location() == target) {
            return Ok(on_spot);
        }

        let mut best: Option<(&Courier, f64)> = None;
        for courier in couriers {
            let time = courier.calculate_time_to_point(&target);
            match best {
                Some((_, best_time)) if time >= best_time => {}
                _ => best = Some((courier, time)),
            }
        }

        best.map(|(courier, _)| courier)
            .ok_or_else(|| DispatchError::validation("couriers", "candidate list is empty"))
    }
}
