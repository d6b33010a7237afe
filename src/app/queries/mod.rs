pub mod active_orders;
pub mod busy_couriers;

pub use active_orders::{GetActiveOrdersHandler, OrderView};
pub use busy_couriers::{CourierView, GetBusyCouriersHandler};
