pub mod courier;
pub mod location;
pub mod order;
pub mod transport;

pub use courier::{Courier, CourierId, CourierStatus};
pub use location::Location;
pub use order::{Order, OrderId, OrderStatus};
pub use transport::Transport;
