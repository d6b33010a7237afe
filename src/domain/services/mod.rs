pub mod dispatch;

pub use dispatch::{Dispatcher, NearestCourierDispatcher};
