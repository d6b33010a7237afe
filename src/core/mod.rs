pub mod engine;

pub use engine::{DispatchEngine, EngineSummary};
