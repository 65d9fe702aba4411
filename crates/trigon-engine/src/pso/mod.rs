//! Pipeline-state registry.

mod error;
mod manager;
mod registry;
mod state;

pub use error::PsoError;
pub use manager::PsoManager;
pub use registry::{DuplicatePolicy, StateRegistry};
pub use state::PipelineState;
