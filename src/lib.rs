//! Conway's Game of Life on a torus, with neighbour counts computed by FFT
//! convolution and a simulation loop that renderers read without locking.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod field;
pub mod kernel;
pub mod patterns;
pub mod stepper;
pub mod telemetry;
pub mod transform;

pub use config::LifeConfig;
pub use engine::{Engine, EngineHandle};
pub use error::{Error, Result};
pub use field::{FieldStore, FieldView};
pub use patterns::Pattern;
pub use stepper::StepOutcome;
