//! de-energy: difference kinetic / total energy between two model runs.

pub mod calculator;
pub mod error;
pub mod mode;

pub use calculator::{DiffEnergyCalculator, StepValue, ensure_matching_times};
pub use error::{EnergyError, EnergyResult};
pub use mode::{EnergyKind, IntegrationMode, VerticalBounds};
