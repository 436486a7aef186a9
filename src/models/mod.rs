//! # Record kinds
//!
//! Plain records describing a layered reflectometry sample. Each record
//! checks its own field invariants when it is built; references between
//! records are plain names, resolved and checked by the
//! [`Project`](crate::project::Project).
//!
//! - [`Parameter`]: a fittable value with bounds and a prior
//! - [`Background`] / [`Resolution`]: constant, data or function signals
//! - [`LayerRecord`]: a [`Layer`] or an [`AbsorptionLayer`]
//! - [`Data`]: measured (or empty, simulated) reflectivity
//! - [`ContrastRecord`]: a [`Contrast`] or a [`ContrastWithRatio`]
//! - [`DomainContrast`]: a named stack of layers used in domains mode
//! - [`CustomFile`]: identity of an externally defined model function

use thiserror::Error;

pub mod contrast;
pub mod custom_file;
pub mod data;
pub mod domain_contrast;
pub mod enums;
pub mod layer;
pub mod parameter;
pub mod signal;

pub use contrast::{Contrast, ContrastRecord, ContrastWithRatio};
pub use custom_file::CustomFile;
pub use data::Data;
pub use domain_contrast::DomainContrast;
pub use enums::{
    BackgroundAction, Calculation, Geometry, HydrateWith, Language, LayerModel, PriorType,
    SignalType,
};
pub use layer::{AbsorptionLayer, Layer, LayerRecord};
pub use parameter::Parameter;
pub use signal::{Background, Resolution, Signal};

/// Errors raised when a record violates one of its own field invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("\"{name}\": min ({min}) must be less than or equal to max ({max})")]
    InvalidBounds { name: String, min: f64, max: f64 },

    #[error("\"{name}\": value {value} is outside bounds [{min}, {max}]")]
    ValueOutsideBounds {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("\"{name}\": the \"{field}\" field must be empty for a {signal_type} {kind}")]
    FieldNotEmpty {
        name: String,
        kind: String,
        field: String,
        signal_type: SignalType,
    },

    #[error("\"{name}\": data must have at least three columns (q, R, dR), found {columns}")]
    DataColumns { name: String, columns: usize },

    #[error("\"{name}\": {field} [{min}, {max}] must have its minimum below its maximum")]
    RangeOrder {
        name: String,
        field: String,
        min: f64,
        max: f64,
    },

    #[error("\"{name}\": data_range [{min}, {max}] must lie within the q range of the data [{q_min}, {q_max}]")]
    DataRangeOutside {
        name: String,
        min: f64,
        max: f64,
        q_min: f64,
        q_max: f64,
    },

    #[error("\"{name}\": simulation_range [{min}, {max}] must contain the q range of the data [{q_min}, {q_max}]")]
    SimulationRangeTooNarrow {
        name: String,
        min: f64,
        max: f64,
        q_min: f64,
        q_max: f64,
    },

    #[error("invalid fields for {kind}: {message}")]
    InvalidFields { kind: String, message: String },
}
