//! # ratapi-rs
//!
//! `ratapi-rs` describes reflectivity analysis projects as validated,
//! name-indexed collections of records, and flattens them into the
//! positional input a numerical reflectivity engine consumes.
//!
//! The library provides:
//! - [`ClassList`](classlist::ClassList), an ordered collection of records
//!   with case-insensitive unique names
//! - Record kinds for parameters, layers, backgrounds, resolutions, data,
//!   contrasts, domain contrasts and custom files
//! - A [`Project`](project::Project) that checks every reference between
//!   collections and rolls back any change that breaks one
//! - The marshaller ([`build_input`](inputs::build_input)) and the copy-back
//!   of fitted values ([`update_project`](outputs::update_project))
//!
//! ## Basic Usage
//!
//! ```
//! use ratapi_rs::prelude::*;
//!
//! let mut project = Project::new("Oxide on silicon");
//! project
//!     .update(|p| {
//!         p.parameters_mut().extend([
//!             Parameter::new("Oxide Thickness", 5.0, 20.0, 60.0, true).unwrap(),
//!             Parameter::new("Oxide SLD", 3e-6, 3.41e-6, 4e-6, false).unwrap(),
//!         ])?;
//!         p.layers_mut().append(
//!             Layer::new("Oxide", "Oxide Thickness", "Oxide SLD", "Substrate Roughness").into(),
//!         )?;
//!         p.contrasts_mut()
//!             .update_with(0, |contrast| contrast.model_mut().push("Oxide".to_string()))
//!     })
//!     .unwrap();
//!
//! let input = build_input(&project, &Controls::default()).unwrap();
//! assert_eq!(input.problem.contrast_layers, vec![vec![1]]);
//! assert_eq!(input.problem.fit_params, vec![3.0, 20.0]);
//! ```

pub mod error;

// Collections and records
pub mod classlist;
pub mod models;

// Project graph
pub mod project;

// Engine boundary
pub mod controls;
pub mod custom;
pub mod inputs;
pub mod outputs;

// Re-exports for convenience
pub use classlist::{ClassList, Record};
pub use controls::Controls;
pub use error::{RatError, Result};
pub use inputs::{build_input, EngineInput};
pub use outputs::update_project;
pub use project::Project;

/// The types most programs need
pub mod prelude {
    pub use crate::classlist::{ClassList, Record};
    pub use crate::controls::{Controls, Procedure};
    pub use crate::inputs::{build_input, EngineInput};
    pub use crate::models::{
        AbsorptionLayer, Background, Calculation, Contrast, ContrastRecord, ContrastWithRatio,
        CustomFile, Data, DomainContrast, Geometry, HydrateWith, Layer, LayerModel, LayerRecord,
        Parameter, Resolution,
    };
    pub use crate::outputs::update_project;
    pub use crate::project::{CollectionId, Project, ProjectError};
}

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
