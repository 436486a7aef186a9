//! # Engine input
//!
//! The marshaller flattens a validated [`Project`](crate::project::Project)
//! and its [`Controls`](crate::controls::Controls) into the positional
//! records the numerical engine consumes: name references become 1-based
//! indices, parameter collections become value, limit, fit-flag and prior
//! arrays in a fixed collection order, and every contrast gets its data
//! padded to a fixed column count.
//!
//! ```rust
//! use ratapi_rs::controls::Controls;
//! use ratapi_rs::inputs::build_input;
//! use ratapi_rs::project::Project;
//!
//! let project = Project::new("Simulation");
//! let input = build_input(&project, &Controls::default()).unwrap();
//! assert_eq!(input.problem.number_of_contrasts, 1);
//! assert_eq!(input.problem.contrast_scalefactors, vec![1]);
//! ```

use std::rc::Rc;
use thiserror::Error;

use crate::controls::ControlsError;
use crate::custom::{CustomFileHandle, FunctionResolver};
use crate::models::CustomFile;
use crate::project::CollectionId;

mod check;
mod marshal;
pub mod problem;

pub use check::check_indices;
pub use marshal::build_input;
pub use problem::{Checks, Control, Limits, Names, PriorSpec, Priors, ProblemDefinition};

/// Number of columns every contrast's data is padded to: q, R, dR, dQ.
pub const DATA_COLUMNS: usize = 4;

/// Errors raised while building engine input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("\"{record}\".{field} = \"{value}\" does not name a record of {collection}")]
    UnresolvedReference {
        record: String,
        field: String,
        value: String,
        collection: CollectionId,
    },

    #[error("{field} holds indices {values:?} outside 1..={len}")]
    IndicesOutOfRange {
        field: String,
        values: Vec<usize>,
        len: usize,
    },

    #[error("data \"{name}\" has {columns} columns, expected at least 3")]
    MalformedData { name: String, columns: usize },

    #[error(transparent)]
    Controls(#[from] ControlsError),
}

/// Everything the engine needs for one run
#[derive(Debug, Clone, PartialEq)]
pub struct EngineInput {
    pub problem: ProblemDefinition,
    pub limits: Limits,
    pub priors: Priors,
    pub control: Control,
    /// Custom files in project order, indexed by `contrast_custom_files`
    /// and by function-type signals.
    pub custom_files: Vec<CustomFile>,
}

impl EngineInput {
    /// One lazy handle per custom file. Nothing is loaded until a handle
    /// is called.
    pub fn custom_handles(&self, resolver: Rc<dyn FunctionResolver>) -> Vec<CustomFileHandle> {
        self.custom_files
            .iter()
            .map(|file| CustomFileHandle::new(file.clone(), Rc::clone(&resolver)))
            .collect()
    }
}
