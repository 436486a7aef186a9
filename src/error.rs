use thiserror::Error;

use crate::classlist::CollectionError;
use crate::controls::ControlsError;
use crate::custom::CustomError;
use crate::inputs::InputError;
use crate::models::RecordError;
use crate::outputs::OutputError;
use crate::project::ProjectError;

/// Error types for the ratapi-rs library.
#[derive(Error, Debug)]
pub enum RatError {
    /// A record failed one of its own field invariants.
    #[error("Invalid record: {0}")]
    Record(#[from] RecordError),

    /// A named collection rejected an insertion or lookup.
    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    /// A project mutation was vetoed and rolled back.
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    /// The algorithm configuration is out of range.
    #[error("Invalid controls: {0}")]
    Controls(#[from] ControlsError),

    /// Flattening a project into engine input failed.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Engine output could not be copied back into a project.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// A custom model function could not be resolved or evaluated.
    #[error("Custom function error: {0}")]
    Custom(#[from] CustomError),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for ratapi-rs operations.
pub type Result<T> = std::result::Result<T, RatError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classlist::CollectionError;

    #[test]
    fn test_error_display() {
        let err: RatError = CollectionError::NameNotFound {
            name: "Oxide Thickness".to_string(),
        }
        .into();
        assert!(format!("{}", err).contains("Oxide Thickness"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RatError = io_err.into();

        match err {
            RatError::IoError(_) => (),
            _ => panic!("Expected IoError variant"),
        }
    }
}
