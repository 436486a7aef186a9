//! Lazy handles on custom model functions.
//!
//! A [`CustomFile`] only names a function. Turning that name into something
//! callable is left to a [`FunctionResolver`] supplied by the caller (an
//! embedded interpreter, a dynamic library loader, or a plain
//! [`FunctionRegistry`] of Rust closures). A [`CustomFileHandle`] asks its
//! resolver the first time it is called and keeps the result, so building
//! engine input never loads or compiles anything.

use ndarray::Array2;
use once_cell::unsync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

use crate::models::CustomFile;

/// Errors raised while resolving or calling a custom function
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CustomError {
    #[error("cannot resolve function \"{function_name}\" in \"{filename}\": {message}")]
    Unresolved {
        filename: String,
        function_name: String,
        message: String,
    },

    #[error("function \"{function_name}\" failed: {message}")]
    Evaluation {
        function_name: String,
        message: String,
    },
}

/// Output of a custom model: the layer matrix (or SLD profile for
/// custom XY models) and the substrate roughness.
pub type CustomOutput = (Array2<f64>, f64);

/// A callable custom model.
///
/// Arguments are the values of every parameter, the bulk-in and bulk-out
/// values, the 1-based contrast index and, in domains mode, the 1-based
/// domain index.
pub trait CustomModel {
    fn evaluate(
        &self,
        params: &[f64],
        bulk_in: &[f64],
        bulk_out: &[f64],
        contrast: usize,
        domain: Option<usize>,
    ) -> Result<CustomOutput, CustomError>;
}

impl<F> CustomModel for F
where
    F: Fn(&[f64], &[f64], &[f64], usize, Option<usize>) -> Result<CustomOutput, CustomError>,
{
    fn evaluate(
        &self,
        params: &[f64],
        bulk_in: &[f64],
        bulk_out: &[f64],
        contrast: usize,
        domain: Option<usize>,
    ) -> Result<CustomOutput, CustomError> {
        self(params, bulk_in, bulk_out, contrast, domain)
    }
}

/// Turns a custom file description into a callable model.
pub trait FunctionResolver {
    fn resolve(&self, file: &CustomFile) -> Result<Rc<dyn CustomModel>, CustomError>;
}

/// A resolver over models registered in-process, keyed by file name and
/// function name.
#[derive(Default)]
pub struct FunctionRegistry {
    models: HashMap<(String, String), Rc<dyn CustomModel>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `model` as `function_name` in `filename`, replacing any
    /// earlier registration.
    pub fn register<M>(&mut self, filename: &str, function_name: &str, model: M)
    where
        M: CustomModel + 'static,
    {
        self.models.insert(
            (filename.to_string(), function_name.to_string()),
            Rc::new(model),
        );
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl FunctionResolver for FunctionRegistry {
    fn resolve(&self, file: &CustomFile) -> Result<Rc<dyn CustomModel>, CustomError> {
        self.models
            .get(&(file.filename.clone(), file.function_name.clone()))
            .cloned()
            .ok_or_else(|| CustomError::Unresolved {
                filename: file.filename.clone(),
                function_name: file.function_name.clone(),
                message: "no such function is registered".to_string(),
            })
    }
}

/// A custom file paired with the resolver that will load it on first use
#[derive(Clone)]
pub struct CustomFileHandle {
    file: CustomFile,
    resolver: Rc<dyn FunctionResolver>,
    model: OnceCell<Rc<dyn CustomModel>>,
}

impl CustomFileHandle {
    pub fn new(file: CustomFile, resolver: Rc<dyn FunctionResolver>) -> Self {
        Self {
            file,
            resolver,
            model: OnceCell::new(),
        }
    }

    pub fn file(&self) -> &CustomFile {
        &self.file
    }

    /// Whether the function has been loaded yet.
    pub fn is_resolved(&self) -> bool {
        self.model.get().is_some()
    }

    /// The resolved model, resolving it now if needed. A failed resolution
    /// is not cached; the next call tries again.
    pub fn model(&self) -> Result<&Rc<dyn CustomModel>, CustomError> {
        self.model.get_or_try_init(|| self.resolver.resolve(&self.file))
    }

    pub fn call(
        &self,
        params: &[f64],
        bulk_in: &[f64],
        bulk_out: &[f64],
        contrast: usize,
        domain: Option<usize>,
    ) -> Result<CustomOutput, CustomError> {
        self.model()?
            .evaluate(params, bulk_in, bulk_out, contrast, domain)
    }
}

impl fmt::Debug for CustomFileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFileHandle")
            .field("file", &self.file)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
