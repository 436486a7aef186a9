//! # Project
//!
//! A [`Project`] owns every collection describing a reflectometry sample plus
//! the scalar mode flags, and is the only place where references between
//! collections are checked.
//!
//! ## Transactional mutation
//!
//! Collections are read through plain getters (`project.parameters()`) and
//! changed through guarded handles (`project.parameters_mut()`). Every
//! change is applied to a candidate copy of the project, which then runs
//! the whole validator chain; the candidate replaces the project only if
//! the chain passes. A rejected change therefore leaves the project exactly
//! as it was.
//!
//! ```rust
//! use ratapi_rs::models::{Layer, Parameter};
//! use ratapi_rs::project::Project;
//!
//! let mut project = Project::new("Oxide");
//! project
//!     .parameters_mut()
//!     .append(Parameter::new("Oxide Thickness", 5.0, 20.0, 60.0, true).unwrap())
//!     .unwrap();
//!
//! // A layer referencing a parameter that does not exist is rejected.
//! let bad = Layer::new("Oxide", "Oxide Thickness", "Oxide SLD", "Substrate Roughness");
//! assert!(project.layers_mut().append(bad.into()).is_err());
//! assert!(project.layers().is_empty());
//! ```

use log::debug;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::classlist::{ClassList, CollectionError};
use crate::models::{
    Background, Calculation, ContrastRecord, CustomFile, Data, DomainContrast, Geometry,
    LayerModel, LayerRecord, Parameter, Resolution,
};

mod builder;
pub mod guard;
pub mod references;
mod serialization;
pub mod validation;

pub use builder::ProjectBuilder;
pub use guard::CollectionMut;
pub use references::{CollectionId, Reference, References};
pub use validation::{ValidationError, ValidationErrorKind, ValidationErrors};

use validation::ValidationContext;

/// Parameter collections in the order the engine expects them.
pub const PARAMETER_COLLECTIONS: [CollectionId; 7] = [
    CollectionId::Parameters,
    CollectionId::BackgroundParameters,
    CollectionId::Scalefactors,
    CollectionId::BulkIn,
    CollectionId::BulkOut,
    CollectionId::ResolutionParameters,
    CollectionId::DomainRatios,
];

/// Name of the parameter every project must keep.
pub const SUBSTRATE_ROUGHNESS: &str = "Substrate Roughness";

/// Errors raised by project mutations
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("{collection}: {source}")]
    Collection {
        collection: CollectionId,
        #[source]
        source: CollectionError,
    },

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("project serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("project file could not be read or written: {0}")]
    Io(#[from] std::io::Error),
}

impl ProjectError {
    /// The validation errors, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ProjectError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// The complete, validated description of a sample and its measurements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    name: String,
    calculation: Calculation,
    model: LayerModel,
    geometry: Geometry,
    absorption: bool,

    parameters: ClassList<Parameter>,
    bulk_in: ClassList<Parameter>,
    bulk_out: ClassList<Parameter>,
    scalefactors: ClassList<Parameter>,
    domain_ratios: ClassList<Parameter>,
    background_parameters: ClassList<Parameter>,
    backgrounds: ClassList<Background>,
    resolution_parameters: ClassList<Parameter>,
    resolutions: ClassList<Resolution>,
    custom_files: ClassList<CustomFile>,
    data: ClassList<Data>,
    layers: ClassList<LayerRecord>,
    domain_contrasts: ClassList<DomainContrast>,
    contrasts: ClassList<ContrastRecord>,

    /// Set while a multi-step [`Project::update`] is running, so nested
    /// changes are validated once, at the end.
    #[serde(skip)]
    deferred: bool,
}

/// Dispatch an expression over the collection named by a [`CollectionId`].
macro_rules! with_collection {
    ($project:expr, $id:expr, $list:ident => $body:expr) => {
        match $id {
            CollectionId::Parameters => { let $list = &$project.parameters; $body }
            CollectionId::BulkIn => { let $list = &$project.bulk_in; $body }
            CollectionId::BulkOut => { let $list = &$project.bulk_out; $body }
            CollectionId::Scalefactors => { let $list = &$project.scalefactors; $body }
            CollectionId::DomainRatios => { let $list = &$project.domain_ratios; $body }
            CollectionId::BackgroundParameters => { let $list = &$project.background_parameters; $body }
            CollectionId::Backgrounds => { let $list = &$project.backgrounds; $body }
            CollectionId::ResolutionParameters => { let $list = &$project.resolution_parameters; $body }
            CollectionId::Resolutions => { let $list = &$project.resolutions; $body }
            CollectionId::CustomFiles => { let $list = &$project.custom_files; $body }
            CollectionId::Data => { let $list = &$project.data; $body }
            CollectionId::Layers => { let $list = &$project.layers; $body }
            CollectionId::DomainContrasts => { let $list = &$project.domain_contrasts; $body }
            CollectionId::Contrasts => { let $list = &$project.contrasts; $body }
        }
    };
}

/// Getter and guarded handle for each collection.
macro_rules! collection_accessors {
    ($($(#[$doc:meta])* $field:ident, $field_mut:ident: $record:ty => $id:ident;)*) => {
        impl Project {
            $(
                $(#[$doc])*
                pub fn $field(&self) -> &ClassList<$record> {
                    &self.$field
                }

                /// Guarded handle; every change through it is validated
                /// against the whole project.
                pub fn $field_mut(&mut self) -> CollectionMut<'_, $record> {
                    fn view(project: &Project) -> &ClassList<$record> {
                        &project.$field
                    }
                    fn select(project: &mut Project) -> &mut ClassList<$record> {
                        &mut project.$field
                    }
                    CollectionMut::new(self, CollectionId::$id, view, select)
                }
            )*
        }
    };
}

collection_accessors! {
    /// Sample parameters referenced by layers.
    parameters, parameters_mut: Parameter => Parameters;
    /// Parameters for the SLD of the incoming medium.
    bulk_in, bulk_in_mut: Parameter => BulkIn;
    /// Parameters for the SLD of the substrate or outgoing medium.
    bulk_out, bulk_out_mut: Parameter => BulkOut;
    scalefactors, scalefactors_mut: Parameter => Scalefactors;
    /// Ratios mixing the two domains; empty outside domains mode.
    domain_ratios, domain_ratios_mut: Parameter => DomainRatios;
    background_parameters, background_parameters_mut: Parameter => BackgroundParameters;
    backgrounds, backgrounds_mut: Background => Backgrounds;
    resolution_parameters, resolution_parameters_mut: Parameter => ResolutionParameters;
    resolutions, resolutions_mut: Resolution => Resolutions;
    custom_files, custom_files_mut: CustomFile => CustomFiles;
    data, data_mut: Data => Data;
    /// Layers; empty unless the model is standard layers.
    layers, layers_mut: LayerRecord => Layers;
    /// Domain structures; empty unless the project uses standard layers in domains mode.
    domain_contrasts, domain_contrasts_mut: DomainContrast => DomainContrasts;
    contrasts, contrasts_mut: ContrastRecord => Contrasts;
}

impl Project {
    /// A project with the default content for a normal, standard-layers
    /// calculation.
    pub fn new(name: &str) -> Self {
        Self::with_defaults(name)
    }

    /// Start building a project with non-default settings.
    pub fn builder(name: &str) -> ProjectBuilder {
        ProjectBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn calculation(&self) -> Calculation {
        self.calculation
    }

    pub fn model(&self) -> LayerModel {
        self.model
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn absorption(&self) -> bool {
        self.absorption
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Switch the calculation mode; contrasts change shape and the domain
    /// collections are filled or cleared to match.
    pub fn set_calculation(&mut self, calculation: Calculation) -> Result<(), ProjectError> {
        self.update(|project| {
            project.calculation = calculation;
            Ok(())
        })
    }

    /// Switch the model type; collections the new type cannot use are cleared.
    pub fn set_model(&mut self, model: LayerModel) -> Result<(), ProjectError> {
        self.update(|project| {
            project.model = model;
            Ok(())
        })
    }

    pub fn set_geometry(&mut self, geometry: Geometry) -> Result<(), ProjectError> {
        self.update(|project| {
            project.geometry = geometry;
            Ok(())
        })
    }

    /// Switch absorption on or off, converting every layer to the matching shape.
    pub fn set_absorption(&mut self, absorption: bool) -> Result<(), ProjectError> {
        self.update(|project| {
            project.absorption = absorption;
            Ok(())
        })
    }

    /// Apply several changes as one transaction.
    ///
    /// Changes made through the candidate's handles inside `edit` are not
    /// validated one by one; the candidate is validated once when `edit`
    /// returns, and committed only if that passes.
    ///
    /// # Examples
    ///
    /// ```
    /// use ratapi_rs::models::{Layer, Parameter};
    /// use ratapi_rs::project::Project;
    ///
    /// let mut project = Project::new("Oxide");
    /// project
    ///     .update(|candidate| {
    ///         candidate.layers_mut().append(Layer::new("Oxide", "Oxide Thickness", "", "").into())?;
    ///         candidate
    ///             .parameters_mut()
    ///             .append(Parameter::new("Oxide Thickness", 5.0, 20.0, 60.0, true).unwrap())
    ///     })
    ///     .unwrap();
    /// assert_eq!(project.layers().len(), 1);
    /// ```
    pub fn update<F, R>(&mut self, edit: F) -> Result<R, ProjectError>
    where
        F: FnOnce(&mut Project) -> Result<R, ProjectError>,
    {
        self.transact("project", edit)
    }

    /// Run `edit` on a candidate copy and commit it if it validates.
    pub(crate) fn transact<F, R>(&mut self, scope: &str, edit: F) -> Result<R, ProjectError>
    where
        F: FnOnce(&mut Project) -> Result<R, ProjectError>,
    {
        if self.deferred {
            return edit(self);
        }

        let context = ValidationContext::capture(self);
        let mut candidate = self.clone();
        candidate.deferred = true;
        let outcome = edit(&mut candidate).and_then(|value| {
            candidate.deferred = false;
            candidate.revalidate(&context)?;
            Ok(value)
        });

        match outcome {
            Ok(value) => {
                debug!("committed change to {}", scope);
                *self = candidate;
                Ok(value)
            }
            Err(err) => {
                debug!("rolled back change to {}: {}", scope, err);
                Err(err)
            }
        }
    }

    /// Names of every record of a collection, in order.
    pub fn names(&self, id: CollectionId) -> Vec<String> {
        with_collection!(self, id, list => list.get_names())
    }

    /// Whether a collection holds a record named `name` (ignoring case).
    pub fn contains(&self, id: CollectionId, name: &str) -> bool {
        with_collection!(self, id, list => list.contains(name))
    }

    /// 1-based position of `name` in a collection.
    pub fn index_of(&self, id: CollectionId, name: &str) -> Option<usize> {
        with_collection!(self, id, list => list.index(name, true).ok())
    }

    /// Number of records in a collection.
    pub fn len_of(&self, id: CollectionId) -> usize {
        with_collection!(self, id, list => list.len())
    }

    /// The parameter collection named by `id`, or `None` if it holds
    /// something else.
    pub fn parameter_collection(&self, id: CollectionId) -> Option<&ClassList<Parameter>> {
        match id {
            CollectionId::Parameters => Some(&self.parameters),
            CollectionId::BulkIn => Some(&self.bulk_in),
            CollectionId::BulkOut => Some(&self.bulk_out),
            CollectionId::Scalefactors => Some(&self.scalefactors),
            CollectionId::DomainRatios => Some(&self.domain_ratios),
            CollectionId::BackgroundParameters => Some(&self.background_parameters),
            CollectionId::ResolutionParameters => Some(&self.resolution_parameters),
            _ => None,
        }
    }

    pub(crate) fn parameter_collection_mut(&mut self, id: CollectionId) -> Option<&mut ClassList<Parameter>> {
        match id {
            CollectionId::Parameters => Some(&mut self.parameters),
            CollectionId::BulkIn => Some(&mut self.bulk_in),
            CollectionId::BulkOut => Some(&mut self.bulk_out),
            CollectionId::Scalefactors => Some(&mut self.scalefactors),
            CollectionId::DomainRatios => Some(&mut self.domain_ratios),
            CollectionId::BackgroundParameters => Some(&mut self.background_parameters),
            CollectionId::ResolutionParameters => Some(&mut self.resolution_parameters),
            _ => None,
        }
    }

    /// The collection contrast models currently name records of.
    pub fn contrast_model_target(&self) -> Option<CollectionId> {
        match (self.model, self.calculation) {
            (LayerModel::StandardLayers, Calculation::Normal) => Some(CollectionId::Layers),
            (LayerModel::StandardLayers, Calculation::Domains) => Some(CollectionId::DomainContrasts),
            _ => Some(CollectionId::CustomFiles),
        }
    }

    /// Every parameter of the seven parameter collections, in engine order.
    pub fn all_parameters(&self) -> impl Iterator<Item = (CollectionId, &Parameter)> + '_ {
        PARAMETER_COLLECTIONS.into_iter().flat_map(move |id| {
            self.parameter_collection(id)
                .into_iter()
                .flat_map(move |list| list.iter().map(move |param| (id, param)))
        })
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Project: {}", self.name)?;
        writeln!(f, "  calculation: {}", self.calculation)?;
        writeln!(f, "  model:       {}", self.model)?;
        writeln!(f, "  geometry:    {}", self.geometry)?;
        writeln!(f, "  absorption:  {}", self.absorption)?;
        for id in CollectionId::ALL {
            if self.len_of(id) == 0 {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{}:", id)?;
            for (index, name) in self.names(id).iter().enumerate() {
                writeln!(f, "  {:>3}  {}", index + 1, name)?;
            }
        }
        Ok(())
    }
}
