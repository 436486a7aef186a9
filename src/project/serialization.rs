//! JSON persistence of a project
//!
//! A saved project is the serialised field values of every collection plus
//! the mode flags. Loading rebuilds every collection (checking record
//! invariants, kinds and names) and then runs the whole validator chain, so a
//! hand-edited file cannot produce an invalid project.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::classlist::ClassList;
use crate::models::{
    Background, Calculation, ContrastRecord, CustomFile, Data, DomainContrast, Geometry,
    LayerModel, LayerRecord, Parameter, Resolution,
};
use crate::project::builder::ensure_substrate_roughness;
use crate::project::validation::ValidationContext;
use crate::project::{Project, ProjectError};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RawProject {
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
}

impl TryFrom<RawProject> for Project {
    type Error = ProjectError;

    fn try_from(raw: RawProject) -> Result<Self, Self::Error> {
        let mut parameters = raw.parameters;
        ensure_substrate_roughness(&mut parameters);

        let mut project = Project {
            name: raw.name,
            calculation: raw.calculation,
            model: raw.model,
            geometry: raw.geometry,
            absorption: raw.absorption,
            parameters,
            bulk_in: raw.bulk_in,
            bulk_out: raw.bulk_out,
            scalefactors: raw.scalefactors,
            domain_ratios: raw.domain_ratios,
            background_parameters: raw.background_parameters,
            backgrounds: raw.backgrounds,
            resolution_parameters: raw.resolution_parameters,
            resolutions: raw.resolutions,
            custom_files: raw.custom_files,
            data: raw.data,
            layers: raw.layers,
            domain_contrasts: raw.domain_contrasts,
            contrasts: raw.contrasts,
            deferred: false,
        };
        let context = ValidationContext::capture(&project);
        project.revalidate(&context)?;
        Ok(project)
    }
}

impl Project {
    /// Serialise the project as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rebuild and validate a project from JSON.
    ///
    /// # Examples
    ///
    /// ```
    /// use ratapi_rs::project::Project;
    ///
    /// let project = Project::new("Round trip");
    /// let text = project.to_json().unwrap();
    /// assert_eq!(Project::from_json(&text).unwrap(), project);
    /// ```
    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        let raw: RawProject = serde_json::from_str(text)?;
        Project::try_from(raw)
    }

    /// Write the project to `path` as JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ProjectError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read and validate a project saved by [`save_json`](Self::save_json).
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ProjectError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
