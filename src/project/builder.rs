use crate::classlist::ClassList;
use crate::models::{
    Background, Calculation, Contrast, ContrastRecord, Data, Geometry, LayerModel, LayerRecord,
    Parameter, Resolution,
};
use crate::project::validation::ValidationContext;
use crate::project::{Project, ProjectError, SUBSTRATE_ROUGHNESS};

/// Builder for a [`Project`] with non-default modes
///
/// # Examples
///
/// ```
/// use ratapi_rs::models::Calculation;
/// use ratapi_rs::project::Project;
///
/// let project = Project::builder("Bilayer")
///     .calculation(Calculation::Domains)
///     .build()
///     .unwrap();
/// assert_eq!(project.domain_ratios().get_names(), vec!["Domain Ratio 1"]);
/// assert!(project.contrasts()[0].has_ratio());
/// ```
#[derive(Debug, Clone)]
pub struct ProjectBuilder {
    name: String,
    calculation: Calculation,
    model: LayerModel,
    geometry: Geometry,
    absorption: bool,
}

impl ProjectBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calculation: Calculation::Normal,
            model: LayerModel::StandardLayers,
            geometry: Geometry::default(),
            absorption: false,
        }
    }

    pub fn calculation(mut self, calculation: Calculation) -> Self {
        self.calculation = calculation;
        self
    }

    pub fn model(mut self, model: LayerModel) -> Self {
        self.model = model;
        self
    }

    pub fn geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn absorption(mut self, absorption: bool) -> Self {
        self.absorption = absorption;
        self
    }

    /// Build the project with its default content, shaped for the chosen modes.
    pub fn build(self) -> Result<Project, ProjectError> {
        let mut project = Project::new(&self.name);
        let context = ValidationContext::capture(&project);
        project.calculation = self.calculation;
        project.model = self.model;
        project.geometry = self.geometry;
        project.absorption = self.absorption;
        project.revalidate(&context)?;
        Ok(project)
    }
}

/// The protected roughness of the substrate every project starts with.
pub(crate) fn substrate_roughness() -> Parameter {
    Parameter {
        name: SUBSTRATE_ROUGHNESS.to_string(),
        min: 1.0,
        value: 3.0,
        max: 5.0,
        fit: true,
        protected: true,
        ..Parameter::default()
    }
}

fn parameter(name: &str, min: f64, value: f64, max: f64, fit: bool) -> Parameter {
    Parameter {
        name: name.to_string(),
        min,
        value,
        max,
        fit,
        ..Parameter::default()
    }
}

fn parameters(records: Vec<Parameter>) -> ClassList<Parameter> {
    ClassList::from_trusted("Parameter", records)
}

/// Make the substrate roughness the protected first parameter, adding it if
/// missing.
pub(crate) fn ensure_substrate_roughness(list: &mut ClassList<Parameter>) {
    let mut records: Vec<Parameter> = list.iter().cloned().collect();
    let roughness = match records
        .iter()
        .position(|param| crate::classlist::names_match(&param.name, SUBSTRATE_ROUGHNESS))
    {
        Some(index) => {
            let mut existing = records.remove(index);
            existing.protected = true;
            existing
        }
        None => substrate_roughness(),
    };
    records.insert(0, roughness);
    *list = parameters(records);
}

impl Project {
    /// Default content for a normal, standard-layers project.
    pub(crate) fn with_defaults(name: &str) -> Self {
        let contrast = Contrast::new(
            "Contrast 1",
            "Simulation",
            "Background 1",
            "SLD Air",
            "SLD D2O",
            "Scalefactor 1",
            "Resolution 1",
        );

        Project {
            name: name.to_string(),
            calculation: Calculation::Normal,
            model: LayerModel::StandardLayers,
            geometry: Geometry::default(),
            absorption: false,
            parameters: parameters(vec![substrate_roughness()]),
            bulk_in: parameters(vec![parameter("SLD Air", 0.0, 0.0, 0.0, false)]),
            bulk_out: parameters(vec![parameter("SLD D2O", 6.2e-6, 6.35e-6, 6.35e-6, false)]),
            scalefactors: parameters(vec![parameter("Scalefactor 1", 0.02, 0.23, 0.25, false)]),
            domain_ratios: parameters(Vec::new()),
            background_parameters: parameters(vec![parameter(
                "Background Param 1",
                1e-7,
                1e-6,
                1e-5,
                false,
            )]),
            backgrounds: ClassList::from_trusted(
                "Background",
                vec![Background::constant("Background 1", "Background Param 1")],
            ),
            resolution_parameters: parameters(vec![parameter(
                "Resolution Param 1",
                0.01,
                0.03,
                0.05,
                false,
            )]),
            resolutions: ClassList::from_trusted(
                "Resolution",
                vec![Resolution::constant("Resolution 1", "Resolution Param 1")],
            ),
            custom_files: ClassList::new(),
            data: ClassList::from_trusted("Data", vec![Data::simulation("Simulation")]),
            layers: ClassList::from_trusted(LayerRecord::STANDARD, Vec::new()),
            domain_contrasts: ClassList::new(),
            contrasts: ClassList::from_trusted(ContrastRecord::STANDARD, vec![contrast.into()]),
            deferred: false,
        }
    }
}
