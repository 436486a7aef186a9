use log::debug;
use ndarray::{s, Array2};

use crate::classlist::Record;
use crate::controls::Controls;
use crate::inputs::problem::{Control, Limits, PriorSpec, Priors, ProblemDefinition};
use crate::inputs::{check_indices, EngineInput, InputError, DATA_COLUMNS};
use crate::models::data::MIN_DATA_COLUMNS;
use crate::models::{Calculation, ContrastRecord, Data, Parameter};
use crate::project::{CollectionId, Project, References, PARAMETER_COLLECTIONS};

/// Flatten `project` and `controls` into engine input.
///
/// The project is only read. Every reference is resolved to a 1-based
/// index, and the result passes [`check_indices`] before it is returned.
pub fn build_input(project: &Project, controls: &Controls) -> Result<EngineInput, InputError> {
    controls.validate()?;

    let mut problem = ProblemDefinition {
        calculation: project.calculation().to_string(),
        model_type: project.model().to_string(),
        geometry: project.geometry().to_string(),
        use_imaginary: project.absorption(),
        ..ProblemDefinition::default()
    };
    let mut limits = Limits::default();
    let mut priors = Priors::default();

    flatten_parameters(project, &mut problem, &mut limits, &mut priors);
    partition_parameters(project, &mut problem, &mut priors);
    collect_names(project, &mut problem);

    problem.number_of_layers = project.layers().len();
    problem.layers_details = layer_details(project)?;
    problem.number_of_domain_contrasts = project.domain_contrasts().len();
    problem.domain_contrast_layers = domain_contrast_layers(project)?;

    problem.number_of_contrasts = project.contrasts().len();
    for contrast in project.contrasts().iter() {
        add_contrast(project, contrast, &mut problem)?;
    }

    check_indices(&problem)?;

    debug!(
        "Marshalled \"{}\": {} contrasts, {} fitted and {} fixed parameters",
        project.name(),
        problem.number_of_contrasts,
        problem.fit_params.len(),
        problem.other_params.len()
    );

    Ok(EngineInput {
        problem,
        limits,
        priors,
        control: Control::from(controls),
        custom_files: project.custom_files().iter().cloned().collect(),
    })
}

type Slots<'a> = (
    &'a mut Vec<f64>,
    &'a mut Vec<u8>,
    &'a mut Vec<String>,
    &'a mut Vec<[f64; 2]>,
    &'a mut Vec<PriorSpec>,
);

/// Values, fit flags, names, limits and priors of one parameter collection.
fn parameter_slots<'a>(
    id: CollectionId,
    problem: &'a mut ProblemDefinition,
    limits: &'a mut Limits,
    priors: &'a mut Priors,
) -> Option<Slots<'a>> {
    let (checks, names) = (&mut problem.checks, &mut problem.names);
    match id {
        CollectionId::Parameters => Some((
            &mut problem.params,
            &mut checks.fit_param,
            &mut names.params,
            &mut limits.params,
            &mut priors.param,
        )),
        CollectionId::BackgroundParameters => Some((
            &mut problem.background_params,
            &mut checks.fit_background_param,
            &mut names.background_params,
            &mut limits.background_params,
            &mut priors.background_param,
        )),
        CollectionId::Scalefactors => Some((
            &mut problem.scalefactors,
            &mut checks.fit_scalefactor,
            &mut names.scalefactors,
            &mut limits.scalefactors,
            &mut priors.scalefactor,
        )),
        CollectionId::BulkIn => Some((
            &mut problem.bulk_ins,
            &mut checks.fit_bulk_in,
            &mut names.bulk_ins,
            &mut limits.bulk_ins,
            &mut priors.bulk_in,
        )),
        CollectionId::BulkOut => Some((
            &mut problem.bulk_outs,
            &mut checks.fit_bulk_out,
            &mut names.bulk_outs,
            &mut limits.bulk_outs,
            &mut priors.bulk_out,
        )),
        CollectionId::ResolutionParameters => Some((
            &mut problem.resolution_params,
            &mut checks.fit_resolution_param,
            &mut names.resolution_params,
            &mut limits.resolution_params,
            &mut priors.resolution_param,
        )),
        CollectionId::DomainRatios => Some((
            &mut problem.domain_ratios,
            &mut checks.fit_domain_ratio,
            &mut names.domain_ratios,
            &mut limits.domain_ratios,
            &mut priors.domain_ratio,
        )),
        _ => None,
    }
}

fn flatten_parameters(project: &Project, problem: &mut ProblemDefinition, limits: &mut Limits, priors: &mut Priors) {
    for id in PARAMETER_COLLECTIONS {
        let Some(list) = project.parameter_collection(id) else {
            continue;
        };
        let Some((values, flags, names, bounds, specs)) = parameter_slots(id, problem, limits, priors) else {
            continue;
        };
        for param in list.iter() {
            values.push(param.value);
            flags.push(u8::from(param.fit));
            names.push(param.name.clone());
            bounds.push(param.limits());
            specs.push(prior_spec(param));
        }
    }
}

fn prior_spec(param: &Parameter) -> PriorSpec {
    PriorSpec {
        name: param.name.clone(),
        prior_type: param.prior_type.to_string(),
        mu: param.mu,
        sigma: param.sigma,
    }
}

/// Split every parameter, in engine order, into the fitted and fixed sets.
fn partition_parameters(project: &Project, problem: &mut ProblemDefinition, priors: &mut Priors) {
    for (_, param) in project.all_parameters() {
        let (values, bounds) = if param.fit {
            (&mut problem.fit_params, &mut problem.fit_limits)
        } else {
            (&mut problem.other_params, &mut problem.other_limits)
        };
        values.push(param.value);
        bounds.push(param.limits());

        priors.prior_names.push(param.name.clone());
        priors.prior_values.push([param.prior_type.code(), param.mu, param.sigma]);
    }
}

fn collect_names(project: &Project, problem: &mut ProblemDefinition) {
    let names = &mut problem.names;
    names.backgrounds = project.names(CollectionId::Backgrounds);
    names.resolutions = project.names(CollectionId::Resolutions);
    names.data = project.names(CollectionId::Data);
    names.custom_files = project.names(CollectionId::CustomFiles);
    names.layers = project.names(CollectionId::Layers);
    names.domain_contrasts = project.names(CollectionId::DomainContrasts);
    names.contrasts = project.names(CollectionId::Contrasts);
}

fn unresolved(record: &str, field: &str, collection: CollectionId, value: &str) -> InputError {
    InputError::UnresolvedReference {
        record: record.to_string(),
        field: field.to_string(),
        value: value.to_string(),
        collection,
    }
}

fn resolve(project: &Project, record: &str, field: &str, target: CollectionId, value: &str) -> Result<usize, InputError> {
    project
        .index_of(target, value)
        .ok_or_else(|| unresolved(record, field, target, value))
}

/// Index of a layer's parameter, or `NaN` for an empty reference.
fn parameter_index(project: &Project, layer: &str, field: &str, value: &str) -> Result<f64, InputError> {
    if value.is_empty() {
        return Ok(f64::NAN);
    }
    resolve(project, layer, field, CollectionId::Parameters, value).map(|index| index as f64)
}

fn layer_details(project: &Project) -> Result<Vec<Vec<f64>>, InputError> {
    project
        .layers()
        .iter()
        .map(|layer| {
            let mut row = Vec::with_capacity(7);
            for (field, value) in layer.parameter_fields() {
                row.push(parameter_index(project, layer.name(), field, value)?);
            }
            row.push(parameter_index(project, layer.name(), "hydration", layer.hydration())?);
            row.push(layer.hydrate_with().code());
            Ok(row)
        })
        .collect()
}

fn domain_contrast_layers(project: &Project) -> Result<Vec<Vec<usize>>, InputError> {
    project
        .domain_contrasts()
        .iter()
        .map(|domain| {
            domain
                .model
                .iter()
                .map(|entry| resolve(project, &domain.name, "model", CollectionId::Layers, entry))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

/// Source index followed by the indices of every filled value field.
fn signal_indices<S: References>(project: &Project, signal: &S) -> Result<Vec<usize>, InputError> {
    let name = signal.name().unwrap_or_default();
    signal
        .references(None)
        .into_iter()
        .filter(|reference| !reference.value.is_empty())
        .map(|reference| resolve(project, name, reference.field, reference.target, reference.value))
        .collect()
}

/// The data of a contrast padded with zero columns up to [`DATA_COLUMNS`].
fn padded_data(data: &Data) -> Result<Array2<f64>, InputError> {
    let (rows, columns) = data.data.dim();
    if columns < MIN_DATA_COLUMNS {
        return Err(InputError::MalformedData {
            name: data.name.clone(),
            columns,
        });
    }
    if columns >= DATA_COLUMNS {
        return Ok(data.data.clone());
    }
    let mut padded = Array2::zeros((rows, DATA_COLUMNS));
    padded.slice_mut(s![.., ..columns]).assign(&data.data);
    Ok(padded)
}

fn add_contrast(project: &Project, contrast: &ContrastRecord, problem: &mut ProblemDefinition) -> Result<(), InputError> {
    let name = contrast.name();
    let required = |field: &str, target: CollectionId, value: &str| resolve(project, name, field, target, value);

    problem
        .contrast_scalefactors
        .push(required("scalefactor", CollectionId::Scalefactors, contrast.scalefactor())?);
    problem
        .contrast_bulk_ins
        .push(required("bulk_in", CollectionId::BulkIn, contrast.bulk_in())?);
    problem
        .contrast_bulk_outs
        .push(required("bulk_out", CollectionId::BulkOut, contrast.bulk_out())?);
    let domain_ratio = match contrast.domain_ratio() {
        Some(ratio) if !ratio.is_empty() => required("domain_ratio", CollectionId::DomainRatios, ratio)?,
        _ => 0,
    };
    problem.contrast_domain_ratios.push(domain_ratio);

    let background = project
        .backgrounds()
        .get_by_name(contrast.background())
        .ok_or_else(|| unresolved(name, "background", CollectionId::Backgrounds, contrast.background()))?;
    problem.contrast_background_params.push(signal_indices(project, background)?);
    problem
        .contrast_background_types
        .push(background.signal_type.as_str().to_string());
    problem
        .contrast_background_actions
        .push(contrast.background_action().as_str().to_string());

    let resolution = project
        .resolutions()
        .get_by_name(contrast.resolution())
        .ok_or_else(|| unresolved(name, "resolution", CollectionId::Resolutions, contrast.resolution()))?;
    problem.contrast_resolution_params.push(signal_indices(project, resolution)?);
    problem
        .contrast_resolution_types
        .push(resolution.signal_type.as_str().to_string());

    let data = project
        .data()
        .get_by_name(contrast.data())
        .ok_or_else(|| unresolved(name, "data", CollectionId::Data, contrast.data()))?;
    problem.data.push(padded_data(data)?);
    problem.data_present.push(data.has_data());
    problem.data_limits.push(data.data_range.unwrap_or([0.0, 0.0]));
    problem
        .simulation_limits
        .push(data.simulation_range.unwrap_or([0.0, 0.0]));
    problem.resample.push(contrast.resample());

    if project.model().is_custom() {
        let file = match contrast.model().first() {
            Some(entry) => required("model", CollectionId::CustomFiles, entry)?,
            None => 0,
        };
        problem.contrast_custom_files.push(file);
        problem.contrast_layers.push(Vec::new());
    } else {
        let target = match project.calculation() {
            Calculation::Domains => CollectionId::DomainContrasts,
            Calculation::Normal => CollectionId::Layers,
        };
        let layers = contrast
            .model()
            .iter()
            .map(|entry| required("model", target, entry))
            .collect::<Result<Vec<_>, _>>()?;
        problem.contrast_custom_files.push(0);
        problem.contrast_layers.push(layers);
    }

    Ok(())
}
