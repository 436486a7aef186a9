//! Engine-side records produced by the marshaller.
//!
//! Field names serialise in the camelCase the engine reads. Every
//! per-contrast index is 1-based; `0` marks an optional reference that is
//! not set.

use ndarray::Array2;
use serde::Serialize;

use crate::controls::Controls;
use crate::project::CollectionId;

/// The flattened project handed to the engine
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDefinition {
    /// Calculation mode, `"normal"` or `"domains"`
    #[serde(rename = "TF")]
    pub calculation: String,
    pub model_type: String,
    pub geometry: String,
    /// Whether layers carry an imaginary SLD
    pub use_imaginary: bool,

    pub params: Vec<f64>,
    pub background_params: Vec<f64>,
    pub scalefactors: Vec<f64>,
    pub bulk_ins: Vec<f64>,
    pub bulk_outs: Vec<f64>,
    pub resolution_params: Vec<f64>,
    pub domain_ratios: Vec<f64>,

    pub number_of_contrasts: usize,
    /// Per contrast: the background's source index followed by its value
    /// indices. The source indexes background parameters, data or custom
    /// files depending on the background type.
    pub contrast_background_params: Vec<Vec<usize>>,
    pub contrast_background_types: Vec<String>,
    pub contrast_background_actions: Vec<String>,
    pub contrast_resolution_params: Vec<Vec<usize>>,
    pub contrast_resolution_types: Vec<String>,
    pub contrast_scalefactors: Vec<usize>,
    pub contrast_bulk_ins: Vec<usize>,
    pub contrast_bulk_outs: Vec<usize>,
    /// `0` outside domains mode
    pub contrast_domain_ratios: Vec<usize>,
    /// Custom file of each contrast's model; `0` for standard layers
    pub contrast_custom_files: Vec<usize>,
    pub resample: Vec<bool>,

    /// Per contrast: the measured (or empty) data, padded to four columns
    #[serde(serialize_with = "serialize_arrays")]
    pub data: Vec<Array2<f64>>,
    pub data_present: Vec<bool>,
    pub data_limits: Vec<[f64; 2]>,
    pub simulation_limits: Vec<[f64; 2]>,

    pub number_of_layers: usize,
    /// Per layer: parameter indices of thickness, SLD (real then imaginary
    /// when absorbing), roughness and hydration (`NaN` when unhydrated),
    /// then the hydrate-with code.
    pub layers_details: Vec<Vec<f64>>,
    /// Per contrast: indices of its model entries into layers, or into
    /// domain contrasts in domains mode. Empty for custom models.
    pub contrast_layers: Vec<Vec<usize>>,
    pub number_of_domain_contrasts: usize,
    pub domain_contrast_layers: Vec<Vec<usize>>,

    pub fit_params: Vec<f64>,
    pub fit_limits: Vec<[f64; 2]>,
    pub other_params: Vec<f64>,
    pub other_limits: Vec<[f64; 2]>,

    pub names: Names,
    pub checks: Checks,
}

impl ProblemDefinition {
    /// Values of one parameter collection, or `None` for a collection that
    /// does not hold parameters.
    pub fn parameter_values(&self, id: CollectionId) -> Option<&[f64]> {
        match id {
            CollectionId::Parameters => Some(&self.params),
            CollectionId::BackgroundParameters => Some(&self.background_params),
            CollectionId::Scalefactors => Some(&self.scalefactors),
            CollectionId::BulkIn => Some(&self.bulk_ins),
            CollectionId::BulkOut => Some(&self.bulk_outs),
            CollectionId::ResolutionParameters => Some(&self.resolution_params),
            CollectionId::DomainRatios => Some(&self.domain_ratios),
            _ => None,
        }
    }
}

fn serialize_arrays<S>(arrays: &[Array2<f64>], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let rows: Vec<Vec<Vec<f64>>> = arrays
        .iter()
        .map(|array| array.outer_iter().map(|row| row.to_vec()).collect())
        .collect();
    rows.serialize(serializer)
}

/// Name lists of every collection the indices point into
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Names {
    pub params: Vec<String>,
    pub background_params: Vec<String>,
    pub scalefactors: Vec<String>,
    pub bulk_ins: Vec<String>,
    pub bulk_outs: Vec<String>,
    pub resolution_params: Vec<String>,
    pub domain_ratios: Vec<String>,
    pub backgrounds: Vec<String>,
    pub resolutions: Vec<String>,
    pub data: Vec<String>,
    pub custom_files: Vec<String>,
    pub layers: Vec<String>,
    pub domain_contrasts: Vec<String>,
    pub contrasts: Vec<String>,
}

/// Fit flags, `1` for fitted and `0` for fixed
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checks {
    pub fit_param: Vec<u8>,
    pub fit_background_param: Vec<u8>,
    pub fit_scalefactor: Vec<u8>,
    pub fit_bulk_in: Vec<u8>,
    pub fit_bulk_out: Vec<u8>,
    pub fit_resolution_param: Vec<u8>,
    pub fit_domain_ratio: Vec<u8>,
}

impl Checks {
    /// Total number of fitted parameters.
    pub fn fitted(&self) -> usize {
        [
            &self.fit_param,
            &self.fit_background_param,
            &self.fit_scalefactor,
            &self.fit_bulk_in,
            &self.fit_bulk_out,
            &self.fit_resolution_param,
            &self.fit_domain_ratio,
        ]
        .iter()
        .map(|flags| flags.iter().filter(|&&flag| flag == 1).count())
        .sum()
    }
}

/// `[min, max]` of every parameter, per collection
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub params: Vec<[f64; 2]>,
    pub background_params: Vec<[f64; 2]>,
    pub scalefactors: Vec<[f64; 2]>,
    pub bulk_ins: Vec<[f64; 2]>,
    pub bulk_outs: Vec<[f64; 2]>,
    pub resolution_params: Vec<[f64; 2]>,
    pub domain_ratios: Vec<[f64; 2]>,
}

/// Prior of one parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorSpec {
    pub name: String,
    pub prior_type: String,
    pub mu: f64,
    pub sigma: f64,
}

/// Priors per collection, plus the same priors flattened across all
/// parameter collections in engine order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Priors {
    pub param: Vec<PriorSpec>,
    pub background_param: Vec<PriorSpec>,
    pub scalefactor: Vec<PriorSpec>,
    pub bulk_in: Vec<PriorSpec>,
    pub bulk_out: Vec<PriorSpec>,
    pub resolution_param: Vec<PriorSpec>,
    pub domain_ratio: Vec<PriorSpec>,
    pub prior_names: Vec<String>,
    /// `[type code, mu, sigma]`
    pub prior_values: Vec<[f64; 3]>,
}

/// Algorithm options in the engine's naming
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    pub procedure: String,
    pub parallel: String,
    pub calc_sld_during_fit: bool,
    pub resample_min_angle: f64,
    #[serde(rename = "resamplePoints")]
    pub resample_n_points: usize,
    pub display: String,

    pub x_tolerance: f64,
    #[serde(rename = "funcTolerance")]
    pub fun_tolerance: f64,
    #[serde(rename = "maxFuncEvals")]
    pub max_fun_evals: usize,
    pub max_iterations: usize,
    pub update_freq: usize,
    pub update_plot_freq: usize,

    pub population_size: usize,
    pub f_weight: f64,
    pub crossover_probability: f64,
    pub strategy: u8,
    pub target_value: f64,
    pub num_generations: usize,

    pub n_live: usize,
    #[serde(rename = "nMCMC")]
    pub n_mcmc: usize,
    pub prop_scale: f64,
    pub ns_tolerance: f64,

    pub n_samples: usize,
    pub n_chains: usize,
    pub jump_probability: f64,
    pub p_unit_gamma: f64,
    pub bound_handling: String,
    #[serde(rename = "adaptPCR")]
    pub adapt_pcr: bool,
}

impl From<&Controls> for Control {
    fn from(controls: &Controls) -> Self {
        Self {
            procedure: controls.procedure.to_string(),
            parallel: controls.parallel.to_string(),
            calc_sld_during_fit: controls.calc_sld_during_fit,
            resample_min_angle: controls.resample_min_angle,
            resample_n_points: controls.resample_n_points,
            display: controls.display.to_string(),
            x_tolerance: controls.simplex.x_tolerance,
            fun_tolerance: controls.simplex.fun_tolerance,
            max_fun_evals: controls.simplex.max_fun_evals,
            max_iterations: controls.simplex.max_iterations,
            update_freq: controls.simplex.update_freq,
            update_plot_freq: controls.simplex.update_plot_freq,
            population_size: controls.de.population_size,
            f_weight: controls.de.f_weight,
            crossover_probability: controls.de.crossover_probability,
            strategy: controls.de.strategy.code(),
            target_value: controls.de.target_value,
            num_generations: controls.de.num_generations,
            n_live: controls.ns.n_live,
            n_mcmc: controls.ns.n_mcmc,
            prop_scale: controls.ns.prop_scale,
            ns_tolerance: controls.ns.ns_tolerance,
            n_samples: controls.dream.n_samples,
            n_chains: controls.dream.n_chains,
            jump_probability: controls.dream.jump_probability,
            p_unit_gamma: controls.dream.p_unit_gamma,
            bound_handling: controls.dream.bound_handling.to_string(),
            adapt_pcr: controls.dream.adapt_pcr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{Procedure, Strategy};

    #[test]
    fn test_control_uses_engine_names() {
        let mut controls = Controls::new().with_procedure(Procedure::DE);
        controls.de.strategy = Strategy::BestWithJitter;
        let control = Control::from(&controls);
        assert_eq!(control.procedure, "de");
        assert_eq!(control.strategy, 3);

        let value = serde_json::to_value(&control).unwrap();
        assert_eq!(value["maxFuncEvals"], 10000);
        assert_eq!(value["nMCMC"], 0);
        assert_eq!(value["resamplePoints"], 50);
        assert_eq!(value["boundHandling"], "reflect");
        assert_eq!(value["adaptPCR"], true);
    }

    #[test]
    fn test_checks_fitted() {
        let checks = Checks {
            fit_param: vec![1, 0, 1],
            fit_scalefactor: vec![1],
            ..Checks::default()
        };
        assert_eq!(checks.fitted(), 3);
    }
}
