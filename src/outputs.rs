//! Engine results and copying fitted values back into a project.

use log::warn;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::inputs::ProblemDefinition;
use crate::project::{CollectionId, Project, ProjectError, PARAMETER_COLLECTIONS};

/// Errors raised while reading engine output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("{collection}: engine returned {found} values for {expected} parameters")]
    LengthMismatch {
        collection: CollectionId,
        expected: usize,
        found: usize,
    },

    #[error("malformed engine output: {0}")]
    Malformed(String),

    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// Chi-squared of each contrast and their sum
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalculationResults {
    pub chi_values: Vec<f64>,
    pub sum_chi: f64,
}

/// Curves and statistics of one engine run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputResult {
    /// Per contrast: `[q, R]` over the simulation range
    pub reflectivity: Vec<Array2<f64>>,
    /// Per contrast: `[q, R]` over the data range
    pub simulation: Vec<Array2<f64>>,
    /// Per contrast: the data after scalefactor and background shifts
    pub shifted_data: Vec<Array2<f64>>,
    /// Per contrast, per domain: `[z, SLD]`
    pub sld_profiles: Vec<Vec<Array2<f64>>>,
    /// Per contrast, per domain: the resampled layer table
    pub resampled_layers: Vec<Vec<Array2<f64>>>,
    pub calculation_results: CalculationResults,
    /// Fitted values in the order of the fit partition
    pub fit_params: Vec<f64>,
    pub fit_names: Vec<String>,
}

impl OutputResult {
    /// Check that the per-contrast arrays agree with each other.
    pub fn validate(&self) -> Result<(), OutputError> {
        let contrasts = self.reflectivity.len();
        let lengths = [
            ("simulation", self.simulation.len()),
            ("shifted_data", self.shifted_data.len()),
            ("sld_profiles", self.sld_profiles.len()),
            ("chi_values", self.calculation_results.chi_values.len()),
        ];
        if let Some((field, len)) = lengths.iter().find(|(_, len)| *len != contrasts) {
            return Err(OutputError::Malformed(format!(
                "{} has {} entries for {} contrasts",
                field, len, contrasts
            )));
        }
        if self.fit_params.len() != self.fit_names.len() {
            return Err(OutputError::Malformed(format!(
                "{} fitted values for {} names",
                self.fit_params.len(),
                self.fit_names.len()
            )));
        }
        Ok(())
    }

    /// Fitted parameters as `(name, value)` pairs.
    pub fn best_fit(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.fit_names
            .iter()
            .map(String::as_str)
            .zip(self.fit_params.iter().copied())
    }
}

/// Reflectivity and SLD intervals from the posterior
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionIntervals {
    /// Per contrast: rows of the 1, 2.5, 50, 97.5 and 99th percentiles
    pub reflectivity: Vec<Array2<f64>>,
    pub sld: Vec<Vec<Array2<f64>>>,
    pub sample_chi: Vec<f64>,
}

/// Per-parameter summary of the posterior
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceIntervals {
    /// `[low, high]` rows, one column per fitted parameter
    pub percentile95: Array2<f64>,
    pub percentile65: Array2<f64>,
    pub mean: Vec<f64>,
}

/// Sampler-specific diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sampler", rename_all = "lowercase")]
pub enum Diagnostics {
    Dream {
        /// Gelman-Rubin statistic per fitted parameter
        r_stat: Vec<f64>,
        acceptance_rate: f64,
    },
    Ns {
        log_z: f64,
        log_z_error: f64,
    },
}

/// Extra output of the Bayesian procedures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesResults {
    pub prediction_intervals: PredictionIntervals,
    pub confidence_intervals: ConfidenceIntervals,
    /// One row per sample, one column per fitted parameter
    pub chain: Array2<f64>,
    pub diagnostics: Diagnostics,
}

impl BayesResults {
    /// Mean of every fitted parameter over the chain, or `None` for an
    /// empty chain.
    pub fn chain_means(&self) -> Option<Array1<f64>> {
        self.chain.mean_axis(Axis(0))
    }
}

/// Copy the parameter values returned by the engine into `project`.
///
/// `problem` holds one value array per parameter collection, in the same
/// layout the marshaller produced. Values outside a parameter's bounds are
/// clamped into them with a warning. The project is left untouched if any
/// array has the wrong length.
pub fn update_project(project: &mut Project, problem: &ProblemDefinition) -> Result<(), OutputError> {
    for id in PARAMETER_COLLECTIONS {
        let expected = project.len_of(id);
        let found = problem.parameter_values(id).map_or(0, <[f64]>::len);
        if expected != found {
            return Err(OutputError::LengthMismatch {
                collection: id,
                expected,
                found,
            });
        }
    }

    project.update(|candidate| {
        for id in PARAMETER_COLLECTIONS {
            let (Some(values), Some(list)) = (problem.parameter_values(id), candidate.parameter_collection_mut(id)) else {
                continue;
            };
            for (param, &value) in list.records_mut().zip(values) {
                if !param.is_within_bounds(value) {
                    warn!(
                        "{}: fitted value {} of \"{}\" is outside [{}, {}], clamping",
                        id, value, param.name, param.min, param.max
                    );
                }
                param.value = param.clamp(value);
            }
        }
        Ok(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::Controls;
    use crate::inputs::build_input;
    use crate::models::Parameter;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn fitted_project() -> Project {
        let mut project = Project::new("Fitted");
        project
            .parameters_mut()
            .append(Parameter::new("Oxide Thickness", 5.0, 20.0, 60.0, true).unwrap())
            .unwrap();
        project
    }

    #[test]
    fn test_values_are_copied_by_position() {
        let mut project = fitted_project();
        let mut problem = build_input(&project, &Controls::default()).unwrap().problem;
        problem.params = vec![4.5, 31.0];
        problem.scalefactors = vec![0.21];

        update_project(&mut project, &problem).unwrap();
        assert_relative_eq!(project.parameters()[0].value, 4.5);
        assert_relative_eq!(project.parameters()["Oxide Thickness"].value, 31.0);
        assert_relative_eq!(project.scalefactors()[0].value, 0.21);
    }

    #[test]
    fn test_out_of_bounds_values_are_clamped() {
        let mut project = fitted_project();
        let mut problem = build_input(&project, &Controls::default()).unwrap().problem;
        problem.params = vec![5.0000001, 4.0];

        update_project(&mut project, &problem).unwrap();
        assert_relative_eq!(project.parameters()[0].value, 5.0);
        assert_relative_eq!(project.parameters()[1].value, 5.0);
    }

    #[test]
    fn test_length_mismatch_leaves_project_untouched() {
        let mut project = fitted_project();
        let before = project.clone();
        let mut problem = build_input(&project, &Controls::default()).unwrap().problem;
        problem.params = vec![4.0, 25.0];
        problem.bulk_outs.push(6.0e-6);

        let err = update_project(&mut project, &problem).unwrap_err();
        assert!(matches!(
            err,
            OutputError::LengthMismatch {
                collection: CollectionId::BulkOut,
                expected: 1,
                found: 2
            }
        ));
        assert_eq!(project, before);
    }

    #[test]
    fn test_result_shape_check() {
        let mut result = OutputResult {
            reflectivity: vec![array![[0.01, 1.0]]],
            simulation: vec![array![[0.01, 1.0]]],
            shifted_data: vec![array![[0.01, 1.0, 0.1]]],
            sld_profiles: vec![vec![array![[0.0, 2.07e-6]]]],
            resampled_layers: vec![vec![]],
            calculation_results: CalculationResults {
                chi_values: vec![1.2],
                sum_chi: 1.2,
            },
            fit_params: vec![3.0],
            fit_names: vec!["Substrate Roughness".to_string()],
        };
        assert!(result.validate().is_ok());
        assert_eq!(result.best_fit().collect::<Vec<_>>(), vec![("Substrate Roughness", 3.0)]);

        result.calculation_results.chi_values.push(0.4);
        assert!(matches!(result.validate(), Err(OutputError::Malformed(_))));
    }

    #[test]
    fn test_chain_means() {
        let bayes = BayesResults {
            prediction_intervals: PredictionIntervals::default(),
            confidence_intervals: ConfidenceIntervals::default(),
            chain: array![[1.0, 10.0], [3.0, 20.0]],
            diagnostics: Diagnostics::Ns {
                log_z: -12.5,
                log_z_error: 0.1,
            },
        };
        let means = bayes.chain_means().unwrap();
        assert_relative_eq!(means[0], 2.0);
        assert_relative_eq!(means[1], 15.0);

        let value = serde_json::to_value(&bayes.diagnostics).unwrap();
        assert_eq!(value["sampler"], "ns");
    }
}
