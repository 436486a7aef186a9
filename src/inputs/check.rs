use crate::inputs::problem::ProblemDefinition;
use crate::inputs::InputError;
use crate::models::{Calculation, LayerModel, SignalType};

/// Check every per-contrast index of `problem` against the length of the
/// collection it points into.
///
/// Indices are 1-based. Optional references (domain ratios, custom files)
/// may also be `0`. The first field holding a bad index is reported along
/// with every bad value it holds.
pub fn check_indices(problem: &ProblemDefinition) -> Result<(), InputError> {
    let names = &problem.names;

    check_field("contrastScalefactors", &problem.contrast_scalefactors, names.scalefactors.len(), false)?;
    check_field("contrastBulkIns", &problem.contrast_bulk_ins, names.bulk_ins.len(), false)?;
    check_field("contrastBulkOuts", &problem.contrast_bulk_outs, names.bulk_outs.len(), false)?;
    check_field("contrastDomainRatios", &problem.contrast_domain_ratios, names.domain_ratios.len(), true)?;
    check_field("contrastCustomFiles", &problem.contrast_custom_files, names.custom_files.len(), true)?;

    check_signals(
        "contrastBackgroundParams",
        &problem.contrast_background_params,
        &problem.contrast_background_types,
        names.background_params.len(),
        problem,
    )?;
    check_signals(
        "contrastResolutionParams",
        &problem.contrast_resolution_params,
        &problem.contrast_resolution_types,
        names.resolution_params.len(),
        problem,
    )?;

    let domains = problem.calculation == Calculation::Domains.as_str()
        && problem.model_type == LayerModel::StandardLayers.as_str();
    let model_len = if domains {
        names.domain_contrasts.len()
    } else {
        names.layers.len()
    };
    check_field("contrastLayers", problem.contrast_layers.iter().flatten(), model_len, false)?;
    check_field(
        "domainContrastLayers",
        problem.domain_contrast_layers.iter().flatten(),
        names.layers.len(),
        false,
    )?;
    Ok(())
}

/// The first index of a signal points into parameters, data or custom files
/// depending on its type; the rest always point into parameters.
fn check_signals(
    field: &str,
    indices: &[Vec<usize>],
    types: &[String],
    parameters: usize,
    problem: &ProblemDefinition,
) -> Result<(), InputError> {
    let mut sources = Vec::new();
    for (signal, kind) in indices.iter().zip(types) {
        let Some((&source, values)) = signal.split_first() else {
            continue;
        };
        let source_len = if kind == SignalType::Data.as_str() {
            problem.names.data.len()
        } else if kind == SignalType::Function.as_str() {
            problem.names.custom_files.len()
        } else {
            parameters
        };
        if source == 0 || source > source_len {
            sources.push((source, source_len));
        }
        check_field(field, values, parameters, false)?;
    }
    if let Some(&(_, len)) = sources.first() {
        return Err(InputError::IndicesOutOfRange {
            field: field.to_string(),
            values: sources.into_iter().map(|(source, _)| source).collect(),
            len,
        });
    }
    Ok(())
}

fn check_field<'a, I>(field: &str, indices: I, len: usize, optional: bool) -> Result<(), InputError>
where
    I: IntoIterator<Item = &'a usize>,
{
    let bad: Vec<usize> = indices
        .into_iter()
        .copied()
        .filter(|&index| (index == 0 && !optional) || index > len)
        .collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(InputError::IndicesOutOfRange {
            field: field.to_string(),
            values: bad,
            len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::Controls;
    use crate::inputs::build_input;
    use crate::project::Project;

    fn problem() -> ProblemDefinition {
        build_input(&Project::new("Checked"), &Controls::default())
            .unwrap()
            .problem
    }

    #[test]
    fn test_marshalled_problem_passes() {
        assert!(check_indices(&problem()).is_ok());
    }

    #[test]
    fn test_out_of_range_scalefactor() {
        let mut problem = problem();
        problem.contrast_scalefactors = vec![4];
        assert_eq!(
            check_indices(&problem),
            Err(InputError::IndicesOutOfRange {
                field: "contrastScalefactors".to_string(),
                values: vec![4],
                len: 1,
            })
        );
    }

    #[test]
    fn test_zero_only_allowed_for_optional_references() {
        let mut problem = problem();
        problem.contrast_domain_ratios = vec![0];
        problem.contrast_custom_files = vec![0];
        assert!(check_indices(&problem).is_ok());

        problem.contrast_bulk_ins = vec![0];
        assert!(matches!(
            check_indices(&problem),
            Err(InputError::IndicesOutOfRange { ref field, .. }) if field == "contrastBulkIns"
        ));
    }

    #[test]
    fn test_signal_source_checked_against_its_type() {
        let mut problem = problem();
        problem.contrast_background_types = vec!["data".to_string()];
        // One data record exists, so index 1 is still in range.
        assert!(check_indices(&problem).is_ok());

        problem.contrast_background_types = vec!["function".to_string()];
        let err = check_indices(&problem).unwrap_err();
        assert_eq!(
            err,
            InputError::IndicesOutOfRange {
                field: "contrastBackgroundParams".to_string(),
                values: vec![1],
                len: 0,
            }
        );
    }

    #[test]
    fn test_every_bad_value_is_reported() {
        let mut problem = problem();
        problem.contrast_layers = vec![vec![1, 7, 9]];
        let err = check_indices(&problem).unwrap_err();
        assert!(err.to_string().contains("[1, 7, 9]"));
    }
}
