//! Properties every valid project and every marshalled input must keep.

use ratapi_rs::prelude::*;
use ratapi_rs::project::{ValidationErrorKind, PARAMETER_COLLECTIONS, SUBSTRATE_ROUGHNESS};
use serde_json::json;
use std::collections::HashSet;

use crate::test_helpers::{bilayer_project, fields, oxide_project};

#[test]
fn test_names_stay_unique_ignoring_case() {
    let mut project = oxide_project();
    let duplicate = Parameter::new("OXIDE thickness", 0.0, 1.0, 2.0, false).unwrap();
    assert!(project.parameters_mut().append(duplicate).is_err());

    for id in CollectionId::ALL {
        let names: HashSet<String> = project.names(id).iter().map(|name| name.to_lowercase()).collect();
        assert_eq!(names.len(), project.len_of(id), "duplicate names in {}", id);
    }
}

#[test]
fn test_every_reference_resolves() {
    let project = bilayer_project();
    for contrast in project.contrasts().iter() {
        assert!(project.contains(CollectionId::Data, contrast.data()));
        assert!(project.contains(CollectionId::Backgrounds, contrast.background()));
        assert!(project.contains(CollectionId::BulkIn, contrast.bulk_in()));
        assert!(project.contains(CollectionId::BulkOut, contrast.bulk_out()));
        assert!(project.contains(CollectionId::Scalefactors, contrast.scalefactor()));
        assert!(project.contains(CollectionId::Resolutions, contrast.resolution()));
        for layer in contrast.model() {
            assert!(project.contains(CollectionId::Layers, layer));
        }
    }
    for layer in project.layers().iter() {
        for (_, value) in layer.parameter_fields() {
            assert!(value.is_empty() || project.contains(CollectionId::Parameters, value));
        }
    }
}

#[test]
fn test_failed_mutations_leave_project_unchanged() {
    let mut project = bilayer_project();
    let before = project.clone();

    // Unknown layer in a contrast model.
    assert!(project
        .contrasts_mut()
        .set_fields(0, fields(json!({"model": ["Oxide", "Missing"]})))
        .is_err());
    // Parameter still referenced by a layer.
    assert!(project.parameters_mut().remove("Head SLD").is_err());
    // Duplicate name.
    assert!(project
        .layers_mut()
        .append(Layer::new("head", "Head Thickness", "Head SLD", "").into())
        .is_err());
    // A failing step late in a multi-step update.
    assert!(project
        .update(|p| {
            p.parameters_mut()
                .append(Parameter::new("Extra", 0.0, 1.0, 2.0, true).unwrap())?;
            p.bulk_in_mut().clear()
        })
        .is_err());

    assert_eq!(project, before);
}

#[test]
fn test_protected_parameter_survives_every_path() {
    let mut project = oxide_project();
    let before = project.clone();

    let mut removals: Vec<Result<(), ProjectError>> = Vec::new();
    removals.push(project.parameters_mut().remove(SUBSTRATE_ROUGHNESS).map(|_| ()));
    removals.push(project.parameters_mut().remove_at(0).map(|_| ()));
    removals.push(project.parameters_mut().clear());
    removals.push(project.update(|p| {
        p.parameters_mut().clear()?;
        p.parameters_mut()
            .extend([Parameter::new("Replacement", 0.0, 1.0, 2.0, true).unwrap()])
    }));
    removals.push(
        project
            .parameters_mut()
            .set_fields(0, fields(json!({"name": "Renamed Roughness"}))),
    );
    removals.push(
        project
            .parameters_mut()
            .update_with(0, |param| param.protected = false),
    );

    for outcome in removals {
        let err = outcome.unwrap_err();
        assert!(
            err.validation_errors()
                .is_some_and(|errors| errors.contains_kind(ValidationErrorKind::Protected)),
            "unexpected error: {}",
            err
        );
    }
    assert_eq!(project, before);
}

#[test]
fn test_rename_round_trip() {
    let mut project = bilayer_project();
    let original = project.clone();
    let index = project.parameters().index("Head Thickness", false).unwrap();

    project
        .parameters_mut()
        .set_fields(index, fields(json!({"name": "Headgroup Thickness"})))
        .unwrap();
    let LayerRecord::Layer(head) = &project.layers()["Head"] else {
        panic!("expected a plain layer");
    };
    assert_eq!(head.thickness, "Headgroup Thickness");
    assert_eq!(head.sld, "Head SLD");
    assert!(project.parameters().contains("Headgroup Thickness"));

    project
        .parameters_mut()
        .set_fields(index, fields(json!({"name": "Head Thickness"})))
        .unwrap();
    assert_eq!(project, original);
}

#[test]
fn test_marshalled_indices_match_collection_order() {
    let project = bilayer_project();
    let input = build_input(&project, &Controls::default()).unwrap();

    for (position, name) in project.parameters().get_names().iter().enumerate() {
        assert_eq!(project.parameters().index(name, true).unwrap(), position + 1);
    }

    let tail_thickness = project.parameters().index("Tail Thickness", true).unwrap();
    let tail = project.layers().index("Tail", true).unwrap();
    assert_eq!(input.problem.layers_details[tail - 1][0], tail_thickness as f64);

    let h2o = project.bulk_out().index("SLD H2O", true).unwrap();
    assert_eq!(input.problem.contrast_bulk_outs, vec![1, h2o]);
    assert_eq!(input.problem.contrast_layers[1], vec![1, 2, 3, 2]);
}

#[test]
fn test_fit_partition_is_complete() {
    let project = bilayer_project();
    let problem = build_input(&project, &Controls::default()).unwrap().problem;

    let total: usize = PARAMETER_COLLECTIONS.iter().map(|&id| project.len_of(id)).sum();
    assert_eq!(problem.fit_params.len() + problem.other_params.len(), total);

    let fitted: Vec<f64> = project
        .all_parameters()
        .filter(|(_, param)| param.fit)
        .map(|(_, param)| param.value)
        .collect();
    assert_eq!(problem.fit_params, fitted);
    assert_eq!(problem.fit_params.len(), problem.checks.fitted());
}
