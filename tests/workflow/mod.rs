//! Whole-library round trips.

use approx::assert_relative_eq;
use ratapi_rs::custom::{CustomError, CustomOutput, FunctionRegistry};
use ratapi_rs::inputs::check_indices;
use ratapi_rs::prelude::*;
use ratapi_rs::RatError;
use ndarray::array;
use std::rc::Rc;
use tempfile::tempdir;

use crate::test_helpers::bilayer_project;

#[test]
fn test_marshal_then_copy_back() -> Result<(), RatError> {
    let mut project = bilayer_project();
    let input = build_input(&project, &Controls::new().with_procedure(Procedure::Simplex))?;
    assert_eq!(input.control.procedure, "simplex");
    check_indices(&input.problem)?;

    // Pretend the engine moved every fitted parameter to its upper bound.
    let mut fitted = input.problem.clone();
    fitted.params = input.limits.params.iter().map(|[_, max]| *max).collect();
    update_project(&mut project, &fitted)?;

    assert_relative_eq!(project.parameters()["Head Thickness"].value, 15.0);
    assert_relative_eq!(project.parameters()["Tail SLD"].value, 0.0);
    assert_eq!(project.layers().len(), 3);

    let again = build_input(&project, &Controls::default())?;
    assert_eq!(again.problem.params, fitted.params);
    Ok(())
}

#[test]
fn test_save_and_load_project() -> Result<(), RatError> {
    let project = bilayer_project();
    let dir = tempdir()?;
    let path = dir.path().join("bilayer.json");

    project.save_json(&path)?;
    let loaded = Project::load_json(&path)?;
    assert_eq!(loaded, project);

    let original = build_input(&project, &Controls::default())?;
    let reloaded = build_input(&loaded, &Controls::default())?;
    assert_eq!(reloaded.problem.contrast_layers, original.problem.contrast_layers);
    assert_eq!(reloaded.problem.fit_params, original.problem.fit_params);
    Ok(())
}

#[test]
fn test_hand_edited_file_is_validated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");

    let mut value: serde_json::Value = serde_json::from_str(&bilayer_project().to_json().unwrap()).unwrap();
    value["layers"]["data"][0]["thickness"] = "Missing Thickness".into();
    std::fs::write(&path, value.to_string()).unwrap();

    let err = Project::load_json(&path).unwrap_err();
    assert!(err.validation_errors().is_some());
}

#[test]
fn test_custom_model_handles_are_lazy() {
    let mut project = Project::new("Custom");
    project
        .update(|p| {
            p.set_model(LayerModel::CustomLayers)?;
            p.parameters_mut()
                .append(Parameter::new("Bilayer Thickness", 30.0, 40.0, 50.0, true).unwrap())?;
            p.custom_files_mut()
                .append(CustomFile::new("Bilayer Model", "bilayer.py", "bilayer"))?;
            p.contrasts_mut()
                .update_with(0, |contrast| contrast.model_mut().push("Bilayer Model".to_string()))
        })
        .unwrap();

    let input = build_input(&project, &Controls::default()).unwrap();
    assert_eq!(input.problem.contrast_custom_files, vec![1]);

    let mut registry = FunctionRegistry::new();
    registry.register(
        "bilayer.py",
        "bilayer",
        |params: &[f64], _: &[f64], bulk_out: &[f64], contrast: usize, _: Option<usize>| -> Result<CustomOutput, CustomError> {
            Ok((array![[params[1], bulk_out[contrast - 1], params[0]]], params[0]))
        },
    );
    let handles = input.custom_handles(Rc::new(registry));
    assert!(!handles[0].is_resolved());

    let (layers, roughness) = handles[0]
        .call(&input.problem.params, &input.problem.bulk_ins, &input.problem.bulk_outs, 1, None)
        .unwrap();
    assert!(handles[0].is_resolved());
    assert_relative_eq!(layers[[0, 0]], 40.0);
    assert_relative_eq!(layers[[0, 1]], 6.35e-6);
    assert_relative_eq!(roughness, 3.0);
}
