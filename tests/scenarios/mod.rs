//! Worked examples of building, changing and marshalling projects.

use ratapi_rs::prelude::*;
use ratapi_rs::project::{ValidationErrorKind, SUBSTRATE_ROUGHNESS};
use serde_json::json;

use crate::test_helpers::{fields, oxide_project};

#[test]
fn test_default_project_has_protected_roughness() {
    let project = Project::new("Default");
    assert_eq!(project.parameters().get_names(), vec![SUBSTRATE_ROUGHNESS]);

    let roughness = &project.parameters()[SUBSTRATE_ROUGHNESS];
    assert!(roughness.fit);
    assert!(roughness.protected);
    assert_eq!(roughness.min, 1.0);
    assert_eq!(roughness.value, 3.0);
    assert_eq!(roughness.max, 5.0);
}

#[test]
fn test_appended_parameter_index() {
    let mut project = Project::new("Append");
    project
        .parameters_mut()
        .append(Parameter::new("Oxide Thickness", 5.0, 20.0, 60.0, true).unwrap())
        .unwrap();

    assert_eq!(project.parameters().index("Oxide Thickness", true).unwrap(), 2);
    assert_eq!(project.index_of(CollectionId::Parameters, "oxide thickness"), Some(2));
}

#[test]
fn test_removing_substrate_roughness_fails() {
    let mut project = oxide_project();
    let names = project.parameters().get_names();

    let err = project.parameters_mut().remove(SUBSTRATE_ROUGHNESS).unwrap_err();
    assert!(err
        .validation_errors()
        .is_some_and(|errors| errors.contains_kind(ValidationErrorKind::Protected)));
    assert_eq!(project.parameters().get_names(), names);
}

#[test]
fn test_background_value_must_resolve() {
    let mut project = Project::new("Background");
    project
        .backgrounds_mut()
        .append(Background::data("Data Background", "Simulation", Some("Background Param 1")))
        .unwrap();

    let err = project
        .backgrounds_mut()
        .set_fields(1, fields(json!({"value_1": "Missing Offset"})))
        .unwrap_err();

    let errors = err.validation_errors().unwrap();
    assert!(errors.contains_kind(ValidationErrorKind::CrossReference));
    let offending = errors.iter().next().unwrap();
    assert_eq!(offending.collection, CollectionId::Backgrounds);
    assert_eq!(offending.field, "value_1");
    assert_eq!(offending.value, "Missing Offset");

    assert_eq!(project.backgrounds()[1].value_1, "Background Param 1");
}

#[test]
fn test_domains_contrast_layers() {
    let mut project = oxide_project();
    project
        .update(|p| {
            p.set_calculation(Calculation::Domains)?;
            p.domain_contrasts_mut().extend([
                DomainContrast::new("Domain 1", &["Oxide"]),
                DomainContrast::new("Domain 2", &["Oxide", "Oxide"]),
            ])?;
            p.contrasts_mut().update_with(0, |contrast| {
                *contrast.model_mut() = vec!["Domain 1".to_string(), "Domain 2".to_string()];
            })
        })
        .unwrap();

    let input = build_input(&project, &Controls::default()).unwrap();
    assert_eq!(input.problem.contrast_layers[0], vec![1, 2]);
    assert_eq!(input.problem.number_of_domain_contrasts, 2);
    assert_eq!(input.problem.domain_contrast_layers, vec![vec![1], vec![1, 1]]);
}

#[test]
fn test_absorption_converts_layers() {
    let mut project = oxide_project();
    let before = project.layers()[0].clone();
    project.set_absorption(true).unwrap();

    assert_eq!(project.layers().class_handle(), Some(LayerRecord::ABSORPTION));
    let (LayerRecord::Layer(old), LayerRecord::Absorption(new)) = (&before, &project.layers()[0]) else {
        panic!("expected a plain layer converted to an absorption layer");
    };
    assert_eq!(new.thickness, old.thickness);
    assert_eq!(new.roughness, old.roughness);
    assert_eq!(new.sld_real, old.sld);
    assert!(new.sld_imaginary.is_empty());
}
