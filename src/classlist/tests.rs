use super::*;
use crate::models::{Background, Contrast, ContrastRecord, ContrastWithRatio, Parameter};
use serde_json::json;

fn fields(value: serde_json::Value) -> Fields {
    value.as_object().unwrap().clone()
}

fn parameters() -> ClassList<Parameter> {
    ClassList::from_records(vec![
        Parameter::new("Substrate Roughness", 1.0, 3.0, 5.0, true).unwrap(),
        Parameter::new("Oxide Thickness", 5.0, 20.0, 60.0, true).unwrap(),
        Parameter::new("Oxide SLD", 3e-6, 3.41e-6, 4e-6, false).unwrap(),
    ])
    .unwrap()
}

#[test]
fn test_case_insensitive_uniqueness() {
    let mut params = parameters();
    let err = params
        .append(Parameter::fixed("oxide thickness", 10.0))
        .unwrap_err();
    assert_eq!(
        err,
        CollectionError::DuplicateNames {
            names: vec!["oxide thickness".to_string()]
        }
    );
    assert_eq!(params.len(), 3);
}

#[test]
fn test_lookup_by_name() {
    let params = parameters();
    assert!(params.contains("OXIDE SLD"));
    assert_eq!(params["oxide sld"].value, 3.41e-6);
    assert_eq!(params.index("Oxide SLD", false).unwrap(), 2);
    assert_eq!(params.index("Oxide SLD", true).unwrap(), 3);
    assert_eq!(params.count("substrate roughness"), 1);
    assert_eq!(params.count("Bilayer Heads"), 0);
    assert!(matches!(
        params.index("Bilayer Heads", true),
        Err(CollectionError::NameNotFound { .. })
    ));
}

#[test]
fn test_insert_clamps_index() {
    let mut params = parameters();
    params.insert(0, Parameter::fixed("First", 1.0)).unwrap();
    params.insert(99, Parameter::fixed("Last", 1.0)).unwrap();
    let names = params.get_names();
    assert_eq!(names.first().unwrap(), "First");
    assert_eq!(names.last().unwrap(), "Last");
}

#[test]
fn test_insert_checks_record_invariants() {
    let mut params = parameters();
    let mut bad = Parameter::fixed("Bad", 1.0);
    bad.max = 0.0;
    assert!(matches!(
        params.append(bad),
        Err(CollectionError::Record(_))
    ));
    assert_eq!(params.len(), 3);
}

#[test]
fn test_remove_by_name_and_record() {
    let mut params = parameters();
    let removed = params.remove("oxide thickness").unwrap();
    assert_eq!(removed.name, "Oxide Thickness");

    let sld = params["Oxide SLD"].clone();
    params.remove_record(&sld).unwrap();
    assert_eq!(params.get_names(), vec!["Substrate Roughness"]);

    assert!(matches!(
        params.remove("Oxide SLD"),
        Err(CollectionError::NameNotFound { .. })
    ));
    assert_eq!(params.remove_record(&sld), Err(CollectionError::RecordNotFound));
    assert!(matches!(
        params.remove_at(5),
        Err(CollectionError::IndexOutOfRange { index: 5, len: 1 })
    ));
}

#[test]
fn test_extend_checks_combined_collection() {
    let mut params = parameters();

    // Collides with an existing record.
    let err = params
        .extend(vec![Parameter::fixed("New", 1.0), Parameter::fixed("OXIDE SLD", 1.0)])
        .unwrap_err();
    assert!(matches!(err, CollectionError::DuplicateNames { .. }));

    // Collides with another new record.
    let err = params
        .extend(vec![Parameter::fixed("A", 1.0), Parameter::fixed("a", 1.0)])
        .unwrap_err();
    assert!(matches!(err, CollectionError::DuplicateNames { .. }));

    assert_eq!(params.len(), 3);
    params
        .extend(vec![Parameter::fixed("A", 1.0), Parameter::fixed("B", 1.0)])
        .unwrap();
    assert_eq!(params.len(), 5);
}

#[test]
fn test_kind_is_fixed_by_first_record() {
    let mut contrasts: ClassList<ContrastRecord> = ClassList::new();
    assert_eq!(contrasts.class_handle(), None);
    assert_eq!(
        contrasts.append_fields(fields(json!({"name": "D2O"}))),
        Err(CollectionError::KindNotKnown)
    );

    contrasts
        .append(ContrastWithRatio::new("D2O", "", "", "", "", "", "", "").into())
        .unwrap();
    assert_eq!(contrasts.class_handle(), Some(ContrastRecord::WITH_RATIO));

    let err = contrasts
        .append(Contrast::new("H2O", "", "", "", "", "", "").into())
        .unwrap_err();
    assert_eq!(
        err,
        CollectionError::WrongKind {
            expected: "ContrastWithRatio".to_string(),
            found: "Contrast".to_string(),
        }
    );

    // Field-built records take the collection's kind.
    contrasts
        .append_fields(fields(json!({"name": "H2O", "domain_ratio": "Ratio"})))
        .unwrap();
    assert!(contrasts[1].has_ratio());
}

#[test]
fn test_declared_kind() {
    let list = ClassList::<ContrastRecord>::of_kind("Contrast").unwrap();
    assert_eq!(list.class_handle(), Some("Contrast"));
    assert!(matches!(
        ClassList::<ContrastRecord>::of_kind("Layer"),
        Err(CollectionError::UnknownKind { .. })
    ));
}

#[test]
fn test_default_names() {
    let mut params = ClassList::<Parameter>::new();
    params
        .append(Parameter::fixed("New Parameter 1", 0.0))
        .unwrap();
    params.append_fields(Fields::new()).unwrap();
    params.append_fields(fields(json!({"name": ""}))).unwrap();
    assert_eq!(
        params.get_names(),
        vec!["New Parameter 1", "New Parameter 2", "New Parameter 3"]
    );
}

#[test]
fn test_append_fields_rejects_unknown_fields() {
    let mut params = ClassList::<Parameter>::new();
    let err = params
        .append_fields(fields(json!({"name": "A", "colour": "red"})))
        .unwrap_err();
    assert!(matches!(err, CollectionError::Record(_)));
    assert!(params.is_empty());
}

#[test]
fn test_set_fields_rebuilds_record() {
    let mut params = parameters();
    params
        .set_fields(1, fields(json!({"value": 30.0, "fit": false})))
        .unwrap();
    assert_eq!(params[1].value, 30.0);
    assert!(!params[1].fit);
    assert_eq!(params[1].name, "Oxide Thickness");

    // Rebuilding re-runs the bounds check.
    let err = params.set_fields(1, fields(json!({"value": 100.0})));
    assert!(matches!(err, Err(CollectionError::Record(_))));
    assert_eq!(params[1].value, 30.0);

    // Renaming onto another record's name is a duplicate; renaming a record
    // onto its own name in another case is not.
    assert!(params
        .set_fields(1, fields(json!({"name": "oxide sld"})))
        .is_err());
    params
        .set_fields(1, fields(json!({"name": "OXIDE THICKNESS"})))
        .unwrap();
    assert_eq!(params[1].name, "OXIDE THICKNESS");
}

#[test]
fn test_update_with() {
    let mut params = parameters();
    params.update_with(2, |p| p.fit = true).unwrap();
    assert!(params[2].fit);
    assert!(params.update_with(2, |p| p.value = -1.0).is_err());
    assert_eq!(params[2].value, 3.41e-6);
}

#[test]
fn test_get_all_matches() {
    let backgrounds = ClassList::from_records(vec![
        Background::constant("Background 1", "Param A"),
        Background::function("Background 2", "background.py", &["param a", "Param B", "Param A"]),
    ])
    .unwrap();

    assert_eq!(
        backgrounds.get_all_matches("Param A"),
        vec![(0, "source"), (1, "value_1"), (1, "value_3")]
    );
    assert!(backgrounds.get_all_matches("Param C").is_empty());
}

#[test]
fn test_clear_keeps_kind() {
    let mut contrasts = ClassList::<ContrastRecord>::new();
    contrasts
        .append(Contrast::new("D2O", "", "", "", "", "", "").into())
        .unwrap();
    contrasts.clear();
    assert!(contrasts.is_empty());
    assert_eq!(contrasts.class_handle(), Some("Contrast"));
}

#[test]
fn test_serde_round_trip_revalidates() {
    let params = parameters();
    let text = serde_json::to_string(&params).unwrap();
    let back: ClassList<Parameter> = serde_json::from_str(&text).unwrap();
    assert_eq!(back, params);

    let duplicated = json!({
        "data": [
            {"name": "A", "min": 0.0, "value": 1.0, "max": 2.0},
            {"name": "a", "min": 0.0, "value": 1.0, "max": 2.0}
        ],
        "class_handle": "Parameter"
    });
    assert!(serde_json::from_value::<ClassList<Parameter>>(duplicated).is_err());
}

#[test]
fn test_display() {
    let text = parameters().to_string();
    assert!(text.starts_with("Parameter [3 records]"));
    assert!(text.contains("Oxide Thickness"));
}

#[test]
fn test_name_lookup() {
    let params = parameters();
    assert_eq!(params["oxide sld"].value, 3.41e-6);
    assert!(params.get_by_name("Missing").is_none());
}

#[test]
#[should_panic(expected = "no record named \"Missing\"")]
fn test_index_by_missing_name_panics() {
    let params = parameters();
    let _ = &params["Missing"];
}
