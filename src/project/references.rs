//! Which collection each reference field points into.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classlist::Record;
use crate::models::{Background, ContrastRecord, DomainContrast, LayerRecord, Resolution, Signal, SignalType};

/// Identifies one of the collections held by a [`Project`](super::Project)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionId {
    Parameters,
    BulkIn,
    BulkOut,
    Scalefactors,
    DomainRatios,
    BackgroundParameters,
    Backgrounds,
    ResolutionParameters,
    Resolutions,
    CustomFiles,
    Data,
    Layers,
    DomainContrasts,
    Contrasts,
}

impl CollectionId {
    /// Every collection, in the order a project lists them.
    pub const ALL: [CollectionId; 14] = [
        CollectionId::Parameters,
        CollectionId::BulkIn,
        CollectionId::BulkOut,
        CollectionId::Scalefactors,
        CollectionId::DomainRatios,
        CollectionId::BackgroundParameters,
        CollectionId::Backgrounds,
        CollectionId::ResolutionParameters,
        CollectionId::Resolutions,
        CollectionId::CustomFiles,
        CollectionId::Data,
        CollectionId::Layers,
        CollectionId::DomainContrasts,
        CollectionId::Contrasts,
    ];

    /// The field name of the collection on a project.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionId::Parameters => "parameters",
            CollectionId::BulkIn => "bulk_in",
            CollectionId::BulkOut => "bulk_out",
            CollectionId::Scalefactors => "scalefactors",
            CollectionId::DomainRatios => "domain_ratios",
            CollectionId::BackgroundParameters => "background_parameters",
            CollectionId::Backgrounds => "backgrounds",
            CollectionId::ResolutionParameters => "resolution_parameters",
            CollectionId::Resolutions => "resolutions",
            CollectionId::CustomFiles => "custom_files",
            CollectionId::Data => "data",
            CollectionId::Layers => "layers",
            CollectionId::DomainContrasts => "domain_contrasts",
            CollectionId::Contrasts => "contrasts",
        }
    }

    /// Whether the collection holds parameters.
    pub fn is_parameters(&self) -> bool {
        super::PARAMETER_COLLECTIONS.contains(self)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reference held by a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    pub field: &'static str,
    pub target: CollectionId,
    pub value: &'a str,
}

/// Records whose text fields name records of other collections.
///
/// `model_target` is the collection a contrast `model` currently points
/// into, or `None` when contrast models cannot reference anything.
pub trait References: Record {
    /// Target collection of `field`, or `None` if it is not a reference.
    fn reference_target(&self, field: &str, model_target: Option<CollectionId>) -> Option<CollectionId>;

    /// Every reference field with its current value, empty ones included.
    fn references(&self, model_target: Option<CollectionId>) -> Vec<Reference<'_>> {
        self.text_fields()
            .into_iter()
            .filter_map(|(field, value)| {
                self.reference_target(field, model_target)
                    .map(|target| Reference { field, target, value })
            })
            .collect()
    }
}

fn signal_target(signal: &Signal, field: &str, parameters: CollectionId) -> Option<CollectionId> {
    match (field, signal.signal_type) {
        ("source", SignalType::Constant) => Some(parameters),
        ("source", SignalType::Data) => Some(CollectionId::Data),
        ("source", SignalType::Function) => Some(CollectionId::CustomFiles),
        (value, SignalType::Data | SignalType::Function) if value.starts_with("value_") => {
            Some(parameters)
        }
        _ => None,
    }
}

impl References for Background {
    fn reference_target(&self, field: &str, _: Option<CollectionId>) -> Option<CollectionId> {
        signal_target(self, field, CollectionId::BackgroundParameters)
    }
}

impl References for Resolution {
    fn reference_target(&self, field: &str, _: Option<CollectionId>) -> Option<CollectionId> {
        signal_target(self, field, CollectionId::ResolutionParameters)
    }
}

impl References for LayerRecord {
    fn reference_target(&self, field: &str, _: Option<CollectionId>) -> Option<CollectionId> {
        match field {
            "name" => None,
            _ => Some(CollectionId::Parameters),
        }
    }
}

impl References for DomainContrast {
    fn reference_target(&self, field: &str, _: Option<CollectionId>) -> Option<CollectionId> {
        (field == "model").then_some(CollectionId::Layers)
    }
}

impl References for ContrastRecord {
    fn reference_target(&self, field: &str, model_target: Option<CollectionId>) -> Option<CollectionId> {
        match field {
            "data" => Some(CollectionId::Data),
            "background" => Some(CollectionId::Backgrounds),
            "bulk_in" => Some(CollectionId::BulkIn),
            "bulk_out" => Some(CollectionId::BulkOut),
            "scalefactor" => Some(CollectionId::Scalefactors),
            "resolution" => Some(CollectionId::Resolutions),
            "domain_ratio" => Some(CollectionId::DomainRatios),
            "model" => model_target,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contrast, Layer};

    #[test]
    fn test_signal_targets_follow_type() {
        let constant = Background::constant("B", "Param");
        assert_eq!(
            constant.references(None),
            vec![Reference {
                field: "source",
                target: CollectionId::BackgroundParameters,
                value: "Param"
            }]
        );

        let data = Resolution::data("R", "D2O Data", Some("Offset"));
        let targets: Vec<_> = data
            .references(None)
            .into_iter()
            .filter(|r| !r.value.is_empty())
            .map(|r| (r.field, r.target))
            .collect();
        assert_eq!(
            targets,
            vec![
                ("source", CollectionId::Data),
                ("value_1", CollectionId::ResolutionParameters)
            ]
        );

        let function = Background::function("F", "bg.py", &["A"]);
        assert_eq!(
            function.reference_target("source", None),
            Some(CollectionId::CustomFiles)
        );
    }

    #[test]
    fn test_layer_and_contrast_targets() {
        let layer = LayerRecord::from(Layer::new("Oxide", "T", "S", "R"));
        assert_eq!(layer.references(None).len(), 4);
        assert_eq!(layer.reference_target("name", None), None);

        let contrast = ContrastRecord::from(Contrast::new("C", "D", "B", "I", "O", "S", "R").with_model(&["L"]));
        assert_eq!(
            contrast.reference_target("model", Some(CollectionId::Layers)),
            Some(CollectionId::Layers)
        );
        assert_eq!(contrast.reference_target("model", None), None);
        assert_eq!(contrast.references(None).len(), 6);
    }
}
