//! Layers of a standard-layers model
//!
//! A project uses exactly one layer shape: [`Layer`] when absorption is off,
//! [`AbsorptionLayer`] (real and imaginary SLD) when it is on. Both live in the
//! project as a [`LayerRecord`], and converting between the shapes keeps every
//! shared reference.

use serde::{Deserialize, Serialize};

use crate::classlist::{names_match, Fields, Record};
use crate::models::enums::HydrateWith;
use crate::models::RecordError;

/// A layer defined by parameter references
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layer {
    pub name: String,
    pub thickness: String,
    #[serde(rename = "SLD")]
    pub sld: String,
    pub roughness: String,
    /// Optional; empty means the layer is not hydrated
    pub hydration: String,
    pub hydrate_with: HydrateWith,
}

/// A layer with a complex scattering length density
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AbsorptionLayer {
    pub name: String,
    pub thickness: String,
    #[serde(rename = "SLD_real")]
    pub sld_real: String,
    #[serde(rename = "SLD_imaginary")]
    pub sld_imaginary: String,
    pub roughness: String,
    pub hydration: String,
    pub hydrate_with: HydrateWith,
}

impl Layer {
    /// Create an unhydrated layer from parameter names.
    ///
    /// # Examples
    ///
    /// ```
    /// use ratapi_rs::models::Layer;
    ///
    /// let layer = Layer::new("Oxide", "Oxide Thickness", "Oxide SLD", "Substrate Roughness");
    /// assert_eq!(layer.sld, "Oxide SLD");
    /// assert!(layer.hydration.is_empty());
    /// ```
    pub fn new(name: &str, thickness: &str, sld: &str, roughness: &str) -> Self {
        Self {
            name: name.to_string(),
            thickness: thickness.to_string(),
            sld: sld.to_string(),
            roughness: roughness.to_string(),
            ..Self::default()
        }
    }

    /// Hydrate the layer with `hydration`, filled from `hydrate_with`.
    pub fn with_hydration(mut self, hydration: &str, hydrate_with: HydrateWith) -> Self {
        self.hydration = hydration.to_string();
        self.hydrate_with = hydrate_with;
        self
    }

    /// Convert to the absorption shape; the imaginary SLD starts empty.
    pub fn into_absorption(self) -> AbsorptionLayer {
        AbsorptionLayer {
            name: self.name,
            thickness: self.thickness,
            sld_real: self.sld,
            sld_imaginary: String::new(),
            roughness: self.roughness,
            hydration: self.hydration,
            hydrate_with: self.hydrate_with,
        }
    }
}

impl AbsorptionLayer {
    pub fn new(
        name: &str,
        thickness: &str,
        sld_real: &str,
        sld_imaginary: &str,
        roughness: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            thickness: thickness.to_string(),
            sld_real: sld_real.to_string(),
            sld_imaginary: sld_imaginary.to_string(),
            roughness: roughness.to_string(),
            ..Self::default()
        }
    }

    pub fn with_hydration(mut self, hydration: &str, hydrate_with: HydrateWith) -> Self {
        self.hydration = hydration.to_string();
        self.hydrate_with = hydrate_with;
        self
    }

    /// Convert to the plain shape, dropping the imaginary SLD.
    pub fn into_standard(self) -> Layer {
        Layer {
            name: self.name,
            thickness: self.thickness,
            sld: self.sld_real,
            roughness: self.roughness,
            hydration: self.hydration,
            hydrate_with: self.hydrate_with,
        }
    }
}

/// Either layer shape, as stored by a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerRecord {
    Layer(Layer),
    Absorption(AbsorptionLayer),
}

impl From<Layer> for LayerRecord {
    fn from(layer: Layer) -> Self {
        LayerRecord::Layer(layer)
    }
}

impl From<AbsorptionLayer> for LayerRecord {
    fn from(layer: AbsorptionLayer) -> Self {
        LayerRecord::Absorption(layer)
    }
}

impl LayerRecord {
    pub const STANDARD: &'static str = "Layer";
    pub const ABSORPTION: &'static str = "AbsorptionLayer";

    pub fn name(&self) -> &str {
        match self {
            LayerRecord::Layer(layer) => &layer.name,
            LayerRecord::Absorption(layer) => &layer.name,
        }
    }

    pub fn hydration(&self) -> &str {
        match self {
            LayerRecord::Layer(layer) => &layer.hydration,
            LayerRecord::Absorption(layer) => &layer.hydration,
        }
    }

    pub fn hydrate_with(&self) -> HydrateWith {
        match self {
            LayerRecord::Layer(layer) => layer.hydrate_with,
            LayerRecord::Absorption(layer) => layer.hydrate_with,
        }
    }

    pub fn is_absorption(&self) -> bool {
        matches!(self, LayerRecord::Absorption(_))
    }

    /// Parameter references in engine order: thickness, SLD (real, imaginary),
    /// roughness. Hydration is reported separately.
    pub fn parameter_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            LayerRecord::Layer(layer) => vec![
                ("thickness", layer.thickness.as_str()),
                ("SLD", layer.sld.as_str()),
                ("roughness", layer.roughness.as_str()),
            ],
            LayerRecord::Absorption(layer) => vec![
                ("thickness", layer.thickness.as_str()),
                ("SLD_real", layer.sld_real.as_str()),
                ("SLD_imaginary", layer.sld_imaginary.as_str()),
                ("roughness", layer.roughness.as_str()),
            ],
        }
    }

    /// This record in the absorption shape.
    pub fn to_absorption(self) -> Self {
        match self {
            LayerRecord::Layer(layer) => LayerRecord::Absorption(layer.into_absorption()),
            absorption => absorption,
        }
    }

    /// This record in the plain shape.
    pub fn to_standard(self) -> Self {
        match self {
            LayerRecord::Absorption(layer) => LayerRecord::Layer(layer.into_standard()),
            standard => standard,
        }
    }

    fn field_mut(&mut self, field: &str) -> Option<&mut String> {
        match self {
            LayerRecord::Layer(layer) => match field {
                "name" => Some(&mut layer.name),
                "thickness" => Some(&mut layer.thickness),
                "SLD" => Some(&mut layer.sld),
                "roughness" => Some(&mut layer.roughness),
                "hydration" => Some(&mut layer.hydration),
                _ => None,
            },
            LayerRecord::Absorption(layer) => match field {
                "name" => Some(&mut layer.name),
                "thickness" => Some(&mut layer.thickness),
                "SLD_real" => Some(&mut layer.sld_real),
                "SLD_imaginary" => Some(&mut layer.sld_imaginary),
                "roughness" => Some(&mut layer.roughness),
                "hydration" => Some(&mut layer.hydration),
                _ => None,
            },
        }
    }
}

impl Record for LayerRecord {
    const KINDS: &'static [&'static str] = &[Self::STANDARD, Self::ABSORPTION];
    const DEFAULT_NAME: &'static str = "New Layer";

    fn kind(&self) -> &'static str {
        match self {
            LayerRecord::Layer(_) => Self::STANDARD,
            LayerRecord::Absorption(_) => Self::ABSORPTION,
        }
    }

    fn name(&self) -> Option<&str> {
        Some(LayerRecord::name(self))
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("name", LayerRecord::name(self))];
        fields.extend(self.parameter_fields());
        fields.push(("hydration", self.hydration()));
        fields
    }

    fn replace_text(&mut self, field: &str, old: &str, new: &str) -> bool {
        match self.field_mut(field) {
            Some(text) if names_match(text, old) => {
                *text = new.to_string();
                true
            }
            _ => false,
        }
    }

    fn parse_fields(kind: &str, fields: Fields) -> Result<Self, RecordError> {
        let value = serde_json::Value::Object(fields);
        let parsed = match kind {
            Self::ABSORPTION => serde_json::from_value(value).map(LayerRecord::Absorption),
            _ => serde_json::from_value(value).map(LayerRecord::Layer),
        };
        parsed.map_err(|err| RecordError::InvalidFields {
            kind: kind.to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_conversion_keeps_references() {
        let layer = Layer::new("Oxide", "Oxide Thickness", "Oxide SLD", "Oxide Roughness")
            .with_hydration("Oxide Hydration", HydrateWith::BulkIn);
        let converted = LayerRecord::from(layer.clone()).to_absorption();

        match &converted {
            LayerRecord::Absorption(absorption) => {
                assert_eq!(absorption.thickness, "Oxide Thickness");
                assert_eq!(absorption.sld_real, "Oxide SLD");
                assert_eq!(absorption.sld_imaginary, "");
                assert_eq!(absorption.roughness, "Oxide Roughness");
                assert_eq!(absorption.hydration, "Oxide Hydration");
                assert_eq!(absorption.hydrate_with, HydrateWith::BulkIn);
            }
            other => panic!("expected an absorption layer, got {:?}", other),
        }

        assert_eq!(converted.to_standard(), LayerRecord::Layer(layer));
    }

    #[test]
    fn test_parse_fields_by_kind() {
        let fields = json!({"name": "Heads", "SLD_real": "Heads SLD"})
            .as_object()
            .unwrap()
            .clone();
        let record = LayerRecord::from_fields(LayerRecord::ABSORPTION, fields.clone()).unwrap();
        assert!(record.is_absorption());

        // The plain shape has no real/imaginary split.
        assert!(LayerRecord::from_fields(LayerRecord::STANDARD, fields).is_err());
    }

    #[test]
    fn test_untagged_round_trip() {
        let record = LayerRecord::from(AbsorptionLayer::new("Tails", "T", "R", "I", "Rough"));
        let text = serde_json::to_string(&record).unwrap();
        let back: LayerRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);

        let record = LayerRecord::from(Layer::new("Tails", "T", "SLD", "Rough"));
        let text = serde_json::to_string(&record).unwrap();
        let back: LayerRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_text_fields_in_engine_order() {
        let record = LayerRecord::from(Layer::new("Tails", "T", "SLD", "Rough"));
        let fields: Vec<_> = record.text_fields().into_iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["name", "thickness", "SLD", "roughness", "hydration"]);
    }
}
