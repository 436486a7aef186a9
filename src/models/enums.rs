//! Enumerations shared by records, projects and the engine input.
//!
//! Serialised names follow the strings the numerical engine and saved
//! projects use (`"standard layers"`, `"air/substrate"`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prior distribution attached to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorType {
    #[default]
    Uniform,
    Gaussian,
}

impl PriorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorType::Uniform => "uniform",
            PriorType::Gaussian => "gaussian",
        }
    }

    /// Numeric code used in the engine's prior table.
    pub fn code(&self) -> f64 {
        match self {
            PriorType::Uniform => 1.0,
            PriorType::Gaussian => 2.0,
        }
    }
}

/// How a background or resolution is specified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    #[default]
    Constant,
    Data,
    Function,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Constant => "constant",
            SignalType::Data => "data",
            SignalType::Function => "function",
        }
    }

    /// Number of `value_N` fields that may be filled for this type.
    pub fn value_slots(&self) -> usize {
        match self {
            SignalType::Constant => 0,
            SignalType::Data => 1,
            SignalType::Function => 5,
        }
    }
}

/// Whether a contrast's background is added to or subtracted from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundAction {
    #[default]
    Add,
    Subtract,
}

impl BackgroundAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackgroundAction::Add => "add",
            BackgroundAction::Subtract => "subtract",
        }
    }
}

/// Bulk phase a hydrated layer is filled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HydrateWith {
    #[serde(rename = "bulk in")]
    BulkIn,
    #[default]
    #[serde(rename = "bulk out")]
    BulkOut,
    #[serde(rename = "none")]
    Unhydrated,
}

impl HydrateWith {
    pub fn as_str(&self) -> &'static str {
        match self {
            HydrateWith::BulkIn => "bulk in",
            HydrateWith::BulkOut => "bulk out",
            HydrateWith::Unhydrated => "none",
        }
    }

    /// Code the engine expects in a layer's detail row.
    pub fn code(&self) -> f64 {
        match self {
            HydrateWith::Unhydrated => 0.0,
            HydrateWith::BulkIn => 1.0,
            HydrateWith::BulkOut => 2.0,
        }
    }
}

/// Language a custom model function is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    Matlab,
    Cpp,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Matlab => "matlab",
            Language::Cpp => "cpp",
        }
    }

    /// Infer the language from a file extension, if recognised.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "py" => Some(Language::Python),
            "m" => Some(Language::Matlab),
            "dll" | "so" | "dylib" => Some(Language::Cpp),
            _ => None,
        }
    }
}

/// Calculation mode of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Calculation {
    #[default]
    Normal,
    Domains,
}

impl Calculation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Calculation::Normal => "normal",
            Calculation::Domains => "domains",
        }
    }
}

/// How the sample structure of a project is described
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayerModel {
    #[default]
    #[serde(rename = "standard layers")]
    StandardLayers,
    #[serde(rename = "custom layers")]
    CustomLayers,
    #[serde(rename = "custom xy")]
    CustomXY,
}

impl LayerModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerModel::StandardLayers => "standard layers",
            LayerModel::CustomLayers => "custom layers",
            LayerModel::CustomXY => "custom xy",
        }
    }

    pub fn is_custom(&self) -> bool {
        !matches!(self, LayerModel::StandardLayers)
    }
}

/// Which side of the sample the beam enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Geometry {
    #[default]
    #[serde(rename = "air/substrate")]
    AirSubstrate,
    #[serde(rename = "substrate/liquid")]
    SubstrateLiquid,
}

impl Geometry {
    pub fn as_str(&self) -> &'static str {
        match self {
            Geometry::AirSubstrate => "air/substrate",
            Geometry::SubstrateLiquid => "substrate/liquid",
        }
    }
}

macro_rules! display_as_str {
    ($($kind:ty),*) => {
        $(
            impl fmt::Display for $kind {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(
    PriorType,
    SignalType,
    BackgroundAction,
    HydrateWith,
    Language,
    Calculation,
    LayerModel,
    Geometry
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialised_names() {
        assert_eq!(
            serde_json::to_string(&LayerModel::CustomXY).unwrap(),
            "\"custom xy\""
        );
        assert_eq!(
            serde_json::from_str::<HydrateWith>("\"bulk in\"").unwrap(),
            HydrateWith::BulkIn
        );
        assert_eq!(Geometry::SubstrateLiquid.to_string(), "substrate/liquid");
    }

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("PY"), Some(Language::Python));
        assert_eq!(Language::from_extension("m"), Some(Language::Matlab));
        assert_eq!(Language::from_extension("so"), Some(Language::Cpp));
        assert_eq!(Language::from_extension("txt"), None);
    }
}
