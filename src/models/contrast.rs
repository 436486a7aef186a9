//! Contrasts: one measurement condition of the sample
//!
//! A contrast ties a data record to the background, resolution, bulk phases
//! and scalefactor used to simulate it, and to a `model`. What `model` names
//! depends on the project:
//!
//! - standard layers, normal calculation: layers
//! - standard layers, domains calculation: exactly two domain contrasts
//! - custom models: at most one custom file
//!
//! In domains mode every contrast also carries a `domain_ratio`, which is why
//! a project stores contrasts as a [`ContrastRecord`].

use serde::{Deserialize, Serialize};

use crate::classlist::{names_match, Fields, Record};
use crate::models::domain_contrast::replace_in_list;
use crate::models::enums::BackgroundAction;
use crate::models::RecordError;

/// A contrast used outside domains mode
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Contrast {
    pub name: String,
    pub data: String,
    pub background: String,
    pub background_action: BackgroundAction,
    pub bulk_in: String,
    pub bulk_out: String,
    pub scalefactor: String,
    pub resolution: String,
    pub resample: bool,
    pub model: Vec<String>,
}

/// A contrast mixing two domains through a domain ratio parameter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContrastWithRatio {
    pub name: String,
    pub data: String,
    pub background: String,
    pub background_action: BackgroundAction,
    pub bulk_in: String,
    pub bulk_out: String,
    pub scalefactor: String,
    pub resolution: String,
    pub resample: bool,
    pub domain_ratio: String,
    pub model: Vec<String>,
}

impl Contrast {
    /// Create a contrast with an empty model.
    ///
    /// # Examples
    ///
    /// ```
    /// use ratapi_rs::models::Contrast;
    ///
    /// let contrast = Contrast::new("D2O", "D2O Data", "Background 1", "SLD Air", "SLD D2O",
    ///     "Scalefactor 1", "Resolution 1")
    ///     .with_model(&["Oxide", "Water"]);
    /// assert_eq!(contrast.model, vec!["Oxide", "Water"]);
    /// ```
    pub fn new(
        name: &str,
        data: &str,
        background: &str,
        bulk_in: &str,
        bulk_out: &str,
        scalefactor: &str,
        resolution: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            data: data.to_string(),
            background: background.to_string(),
            bulk_in: bulk_in.to_string(),
            bulk_out: bulk_out.to_string(),
            scalefactor: scalefactor.to_string(),
            resolution: resolution.to_string(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: &[&str]) -> Self {
        self.model = model.iter().map(|entry| entry.to_string()).collect();
        self
    }

    pub fn with_background_action(mut self, action: BackgroundAction) -> Self {
        self.background_action = action;
        self
    }

    pub fn with_resample(mut self, resample: bool) -> Self {
        self.resample = resample;
        self
    }

    /// Convert to the domains shape with the given ratio parameter.
    pub fn into_with_ratio(self, domain_ratio: &str) -> ContrastWithRatio {
        ContrastWithRatio {
            name: self.name,
            data: self.data,
            background: self.background,
            background_action: self.background_action,
            bulk_in: self.bulk_in,
            bulk_out: self.bulk_out,
            scalefactor: self.scalefactor,
            resolution: self.resolution,
            resample: self.resample,
            domain_ratio: domain_ratio.to_string(),
            model: self.model,
        }
    }
}

impl ContrastWithRatio {
    /// Create a domains contrast; the model starts empty.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        data: &str,
        background: &str,
        bulk_in: &str,
        bulk_out: &str,
        scalefactor: &str,
        resolution: &str,
        domain_ratio: &str,
    ) -> Self {
        Contrast::new(
            name,
            data,
            background,
            bulk_in,
            bulk_out,
            scalefactor,
            resolution,
        )
        .into_with_ratio(domain_ratio)
    }

    pub fn with_model(mut self, model: &[&str]) -> Self {
        self.model = model.iter().map(|entry| entry.to_string()).collect();
        self
    }

    /// Convert to the plain shape, dropping the domain ratio.
    pub fn into_contrast(self) -> Contrast {
        Contrast {
            name: self.name,
            data: self.data,
            background: self.background,
            background_action: self.background_action,
            bulk_in: self.bulk_in,
            bulk_out: self.bulk_out,
            scalefactor: self.scalefactor,
            resolution: self.resolution,
            resample: self.resample,
            model: self.model,
        }
    }
}

/// Either contrast shape, as stored by a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContrastRecord {
    Contrast(Contrast),
    WithRatio(ContrastWithRatio),
}

impl From<Contrast> for ContrastRecord {
    fn from(contrast: Contrast) -> Self {
        ContrastRecord::Contrast(contrast)
    }
}

impl From<ContrastWithRatio> for ContrastRecord {
    fn from(contrast: ContrastWithRatio) -> Self {
        ContrastRecord::WithRatio(contrast)
    }
}

/// Apply the same expression to whichever shape is stored.
macro_rules! either {
    ($record:expr, $contrast:ident => $body:expr) => {
        match $record {
            ContrastRecord::Contrast($contrast) => $body,
            ContrastRecord::WithRatio($contrast) => $body,
        }
    };
}

impl ContrastRecord {
    pub const STANDARD: &'static str = "Contrast";
    pub const WITH_RATIO: &'static str = "ContrastWithRatio";

    pub fn name(&self) -> &str {
        either!(self, c => &c.name)
    }

    pub fn data(&self) -> &str {
        either!(self, c => &c.data)
    }

    pub fn background(&self) -> &str {
        either!(self, c => &c.background)
    }

    pub fn background_action(&self) -> BackgroundAction {
        either!(self, c => c.background_action)
    }

    pub fn bulk_in(&self) -> &str {
        either!(self, c => &c.bulk_in)
    }

    pub fn bulk_out(&self) -> &str {
        either!(self, c => &c.bulk_out)
    }

    pub fn scalefactor(&self) -> &str {
        either!(self, c => &c.scalefactor)
    }

    pub fn resolution(&self) -> &str {
        either!(self, c => &c.resolution)
    }

    pub fn resample(&self) -> bool {
        either!(self, c => c.resample)
    }

    /// The domain ratio reference; `None` for the plain shape.
    pub fn domain_ratio(&self) -> Option<&str> {
        match self {
            ContrastRecord::Contrast(_) => None,
            ContrastRecord::WithRatio(contrast) => Some(&contrast.domain_ratio),
        }
    }

    pub fn model(&self) -> &[String] {
        either!(self, c => &c.model)
    }

    pub fn model_mut(&mut self) -> &mut Vec<String> {
        either!(self, c => &mut c.model)
    }

    pub fn has_ratio(&self) -> bool {
        matches!(self, ContrastRecord::WithRatio(_))
    }

    /// This record in the domains shape; a new ratio reference is `domain_ratio`.
    pub fn to_with_ratio(self, domain_ratio: &str) -> Self {
        match self {
            ContrastRecord::Contrast(contrast) => {
                ContrastRecord::WithRatio(contrast.into_with_ratio(domain_ratio))
            }
            with_ratio => with_ratio,
        }
    }

    /// This record in the plain shape.
    pub fn to_standard(self) -> Self {
        match self {
            ContrastRecord::WithRatio(contrast) => ContrastRecord::Contrast(contrast.into_contrast()),
            standard => standard,
        }
    }

    fn field_mut(&mut self, field: &str) -> Option<&mut String> {
        if field == "domain_ratio" {
            return match self {
                ContrastRecord::WithRatio(contrast) => Some(&mut contrast.domain_ratio),
                ContrastRecord::Contrast(_) => None,
            };
        }
        either!(self, c => match field {
            "name" => Some(&mut c.name),
            "data" => Some(&mut c.data),
            "background" => Some(&mut c.background),
            "bulk_in" => Some(&mut c.bulk_in),
            "bulk_out" => Some(&mut c.bulk_out),
            "scalefactor" => Some(&mut c.scalefactor),
            "resolution" => Some(&mut c.resolution),
            _ => None,
        })
    }
}

impl Record for ContrastRecord {
    const KINDS: &'static [&'static str] = &[Self::STANDARD, Self::WITH_RATIO];
    const DEFAULT_NAME: &'static str = "New Contrast";

    fn kind(&self) -> &'static str {
        match self {
            ContrastRecord::Contrast(_) => Self::STANDARD,
            ContrastRecord::WithRatio(_) => Self::WITH_RATIO,
        }
    }

    fn name(&self) -> Option<&str> {
        Some(ContrastRecord::name(self))
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            ("name", ContrastRecord::name(self)),
            ("data", self.data()),
            ("background", self.background()),
            ("bulk_in", self.bulk_in()),
            ("bulk_out", self.bulk_out()),
            ("scalefactor", self.scalefactor()),
            ("resolution", self.resolution()),
        ];
        if let Some(ratio) = self.domain_ratio() {
            fields.push(("domain_ratio", ratio));
        }
        fields.extend(self.model().iter().map(|entry| ("model", entry.as_str())));
        fields
    }

    fn replace_text(&mut self, field: &str, old: &str, new: &str) -> bool {
        if field == "model" {
            return replace_in_list(self.model_mut(), old, new);
        }
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
            Self::WITH_RATIO => serde_json::from_value(value).map(ContrastRecord::WithRatio),
            _ => serde_json::from_value(value).map(ContrastRecord::Contrast),
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
    use crate::classlist::ClassList;
    use serde_json::json;

    fn contrast() -> Contrast {
        Contrast::new(
            "D2O",
            "D2O Data",
            "Background 1",
            "SLD Air",
            "SLD D2O",
            "Scalefactor 1",
            "Resolution 1",
        )
        .with_model(&["Oxide", "Water"])
    }

    #[test]
    fn test_shape_conversion() {
        let record = ContrastRecord::from(contrast()).to_with_ratio("Domain Ratio 1");
        assert!(record.has_ratio());
        assert_eq!(record.domain_ratio(), Some("Domain Ratio 1"));
        assert_eq!(record.model(), ["Oxide", "Water"]);
        assert_eq!(record.bulk_out(), "SLD D2O");

        let back = record.to_standard();
        assert_eq!(back, ContrastRecord::from(contrast()));
        assert_eq!(back.domain_ratio(), None);
    }

    #[test]
    fn test_text_fields_include_model_entries() {
        let record = ContrastRecord::from(contrast());
        let fields = record.text_fields();
        assert!(fields.contains(&("model", "Oxide")));
        assert!(fields.contains(&("model", "Water")));
        assert!(!fields.iter().any(|(field, _)| *field == "domain_ratio"));
    }

    #[test]
    fn test_replace_text() {
        let mut record = ContrastRecord::from(contrast()).to_with_ratio("Ratio");
        assert!(record.replace_text("domain_ratio", "ratio", "Domain Ratio 2"));
        assert!(record.replace_text("model", "Water", "D2O Layer"));
        assert_eq!(record.domain_ratio(), Some("Domain Ratio 2"));
        assert_eq!(record.model(), ["Oxide", "D2O Layer"]);

        let mut record = ContrastRecord::from(contrast());
        assert!(!record.replace_text("domain_ratio", "", "Ratio"));
    }

    #[test]
    fn test_set_fields_keeps_shape() {
        let mut list = ClassList::new();
        list.append(ContrastRecord::from(contrast())).unwrap();
        assert_eq!(list.class_handle(), Some(ContrastRecord::STANDARD));

        let overrides = json!({"resample": true, "model": ["Oxide"]});
        list.set_fields(0, overrides.as_object().unwrap().clone())
            .unwrap();
        assert!(list[0].resample());
        assert_eq!(list[0].model(), ["Oxide"]);

        // A ratio is not a field of the plain shape.
        let overrides = json!({"domain_ratio": "Domain Ratio 1"});
        assert!(list
            .set_fields(0, overrides.as_object().unwrap().clone())
            .is_err());
    }

    #[test]
    fn test_mixed_shapes_rejected() {
        let mut list = ClassList::new();
        list.append(ContrastRecord::from(contrast())).unwrap();
        let other = ContrastWithRatio::new("H2O", "", "", "", "", "", "", "Ratio");
        assert!(list.append(other.into()).is_err());
    }
}
