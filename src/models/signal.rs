//! Backgrounds and resolutions
//!
//! Both are a [`Signal`]: a type plus a `source` and up to five `value_N`
//! references. What the references point at depends on the type:
//!
//! | type       | `source`               | `value_1`..`value_5`                 |
//! |------------|------------------------|--------------------------------------|
//! | constant   | a signal parameter     | must be empty                        |
//! | data       | a data record          | `value_1`: optional offset parameter |
//! | function   | a custom file          | signal parameters                    |
//!
//! "Signal parameter" means the project's `background_parameters` for a
//! [`Background`] and `resolution_parameters` for a [`Resolution`].

use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

use crate::classlist::{names_match, Fields, Record};
use crate::models::enums::SignalType;
use crate::models::RecordError;

const VALUE_FIELDS: [&str; 5] = ["value_1", "value_2", "value_3", "value_4", "value_5"];

/// Fields shared by backgrounds and resolutions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Signal {
    pub name: String,

    #[serde(rename = "type")]
    pub signal_type: SignalType,

    pub source: String,
    pub value_1: String,
    pub value_2: String,
    pub value_3: String,
    pub value_4: String,
    pub value_5: String,
}

impl Signal {
    /// A constant signal taken from one parameter.
    pub fn constant(name: &str, source: &str) -> Self {
        Self {
            name: name.to_string(),
            signal_type: SignalType::Constant,
            source: source.to_string(),
            ..Self::default()
        }
    }

    /// A signal read from a data record, optionally shifted by an offset parameter.
    pub fn data(name: &str, source: &str, offset: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            signal_type: SignalType::Data,
            source: source.to_string(),
            value_1: offset.unwrap_or_default().to_string(),
            ..Self::default()
        }
    }

    /// A signal computed by a custom function from up to five parameters.
    ///
    /// Parameters past the fifth are ignored.
    pub fn function(name: &str, source: &str, parameters: &[&str]) -> Self {
        let mut signal = Self {
            name: name.to_string(),
            signal_type: SignalType::Function,
            source: source.to_string(),
            ..Self::default()
        };
        for (slot, parameter) in signal.values_mut().into_iter().zip(parameters) {
            *slot = parameter.to_string();
        }
        signal
    }

    /// The five `value_N` fields in order.
    pub fn values(&self) -> [&str; 5] {
        [
            &self.value_1,
            &self.value_2,
            &self.value_3,
            &self.value_4,
            &self.value_5,
        ]
    }

    fn values_mut(&mut self) -> [&mut String; 5] {
        [
            &mut self.value_1,
            &mut self.value_2,
            &mut self.value_3,
            &mut self.value_4,
            &mut self.value_5,
        ]
    }

    fn field_mut(&mut self, field: &str) -> Option<&mut String> {
        match field {
            "name" => Some(&mut self.name),
            "source" => Some(&mut self.source),
            "value_1" => Some(&mut self.value_1),
            "value_2" => Some(&mut self.value_2),
            "value_3" => Some(&mut self.value_3),
            "value_4" => Some(&mut self.value_4),
            "value_5" => Some(&mut self.value_5),
            _ => None,
        }
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("name", self.name.as_str()), ("source", self.source.as_str())];
        fields.extend(VALUE_FIELDS.iter().copied().zip(self.values()));
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

    fn validated(self, kind: &str) -> Result<Self, RecordError> {
        let allowed = self.signal_type.value_slots();
        let filled = VALUE_FIELDS
            .iter()
            .zip(self.values())
            .skip(allowed)
            .find(|(_, value)| !value.is_empty())
            .map(|(field, _)| *field);
        if let Some(field) = filled {
            return Err(RecordError::FieldNotEmpty {
                name: self.name,
                kind: kind.to_string(),
                field: field.to_string(),
                signal_type: self.signal_type,
            });
        }
        Ok(self)
    }

    /// A change of type leaves every reference not re-supplied empty: the
    /// old references point into a different collection.
    fn reconcile(&mut self, previous: &Self, overrides: &Fields) {
        if self.signal_type == previous.signal_type {
            return;
        }
        if !overrides.contains_key("source") {
            self.source.clear();
        }
        for (field, value) in VALUE_FIELDS.iter().zip(self.values_mut()) {
            if !overrides.contains_key(*field) {
                value.clear();
            }
        }
    }
}

/// The background signal of a contrast
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Background(pub Signal);

/// The instrument resolution of a contrast
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resolution(pub Signal);

impl Background {
    /// A constant background taken from one background parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use ratapi_rs::models::{Background, SignalType};
    ///
    /// let background = Background::constant("Background 1", "Background Param 1");
    /// assert_eq!(background.signal_type, SignalType::Constant);
    /// assert_eq!(background.source, "Background Param 1");
    /// ```
    pub fn constant(name: &str, source: &str) -> Self {
        Self(Signal::constant(name, source))
    }

    /// A background read from a data record.
    pub fn data(name: &str, source: &str, offset: Option<&str>) -> Self {
        Self(Signal::data(name, source, offset))
    }

    /// A background computed by a custom function.
    pub fn function(name: &str, source: &str, parameters: &[&str]) -> Self {
        Self(Signal::function(name, source, parameters))
    }
}

impl Resolution {
    pub fn constant(name: &str, source: &str) -> Self {
        Self(Signal::constant(name, source))
    }

    pub fn data(name: &str, source: &str, offset: Option<&str>) -> Self {
        Self(Signal::data(name, source, offset))
    }

    pub fn function(name: &str, source: &str, parameters: &[&str]) -> Self {
        Self(Signal::function(name, source, parameters))
    }
}

macro_rules! signal_record {
    ($record:ident, $kind:literal) => {
        impl Deref for $record {
            type Target = Signal;

            fn deref(&self) -> &Signal {
                &self.0
            }
        }

        impl DerefMut for $record {
            fn deref_mut(&mut self) -> &mut Signal {
                &mut self.0
            }
        }

        impl Record for $record {
            const KINDS: &'static [&'static str] = &[$kind];
            const DEFAULT_NAME: &'static str = concat!("New ", $kind);

            fn kind(&self) -> &'static str {
                $kind
            }

            fn name(&self) -> Option<&str> {
                Some(&self.0.name)
            }

            fn text_fields(&self) -> Vec<(&'static str, &str)> {
                self.0.text_fields()
            }

            fn replace_text(&mut self, field: &str, old: &str, new: &str) -> bool {
                self.0.replace_text(field, old, new)
            }

            fn validated(self) -> Result<Self, RecordError> {
                self.0.validated($kind).map(Self)
            }

            fn reconcile(&mut self, previous: &Self, overrides: &Fields) {
                self.0.reconcile(&previous.0, overrides)
            }
        }
    };
}

signal_record!(Background, "Background");
signal_record!(Resolution, "Resolution");
