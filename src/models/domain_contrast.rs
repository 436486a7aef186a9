use serde::{Deserialize, Serialize};

use crate::classlist::{names_match, Record};

/// One of the two structures mixed by a domains-mode contrast: an ordered
/// stack of layer names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DomainContrast {
    pub name: String,
    pub model: Vec<String>,
}

impl DomainContrast {
    pub fn new(name: &str, model: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            model: model.iter().map(|layer| layer.to_string()).collect(),
        }
    }
}

impl Record for DomainContrast {
    const KINDS: &'static [&'static str] = &["DomainContrast"];
    const DEFAULT_NAME: &'static str = "New Domain Contrast";

    fn kind(&self) -> &'static str {
        "DomainContrast"
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("name", self.name.as_str())];
        fields.extend(self.model.iter().map(|layer| ("model", layer.as_str())));
        fields
    }

    fn replace_text(&mut self, field: &str, old: &str, new: &str) -> bool {
        match field {
            "name" if names_match(&self.name, old) => {
                self.name = new.to_string();
                true
            }
            "model" => replace_in_list(&mut self.model, old, new),
            _ => false,
        }
    }
}

/// Replace every entry of `list` matching `old`; returns whether any did.
pub(crate) fn replace_in_list(list: &mut [String], old: &str, new: &str) -> bool {
    let mut changed = false;
    for entry in list.iter_mut().filter(|entry| names_match(entry, old)) {
        *entry = new.to_string();
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_replacement() {
        let mut domain = DomainContrast::new("Domain 1", &["Oxide", "Water", "oxide"]);
        assert!(domain.replace_text("model", "Oxide", "SiO2"));
        assert_eq!(domain.model, vec!["SiO2", "Water", "SiO2"]);
        assert!(!domain.replace_text("model", "Gold", "Au"));

        let fields = domain.text_fields();
        assert_eq!(fields.iter().filter(|(f, _)| *f == "model").count(), 3);
    }
}
