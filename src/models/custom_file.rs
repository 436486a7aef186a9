//! Handles to externally defined model functions.
//!
//! A [`CustomFile`] only records where a function lives; resolving and
//! calling it is the job of [`crate::custom`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::classlist::{names_match, Record};
use crate::models::enums::Language;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomFile {
    pub name: String,
    pub filename: String,
    pub function_name: String,
    pub language: Language,
    /// Directory holding `filename`; empty means the working directory
    pub path: String,
}

impl CustomFile {
    /// Create a handle, inferring the language from the file extension
    /// (Python when it is not recognised).
    ///
    /// # Examples
    ///
    /// ```
    /// use ratapi_rs::models::{CustomFile, Language};
    ///
    /// let file = CustomFile::new("Bilayer", "bilayer.m", "customBilayer");
    /// assert_eq!(file.language, Language::Matlab);
    /// ```
    pub fn new(name: &str, filename: &str, function_name: &str) -> Self {
        let language = Path::new(filename)
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(Language::from_extension)
            .unwrap_or_default();
        Self {
            name: name.to_string(),
            filename: filename.to_string(),
            function_name: function_name.to_string(),
            language,
            path: String::new(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Full path of the file.
    pub fn file_path(&self) -> PathBuf {
        Path::new(&self.path).join(&self.filename)
    }
}

impl Record for CustomFile {
    const KINDS: &'static [&'static str] = &["CustomFile"];
    const DEFAULT_NAME: &'static str = "New Custom File";

    fn kind(&self) -> &'static str {
        "CustomFile"
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("name", self.name.as_str()),
            ("filename", self.filename.as_str()),
            ("function_name", self.function_name.as_str()),
            ("path", self.path.as_str()),
        ]
    }

    fn replace_text(&mut self, field: &str, old: &str, new: &str) -> bool {
        if field == "name" && names_match(&self.name, old) {
            self.name = new.to_string();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_inference() {
        assert_eq!(
            CustomFile::new("A", "model.py", "model").language,
            Language::Python
        );
        assert_eq!(
            CustomFile::new("B", "libmodel.so", "model").language,
            Language::Cpp
        );
        assert_eq!(
            CustomFile::new("C", "model", "model").language,
            Language::Python
        );
    }

    #[test]
    fn test_file_path() {
        let file = CustomFile::new("A", "model.py", "model").with_path("/models");
        assert_eq!(file.file_path(), PathBuf::from("/models/model.py"));
    }
}
