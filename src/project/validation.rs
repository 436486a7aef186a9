//! The project validator chain
//!
//! Every mutation of a [`Project`] is applied to a candidate copy, then the
//! candidate is passed through [`Project::revalidate`]. The chain first
//! normalises the candidate (record shapes, collections the current mode
//! cannot use, renames) and then checks it. Every failing check is
//! collected, so a rejected mutation reports all offending paths at once.

use log::{debug, info};
use std::collections::HashMap;
use std::fmt;

use crate::classlist::{names_match, ClassList};
use crate::models::{Calculation, ContrastRecord, LayerModel, LayerRecord, Parameter};
use crate::project::references::{CollectionId, References};
use crate::project::{Project, ProjectError, PARAMETER_COLLECTIONS};

/// What a [`ValidationError`] is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A reference names no record of its target collection
    CrossReference,
    /// A protected parameter was removed or renamed away
    Protected,
    /// A contrast model has the wrong number of entries for the mode
    ModelLength,
}

/// One offending path found by the validator chain
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub collection: CollectionId,
    pub field: String,
    pub value: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} = \"{}\": {}",
            self.collection, self.field, self.value, self.message
        )
    }
}

/// Every error found by one pass of the validator chain
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Whether any error is of `kind`.
    pub fn contains_kind(&self, kind: ValidationErrorKind) -> bool {
        self.0.iter().any(|error| error.kind == kind)
    }

    fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    fn into_result(self) -> Result<(), ProjectError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ProjectError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// State of a project before a mutation, against which the candidate is
/// compared.
#[derive(Debug, Clone)]
pub(crate) struct ValidationContext {
    names: HashMap<CollectionId, Vec<String>>,
    protected: HashMap<CollectionId, Vec<String>>,
    model_target: Option<CollectionId>,
    /// Contrast models keyed by lower-cased contrast name
    models: HashMap<String, Vec<String>>,
}

impl ValidationContext {
    pub(crate) fn capture(project: &Project) -> Self {
        let names = CollectionId::ALL
            .iter()
            .map(|id| (*id, project.names(*id)))
            .collect();
        let protected = PARAMETER_COLLECTIONS
            .iter()
            .filter_map(|id| project.parameter_collection(*id).map(|list| (*id, protected_names(list))))
            .collect();
        let models = project
            .contrasts
            .iter()
            .map(|contrast| (contrast.name().to_lowercase(), contrast.model().to_vec()))
            .collect();
        Self {
            names,
            protected,
            model_target: project.contrast_model_target(),
            models,
        }
    }
}

fn protected_names(list: &ClassList<Parameter>) -> Vec<String> {
    list.iter()
        .filter(|param| param.protected)
        .map(|param| param.name.clone())
        .collect()
}

impl Project {
    /// Normalise and check this project against its state before the
    /// mutation being validated.
    pub(crate) fn revalidate(&mut self, context: &ValidationContext) -> Result<(), ProjectError> {
        self.apply_domain_ratios()?;
        self.apply_layer_shape();
        self.apply_contrast_shape();
        self.apply_mode_emptiness();
        self.apply_model_target(context);
        self.apply_renames(context);

        let mut errors = ValidationErrors::default();
        self.check_model_lengths(&mut errors);
        self.check_references(&mut errors);
        self.check_protected(context, &mut errors);
        errors.into_result()
    }

    /// The domains calculation always has a ratio to fit; other modes have none.
    fn apply_domain_ratios(&mut self) -> Result<(), ProjectError> {
        if self.calculation == Calculation::Domains {
            if self.domain_ratios.is_empty() {
                info!("adding the default domain ratio for a domains calculation");
                self.domain_ratios
                    .append(default_domain_ratio())
                    .map_err(|source| ProjectError::Collection {
                        collection: CollectionId::DomainRatios,
                        source,
                    })?;
            }
        } else if !self.domain_ratios.is_empty() {
            info!(
                "clearing {} domain ratio(s): calculation is {}",
                self.domain_ratios.len(),
                self.calculation
            );
            self.domain_ratios.clear();
        }
        Ok(())
    }

    fn apply_layer_shape(&mut self) {
        let (kind, convert): (&str, fn(LayerRecord) -> LayerRecord) = if self.absorption {
            (LayerRecord::ABSORPTION, LayerRecord::to_absorption)
        } else {
            (LayerRecord::STANDARD, LayerRecord::to_standard)
        };
        if self.layers.class_handle() == Some(kind) {
            return;
        }
        if !self.layers.is_empty() {
            info!("converting {} layer(s) to {}", self.layers.len(), kind);
        }
        self.layers.convert_all(kind, convert);
    }

    fn apply_contrast_shape(&mut self) {
        if self.calculation == Calculation::Domains {
            if self.contrasts.class_handle() == Some(ContrastRecord::WITH_RATIO) {
                return;
            }
            let ratio = self
                .domain_ratios
                .get(0)
                .map(|param| param.name.clone())
                .unwrap_or_default();
            if !self.contrasts.is_empty() {
                info!(
                    "converting {} contrast(s) to {} using domain ratio \"{}\"",
                    self.contrasts.len(),
                    ContrastRecord::WITH_RATIO,
                    ratio
                );
            }
            self.contrasts
                .convert_all(ContrastRecord::WITH_RATIO, |contrast| contrast.to_with_ratio(&ratio));
        } else if self.contrasts.class_handle() != Some(ContrastRecord::STANDARD) {
            if !self.contrasts.is_empty() {
                info!(
                    "converting {} contrast(s) to {}",
                    self.contrasts.len(),
                    ContrastRecord::STANDARD
                );
            }
            self.contrasts
                .convert_all(ContrastRecord::STANDARD, ContrastRecord::to_standard);
        }
    }

    fn apply_mode_emptiness(&mut self) {
        let standard = self.model == LayerModel::StandardLayers;
        if !(standard && self.calculation == Calculation::Domains) && !self.domain_contrasts.is_empty() {
            info!(
                "clearing {} domain contrast(s): model is {}, calculation is {}",
                self.domain_contrasts.len(),
                self.model,
                self.calculation
            );
            self.domain_contrasts.clear();
        }
        if !standard && !self.layers.is_empty() {
            info!("clearing {} layer(s): model is {}", self.layers.len(), self.model);
            self.layers.clear();
        }
    }

    /// Contrast models name records of a collection that depends on the
    /// mode. When it changes, every model carried over unchanged from before
    /// the mutation is cleared; models written by the same mutation are kept
    /// and checked against the new collection.
    fn apply_model_target(&mut self, context: &ValidationContext) {
        if self.contrast_model_target() == context.model_target {
            return;
        }
        let mut cleared = 0;
        for contrast in self.contrasts.records_mut() {
            let stale = context
                .models
                .get(&contrast.name().to_lowercase())
                .is_some_and(|before| before.as_slice() == contrast.model());
            if stale && !contrast.model().is_empty() {
                contrast.model_mut().clear();
                cleared += 1;
            }
        }
        if cleared > 0 {
            info!("cleared the model of {} contrast(s): the model collection changed", cleared);
        }
    }

    /// Propagate renames to every field referencing the renamed record.
    ///
    /// Names are compared by position, so a rename is only detected when
    /// the collection kept its length.
    fn apply_renames(&mut self, context: &ValidationContext) {
        let model_target = self.contrast_model_target();
        for target in CollectionId::ALL {
            let Some(before) = context.names.get(&target) else {
                continue;
            };
            let after = self.names(target);
            if before.len() != after.len() {
                continue;
            }
            let renames: Vec<(&String, &String)> =
                before.iter().zip(&after).filter(|(old, new)| old != new).collect();
            if renames.is_empty() {
                continue;
            }

            // Every reference moves to a placeholder first, so chained
            // renames (A to B, B to C) and swaps only see the original names.
            let placeholders: Vec<String> = (0..renames.len())
                .map(|position| format!("\u{0}{}#{}", target, position))
                .collect();
            for ((old, _), placeholder) in renames.iter().zip(&placeholders) {
                self.cascade_all(target, old, placeholder, model_target);
            }
            for ((_, new), placeholder) in renames.iter().zip(&placeholders) {
                self.cascade_all(target, placeholder, new, model_target);
            }
            debug!("renamed {} record(s) in {}", renames.len(), target);
        }
    }

    fn cascade_all(&mut self, target: CollectionId, old: &str, new: &str, model_target: Option<CollectionId>) {
        cascade(&mut self.backgrounds, target, old, new, model_target);
        cascade(&mut self.resolutions, target, old, new, model_target);
        cascade(&mut self.layers, target, old, new, model_target);
        cascade(&mut self.domain_contrasts, target, old, new, model_target);
        cascade(&mut self.contrasts, target, old, new, model_target);
    }

    fn check_model_lengths(&self, errors: &mut ValidationErrors) {
        let (limit, exact) = match (self.model, self.calculation) {
            (LayerModel::StandardLayers, Calculation::Domains) => (2, true),
            (LayerModel::StandardLayers, Calculation::Normal) => return,
            _ => (1, false),
        };
        for contrast in &self.contrasts {
            let length = contrast.model().len();
            let bad = if exact {
                length != 0 && length != limit
            } else {
                length > limit
            };
            if !bad {
                continue;
            }
            let message = if exact {
                format!(
                    "contrast \"{}\" must have exactly two domain contrasts in its model, found {}",
                    contrast.name(),
                    length
                )
            } else {
                format!(
                    "contrast \"{}\" can have at most one custom file in its model for {} models, found {}",
                    contrast.name(),
                    self.model,
                    length
                )
            };
            errors.push(ValidationError {
                kind: ValidationErrorKind::ModelLength,
                collection: CollectionId::Contrasts,
                field: "model".to_string(),
                value: contrast.model().join(", "),
                message,
            });
        }
    }

    fn check_references(&self, errors: &mut ValidationErrors) {
        let model_target = self.contrast_model_target();
        self.check_list(CollectionId::Backgrounds, &self.backgrounds, model_target, errors);
        self.check_list(CollectionId::Resolutions, &self.resolutions, model_target, errors);
        self.check_list(CollectionId::Layers, &self.layers, model_target, errors);
        self.check_list(CollectionId::DomainContrasts, &self.domain_contrasts, model_target, errors);
        self.check_list(CollectionId::Contrasts, &self.contrasts, model_target, errors);
    }

    fn check_list<T: References>(
        &self,
        collection: CollectionId,
        list: &ClassList<T>,
        model_target: Option<CollectionId>,
        errors: &mut ValidationErrors,
    ) {
        for record in list {
            for reference in record.references(model_target) {
                if reference.value.is_empty() || self.contains(reference.target, reference.value) {
                    continue;
                }
                errors.push(ValidationError {
                    kind: ValidationErrorKind::CrossReference,
                    collection,
                    field: reference.field.to_string(),
                    value: reference.value.to_string(),
                    message: format!(
                        "\"{}\" is not the name of a record in {} (referenced by \"{}\")",
                        reference.value,
                        reference.target,
                        record.name().unwrap_or_default()
                    ),
                });
            }
        }
    }

    fn check_protected(&self, context: &ValidationContext, errors: &mut ValidationErrors) {
        for id in PARAMETER_COLLECTIONS {
            let (Some(before), Some(list)) = (context.protected.get(&id), self.parameter_collection(id))
            else {
                continue;
            };
            let after = protected_names(list);
            let removed: Vec<&str> = before
                .iter()
                .filter(|name| !after.iter().any(|current| names_match(current, name)))
                .map(String::as_str)
                .collect();
            if removed.is_empty() {
                continue;
            }
            errors.push(ValidationError {
                kind: ValidationErrorKind::Protected,
                collection: id,
                field: "name".to_string(),
                value: removed.join(", "),
                message: format!(
                    "protected parameters cannot be removed or renamed: {}",
                    removed.join(", ")
                ),
            });
        }
    }
}

fn cascade<T: References>(
    list: &mut ClassList<T>,
    target: CollectionId,
    old: &str,
    new: &str,
    model_target: Option<CollectionId>,
) {
    for (index, field) in list.get_all_matches(old) {
        let Some(record) = list.records_mut().nth(index) else {
            continue;
        };
        if record.reference_target(field, model_target) == Some(target) {
            record.replace_text(field, old, new);
        }
    }
}

/// The ratio inserted when a project enters domains mode without one.
pub(crate) fn default_domain_ratio() -> Parameter {
    Parameter {
        name: "Domain Ratio 1".to_string(),
        min: 0.4,
        value: 0.5,
        max: 0.6,
        fit: false,
        ..Parameter::default()
    }
}
