//! Metadata provider contract and the default name formatting.
//!
//! The engine asks a [`MetadataProvider`] for every human readable name it
//! records. [`DefaultMetadataProvider`] derives names from raw identifiers
//! such as `Given_customer_has_AMOUNT_money`.

use std::any::{Any, TypeId};

use hashbrown::HashMap;

use crate::descriptor::{ParameterInfo, StepDescriptor, ValueFormatter};
use crate::types::{FeatureInfo, FeatureType, StepNameFormat, StepType};

/// Resolves feature, scenario and step names for the engine.
///
/// Implementations must be deterministic: the same input always yields the
/// same output within a run.
pub trait MetadataProvider: Send + Sync {
    /// Describe the feature identified by `feature`.
    fn feature_info(&self, feature: &FeatureType) -> FeatureInfo;

    /// Human readable scenario name for `raw_name`.
    fn scenario_name(&self, raw_name: &str) -> String;

    /// Name template for `step`, given the resolved type of the preceding
    /// step.
    fn step_name_format(
        &self,
        step: &StepDescriptor,
        previous_step_type: Option<StepType>,
    ) -> StepNameFormat;

    /// Formatter overriding the descriptor's own for `parameter`.
    fn parameter_formatter(&self, _parameter: &ParameterInfo) -> Option<ValueFormatter> {
        None
    }
}

/// Underscore based name formatting.
///
/// - Underscores separate words.
/// - A leading `given`/`when`/`then`/`and`/`but`/`setup` word is taken as the
///   step type unless the descriptor predefines one; it is removed from the
///   name either way.
/// - A step repeating the previous step's type is labelled `AND`.
/// - Words equal to a parameter name (ignoring case) are replaced by the
///   quoted parameter value; parameters not mentioned are appended as
///   `[name: "value"]`.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::{DefaultMetadataProvider, MetadataProvider, StepDescriptor, StepType};
///
/// let provider = DefaultMetadataProvider::new();
/// let step = StepDescriptor::from_fn("Given_product_is_in_stock", |_, _| Ok(())).unwrap();
/// let format = provider.step_name_format(&step, None);
/// assert_eq!(format.step_type(), Some(StepType::Given));
/// assert_eq!(format.step_type_label(), Some("GIVEN"));
/// assert_eq!(format.format(), "product is in stock");
///
/// let repeated = provider.step_name_format(&step, Some(StepType::Given));
/// assert_eq!(repeated.step_type_label(), Some("AND"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultMetadataProvider {
    features: HashMap<TypeId, FeatureInfo>,
}

impl DefaultMetadataProvider {
    /// Provider without feature overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `info` for the feature type `F` instead of the derived name.
    #[must_use]
    pub fn with_feature<F: Any>(mut self, info: FeatureInfo) -> Self {
        self.features.insert(TypeId::of::<F>(), info);
        self
    }
}

impl MetadataProvider for DefaultMetadataProvider {
    fn feature_info(&self, feature: &FeatureType) -> FeatureInfo {
        self.features
            .get(&feature.id())
            .cloned()
            .unwrap_or_else(|| FeatureInfo::new(humanize(feature.short_name())))
    }

    fn scenario_name(&self, raw_name: &str) -> String {
        humanize(raw_name)
    }

    fn step_name_format(
        &self,
        step: &StepDescriptor,
        previous_step_type: Option<StepType>,
    ) -> StepNameFormat {
        let mut words: Vec<&str> = split_words(step.raw_name()).collect();
        let leading_type = match words.as_slice() {
            [first, _, ..] => first.parse::<StepType>().ok(),
            _ => None,
        };
        if leading_type.is_some() {
            words.remove(0);
        }
        let declared = step.predefined_step_type().or(leading_type);
        let (step_type, label) = resolve_type(declared, previous_step_type);
        let format = render_words(&words, step.parameters().iter().map(|p| p.info()));
        StepNameFormat::new(step_type, label, format)
    }
}

fn split_words(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
}

fn humanize(raw: &str) -> String {
    split_words(raw).collect::<Vec<_>>().join(" ")
}

/// Resolved type for the next step's comparison, plus the label to show.
fn resolve_type(
    declared: Option<StepType>,
    previous: Option<StepType>,
) -> (Option<StepType>, Option<String>) {
    match declared {
        None => (previous, None),
        Some(continuation) if continuation.is_continuation() => {
            (previous, Some(continuation.as_str().to_owned()))
        }
        Some(StepType::Setup) => (Some(StepType::Setup), Some(StepType::Setup.as_str().to_owned())),
        Some(current) if Some(current) == previous => {
            (Some(current), Some(StepType::And.as_str().to_owned()))
        }
        Some(current) => (Some(current), Some(current.as_str().to_owned())),
    }
}

fn render_words<'a>(
    words: &[&str],
    parameters: impl Iterator<Item = &'a ParameterInfo>,
) -> String {
    let parameters: Vec<&ParameterInfo> = parameters.collect();
    let mut used = vec![false; parameters.len()];
    let mut rendered: Vec<String> = Vec::with_capacity(words.len());
    for word in words {
        let position = parameters.iter().enumerate().position(|(index, parameter)| {
            !used.get(index).copied().unwrap_or(true)
                && parameter.raw_name().eq_ignore_ascii_case(word)
        });
        match position.and_then(|index| used.get_mut(index).map(|flag| (index, flag))) {
            Some((index, flag)) => {
                *flag = true;
                rendered.push(format!("\"{{{index}}}\""));
            }
            None => rendered.push(escape_braces(word)),
        }
    }
    let mut format = rendered.join(" ");
    for (index, parameter) in parameters.iter().enumerate() {
        if !used.get(index).copied().unwrap_or(false) {
            format.push_str(&format!(
                " [{}: \"{{{index}}}\"]",
                escape_braces(parameter.raw_name())
            ));
        }
    }
    format
}

fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}
