//! Core naming and identity types shared across the crate.
//!
//! The module defines the step type enum with parsing helpers, the rendered
//! step name model, and the feature/scenario/step identity records handed to
//! progress notifiers and stored in results.

use std::any::{Any, TypeId};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Placeholder rendered for parameters whose value is not known yet.
pub const UNKNOWN_PARAMETER_VALUE: &str = "<?>";

/// Predefined step type used to categorise a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum StepType {
    /// Scenario preparation that is not part of the behaviour itself.
    Setup,
    /// Preconditions for the scenario.
    Given,
    /// The action under test.
    When,
    /// The expected outcome.
    Then,
    /// Continuation of the previous step type.
    And,
    /// Contrasting continuation of the previous step type.
    But,
}

impl StepType {
    /// Return the step type in the upper-case form used in step names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "SETUP",
            Self::Given => "GIVEN",
            Self::When => "WHEN",
            Self::Then => "THEN",
            Self::And => "AND",
            Self::But => "BUT",
        }
    }

    /// Whether the type continues the previous step rather than starting a
    /// new block.
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        matches!(self, Self::And | Self::But)
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`StepType`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid step type: {0}")]
pub struct StepTypeParseError(pub String);

impl FromStr for StepType {
    type Err = StepTypeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let parsed = [
            Self::Setup,
            Self::Given,
            Self::When,
            Self::Then,
            Self::And,
            Self::But,
        ]
        .into_iter()
        .find(|ty| ty.as_str().eq_ignore_ascii_case(trimmed));
        parsed.ok_or_else(|| StepTypeParseError(value.to_string()))
    }
}

/// Identity of a feature fixture type.
///
/// Rust has no runtime reflection, so features are identified by the
/// [`TypeId`] of the fixture type together with its type name for display.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::FeatureType;
///
/// struct LoginFeature;
///
/// let ty = FeatureType::of::<LoginFeature>();
/// assert_eq!(ty, FeatureType::of::<LoginFeature>());
/// assert!(ty.type_name().ends_with("LoginFeature"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureType {
    id: TypeId,
    type_name: &'static str,
}

impl FeatureType {
    /// Identity of the fixture type `F`.
    #[must_use]
    pub fn of<F: Any>() -> Self {
        Self {
            id: TypeId::of::<F>(),
            type_name: std::any::type_name::<F>(),
        }
    }

    /// The [`TypeId`] of the fixture type.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name of the fixture type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without module path or generic arguments.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let without_generics = self
            .type_name
            .split_once('<')
            .map_or(self.type_name, |(head, _)| head);
        without_generics
            .rsplit_once("::")
            .map_or(without_generics, |(_, tail)| tail)
    }
}

/// Descriptive information about a feature.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeatureInfo {
    name: String,
    description: Option<String>,
    labels: Vec<String>,
}

impl FeatureInfo {
    /// Create feature information with the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            labels: Vec::new(),
        }
    }

    /// Attach a free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach labels such as ticket numbers.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Display name of the feature.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Feature labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Descriptive information about a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScenarioInfo {
    name: String,
    labels: Vec<String>,
    categories: Vec<String>,
}

impl ScenarioInfo {
    /// Create scenario information with labels and categories.
    #[must_use]
    pub fn new(name: impl Into<String>, labels: Vec<String>, categories: Vec<String>) -> Self {
        Self {
            name: name.into(),
            labels,
            categories,
        }
    }

    /// Display name of the scenario.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scenario labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Scenario categories.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

/// Name template produced by a metadata provider for one step.
///
/// The `format` contains `{n}` placeholders referring to the step parameters
/// by position; literal braces are written as `{{` and `}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepNameFormat {
    step_type: Option<StepType>,
    step_type_label: Option<String>,
    format: String,
}

impl StepNameFormat {
    /// Construct a name template.
    ///
    /// `step_type` is the resolved type used when naming the next step;
    /// `step_type_label` is the text shown in front of the name.
    #[must_use]
    pub fn new(
        step_type: Option<StepType>,
        step_type_label: Option<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            step_type,
            step_type_label,
            format: format.into(),
        }
    }

    /// Resolved step type, used as "previous" type for the following step.
    #[must_use]
    pub const fn step_type(&self) -> Option<StepType> {
        self.step_type
    }

    /// Label rendered before the step name, e.g. `GIVEN` or `AND`.
    #[must_use]
    pub fn step_type_label(&self) -> Option<&str> {
        self.step_type_label.as_deref()
    }

    /// The raw format string.
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }
}

/// Rendered value of a single name parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NameParameterInfo {
    is_evaluated: bool,
    formatted_value: String,
}

impl NameParameterInfo {
    /// A parameter whose value has been evaluated and formatted.
    #[must_use]
    pub fn evaluated(formatted_value: impl Into<String>) -> Self {
        Self {
            is_evaluated: true,
            formatted_value: formatted_value.into(),
        }
    }

    /// A parameter whose value is not known.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            is_evaluated: false,
            formatted_value: UNKNOWN_PARAMETER_VALUE.to_string(),
        }
    }

    /// Whether the value was evaluated.
    #[must_use]
    pub const fn is_evaluated(&self) -> bool {
        self.is_evaluated
    }

    /// Text substituted into the step name.
    #[must_use]
    pub fn formatted_value(&self) -> &str {
        &self.formatted_value
    }
}

/// Structured step name: type label, format and parameter values.
///
/// # Examples
///
/// ```
/// use stepwise_bdd::{NameParameterInfo, StepNameInfo};
///
/// let name = StepNameInfo::new(
///     Some("GIVEN".into()),
///     "customer has \"{0}\" money",
///     vec![NameParameterInfo::evaluated("20")],
/// );
/// assert_eq!(name.to_string(), "GIVEN customer has \"20\" money");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StepNameInfo {
    step_type_label: Option<String>,
    name_format: String,
    parameters: Vec<NameParameterInfo>,
}

impl StepNameInfo {
    /// Construct a step name from its parts.
    #[must_use]
    pub fn new(
        step_type_label: Option<String>,
        name_format: impl Into<String>,
        parameters: Vec<NameParameterInfo>,
    ) -> Self {
        Self {
            step_type_label,
            name_format: name_format.into(),
            parameters,
        }
    }

    /// Label shown in front of the name.
    #[must_use]
    pub fn step_type_label(&self) -> Option<&str> {
        self.step_type_label.as_deref()
    }

    /// Name format with `{n}` placeholders.
    #[must_use]
    pub fn name_format(&self) -> &str {
        &self.name_format
    }

    /// Parameter values in placeholder order.
    #[must_use]
    pub fn parameters(&self) -> &[NameParameterInfo] {
        &self.parameters
    }

    fn write_format(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = self.name_format.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    f.write_str("{")?;
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    f.write_str("}")?;
                }
                '{' => {
                    let mut digits = String::new();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next == '}' {
                            break;
                        }
                        digits.push(next);
                    }
                    let value = digits
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| self.parameters.get(index))
                        .map_or(UNKNOWN_PARAMETER_VALUE, NameParameterInfo::formatted_value);
                    f.write_str(value)?;
                }
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for StepNameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.step_type_label {
            write!(f, "{label} ")?;
        }
        self.write_format(f)
    }
}

/// Identity of a step within a scenario: its number and rendered name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StepInfo {
    number: String,
    name: StepNameInfo,
}

impl StepInfo {
    /// Construct a step identity.
    #[must_use]
    pub fn new(number: impl Into<String>, name: StepNameInfo) -> Self {
        Self {
            number: number.into(),
            name,
        }
    }

    /// Step number, e.g. `3` or `2.1` for sub-steps.
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Structured step name.
    #[must_use]
    pub fn name(&self) -> &StepNameInfo {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: StepNameInfo) {
        self.name = name;
    }
}

impl fmt::Display for StepInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number, self.name)
    }
}
