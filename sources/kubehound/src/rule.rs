//! Declarative kubelet rules: a setting, where it may be read from, and what it must be.

use crate::assertion::{self, Predicate};
use crate::inputs::NodeInputs;
use crate::one_of;
use crate::resolver::{Setting, SettingResolver, SourceKind};
use crate::results::{Checker, CheckerMetadata, CheckerResult};
use log::warn;

/// Shown for rotation checks on nodes whose certificates are managed elsewhere.
pub const EXTERNAL_CERT_AUTHORITY_REASON: &str =
    "N/A - Node using external authority/tool to handle certificate rotation";

/// When a rule does not apply to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipCondition {
    /// The node uses an external certificate authority.
    ExternalCertAuthority,
    /// The rule can only be verified by a person.
    Manual(String),
}

impl SkipCondition {
    /// The reason to skip, if the condition holds for `inputs`.
    pub fn reason(&self, inputs: &NodeInputs) -> Option<String> {
        match self {
            SkipCondition::ExternalCertAuthority if inputs.external_cert_authority_in_use => {
                Some(EXTERNAL_CERT_AUTHORITY_REASON.to_string())
            }
            SkipCondition::ExternalCertAuthority => None,
            SkipCondition::Manual(reason) => Some(reason.clone()),
        }
    }
}

/// One way of detecting that a rule holds.
#[derive(Debug, Clone)]
pub struct Alternative {
    pub description: String,
    pub setting: Setting,
    /// The kinds of source this alternative may read from.
    pub sources: Vec<SourceKind>,
    pub predicate: Predicate,
}

impl Alternative {
    pub fn new<S: Into<String>>(
        description: S,
        setting: Setting,
        sources: &[SourceKind],
        predicate: Predicate,
    ) -> Self {
        Self {
            description: description.into(),
            setting,
            sources: sources.to_vec(),
            predicate,
        }
    }

    /// Resolves the setting from freshly built sources and checks it. Errors that stop
    /// resolution become `ERROR` outcomes.
    pub fn evaluate(&self, inputs: &NodeInputs) -> CheckerResult {
        let resolver = SettingResolver::new(inputs.timeout());
        let sources = inputs.sources(&self.sources);
        match resolver.resolve(&self.setting, &sources) {
            Ok(value) => assertion::evaluate(&value, &self.predicate),
            Err(e) => {
                warn!("Unable to resolve '{}': {}", self.setting, e);
                CheckerResult::error(e.to_string())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub metadata: CheckerMetadata,
    pub skip_when: Option<SkipCondition>,
    pub alternatives: Vec<Alternative>,
}

impl Rule {
    /// Passes if any alternative passes. Every alternative is evaluated, one after another.
    pub fn evaluate(&self, inputs: &NodeInputs) -> CheckerResult {
        let skip_reason = self
            .skip_when
            .as_ref()
            .and_then(|condition| condition.reason(inputs));
        one_of::evaluate_any(
            skip_reason.as_deref(),
            self.alternatives.iter().map(|alternative| {
                (alternative.description.clone(), move || alternative.evaluate(inputs))
            }),
        )
    }
}

impl Checker for Rule {
    fn metadata(&self) -> CheckerMetadata {
        self.metadata.clone()
    }

    fn execute(&self, inputs: &NodeInputs) -> CheckerResult {
        self.evaluate(inputs)
    }
}
