use serde::{Deserialize, Serialize};

/// Matching strategy of a redaction rule.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Exact match on an input element's `type`; replaces the whole value.
    InputType,
    /// Pattern applied through the regex cascade.
    Regex,
    /// Constrained selector pattern against the target's id/selector;
    /// replaces the whole value.
    Selector,
    /// Exact attribute-name match inside fragments; replaces the value.
    Attribute,
}

/// A pattern/replacement pair. Configuration data: loaded once per session,
/// never mutated by the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RedactionRule {
    pub id: String,
    pub name: String,
    pub kind: RuleKind,
    pub pattern: String,
    pub replacement: String,
    pub enabled: bool,
}

impl RedactionRule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: RuleKind,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            pattern: pattern.into(),
            replacement: replacement.into(),
            enabled: true,
        }
    }
}

/// Built-in rule set, applied ahead of any custom rules.
pub fn default_rules() -> Vec<RedactionRule> {
    vec![
        RedactionRule::new(
            "builtin-email",
            "Email addresses",
            RuleKind::Regex,
            r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}",
            "[EMAIL]",
        ),
        RedactionRule::new(
            "builtin-phone",
            "Phone numbers",
            RuleKind::Regex,
            r"\b(?:\+?1[-. ]?)?\(?\d{3}\)?[-. ]?\d{3}[-. ]?\d{4}\b",
            "[PHONE]",
        ),
        RedactionRule::new(
            "builtin-card",
            "Payment card numbers",
            RuleKind::Regex,
            r"\b(?:4[0-9]{12}(?:[0-9]{3})?|5[1-5][0-9]{14}|3[47][0-9]{13}|6(?:011|5[0-9]{2})[0-9]{12})\b",
            "[CARD]",
        ),
        RedactionRule::new(
            "builtin-ssn",
            "Social security numbers",
            RuleKind::Regex,
            r"\b\d{3}-\d{2}-\d{4}\b",
            "[SSN]",
        ),
        RedactionRule::new(
            "builtin-token",
            "Secret tokens",
            RuleKind::Regex,
            r"\b(?:sk|pk|tok)_[A-Za-z0-9]{16,}\b",
            "[TOKEN]",
        ),
        RedactionRule::new(
            "builtin-password-input",
            "Password fields",
            RuleKind::InputType,
            "password",
            "[PASSWORD]",
        ),
        RedactionRule::new(
            "builtin-email-input",
            "Email fields",
            RuleKind::InputType,
            "email",
            "[EMAIL]",
        ),
    ]
}
