use std::collections::BTreeMap;

use pagetrace_core_types::{DomFragment, ElementDescriptor, EventPayload, EventRecord};
use regex::Regex;
use tracing::warn;

use crate::model::{default_rules, RedactionRule, RuleKind};
use crate::selector::SelectorPattern;

enum Matcher {
    InputType,
    Regex(Regex),
    Selector(SelectorPattern),
    Attribute,
}

struct CompiledRule {
    rule: RedactionRule,
    matcher: Matcher,
}

/// Ordered rule set with regexes compiled once at load time. The engine is
/// immutable after construction; `process` is a pure transform.
pub struct RedactionEngine {
    rules: Vec<CompiledRule>,
}

impl RedactionEngine {
    /// Built-in defaults followed by the supplied custom rules.
    pub fn new(custom: Vec<RedactionRule>) -> Self {
        let mut rules = default_rules();
        rules.extend(custom);
        Self::with_rules(rules)
    }

    /// Exactly the supplied rules, in order. Disabled rules and rules whose
    /// pattern fails to compile are skipped; a bad pattern is never fatal.
    pub fn with_rules(rules: Vec<RedactionRule>) -> Self {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            if !rule.enabled {
                continue;
            }
            let matcher = match rule.kind {
                RuleKind::InputType => Some(Matcher::InputType),
                RuleKind::Attribute => Some(Matcher::Attribute),
                RuleKind::Regex => match Regex::new(&rule.pattern) {
                    Ok(regex) => Some(Matcher::Regex(regex)),
                    Err(err) => {
                        warn!(
                            target: "redaction",
                            rule = %rule.id,
                            %err,
                            "invalid regex pattern, rule skipped"
                        );
                        None
                    }
                },
                RuleKind::Selector => match SelectorPattern::parse(&rule.pattern) {
                    Some(pattern) => Some(Matcher::Selector(pattern)),
                    None => {
                        warn!(
                            target: "redaction",
                            rule = %rule.id,
                            pattern = %rule.pattern,
                            "unrecognized selector pattern, rule will never match"
                        );
                        None
                    }
                },
            };
            if let Some(matcher) = matcher {
                compiled.push(CompiledRule { rule, matcher });
            }
        }
        Self { rules: compiled }
    }

    pub fn active_rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns a redacted copy of the event. The input is never mutated; the
    /// transform is irreversible — no original value survives in the output.
    pub fn process(&self, event: &EventRecord) -> EventRecord {
        let mut out = event.clone();
        out.target = self.redact_descriptor(&event.target);
        out.payload = self.redact_payload(&event.payload, &event.target);
        out.dom_snapshot = event
            .dom_snapshot
            .as_ref()
            .map(|fragment| self.redact_fragment(fragment));
        out
    }

    /// Applies every enabled regex rule in list order; each rule sees the
    /// previous rule's output, so ordering matters when patterns overlap.
    pub fn cascade(&self, text: &str) -> String {
        let mut masked = text.to_string();
        for compiled in &self.rules {
            if let Matcher::Regex(regex) = &compiled.matcher {
                masked = regex
                    .replace_all(&masked, compiled.rule.replacement.as_str())
                    .into_owned();
            }
        }
        masked
    }

    fn redact_descriptor(&self, descriptor: &ElementDescriptor) -> ElementDescriptor {
        let mut out = descriptor.clone();
        out.label = descriptor.label.as_deref().map(|label| self.cascade(label));
        out
    }

    /// Full-value rules first (input type, then selector patterns); only
    /// values no full rule claims go through the regex cascade.
    fn redact_input_value(
        &self,
        descriptor: &ElementDescriptor,
        input_type: &str,
        value: &str,
    ) -> String {
        for compiled in &self.rules {
            match &compiled.matcher {
                Matcher::InputType
                    if compiled.rule.pattern.eq_ignore_ascii_case(input_type) =>
                {
                    return compiled.rule.replacement.clone();
                }
                Matcher::Selector(pattern) if pattern.matches(descriptor) => {
                    return compiled.rule.replacement.clone();
                }
                _ => {}
            }
        }
        self.cascade(value)
    }

    fn redact_payload(
        &self,
        payload: &EventPayload,
        descriptor: &ElementDescriptor,
    ) -> EventPayload {
        match payload {
            EventPayload::Input {
                input_type,
                value,
                selection,
            } => EventPayload::Input {
                input_type: input_type.clone(),
                value: self.redact_input_value(descriptor, input_type, value),
                selection: *selection,
            },
            EventPayload::MutationAdd {
                node_count,
                nodes,
                parent_before,
                parent_after,
            } => EventPayload::MutationAdd {
                node_count: *node_count,
                nodes: nodes.iter().map(|n| self.redact_fragment(n)).collect(),
                parent_before: parent_before.as_deref().map(|html| self.cascade(html)),
                parent_after: parent_after.as_deref().map(|html| self.cascade(html)),
            },
            EventPayload::MutationRemove {
                node_count,
                nodes,
                parent_before,
                parent_after,
            } => EventPayload::MutationRemove {
                node_count: *node_count,
                nodes: nodes.iter().map(|n| self.redact_fragment(n)).collect(),
                parent_before: parent_before.as_deref().map(|html| self.cascade(html)),
                parent_after: parent_after.as_deref().map(|html| self.cascade(html)),
            },
            EventPayload::MutationAttribute {
                name,
                old_value,
                new_value,
            } => EventPayload::MutationAttribute {
                name: name.clone(),
                old_value: old_value.as_deref().map(|v| self.cascade(v)),
                new_value: new_value.as_deref().map(|v| self.cascade(v)),
            },
            EventPayload::MutationText {
                old_value,
                new_value,
            } => EventPayload::MutationText {
                old_value: self.cascade(old_value),
                new_value: self.cascade(new_value),
            },
            EventPayload::Navigation {
                url,
                nav_kind,
                page_source,
            } => EventPayload::Navigation {
                url: url.clone(),
                nav_kind: *nav_kind,
                page_source: page_source.as_deref().map(|source| self.cascade(source)),
            },
            EventPayload::PageError { message, source } => EventPayload::PageError {
                message: self.cascade(message),
                source: source.clone(),
            },
            other => other.clone(),
        }
    }

    fn redact_fragment(&self, fragment: &DomFragment) -> DomFragment {
        let attributes: BTreeMap<String, String> = fragment
            .attributes
            .iter()
            .map(|(name, value)| {
                let replaced = self
                    .rules
                    .iter()
                    .find(|compiled| {
                        matches!(compiled.matcher, Matcher::Attribute)
                            && compiled.rule.pattern.eq_ignore_ascii_case(name)
                    })
                    .map(|compiled| compiled.rule.replacement.clone())
                    .unwrap_or_else(|| self.cascade(value));
                (name.clone(), replaced)
            })
            .collect();
        DomFragment {
            html: self.cascade(&fragment.html),
            text: self.cascade(&fragment.text),
            attributes,
        }
    }
}
