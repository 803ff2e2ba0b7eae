use pagetrace_core_types::ElementDescriptor;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Field {
    Id,
    Selector,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum MatchOp {
    Exact,
    Contains,
    Prefix,
    Suffix,
}

/// Constrained selector-rule pattern. Supported grammar:
/// `#value` (exact id), or `[id<op>value]` / `[selector<op>value]` where
/// `<op>` is `=`, `*=`, `^=` or `$=` and the value may be quoted. Anything
/// else is unparseable and therefore never matches.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectorPattern {
    field: Field,
    op: MatchOp,
    value: String,
}

impl SelectorPattern {
    pub fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        if let Some(id) = pattern.strip_prefix('#') {
            if id.is_empty() || id.contains(|c: char| c.is_whitespace()) {
                return None;
            }
            return Some(Self {
                field: Field::Id,
                op: MatchOp::Exact,
                value: id.to_string(),
            });
        }

        let inner = pattern.strip_prefix('[')?.strip_suffix(']')?;
        let (raw_field, op, raw_value) = if let Some((f, v)) = inner.split_once("*=") {
            (f, MatchOp::Contains, v)
        } else if let Some((f, v)) = inner.split_once("^=") {
            (f, MatchOp::Prefix, v)
        } else if let Some((f, v)) = inner.split_once("$=") {
            (f, MatchOp::Suffix, v)
        } else if let Some((f, v)) = inner.split_once('=') {
            (f, MatchOp::Exact, v)
        } else {
            return None;
        };

        let field = match raw_field.trim() {
            "id" => Field::Id,
            "selector" => Field::Selector,
            _ => return None,
        };
        let value = raw_value.trim().trim_matches('"').trim_matches('\'');
        if value.is_empty() {
            return None;
        }
        Some(Self {
            field,
            op,
            value: value.to_string(),
        })
    }

    pub fn matches(&self, descriptor: &ElementDescriptor) -> bool {
        let subject = match self.field {
            Field::Id => match descriptor.id.as_deref() {
                Some(id) => id,
                None => return false,
            },
            Field::Selector => descriptor.selector.as_str(),
        };
        match self.op {
            MatchOp::Exact => subject == self.value,
            MatchOp::Contains => subject.contains(&self.value),
            MatchOp::Prefix => subject.starts_with(&self.value),
            MatchOp::Suffix => subject.ends_with(&self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: Option<&str>, selector: &str) -> ElementDescriptor {
        ElementDescriptor {
            id: id.map(str::to_string),
            selector: selector.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn hash_pattern_is_exact_id() {
        let pattern = SelectorPattern::parse("#card-number").unwrap();
        assert!(pattern.matches(&descriptor(Some("card-number"), "#card-number")));
        assert!(!pattern.matches(&descriptor(Some("card-number-2"), "#card-number-2")));
        assert!(!pattern.matches(&descriptor(None, "input")));
    }

    #[test]
    fn attribute_operators_cover_contains_prefix_suffix() {
        let contains = SelectorPattern::parse("[id*=ssn]").unwrap();
        assert!(contains.matches(&descriptor(Some("user-ssn-field"), "")));

        let prefix = SelectorPattern::parse("[id^=\"cc-\"]").unwrap();
        assert!(prefix.matches(&descriptor(Some("cc-expiry"), "")));
        assert!(!prefix.matches(&descriptor(Some("acc-expiry"), "")));

        let suffix = SelectorPattern::parse("[selector$=password]").unwrap();
        assert!(suffix.matches(&descriptor(None, "form > input#password")));
    }

    #[test]
    fn unrecognized_syntax_never_matches() {
        assert_eq!(SelectorPattern::parse("input[type=password]"), None);
        assert_eq!(SelectorPattern::parse("[class*=secret]"), None);
        assert_eq!(SelectorPattern::parse("div > input"), None);
        assert_eq!(SelectorPattern::parse("[id~=odd]"), None);
    }
}
