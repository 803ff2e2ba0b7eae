pub mod engine;
pub mod model;
pub mod selector;

pub use engine::RedactionEngine;
pub use model::{default_rules, RedactionRule, RuleKind};
pub use selector::SelectorPattern;
