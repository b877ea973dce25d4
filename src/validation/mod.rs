//! Convention-driven validation of action inputs
//!
//! Every value passes through the injection guard first, then the rule
//! resolved for its `(action, input)` pair: an explicit per-action rule, a
//! naming convention, or the generic guard-only rule.

pub mod conventions;
pub mod explicit;
pub mod guard;
pub mod loader;
pub mod rules;
pub mod schema;
pub mod validator;

pub use explicit::COMMON_RETRY;
pub use guard::GuardLevel;
pub use loader::RuleSet;
pub use rules::{InputSpec, NamedPattern, Rule, RuleViolation};
pub use schema::ActionSchema;
pub use validator::{InputValidator, ResolvedRule, RuleSource, ValidationResult};
