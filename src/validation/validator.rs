//! Input validation: rule resolution and the four-step check

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

use super::conventions;
use super::explicit::{self, BUILTIN_RULES};
use super::loader::RuleSet;
use super::rules::{InputSpec, Rule};
use super::schema::ActionSchema;
use crate::error::ErrorCode;

/// Where a resolved rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// Per-action rule, from a rule file or the built-in table
    Explicit,
    /// Matched by input name
    Convention,
    /// Injection guard only
    Generic,
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            RuleSource::Explicit => "explicit",
            RuleSource::Convention => "convention",
            RuleSource::Generic => "generic",
        })
    }
}

/// Outcome of validating one value
///
/// Rejection is data, not an error. `error_message` names the input and the
/// expected shape, never the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Trimmed value on success; `None` for an accepted empty value
    pub normalized_value: Option<String>,
    pub error_message: Option<String>,
    pub rule: Option<String>,
    pub source: RuleSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl ValidationResult {
    fn accepted(value: Option<String>, spec: &InputSpec, source: RuleSource) -> Self {
        Self {
            valid: true,
            normalized_value: value,
            error_message: None,
            rule: Some(spec.rule.name().to_string()),
            source,
            code: None,
        }
    }

    fn rejected(code: u16, message: String, spec: &InputSpec, source: RuleSource) -> Self {
        Self {
            valid: false,
            normalized_value: None,
            error_message: Some(message),
            rule: Some(spec.rule.name().to_string()),
            source,
            code: Some(code),
        }
    }

    /// `key=value` pairs for the step output file
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("valid", self.valid.to_string()),
            (
                "error-message",
                self.error_message.clone().unwrap_or_default(),
            ),
            ("rule", self.rule.clone().unwrap_or_default()),
        ]
    }
}

/// A rule as resolved for one `(action, input)` pair
#[derive(Debug, Clone)]
pub struct ResolvedRule {
    pub input: String,
    pub spec: InputSpec,
    pub source: RuleSource,
}

/// Maps `(action, input, value)` to a [`ValidationResult`]
///
/// Immutable once built; the built-in tables are process-wide statics.
#[derive(Debug, Clone, Default)]
pub struct InputValidator {
    rules: RuleSet,
    schema: Option<ActionSchema>,
}

impl InputValidator {
    /// Validator using only the built-in rules and conventions
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_schema(mut self, schema: ActionSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Explicit rule, then convention, then the generic fallback
    pub fn resolve(&self, action: &str, input: &str) -> (InputSpec, RuleSource) {
        let (spec, source) = if let Some(spec) = self.rules.lookup(action, input) {
            (spec.clone(), RuleSource::Explicit)
        } else if let Some(spec) = explicit::lookup(action, input) {
            (spec.clone(), RuleSource::Explicit)
        } else {
            if !self.knows_action(action) {
                debug!("No explicit rules for action '{}'", action);
            }
            match conventions::lookup(input) {
                Some(convention) => {
                    debug!("Input '{}' matched convention {}", input, convention.matcher);
                    (convention.spec.clone(), RuleSource::Convention)
                }
                None => (InputSpec::new(Rule::Any), RuleSource::Generic),
            }
        };

        let spec = match &self.schema {
            Some(schema) => schema.apply(input, spec),
            None => spec,
        };
        (spec, source)
    }

    pub fn validate(&self, action: &str, input: &str, value: &str) -> ValidationResult {
        let (spec, source) = self.resolve(action, input);
        let value = value.trim();

        if !spec.guard.allows(value) {
            debug!(
                "Input '{}' rejected by {} guard",
                input,
                spec.guard.as_str()
            );
            return ValidationResult::rejected(
                ErrorCode::VALIDATION_INJECTION,
                format!("{} contains disallowed characters", input),
                &spec,
                source,
            );
        }

        if value.is_empty() {
            if spec.required {
                return ValidationResult::rejected(
                    ErrorCode::VALIDATION_REQUIRED,
                    format!("{} is required", input),
                    &spec,
                    source,
                );
            }
            return ValidationResult::accepted(None, &spec, source);
        }

        match spec.rule.check(input, value) {
            Ok(()) => ValidationResult::accepted(Some(value.to_string()), &spec, source),
            Err(violation) => {
                ValidationResult::rejected(violation.code, violation.message, &spec, source)
            }
        }
    }

    /// Validate several inputs of one action; results are keyed by input name
    pub fn validate_all<'a, I>(&self, action: &str, inputs: I) -> BTreeMap<String, ValidationResult>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        inputs
            .into_iter()
            .map(|(input, value)| (input.to_string(), self.validate(action, input, value)))
            .collect()
    }

    /// Default the caller substitutes when a value is empty
    pub fn default_for(&self, action: &str, input: &str) -> Option<String> {
        self.resolve(action, input).0.default
    }

    /// Every action with explicit rules, from files or built in
    pub fn known_actions(&self) -> BTreeSet<String> {
        BUILTIN_RULES
            .keys()
            .cloned()
            .chain(self.rules.actions().map(|(name, _)| name.clone()))
            .collect()
    }

    fn knows_action(&self, action: &str) -> bool {
        BUILTIN_RULES.contains_key(action) || self.rules.action(action).is_some()
    }

    /// Resolved rules for every input an action is known to take
    pub fn describe(&self, action: &str) -> Vec<ResolvedRule> {
        let mut inputs: BTreeSet<String> = BTreeSet::new();
        if let Some(rules) = BUILTIN_RULES.get(action) {
            inputs.extend(rules.keys().cloned());
        }
        if let Some(rules) = self.rules.action(action) {
            inputs.extend(rules.keys().cloned());
        }
        if let Some(schema) = &self.schema {
            inputs.extend(schema.inputs.keys().cloned());
        }

        inputs
            .into_iter()
            .map(|input| {
                let (spec, source) = self.resolve(action, &input);
                ResolvedRule {
                    input,
                    spec,
                    source,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::explicit::COMMON_RETRY;
    use proptest::prelude::*;

    fn validator() -> InputValidator {
        InputValidator::new()
    }

    #[test]
    fn test_prettier_token() {
        let v = validator();
        let token = format!("ghp_{}", "1".repeat(36));

        let ok = v.validate("prettier-fix", "token", &token);
        assert!(ok.valid);
        assert_eq!(ok.normalized_value.as_deref(), Some(token.as_str()));
        assert_eq!(ok.source, RuleSource::Explicit);

        let injected = v.validate("prettier-fix", "token", "ghp_x; rm -rf /");
        assert!(!injected.valid);
        assert_eq!(
            injected.error_message.as_deref(),
            Some("token contains disallowed characters")
        );
        assert_eq!(injected.code, Some(ErrorCode::VALIDATION_INJECTION));
    }

    #[test]
    fn test_version_convention_fallback() {
        let v = validator();
        let ok = v.validate("unknown-action", "default-version", "8.4");
        assert!(ok.valid);
        assert_eq!(ok.source, RuleSource::Convention);
        assert_eq!(ok.rule.as_deref(), Some("version"));

        let bad = v.validate("unknown-action", "default-version", "8.0;malicious");
        assert!(!bad.valid);
    }

    #[test]
    fn test_empty_optional_working_directory() {
        let v = validator();
        let result = v.validate(COMMON_RETRY, "working-directory", "");
        assert!(result.valid);
        assert_eq!(result.normalized_value, None);
        assert_eq!(
            v.default_for(COMMON_RETRY, "working-directory").as_deref(),
            Some(".")
        );
    }

    #[test]
    fn test_required_empty_rejected() {
        let v = validator();
        let result = v.validate(COMMON_RETRY, "command", "   ");
        assert!(!result.valid);
        assert_eq!(result.error_message.as_deref(), Some("command is required"));
        assert_eq!(result.code, Some(ErrorCode::VALIDATION_REQUIRED));
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let v = validator();
        let cases = [
            ("max-retries", 1, 10),
            ("retry-delay", 1, 300),
            ("timeout", 1, 3600),
        ];
        for (input, min, max) in cases {
            for ok in [min, max] {
                assert!(v.validate(COMMON_RETRY, input, &ok.to_string()).valid);
            }
            for bad in [min - 1, max + 1] {
                assert!(!v.validate(COMMON_RETRY, input, &bad.to_string()).valid);
            }
        }
    }

    #[test]
    fn test_guard_runs_before_every_rule_kind() {
        let v = validator();
        // One input per rule kind: pattern, enum, range, boolean, path, free text, any
        let inputs = [
            ("prettier-fix", "token"),
            ("eslint-lint", "mode"),
            (COMMON_RETRY, "max-retries"),
            ("release-monthly", "dry-run"),
            (COMMON_RETRY, "working-directory"),
            ("any-action", "description"),
            ("any-action", "labels"),
            ("php-composer", "args"),
            (COMMON_RETRY, "command"),
        ];
        for (action, input) in inputs {
            for payload in ["; rm -rf /", "`whoami`", "$(whoami)"] {
                let result = v.validate(action, input, payload);
                assert!(!result.valid, "{}/{} accepted {:?}", action, input, payload);
                assert_eq!(
                    result.error_message,
                    Some(format!("{} contains disallowed characters", input))
                );
            }
        }
    }

    #[test]
    fn test_command_guard_allows_pipelines() {
        let v = validator();
        let result = v.validate(COMMON_RETRY, "command", "npm ci && npm test | tee log");
        assert!(result.valid);
    }

    #[test]
    fn test_generic_fallback() {
        let v = validator();
        let result = v.validate("anything", "labels", "bug, enhancement");
        assert!(result.valid);
        assert_eq!(result.source, RuleSource::Generic);
        assert_eq!(result.rule.as_deref(), Some("any"));
    }

    #[test]
    fn test_value_is_trimmed_not_lowercased() {
        let v = validator();
        let result = v.validate("eslint-lint", "mode", "  fix\n");
        assert!(result.valid);
        assert_eq!(result.normalized_value.as_deref(), Some("fix"));
        assert!(!v.validate("eslint-lint", "mode", "FIX").valid);
    }

    #[test]
    fn test_file_rules_override_builtin() {
        let mut rules = RuleSet::new();
        rules
            .add_yaml("action: prettier-fix\ninputs:\n  token: { rule: any }\n")
            .unwrap();
        let v = InputValidator::new().with_rules(rules);
        assert!(v.validate("prettier-fix", "token", "plain-secret").valid);
        assert!(!validator().validate("prettier-fix", "token", "plain-secret").valid);
    }

    #[test]
    fn test_schema_makes_input_required() {
        let schema = ActionSchema::from_yaml(
            "inputs:\n  labels:\n    required: true\n  mode:\n    default: fix\n",
        )
        .unwrap();
        let v = InputValidator::new().with_schema(schema);
        assert!(!v.validate("eslint-lint", "labels", "").valid);
        assert_eq!(v.default_for("eslint-lint", "mode").as_deref(), Some("fix"));
    }

    #[test]
    fn test_schema_required_overrides_rule_default() {
        let schema =
            ActionSchema::from_yaml("inputs:\n  working-directory:\n    required: true\n")
                .unwrap();
        let v = InputValidator::new().with_schema(schema);

        for action in [COMMON_RETRY, "unknown-action"] {
            let result = v.validate(action, "working-directory", "");
            assert!(!result.valid, "{}", action);
            assert_eq!(
                result.error_message.as_deref(),
                Some("working-directory is required")
            );
            assert_eq!(v.default_for(action, "working-directory"), None);
        }
        assert!(v.validate(COMMON_RETRY, "working-directory", "src").valid);
    }

    #[test]
    fn test_validate_all_sorted() {
        let v = validator();
        let results = v.validate_all(
            COMMON_RETRY,
            [("timeout", "0"), ("command", "make"), ("max-retries", "3")],
        );
        let names: Vec<&str> = results.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["command", "max-retries", "timeout"]);
        assert!(!results["timeout"].valid);
        assert!(results["command"].valid);
    }

    #[test]
    fn test_describe_lists_action_inputs() {
        let described = validator().describe("docker-build");
        let names: Vec<&str> = described.iter().map(|r| r.input.as_str()).collect();
        assert_eq!(names, vec!["build-args", "image-name", "platforms", "push"]);
        assert!(validator().known_actions().contains(COMMON_RETRY));
    }

    #[test]
    fn test_outputs() {
        let result = validator().validate("x", "dry-run", "maybe");
        let outputs = result.outputs();
        assert_eq!(outputs[0], ("valid", "false".to_string()));
        assert_eq!(outputs[2], ("rule", "boolean".to_string()));
    }

    const INPUT_NAMES: &[&str] = &[
        "token",
        "max-retries",
        "default-version",
        "working-directory",
        "dry-run",
        "mode",
        "description",
        "args",
        "command",
        "labels",
    ];

    proptest! {
        #[test]
        fn prop_validation_is_idempotent(
            index in 0..INPUT_NAMES.len(),
            value in "[ -~\\t\\n]{0,40}",
        ) {
            let v = validator();
            let input = INPUT_NAMES[index];
            let first = v.validate(COMMON_RETRY, input, &value);
            prop_assert_eq!(&first, &v.validate(COMMON_RETRY, input, &value));

            if let Some(normalized) = &first.normalized_value {
                let again = v.validate(COMMON_RETRY, input, normalized);
                prop_assert!(again.valid);
                prop_assert_eq!(again.normalized_value.as_ref(), Some(normalized));
            }
        }
    }
}
