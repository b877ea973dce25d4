//! End-to-end validator scenarios through the public API

use stepguard::validation::{
    ActionSchema, InputValidator, RuleSet, RuleSource, COMMON_RETRY,
};

#[test]
fn test_token_for_prettier_fix() {
    let validator = InputValidator::new();
    let token = format!("ghp_{}", "Z".repeat(40));

    let accepted = validator.validate("prettier-fix", "token", &token);
    assert!(accepted.valid);
    assert_eq!(accepted.normalized_value, Some(token));

    let rejected = validator.validate("prettier-fix", "token", "ghp_x; rm -rf /");
    assert!(!rejected.valid);
    assert_eq!(
        rejected.error_message.as_deref(),
        Some("token contains disallowed characters")
    );
}

#[test]
fn test_default_version_falls_back_to_convention() {
    let validator = InputValidator::new();
    let result = validator.validate("brand-new-action", "default-version", "1.22.3");
    assert!(result.valid);
    assert_eq!(result.source, RuleSource::Convention);
    assert_eq!(result.rule.as_deref(), Some("version"));
}

#[test]
fn test_empty_optional_uses_default() {
    let validator = InputValidator::new();
    let result = validator.validate(COMMON_RETRY, "working-directory", "");
    assert!(result.valid);
    assert_eq!(result.normalized_value, None);
    assert_eq!(
        validator.default_for(COMMON_RETRY, "working-directory"),
        Some(".".to_string())
    );
}

#[test]
fn test_rule_file_and_schema_together() {
    let mut rules = RuleSet::new();
    rules
        .add_yaml(
            r#"
action: eslint-lint
inputs:
  max-warnings: { rule: range, min: 0, max: 50 }
  config-file: { rule: regex, pattern: "[a-z.]+\\.json", description: "json config file name" }
"#,
        )
        .unwrap();
    let schema = ActionSchema::from_yaml(
        "inputs:\n  config-file:\n    required: true\n  max-warnings:\n    default: 0\n",
    )
    .unwrap();
    let validator = InputValidator::new().with_rules(rules).with_schema(schema);

    assert!(!validator.validate("eslint-lint", "max-warnings", "100").valid);
    assert!(validator.validate("eslint-lint", "max-warnings", "50").valid);

    let missing = validator.validate("eslint-lint", "config-file", "");
    assert_eq!(missing.error_message.as_deref(), Some("config-file is required"));

    let wrong = validator.validate("eslint-lint", "config-file", "eslintrc.yml");
    assert_eq!(
        wrong.error_message.as_deref(),
        Some("config-file must be a json config file name")
    );
    assert!(validator.validate("eslint-lint", "config-file", "eslintrc.json").valid);
}

#[test]
fn test_validate_all_reports_every_input() {
    let validator = InputValidator::new();
    let results = validator.validate_all(
        "docker-build",
        [
            ("image-name", "ghcr.io/acme/app"),
            ("platforms", "linux/amd64,linux/arm64"),
            ("build-args", "--build-arg VERSION=1"),
            ("push", "yes"),
        ],
    );

    assert!(results["image-name"].valid);
    assert!(results["platforms"].valid);
    assert!(results["build-args"].valid);
    assert!(!results["push"].valid);
    assert_eq!(
        results["push"].error_message.as_deref(),
        Some("push must be 'true' or 'false'")
    );
}
