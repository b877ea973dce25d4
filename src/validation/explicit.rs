//! Built-in explicit rules, keyed by action and then input name

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use super::guard::GuardLevel;
use super::rules::{
    InputSpec, Rule, FILE_GLOB, IMAGE_NAME, NPM_SCOPE, PLATFORMS, TAG_PREFIX, TOKEN, URL, VERSION,
};

/// Rules for every input of one action
pub type ActionRules = BTreeMap<String, InputSpec>;

/// Action name used for the retry primitive's own inputs
pub const COMMON_RETRY: &str = "common-retry";

fn action(entries: Vec<(&str, InputSpec)>) -> ActionRules {
    entries
        .into_iter()
        .map(|(input, spec)| (input.to_string(), spec))
        .collect()
}

pub static BUILTIN_RULES: Lazy<BTreeMap<String, ActionRules>> = Lazy::new(|| {
    let mut table = BTreeMap::new();

    table.insert(
        COMMON_RETRY.to_string(),
        action(vec![
            (
                "command",
                InputSpec::new(Rule::Any)
                    .guard(GuardLevel::Command)
                    .required(),
            ),
            (
                "max-retries",
                InputSpec::new(Rule::Range { min: 1, max: 10 }).default_value("3"),
            ),
            (
                "retry-delay",
                InputSpec::new(Rule::Range { min: 1, max: 300 }).default_value("5"),
            ),
            (
                "backoff-strategy",
                InputSpec::new(Rule::one_of(&["linear", "exponential", "fixed"]))
                    .default_value("exponential"),
            ),
            (
                "timeout",
                InputSpec::new(Rule::Range { min: 1, max: 3600 }).default_value("600"),
            ),
            (
                "shell",
                InputSpec::new(Rule::one_of(&["bash", "sh"])).default_value("bash"),
            ),
            (
                "working-directory",
                InputSpec::new(Rule::Path).default_value("."),
            ),
        ]),
    );

    table.insert(
        "prettier-fix".to_string(),
        action(vec![
            ("token", InputSpec::new(Rule::pattern(&TOKEN))),
            ("file-pattern", InputSpec::new(Rule::pattern(&FILE_GLOB))),
            (
                "mode",
                InputSpec::new(Rule::one_of(&["check", "fix"])).default_value("check"),
            ),
        ]),
    );

    table.insert(
        "eslint-lint".to_string(),
        action(vec![
            (
                "mode",
                InputSpec::new(Rule::one_of(&["check", "fix"])).default_value("check"),
            ),
            (
                "max-warnings",
                InputSpec::new(Rule::Range { min: 0, max: 10000 }).default_value("0"),
            ),
            (
                "report-format",
                InputSpec::new(Rule::one_of(&["stylish", "json", "sarif", "compact"]))
                    .default_value("stylish"),
            ),
        ]),
    );

    table.insert(
        "php-composer".to_string(),
        action(vec![
            ("args", InputSpec::new(Rule::Any).guard(GuardLevel::Arguments)),
            ("php-version", InputSpec::new(Rule::pattern(&VERSION))),
        ]),
    );

    table.insert(
        "docker-build".to_string(),
        action(vec![
            (
                "image-name",
                InputSpec::new(Rule::pattern(&IMAGE_NAME)).required(),
            ),
            ("platforms", InputSpec::new(Rule::pattern(&PLATFORMS))),
            (
                "build-args",
                InputSpec::new(Rule::Any).guard(GuardLevel::Arguments),
            ),
            ("push", InputSpec::new(Rule::Boolean).default_value("false")),
        ]),
    );

    table.insert(
        "npm-publish".to_string(),
        action(vec![
            (
                "registry-url",
                InputSpec::new(Rule::pattern(&URL)).default_value("https://registry.npmjs.org"),
            ),
            ("scope", InputSpec::new(Rule::pattern(&NPM_SCOPE))),
            ("package-version", InputSpec::new(Rule::pattern(&VERSION))),
            ("npm-token", InputSpec::new(Rule::Any).required()),
        ]),
    );

    table.insert(
        "release-monthly".to_string(),
        action(vec![
            ("prefix", InputSpec::new(Rule::pattern(&TAG_PREFIX))),
            ("dry-run", InputSpec::new(Rule::Boolean).default_value("false")),
        ]),
    );

    table
});

pub fn lookup(action: &str, input: &str) -> Option<&'static InputSpec> {
    BUILTIN_RULES.get(action).and_then(|rules| rules.get(input))
}
