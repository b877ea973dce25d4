//! Convention table: rules chosen by input name when no explicit rule exists
//!
//! Matchers are tried tier by tier: exact names first, then suffixes, then
//! substrings. Within a tier the first entry wins, so more specific suffixes
//! are listed before general ones.

use once_cell::sync::Lazy;

use super::guard::GuardLevel;
use super::rules::{
    InputSpec, Rule, DEFAULT_FREE_TEXT_LEN, EMAIL, EXIT_CODES, TAG_PREFIX, TOKEN, VERSION,
};

/// Predicate over an input name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatcher {
    Exact(&'static str),
    Suffix(&'static str),
    Contains(&'static str),
}

impl NameMatcher {
    pub fn matches(&self, input: &str) -> bool {
        match self {
            NameMatcher::Exact(name) => input == *name,
            NameMatcher::Suffix(suffix) => input.ends_with(suffix),
            NameMatcher::Contains(part) => input.contains(part),
        }
    }

    /// Lower sorts first
    fn tier(&self) -> u8 {
        match self {
            NameMatcher::Exact(_) => 0,
            NameMatcher::Suffix(_) => 1,
            NameMatcher::Contains(_) => 2,
        }
    }
}

impl std::fmt::Display for NameMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameMatcher::Exact(name) => write!(f, "{}", name),
            NameMatcher::Suffix(suffix) => write!(f, "*{}", suffix),
            NameMatcher::Contains(part) => write!(f, "*{}*", part),
        }
    }
}

pub struct Convention {
    pub matcher: NameMatcher,
    pub spec: InputSpec,
}

fn exact(name: &'static str, spec: InputSpec) -> Convention {
    Convention {
        matcher: NameMatcher::Exact(name),
        spec,
    }
}

fn suffix(suffix: &'static str, spec: InputSpec) -> Convention {
    Convention {
        matcher: NameMatcher::Suffix(suffix),
        spec,
    }
}

fn contains(part: &'static str, spec: InputSpec) -> Convention {
    Convention {
        matcher: NameMatcher::Contains(part),
        spec,
    }
}

const BOOLEAN_INPUTS: &[&str] = &[
    "dry-run",
    "verbose",
    "debug",
    "fail-on-error",
    "push",
    "cache",
    "fix",
    "jitter",
];

const ARGUMENT_INPUTS: &[&str] = &["args", "extra-args", "plugins", "flags"];

const FREE_TEXT_INPUTS: &[&str] = &["description", "message", "title", "body"];

pub static CONVENTIONS: Lazy<Vec<Convention>> = Lazy::new(|| {
    let mut table = vec![
        exact("token", InputSpec::new(Rule::pattern(&TOKEN))),
        exact("github-token", InputSpec::new(Rule::pattern(&TOKEN))),
        exact("email", InputSpec::new(Rule::pattern(&EMAIL))),
        exact("max-retries", InputSpec::new(Rule::Range { min: 1, max: 10 })),
        exact("retry-delay", InputSpec::new(Rule::Range { min: 1, max: 300 })),
        exact("timeout", InputSpec::new(Rule::Range { min: 1, max: 3600 })),
        exact(
            "backoff-strategy",
            InputSpec::new(Rule::one_of(&["linear", "exponential", "fixed"])),
        ),
        exact("shell", InputSpec::new(Rule::one_of(&["bash", "sh"]))),
        exact("mode", InputSpec::new(Rule::one_of(&["check", "fix"]))),
        exact(
            "working-directory",
            InputSpec::new(Rule::Path).default_value("."),
        ),
        exact(
            "command",
            InputSpec::new(Rule::Any).guard(GuardLevel::Command).required(),
        ),
        exact("prefix", InputSpec::new(Rule::pattern(&TAG_PREFIX))),
        exact("success-codes", InputSpec::new(Rule::pattern(&EXIT_CODES))),
        exact("retry-codes", InputSpec::new(Rule::pattern(&EXIT_CODES))),
    ];

    table.extend(
        BOOLEAN_INPUTS
            .iter()
            .copied()
            .map(|name| exact(name, InputSpec::new(Rule::Boolean))),
    );
    table.extend(ARGUMENT_INPUTS.iter().copied().map(|name| {
        exact(
            name,
            InputSpec::new(Rule::Any).guard(GuardLevel::Arguments),
        )
    }));
    table.extend(FREE_TEXT_INPUTS.iter().copied().map(|name| {
        exact(
            name,
            InputSpec::new(Rule::FreeText {
                max_len: DEFAULT_FREE_TEXT_LEN,
            }),
        )
    }));

    table.extend([
        suffix("-file", InputSpec::new(Rule::Path)),
        suffix("-version", InputSpec::new(Rule::pattern(&VERSION))),
        suffix("-directory", InputSpec::new(Rule::Path)),
        suffix("-token", InputSpec::new(Rule::pattern(&TOKEN))),
        suffix("-email", InputSpec::new(Rule::pattern(&EMAIL))),
        suffix("-enabled", InputSpec::new(Rule::Boolean)),
        contains("token", InputSpec::new(Rule::pattern(&TOKEN))),
        contains("version", InputSpec::new(Rule::pattern(&VERSION))),
        contains("email", InputSpec::new(Rule::pattern(&EMAIL))),
        contains("path", InputSpec::new(Rule::Path)),
        contains("directory", InputSpec::new(Rule::Path)),
    ]);

    table.sort_by_key(|c| c.matcher.tier());
    table
});

/// First convention matching `input`, honouring tier priority
pub fn lookup(input: &str) -> Option<&'static Convention> {
    CONVENTIONS.iter().find(|c| c.matcher.matches(input))
}
