//! Rule kinds and the checks they perform

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use super::guard::GuardLevel;
use crate::error::ErrorCode;

/// A compiled regex with the name and description used in messages
#[derive(Debug, Clone)]
pub struct NamedPattern {
    pub name: String,
    pub description: String,
    pub regex: Regex,
}

impl NamedPattern {
    /// Compile a pattern; the regex is anchored so it must match the whole value
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        pattern: &str,
    ) -> Result<Self, regex::Error> {
        let anchored = anchor(pattern);
        Ok(Self {
            name: name.into(),
            description: description.into(),
            regex: Regex::new(&anchored)?,
        })
    }

    fn builtin(name: &str, description: &str, pattern: &str) -> Self {
        // Built-in patterns are literals covered by tests
        #[allow(clippy::expect_used)]
        Self::new(name, description, pattern).expect("built-in pattern must compile")
    }
}

fn anchor(pattern: &str) -> String {
    let body = pattern.strip_prefix('^').unwrap_or(pattern);
    let body = match body.strip_suffix('$') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => body,
    };
    format!("^(?:{})$", body)
}

pub static VERSION: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::builtin(
        "version",
        "semantic version such as 1.2 or v1.2.3-rc.1",
        r"^v?[0-9]+\.[0-9]+(\.[0-9]+)?(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$",
    )
});

pub static TOKEN: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::builtin(
        "token",
        "GitHub token (ghp_, gho_, ghu_, ghs_, ghr_, ghe_ or github_pat_ prefix)",
        r"^(gh[pousre]_[A-Za-z0-9]{36,}|github_pat_[A-Za-z0-9_]{22,})$",
    )
});

pub static EMAIL: Lazy<NamedPattern> =
    Lazy::new(|| NamedPattern::builtin("email", "email address", r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

pub static TAG_PREFIX: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::builtin(
        "tag-prefix",
        "tag prefix of at most 64 letters, digits, '.', '_', '/' or '-'",
        r"^[A-Za-z0-9._/-]{0,64}$",
    )
});

pub static EXIT_CODES: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::builtin(
        "exit-codes",
        "comma separated list of exit codes",
        r"^-?[0-9]{1,3}([, ]+-?[0-9]{1,3})*$",
    )
});

pub static URL: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::builtin("url", "http(s) URL", r"^https?://[A-Za-z0-9.-]+(:[0-9]+)?(/[^\s]*)?$")
});

pub static IMAGE_NAME: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::builtin(
        "image-name",
        "lowercase image name",
        r"^[a-z0-9]+([._/-][a-z0-9]+)*$",
    )
});

pub static PLATFORMS: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::builtin(
        "platforms",
        "comma separated platform list such as linux/amd64,linux/arm64",
        r"^[a-z0-9]+/[a-z0-9]+(/[a-z0-9]+)?(,[a-z0-9]+/[a-z0-9]+(/[a-z0-9]+)?)*$",
    )
});

pub static NPM_SCOPE: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::builtin("npm-scope", "npm scope such as @acme", r"^@[a-z0-9~-][a-z0-9._~-]*$")
});

pub static FILE_GLOB: Lazy<NamedPattern> = Lazy::new(|| {
    NamedPattern::builtin(
        "file-glob",
        "file glob of letters, digits and * ? . / { } , _ - [ ] !",
        r"^[A-Za-z0-9*?./{},_\[\]! -]+$",
    )
});

/// Look up a built-in pattern by the name used in rule files
pub fn builtin_pattern(name: &str) -> Option<&'static NamedPattern> {
    let pattern: &'static Lazy<NamedPattern> = match name {
        "version" => &VERSION,
        "token" => &TOKEN,
        "email" => &EMAIL,
        "tag-prefix" => &TAG_PREFIX,
        "exit-codes" => &EXIT_CODES,
        "url" => &URL,
        "image-name" => &IMAGE_NAME,
        "platforms" => &PLATFORMS,
        "npm-scope" => &NPM_SCOPE,
        "file-glob" => &FILE_GLOB,
        _ => return None,
    };
    Some(Lazy::force(pattern))
}

pub const DEFAULT_FREE_TEXT_LEN: usize = 1024;

/// Type-specific check applied after the injection guard
#[derive(Debug, Clone)]
pub enum Rule {
    /// Full regex match
    Pattern(NamedPattern),
    /// Exact membership in an allow-list
    OneOf(Vec<String>),
    /// Integer within `[min, max]`
    Range { min: i64, max: i64 },
    /// Exactly `true` or `false`
    Boolean,
    /// Relative path without `..` segments
    Path,
    /// Printable text up to `max_len` characters
    FreeText { max_len: usize },
    /// Nothing beyond the injection guard
    Any,
}

/// Why a rule rejected a value; never contains the value itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    pub code: u16,
    pub message: String,
}

impl RuleViolation {
    fn new(code: u16, message: String) -> Self {
        Self { code, message }
    }
}

impl Rule {
    pub fn pattern(pattern: &NamedPattern) -> Self {
        Rule::Pattern(pattern.clone())
    }

    pub fn one_of(values: &[&str]) -> Self {
        Rule::OneOf(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn name(&self) -> &str {
        match self {
            Rule::Pattern(p) => &p.name,
            Rule::OneOf(_) => "enum",
            Rule::Range { .. } => "range",
            Rule::Boolean => "boolean",
            Rule::Path => "path",
            Rule::FreeText { .. } => "free-text",
            Rule::Any => "any",
        }
    }

    /// Check a non-empty value against this rule
    pub fn check(&self, input: &str, value: &str) -> Result<(), RuleViolation> {
        match self {
            Rule::Pattern(pattern) => {
                if pattern.regex.is_match(value) {
                    Ok(())
                } else {
                    Err(RuleViolation::new(
                        ErrorCode::VALIDATION_PATTERN_MISMATCH,
                        format!("{} must be a {}", input, pattern.description),
                    ))
                }
            }
            Rule::OneOf(allowed) => {
                if allowed.iter().any(|a| a == value) {
                    Ok(())
                } else {
                    Err(RuleViolation::new(
                        ErrorCode::VALIDATION_NOT_ALLOWED,
                        format!("{} must be one of: {}", input, allowed.join(", ")),
                    ))
                }
            }
            Rule::Range { min, max } => {
                let in_range = is_integer_literal(value)
                    && value
                        .parse::<i64>()
                        .map(|n| (*min..=*max).contains(&n))
                        .unwrap_or(false);
                if in_range {
                    Ok(())
                } else {
                    Err(RuleViolation::new(
                        ErrorCode::VALIDATION_OUT_OF_RANGE,
                        format!("{} must be an integer between {} and {}", input, min, max),
                    ))
                }
            }
            Rule::Boolean => {
                if value == "true" || value == "false" {
                    Ok(())
                } else {
                    Err(RuleViolation::new(
                        ErrorCode::VALIDATION_NOT_ALLOWED,
                        format!("{} must be 'true' or 'false'", input),
                    ))
                }
            }
            Rule::Path => {
                if is_safe_relative_path(value) {
                    Ok(())
                } else {
                    Err(RuleViolation::new(
                        ErrorCode::VALIDATION_INVALID_PATH,
                        format!("{} must be a relative path without '..' segments", input),
                    ))
                }
            }
            Rule::FreeText { max_len } => {
                if value.chars().count() <= *max_len && !value.chars().any(char::is_control) {
                    Ok(())
                } else {
                    Err(RuleViolation::new(
                        ErrorCode::VALIDATION_PATTERN_MISMATCH,
                        format!(
                            "{} must be at most {} characters without control characters",
                            input, max_len
                        ),
                    ))
                }
            }
            Rule::Any => Ok(()),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Pattern(p) => write!(f, "{} ({})", p.name, p.description),
            Rule::OneOf(values) => write!(f, "enum [{}]", values.join(", ")),
            Rule::Range { min, max } => write!(f, "range [{}, {}]", min, max),
            Rule::FreeText { max_len } => write!(f, "free-text (max {})", max_len),
            other => f.write_str(other.name()),
        }
    }
}

fn is_integer_literal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_safe_relative_path(value: &str) -> bool {
    !value.starts_with('/')
        && !value.starts_with('\\')
        && !value.contains('\0')
        && !value.split(['/', '\\']).any(|segment| segment == "..")
}

/// A resolved rule plus the flags that decide empty-value handling
#[derive(Debug, Clone)]
pub struct InputSpec {
    pub rule: Rule,
    pub guard: GuardLevel,
    pub required: bool,
    pub default: Option<String>,
}

impl InputSpec {
    pub fn new(rule: Rule) -> Self {
        Self {
            rule,
            guard: GuardLevel::Strict,
            required: false,
            default: None,
        }
    }

    pub fn guard(mut self, guard: GuardLevel) -> Self {
        self.guard = guard;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}
