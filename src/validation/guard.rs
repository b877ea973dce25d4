//! Injection guard applied ahead of every type-specific rule

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which denylist the injection guard applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GuardLevel {
    /// Shell metacharacters, command substitution, `${` and `../`
    #[default]
    Strict,
    /// Flag lists such as `--max-warnings 0 --cache`: separators, pipes and
    /// substitution are blocked, spaces and dashes are fine
    Arguments,
    /// Inputs that are a shell command: only substitution and known
    /// destructive sequences are blocked
    Command,
}

const STRICT_DENYLIST: &[&str] = &[";", "&&", "||", "|", "`", "$(", "../", "..\\", "\n", "\r"];
const ARGUMENTS_DENYLIST: &[&str] = &[";", "&&", "|", "`", "$(", "\n", "\r"];
const COMMAND_DENYLIST: &[&str] = &["`", "$("];

static DESTRUCTIVE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\brm\s+-(?:rf|fr|r\s+-f|f\s+-r)\s+(?:/|~)(?:\s|\*|$)",
        r":\s*\(\s*\)\s*\{",
        r"\bmkfs(?:\.\w+)?\s",
        r"\bdd\s+[^\n]*\bof=/dev/(?:sd|nvme|hd)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

impl GuardLevel {
    /// Whether `value` passes this guard
    pub fn allows(self, value: &str) -> bool {
        match self {
            GuardLevel::Strict => {
                !contains_any(value, STRICT_DENYLIST) && !has_unescaped_expansion(value)
            }
            GuardLevel::Arguments => !contains_any(value, ARGUMENTS_DENYLIST),
            GuardLevel::Command => {
                !contains_any(value, COMMAND_DENYLIST)
                    && !DESTRUCTIVE.iter().any(|re| re.is_match(value))
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GuardLevel::Strict => "strict",
            GuardLevel::Arguments => "arguments",
            GuardLevel::Command => "command",
        }
    }
}

fn contains_any(value: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| value.contains(needle))
}

/// `${` not escaped; an even run of backslashes escapes only itself
fn has_unescaped_expansion(value: &str) -> bool {
    value.match_indices("${").any(|(idx, _)| {
        let backslashes = value.as_bytes()[..idx]
            .iter()
            .rev()
            .take_while(|&&b| b == b'\\')
            .count();
        backslashes % 2 == 0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOADS: &[&str] = &["; rm -rf /", "`whoami`", "$(whoami)"];

    #[test]
    fn test_payloads_blocked_at_every_level() {
        for level in [GuardLevel::Strict, GuardLevel::Arguments, GuardLevel::Command] {
            for payload in PAYLOADS {
                assert!(
                    !level.allows(payload),
                    "{} should block {:?}",
                    level.as_str(),
                    payload
                );
            }
        }
    }

    #[test]
    fn test_strict() {
        let level = GuardLevel::Strict;
        assert!(level.allows("1.2.3"));
        assert!(level.allows("some value with spaces"));
        assert!(level.allows("escaped \\${HOME}"));
        assert!(level.allows("escaped \\\\\\${HOME}"));
        for bad in [
            "a;b",
            "a && b",
            "a || b",
            "a | b",
            "${HOME}",
            "x${PATH}",
            "\\\\${HOME}",
            "../etc",
            "a\nb",
        ] {
            assert!(!level.allows(bad), "strict should block {:?}", bad);
        }
    }

    #[test]
    fn test_arguments_allows_flags() {
        let level = GuardLevel::Arguments;
        assert!(level.allows("--max-warnings 0 --cache"));
        assert!(level.allows("-v --format=json"));
        assert!(!level.allows("--fix; curl evil"));
        assert!(!level.allows("--fix && curl evil"));
        assert!(!level.allows("--fix | tee"));
    }

    #[test]
    fn test_command_allows_pipelines() {
        let level = GuardLevel::Command;
        assert!(level.allows("npm ci && npm test"));
        assert!(level.allows("cat report.txt | grep -v warning; echo done"));
        assert!(level.allows("rm -rf ./dist /tmp/build"));
        assert!(!level.allows("rm -rf /"));
        assert!(!level.allows("sudo rm -rf / "));
        assert!(!level.allows("rm -rf ~"));
        assert!(!level.allows(":(){ :|:& };:"));
        assert!(!level.allows("echo $(cat /etc/passwd)"));
    }
}
