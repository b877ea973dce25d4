//! Rule files: per-action YAML definitions that override the built-in table

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::explicit::ActionRules;
use super::guard::GuardLevel;
use super::rules::{builtin_pattern, InputSpec, NamedPattern, Rule, DEFAULT_FREE_TEXT_LEN};
use crate::error::{ErrorCode, Result, StepGuardError};

/// One rule file as written on disk
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    action: String,
    #[serde(default)]
    inputs: BTreeMap<String, RuleDef>,
}

/// One input entry; which fields are meaningful depends on `rule`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RuleDef {
    rule: String,
    pattern: Option<String>,
    description: Option<String>,
    values: Option<Vec<String>>,
    min: Option<i64>,
    max: Option<i64>,
    max_len: Option<usize>,
    #[serde(default)]
    guard: GuardLevel,
    #[serde(default)]
    required: bool,
    default: Option<serde_yaml::Value>,
}

impl RuleDef {
    fn into_spec(self, input: &str) -> Result<InputSpec> {
        let rule = match self.rule.as_str() {
            "regex" => {
                let pattern = self.pattern.ok_or_else(|| {
                    missing_field(input, "regex", "pattern")
                })?;
                let description = self
                    .description
                    .unwrap_or_else(|| format!("value matching {}", pattern));
                let compiled = NamedPattern::new(input, description, &pattern)
                    .map_err(|e| StepGuardError::from(e).with_context(input))?;
                Rule::Pattern(compiled)
            }
            "enum" => {
                let values = self
                    .values
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| missing_field(input, "enum", "values"))?;
                Rule::OneOf(values)
            }
            "range" => {
                let min = self.min.ok_or_else(|| missing_field(input, "range", "min"))?;
                let max = self.max.ok_or_else(|| missing_field(input, "range", "max"))?;
                if min > max {
                    return Err(StepGuardError::config_with_code(
                        ErrorCode::CONFIG_INVALID_VALUE,
                        format!("{}: range min {} is greater than max {}", input, min, max),
                    ));
                }
                Rule::Range { min, max }
            }
            "boolean" => Rule::Boolean,
            "path" => Rule::Path,
            "free-text" => Rule::FreeText {
                max_len: self.max_len.unwrap_or(DEFAULT_FREE_TEXT_LEN),
            },
            "any" => Rule::Any,
            named => match builtin_pattern(named) {
                Some(pattern) => Rule::pattern(pattern),
                None => {
                    return Err(StepGuardError::config_with_code(
                        ErrorCode::CONFIG_INVALID_VALUE,
                        format!("{}: unknown rule kind '{}'", input, named),
                    ))
                }
            },
        };

        let mut spec = InputSpec::new(rule).guard(self.guard);
        spec.required = self.required;
        spec.default = self
            .default
            .map(|value| scalar_to_string(input, value))
            .transpose()?
            .flatten();
        Ok(spec)
    }
}

fn missing_field(input: &str, kind: &str, field: &str) -> StepGuardError {
    StepGuardError::config_with_code(
        ErrorCode::CONFIG_MISSING_REQUIRED,
        format!("{}: rule '{}' needs a '{}' field", input, kind, field),
    )
}

/// Action inputs are strings; YAML may still spell a default as a number or bool
pub(crate) fn scalar_to_string(input: &str, value: serde_yaml::Value) -> Result<Option<String>> {
    match value {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        serde_yaml::Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Err(StepGuardError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!("{}: default must be a scalar", input),
        )),
    }
}

/// Rules loaded from files, keyed by action
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    actions: BTreeMap<String, ActionRules>,
    sources: Vec<PathBuf>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.yml` / `*.yaml` file in `dir`, in file name order
    ///
    /// Files for the same action merge; a later file wins per input.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(StepGuardError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                format!("rules directory '{}' does not exist", dir.display()),
            ));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| {
            StepGuardError::config_with_code(
                ErrorCode::CONFIG_PATH_ERROR,
                format!("cannot read rules directory '{}'", dir.display()),
            )
            .with_source(e)
        })? {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yml" || ext == "yaml");
            if is_yaml && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut set = Self::new();
        for path in files {
            set.load_file(&path)?;
        }
        debug!(
            "Loaded rules for {} action(s) from {}",
            set.actions.len(),
            dir.display()
        );
        Ok(set)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .map_err(|e| StepGuardError::from(e).with_context(path.display()))?;
        self.add_yaml(&content)
            .map_err(|e| e.with_context(path.display()))?;
        self.sources.push(path.to_path_buf());
        debug!("Loaded rule file {}", path.display());
        Ok(())
    }

    /// Parse one rule document and merge it in
    pub fn add_yaml(&mut self, content: &str) -> Result<()> {
        let file: RuleFile = serde_yaml::from_str(content)?;
        if file.action.trim().is_empty() {
            return Err(StepGuardError::config_with_code(
                ErrorCode::CONFIG_MISSING_REQUIRED,
                "rule file has an empty 'action'",
            ));
        }

        let mut parsed = ActionRules::new();
        for (input, def) in file.inputs {
            let spec = def.into_spec(&input)?;
            parsed.insert(input, spec);
        }

        self.actions.entry(file.action).or_default().extend(parsed);
        Ok(())
    }

    pub fn lookup(&self, action: &str, input: &str) -> Option<&InputSpec> {
        self.actions.get(action).and_then(|rules| rules.get(input))
    }

    pub fn action(&self, action: &str) -> Option<&ActionRules> {
        self.actions.get(action)
    }

    pub fn actions(&self) -> impl Iterator<Item = (&String, &ActionRules)> {
        self.actions.iter()
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PRETTIER: &str = r#"
action: prettier-fix
inputs:
  token: { rule: token }
  mode: { rule: enum, values: [check, fix], default: check }
  max-retries: { rule: range, min: 1, max: 10, required: false, default: 3 }
  file-pattern: { rule: regex, pattern: "^[A-Za-z0-9*./{},_-]+$" }
  plugins: { rule: any, guard: arguments }
"#;

    #[test]
    fn test_parse_rule_file() {
        let mut set = RuleSet::new();
        set.add_yaml(PRETTIER).unwrap();

        assert_eq!(set.lookup("prettier-fix", "token").unwrap().rule.name(), "token");
        let mode = set.lookup("prettier-fix", "mode").unwrap();
        assert_eq!(mode.default.as_deref(), Some("check"));
        let retries = set.lookup("prettier-fix", "max-retries").unwrap();
        assert_eq!(retries.default.as_deref(), Some("3"));
        assert!(!retries.required);
        assert_eq!(
            set.lookup("prettier-fix", "plugins").unwrap().guard,
            GuardLevel::Arguments
        );

        let pattern = set.lookup("prettier-fix", "file-pattern").unwrap();
        assert!(pattern.rule.check("file-pattern", "src/**/*.ts").is_ok());
        assert!(pattern.rule.check("file-pattern", "src/*.ts extra").is_err());
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let mut set = RuleSet::new();
        let err = set
            .add_yaml("action: a\ninputs:\n  x: { rule: regex, pattern: \"([\" }\n")
            .unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_PATTERN);
    }

    #[test]
    fn test_unknown_rule_kind_is_config_error() {
        let mut set = RuleSet::new();
        let err = set
            .add_yaml("action: a\ninputs:\n  x: { rule: telepathy }\n")
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("telepathy"));
    }

    #[test]
    fn test_missing_fields_and_bad_range() {
        let mut set = RuleSet::new();
        assert!(set.add_yaml("action: a\ninputs:\n  x: { rule: enum }\n").is_err());
        assert!(set
            .add_yaml("action: a\ninputs:\n  x: { rule: range, min: 5, max: 1 }\n")
            .is_err());
        assert!(set.add_yaml("action: a\ninputs:\n  x: { rule: any, colour: red }\n").is_err());
    }

    #[test]
    fn test_load_dir_merges_in_name_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("01-base.yml"),
            "action: docker-build\ninputs:\n  tag: { rule: version }\n  push: { rule: boolean }\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("02-override.yaml"),
            "action: docker-build\ninputs:\n  tag: { rule: any }\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a rule file").unwrap();

        let set = RuleSet::load_dir(dir.path()).unwrap();
        assert_eq!(set.sources().len(), 2);
        assert_eq!(set.lookup("docker-build", "tag").unwrap().rule.name(), "any");
        assert_eq!(set.lookup("docker-build", "push").unwrap().rule.name(), "boolean");
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let err = RuleSet::load_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_invalid_yaml_names_the_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.yml"), "action: [unterminated").unwrap();
        let err = RuleSet::load_dir(dir.path()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_YAML);
        assert!(err.to_string().contains("broken.yml"));
    }
}
