//! Rules command implementation
//!
//! Without `--action`, lists the actions that have explicit rules. With it,
//! shows how each known input of that action resolves.

use anyhow::Result;

use crate::app::AppConfig;
use crate::cli::args::RulesArgs;
use crate::cli::commands::build_validator;
use crate::validation::conventions::CONVENTIONS;
use crate::validation::{InputValidator, ResolvedRule};

fn format_rule(rule: &ResolvedRule) -> String {
    let mut line = format!(
        "{:<20} {:<12} {:<10} guard={}",
        rule.input,
        rule.spec.rule.name(),
        rule.source,
        rule.spec.guard.as_str()
    );
    if rule.spec.required {
        line.push_str(" required");
    }
    if let Some(default) = &rule.spec.default {
        line.push_str(&format!(" default={}", default));
    }
    line
}

/// Lines printed for `stepguard rules`
pub fn render_rules(validator: &InputValidator, action: Option<&str>) -> Vec<String> {
    let Some(action) = action else {
        return validator.known_actions().into_iter().collect();
    };

    let described = validator.describe(action);
    if !described.is_empty() {
        return described.iter().map(format_rule).collect();
    }

    let mut lines = vec![format!(
        "No explicit rules for '{}'; inputs resolve by name:",
        action
    )];
    lines.extend(
        CONVENTIONS
            .iter()
            .map(|c| format!("{:<20} {}", c.matcher.to_string(), c.spec.rule)),
    );
    lines
}

pub fn run_rules_command(args: RulesArgs, config: &AppConfig) -> Result<i32> {
    let validator = build_validator(config.rules_dir(args.rules_dir.as_deref()).as_deref())?;
    for line in render_rules(&validator, args.action.as_deref()) {
        println!("{}", line);
    }
    Ok(0)
}
