//! Justfile rendering.

use intent_meta::IntentConfig;

use crate::{BANNER, GENERATED_MARKER};

const RECIPE_INDENT: &str = "    ";

/// Render the `justfile`: a `default` recipe listing recipes, then one
/// recipe per declared command in declaration order.
pub fn render_just(config: &IntentConfig) -> String {
    let mut lines = vec![
        GENERATED_MARKER.to_string(),
        BANNER.to_string(),
        String::new(),
        "default:".to_string(),
        format!("{RECIPE_INDENT}@just --list"),
        String::new(),
    ];

    for (name, command) in config.commands.iter() {
        lines.push(format!("{name}:"));
        for line in command.lines().filter(|l| !l.trim().is_empty()) {
            lines.push(format!("{RECIPE_INDENT}{line}"));
        }
        lines.push(String::new());
    }

    crate::finish(lines)
}
