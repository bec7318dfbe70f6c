//! `intent sync`

use colored::Colorize;
use intent_core::{IntentEngine, WriteMode, WriteOutcome, check_versions, read_requires_python};
use intent_fs::Filesystem;
use intent_meta::IntentConfig;
use intent_render::Target;
use similar::TextDiff;

use crate::context::ProjectContext;
use crate::error::{EXIT_OK, Result};

/// Flags of `intent sync`; conflicts are rejected by the parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncArgs {
    pub show_ci: bool,
    pub show_just: bool,
    pub dry_run: bool,
    pub write: bool,
    pub adopt: bool,
    pub force: bool,
}

impl SyncArgs {
    fn mode(&self) -> WriteMode {
        if self.force {
            WriteMode::Force
        } else if self.adopt {
            WriteMode::Adopt
        } else {
            WriteMode::Strict
        }
    }
}

/// Run the sync command
pub fn run_sync(ctx: &ProjectContext, args: SyncArgs) -> Result<u8> {
    let config = ctx.load()?;
    let fs = ctx.fs();

    print!("{}", summary(&config));
    let status = read_requires_python(fs)?;
    println!("{}", check_versions(&config, &status, false).message);

    if args.show_ci {
        println!("\n--- {} (preview) ---", Target::Ci.path());
        print!("{}", Target::Ci.render(&config));
    }
    if args.show_just {
        println!("\n--- {} (preview) ---", Target::Just.path());
        print!("{}", Target::Just.render(&config));
    }

    let runner = ctx.runner();
    let engine = IntentEngine::new(fs, &runner);

    if args.dry_run {
        println!("\n--- dry-run ---");
        for line in engine.preview(&config)? {
            println!("{line}");
        }
        for target in Target::ALL {
            let path = target.path().path();
            let current = fs.read_optional(&path)?.unwrap_or_default();
            let expected = target.render(&config);
            if current != expected {
                print!("{}", unified_diff(path.as_str(), &current, &expected));
            }
        }
        return Ok(EXIT_OK);
    }

    if args.write {
        let report = engine.sync(&config, args.mode())?;
        for (path, outcome) in &report.written {
            match outcome {
                WriteOutcome::Created | WriteOutcome::Updated => {
                    println!("{} Wrote {path}", "OK".green().bold())
                }
                WriteOutcome::Unchanged => println!("No changes to {path}"),
            }
        }
        for hook in &report.hooks.results {
            if hook.ok {
                println!("{} generate hook: {}", "OK".green().bold(), hook.command);
            }
        }
        if let Some(err) = report.hooks.error() {
            return Err(err.into());
        }
    }

    Ok(EXIT_OK)
}

fn summary(config: &IntentConfig) -> String {
    let mut out = format!("Intent python version: {}\nIntent commands:\n", config.python_version);
    for (name, command) in config.commands.iter() {
        out.push_str(&format!("  {name} -> {command}\n"));
    }
    out
}

/// Unified diff from the on-disk content to the rendered content.
pub fn unified_diff(path: &str, current: &str, expected: &str) -> String {
    TextDiff::from_lines(current, expected)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}
