//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// intent - Keep CI, the justfile and Python version pins consistent with intent.toml
#[derive(Parser, Debug)]
#[command(name = "intent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project root
    #[arg(long, global = true, default_value = ".", env = "INTENT_ROOT")]
    pub root: PathBuf,

    /// Config file, relative to the project root
    #[arg(long, global = true, default_value = "intent.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format for commands that support machine-readable output
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write a starter intent.toml
    ///
    /// Examples:
    ///   intent init                   # Declare python 3.12
    ///   intent init --from-existing   # Infer the version from pyproject.toml or .python-version
    Init {
        /// Infer the python version from existing project files
        #[arg(long)]
        from_existing: bool,

        /// Overwrite an existing intent.toml
        #[arg(long)]
        force: bool,
    },

    /// Show the resolved configuration
    Show {
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Preview or write generated files
    ///
    /// Examples:
    ///   intent sync --dry-run         # Show what would change, with diffs
    ///   intent sync --write           # Write tool-owned files
    ///   intent sync --write --force   # Replace files that are not tool-owned
    Sync {
        /// Print the rendered workflow
        #[arg(long)]
        show_ci: bool,

        /// Print the rendered justfile
        #[arg(long)]
        show_just: bool,

        /// Show what would be written or updated, without writing
        #[arg(long, conflicts_with = "write")]
        dry_run: bool,

        /// Write tool-owned generated files
        #[arg(long)]
        write: bool,

        /// Opt in to taking over existing files (still refuses foreign content)
        #[arg(long, requires = "write", conflicts_with = "force")]
        adopt: bool,

        /// Overwrite files regardless of ownership
        #[arg(long, requires = "write")]
        force: bool,
    },

    /// Check versions, generated files and structured checks without writing
    ///
    /// Exit codes: 0 = ok, 1 = drift or check failure, 2 = config/usage error
    Check {
        /// Fail on broader or unsupported requires-python specs
        #[arg(long)]
        strict: bool,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Diagnose the project and suggest fixes
    Doctor,

    /// Align pyproject.toml, .python-version and .tool-versions with intent
    ///
    /// Examples:
    ///   intent reconcile --plan                      # Show what would change
    ///   intent reconcile --apply                     # Create missing pins
    ///   intent reconcile --apply --allow-existing    # Also update existing files
    Reconcile {
        /// Show the plan without modifying anything
        #[arg(long)]
        plan: bool,

        /// Apply the plan
        #[arg(long)]
        apply: bool,

        /// Allow edits to files that already exist
        #[arg(long)]
        allow_existing: bool,
    },

    /// Lint the declared CI workflow
    LintWorkflow {
        /// Exit non-zero when warnings are found
        #[arg(long)]
        strict: bool,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   intent completions bash > ~/.local/share/bash-completion/completions/intent
    ///   intent completions zsh > ~/.zfunc/_intent
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
