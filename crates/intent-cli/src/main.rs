//! intent CLI
//!
//! Keeps GitHub CI, the justfile and Python version pins consistent with
//! a single `intent.toml`.

mod cli;
mod commands;
mod context;
mod error;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::SyncArgs;
use context::ProjectContext;
use error::{EXIT_OK, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Logs go to stderr; `RUST_LOG` applies unless `--verbose` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

fn run(cli: Cli) -> Result<u8> {
    let ctx = ProjectContext::new(&cli.root, &cli.config);

    match cli.command {
        Some(cmd) => execute_command(&ctx, cmd),
        None => {
            println!(
                "{} keeps CI, the justfile and version pins consistent with intent.toml",
                "intent".green().bold()
            );
            println!();
            println!("Run {} for available commands.", "intent --help".cyan());
            Ok(EXIT_OK)
        }
    }
}

fn execute_command(ctx: &ProjectContext, cmd: Commands) -> Result<u8> {
    match cmd {
        Commands::Init {
            from_existing,
            force,
        } => commands::run_init(ctx, from_existing, force),
        Commands::Show { format } => commands::run_show(ctx, format),
        Commands::Sync {
            show_ci,
            show_just,
            dry_run,
            write,
            adopt,
            force,
        } => commands::run_sync(
            ctx,
            SyncArgs {
                show_ci,
                show_just,
                dry_run,
                write,
                adopt,
                force,
            },
        ),
        Commands::Check { strict, format } => commands::run_check(ctx, strict, format),
        Commands::Doctor => commands::run_doctor(ctx),
        Commands::Reconcile {
            plan,
            apply,
            allow_existing,
        } => commands::run_reconcile(ctx, plan, apply, allow_existing),
        Commands::LintWorkflow { strict } => commands::run_lint_workflow(ctx, strict),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "intent", &mut std::io::stdout());
            Ok(EXIT_OK)
        }
    }
}
