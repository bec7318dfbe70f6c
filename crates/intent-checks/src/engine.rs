//! Check orchestration.

use std::collections::BTreeSet;

use intent_meta::{BaselineSource, IntentConfig, SummarySpec};
use serde_json::Value;
use tracing::{debug, info};

use crate::command::CommandCache;
use crate::metric::MetricContext;
use crate::outcome::{CheckItem, MetricItem};
use crate::runner::CommandRunner;
use crate::{assertion, gate, metric, summary};

/// Everything one check run produced, in declaration order.
#[derive(Debug, Default)]
pub struct CheckRun {
    /// Assertions followed by gates
    pub checks: Vec<CheckItem>,
    pub metrics: Vec<MetricItem>,
    pub summary_enabled: bool,
    pub summary_markdown: Option<String>,
    pub commands: CommandCache,
}

impl CheckRun {
    pub fn ok(&self) -> bool {
        self.checks.iter().all(|c| c.ok) && self.metrics.iter().all(|m| m.ok)
    }

    pub fn failures(&self) -> usize {
        self.checks.iter().filter(|c| !c.ok).count() + self.metrics.iter().filter(|m| !m.ok).count()
    }
}

/// Evaluates `[checks]` and `[ci.summary]` metrics through a [`CommandRunner`].
pub struct CheckEngine<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> CheckEngine<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Run every referenced command once, then evaluate all items.
    ///
    /// `baseline_file` is the parsed `[ci.summary].baseline_file`, if one is
    /// configured.
    pub fn run(&self, config: &IntentConfig, baseline_file: Option<Result<Value, String>>) -> CheckRun {
        let summary = active_summary(config);
        let names = referenced_commands(config);
        debug!(commands = names.len(), "Executing check commands");
        let cache = CommandCache::execute(
            self.runner,
            &config.commands,
            names.iter().copied(),
            config.checks.timeout,
        );

        let mut checks: Vec<CheckItem> = config
            .checks
            .assertions
            .iter()
            .map(|a| assertion::evaluate(a, &cache))
            .collect();
        checks.extend(config.checks.gates.iter().map(|g| gate::evaluate(g, &cache)));

        let metrics: Vec<MetricItem> = match summary {
            Some(spec) => {
                let ctx = MetricContext {
                    cache: &cache,
                    baseline_file: baseline_file.as_ref(),
                    on_missing_baseline: spec.on_missing_baseline,
                };
                spec.metrics.iter().map(|m| metric::evaluate(m, ctx)).collect()
            }
            None => Vec::new(),
        };
        let summary_markdown = summary.map(|spec| summary::render(&spec.title, &checks, &metrics));

        let run = CheckRun {
            checks,
            metrics,
            summary_enabled: summary.is_some(),
            summary_markdown,
            commands: cache,
        };
        info!(failures = run.failures(), "Check run complete");
        run
    }
}

fn active_summary(config: &IntentConfig) -> Option<&SummarySpec> {
    config.ci.summary.as_ref().filter(|s| s.enabled)
}

/// Distinct command names used by assertions, gates and enabled metrics.
pub fn referenced_commands(config: &IntentConfig) -> BTreeSet<&str> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    names.extend(config.checks.assertions.iter().map(|a| a.command.as_str()));
    names.extend(config.checks.gates.iter().map(|g| g.command.as_str()));
    if let Some(summary) = active_summary(config) {
        for metric in &summary.metrics {
            names.insert(metric.command.as_str());
            if let Some(BaselineSource::Command { command, .. }) = &metric.baseline {
                names.insert(command.as_str());
            }
        }
    }
    names
}
