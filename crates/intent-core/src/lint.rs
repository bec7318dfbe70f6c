//! Workflow lints over the declared CI topology.

use intent_meta::{Code, IntentConfig, StepAction};
use serde::Serialize;

/// GitHub's upper limit for artifact retention.
pub const MAX_RETENTION_DAYS: u32 = 90;

const CHECKOUT_ACTION: &str = "actions/checkout";

/// A single lint warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintFinding {
    pub message: String,
    pub code: Code,
}

impl LintFinding {
    fn warn(message: String) -> Self {
        Self {
            message,
            code: Code::WorkflowLint,
        }
    }
}

/// Lint custom jobs and artifacts, in declaration order.
pub fn lint_workflow(config: &IntentConfig) -> Vec<LintFinding> {
    let mut findings = Vec::new();

    for job in &config.ci.jobs {
        let has_checkout = job.steps.iter().any(|step| {
            matches!(&step.action, StepAction::Uses { uses, .. } if uses.starts_with(CHECKOUT_ACTION))
        });
        if !has_checkout {
            findings.push(LintFinding::warn(format!(
                "job '{}' has no checkout step",
                job.name
            )));
        }

        for step in &job.steps {
            if let StepAction::Uses { uses, .. } = &step.action
                && !is_pinned(uses)
            {
                findings.push(LintFinding::warn(format!(
                    "job '{}' uses '{uses}' without a pinned @ref",
                    job.name
                )));
            }
        }
    }

    for artifact in &config.ci.artifacts {
        if let Some(days) = artifact.retention_days
            && days > MAX_RETENTION_DAYS
        {
            findings.push(LintFinding::warn(format!(
                "artifact '{}' retention-days {days} exceeds the maximum of {MAX_RETENTION_DAYS}",
                artifact.name
            )));
        }
    }

    findings
}

/// Local and container actions carry no ref; everything else needs `@ref`.
fn is_pinned(uses: &str) -> bool {
    if uses.starts_with("./") || uses.starts_with("docker://") {
        return true;
    }
    uses.split_once('@')
        .is_some_and(|(action, reference)| !action.is_empty() && !reference.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent_meta::{CiArtifact, CiJob, CiStep};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn config_with(jobs: Vec<CiJob>, artifacts: Vec<CiArtifact>) -> IntentConfig {
        let mut config = IntentConfig::minimal("3.12", [("test", "pytest -q")]).unwrap();
        config.ci.jobs = jobs;
        config.ci.artifacts = artifacts;
        config
    }

    fn job(name: &str, steps: Vec<CiStep>) -> CiJob {
        let mut job = CiJob::new(name);
        job.steps = steps;
        job
    }

    #[rstest]
    #[case("actions/checkout@v4", true)]
    #[case("org/action@3f1c2e0", true)]
    #[case("./.github/actions/local", true)]
    #[case("docker://alpine:3.20", true)]
    #[case("actions/checkout", false)]
    #[case("actions/checkout@", false)]
    fn test_is_pinned(#[case] uses: &str, #[case] pinned: bool) {
        assert_eq!(is_pinned(uses), pinned);
    }

    #[test]
    fn test_default_job_has_no_findings() {
        assert!(lint_workflow(&config_with(Vec::new(), Vec::new())).is_empty());
    }

    #[test]
    fn test_findings_follow_declaration_order() {
        let jobs = vec![
            job("test", vec![CiStep::new(StepAction::Command("test".into()))]),
            job(
                "lint",
                vec![CiStep::uses("actions/checkout@v4"), CiStep::uses("astral-sh/ruff-action")],
            ),
        ];
        let artifacts = vec![CiArtifact {
            name: "junit".into(),
            path: "junit.xml".into(),
            retention_days: Some(120),
            when: Default::default(),
        }];

        let messages: Vec<String> = lint_workflow(&config_with(jobs, artifacts))
            .into_iter()
            .map(|f| f.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "job 'test' has no checkout step",
                "job 'lint' uses 'astral-sh/ruff-action' without a pinned @ref",
                "artifact 'junit' retention-days 120 exceeds the maximum of 90",
            ]
        );
    }
}
