use criterion::{Criterion, black_box, criterion_group, criterion_main};
use intent_meta::{CiJob, CiStep, IntentConfig, StepAction};
use intent_render::{render_ci, render_just};

fn wide_config() -> IntentConfig {
    let names: Vec<String> = (0..50).map(|i| format!("cmd{i}")).collect();
    let mut cfg =
        IntentConfig::minimal("3.12", names.iter().map(|n| (n.as_str(), "pytest -q"))).unwrap();
    cfg.ci.jobs = names
        .iter()
        .map(|name| {
            let mut job = CiJob::new(name.clone());
            job.steps = vec![
                CiStep::uses("actions/checkout@v4"),
                CiStep::new(StepAction::Command(name.clone())),
            ];
            job
        })
        .collect();
    cfg
}

fn bench_render(c: &mut Criterion) {
    let cfg = wide_config();
    c.bench_function("render_ci_50_jobs", |b| b.iter(|| render_ci(black_box(&cfg))));
    c.bench_function("render_just_50_commands", |b| {
        b.iter(|| render_just(black_box(&cfg)))
    });
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
