//! Performance benchmarks for the latency mesh orchestrator
//!
//! Covers the CPU-bound pieces around the probes: ping summary parsing,
//! pair planning as regions grow, and aggregation plus report rendering.

use az_latency_mesh::{
    models::{Measurement, Node, ProbeStats, Run},
    output::OutputCoordinator,
    planner::plan_region,
    probe::parse_ping_summary,
    stats::RunSummary,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

const LINUX_OUTPUT: &str = "PING 10.0.2.15 (10.0.2.15) 56(84) bytes of data.\n\n\
--- 10.0.2.15 ping statistics ---\n\
100 packets transmitted, 100 received, 0% packet loss, time 5012ms\n\
rtt min/avg/max/mdev = 0.412/0.588/1.204/0.071 ms\n";

const BSD_OUTPUT: &str = "--- 10.0.2.15 ping statistics ---\n\
100 packets transmitted, 99 packets received, 1.0% packet loss\n\
round-trip min/avg/max/stddev = 0.412/0.588/1.204/0.071 ms\n";

fn node(region: &str, index: usize) -> Node {
    Node {
        id: format!("{}-az{}", region, index),
        region: region.to_string(),
        az_id: format!("az{:03}", index),
        az_name: None,
        instance_id: None,
        public_address: Some(format!("198.51.100.{}", index % 250 + 1)),
        private_address: format!("10.0.{}.{}", index / 250, index % 250 + 1),
        cloud: Some("aws".to_string()),
    }
}

fn nodes(region: &str, count: usize) -> Vec<Node> {
    // Reverse order so the planner has to sort
    (0..count).rev().map(|i| node(region, i)).collect()
}

/// Run with `regions` regions of `azs` AZs each, every pair measured
fn sample_run(regions: usize, azs: usize) -> Run {
    let names: Vec<String> = (0..regions).map(|r| format!("region-{}", r)).collect();
    let mut run = Run::new(100, names.clone(), vec!["aws".to_string()]);

    for region in &names {
        let pairs = plan_region(region, &nodes(region, azs)).expect("valid synthetic region");
        for (i, pair) in pairs.iter().enumerate() {
            let avg_ms = 0.3 + (i % 17) as f64 * 0.11;
            let stats = ProbeStats {
                min_ms: avg_ms * 0.8,
                avg_ms,
                max_ms: avg_ms * 1.6,
                mdev_ms: 0.05,
                packet_loss_pct: 0.0,
            };
            run.record(Measurement::result(pair, stats, 100));
        }
    }
    run.finalize();
    run
}

fn benchmark_ping_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("ping_parsing");

    group.bench_function("linux_summary", |b| {
        b.iter(|| black_box(parse_ping_summary(black_box(LINUX_OUTPUT))));
    });

    group.bench_function("bsd_summary", |b| {
        b.iter(|| black_box(parse_ping_summary(black_box(BSD_OUTPUT))));
    });

    group.bench_function("garbage", |b| {
        let garbage = "ssh: connect to host 203.0.113.9 port 22: Connection timed out\n".repeat(20);
        b.iter(|| black_box(parse_ping_summary(black_box(&garbage))));
    });

    group.finish();
}

fn benchmark_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("planning");

    for size in [3usize, 6, 12, 32, 64] {
        let region_nodes = nodes("bench-region", size);
        group.bench_with_input(BenchmarkId::new("plan_region", size), &region_nodes, |b, region_nodes| {
            b.iter(|| black_box(plan_region("bench-region", black_box(region_nodes))));
        });
    }

    group.finish();
}

fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for (regions, azs) in [(4usize, 3usize), (16, 6), (32, 12)] {
        let run = sample_run(regions, azs);
        let label = format!("{}x{}", regions, azs);

        group.bench_with_input(BenchmarkId::new("run_summary", &label), &run, |b, run| {
            b.iter(|| black_box(RunSummary::from_run(black_box(run))));
        });

        let summary = RunSummary::from_run(&run);
        group.bench_with_input(BenchmarkId::new("render_report", &label), &summary, |b, summary| {
            let coordinator = OutputCoordinator::for_report();
            b.iter(|| black_box(coordinator.render_report(black_box(summary))));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_ping_parsing, benchmark_planning, benchmark_aggregation);
criterion_main!(benches);
