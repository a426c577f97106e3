//! End-to-end runs of the `metapaths` binary on a small synthetic graph.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn write_fixtures(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let nodes = dir.join("nodes.jsonl");
    fs::write(
        &nodes,
        concat!(
            "{\"id\": \"a0\", \"category\": [\"A\"]}\n",
            "{\"id\": \"a1\", \"category\": [\"A\"]}\n",
            "{\"id\": \"b0\", \"category\": [\"B\"]}\n",
            "{\"id\": \"b1\", \"category\": [\"B\"]}\n",
            "{\"id\": \"c0\", \"category\": [\"C\"]}\n",
            "{\"id\": \"c1\", \"category\": [\"C\"]}\n",
            "{\"id\": \"x0\", \"category\": [\"Unknown\"]}\n",
        ),
    )
    .unwrap();

    let edges = dir.join("edges.jsonl");
    fs::write(
        &edges,
        concat!(
            "{\"subject\": \"a0\", \"predicate\": \"p\", \"object\": \"b0\"}\n",
            "{\"subject\": \"a0\", \"predicate\": \"p\", \"object\": \"b1\"}\n",
            "{\"subject\": \"b0\", \"predicate\": \"p\", \"object\": \"c0\"}\n",
            "{\"subject\": \"b1\", \"predicate\": \"p\", \"object\": \"c0\"}\n",
            "{\"subject\": \"c0\", \"predicate\": \"q\", \"object\": \"a0\"}\n",
            "{\"subject\": \"a1\", \"predicate\": \"subclass_of\", \"object\": \"a0\"}\n",
            "{\"subject\": \"x0\", \"predicate\": \"p\", \"object\": \"a0\"}\n",
        ),
    )
    .unwrap();

    let hierarchy = dir.join("hierarchy.json");
    fs::write(
        &hierarchy,
        "{\"A\": [\"Root\"], \"B\": [\"Root\"], \"C\": [\"Root\"]}",
    )
    .unwrap();

    (nodes, edges, hierarchy)
}

fn metapaths() -> Command {
    Command::new(env!("CARGO_BIN_EXE_metapaths"))
}

fn graph_args(cmd: &mut Command, nodes: &Path, edges: &Path, hierarchy: &Path) {
    cmd.arg("--nodes")
        .arg(nodes)
        .arg("--edges")
        .arg(edges)
        .arg("--hierarchy")
        .arg(hierarchy);
}

#[test]
fn overlap_then_metrics_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let (nodes, edges, hierarchy) = write_fixtures(dir.path());
    let overlap = dir.path().join("overlap.tsv");
    let metrics = dir.path().join("metrics.tsv");

    let mut cmd = metapaths();
    cmd.arg("overlap");
    graph_args(&mut cmd, &nodes, &edges, &hierarchy);
    cmd.arg("--output").arg(&overlap);
    let status = cmd.status().unwrap();
    assert!(status.success());

    let overlap_text = fs::read_to_string(&overlap).unwrap();
    let mut lines = overlap_text.lines();
    assert_eq!(
        lines.next(),
        Some("3hop_metapath\t3hop_count\t1hop_metapath\t1hop_count\toverlap\ttotal_possible")
    );
    assert!(lines.next().is_some(), "expected at least one overlap row");

    let status = metapaths()
        .arg("metrics")
        .arg("--overlap")
        .arg(&overlap)
        .arg("--output")
        .arg(&metrics)
        .status()
        .unwrap();
    assert!(status.success());

    let metrics_text = fs::read_to_string(&metrics).unwrap();
    let header = metrics_text.lines().next().unwrap();
    assert!(header.ends_with("PLR\tNLR"));
    assert!(metrics_text.lines().count() >= 2);
}

#[test]
fn bench_and_estimate_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let (nodes, edges, hierarchy) = write_fixtures(dir.path());
    let samples = dir.path().join("samples.tsv");
    let results = dir.path().join("results.tsv");
    let estimate = dir.path().join("estimate.tsv");

    let mut cmd = metapaths();
    cmd.args(["bench", "samples"]);
    graph_args(&mut cmd, &nodes, &edges, &hierarchy);
    cmd.arg("--total-samples")
        .arg("50")
        .arg("--seed")
        .arg("7")
        .arg("--output")
        .arg(&samples);
    assert!(cmd.status().unwrap().success());

    let mut cmd = metapaths();
    cmd.args(["bench", "run"]);
    graph_args(&mut cmd, &nodes, &edges, &hierarchy);
    cmd.arg("--samples").arg(&samples).arg("--output").arg(&results);
    assert!(cmd.status().unwrap().success());

    let results_text = fs::read_to_string(&results).unwrap();
    assert!(results_text.lines().count() >= 2);

    let mut cmd = metapaths();
    cmd.arg("estimate");
    graph_args(&mut cmd, &nodes, &edges, &hierarchy);
    cmd.arg("--benchmark")
        .arg(&results)
        .arg("--output")
        .arg(&estimate);
    assert!(cmd.status().unwrap().success());

    let estimate_text = fs::read_to_string(&estimate).unwrap();
    let mut lines = estimate_text.lines();
    assert_eq!(
        lines.next(),
        Some("bucket\titerations\tpercent\tavg_time\testimated_total")
    );
    let data: Vec<&str> = lines.collect();
    assert!(!data.is_empty());
    for line in data {
        assert!(line.starts_with("tiny"), "small graph stays in the tiny bucket");
        assert!(!line.contains("unknown"));
    }
}

#[test]
fn direction_benchmark_writes_rows() {
    let dir = tempfile::tempdir().unwrap();
    let (nodes, edges, hierarchy) = write_fixtures(dir.path());
    let output = dir.path().join("direction.tsv");

    let mut cmd = metapaths();
    cmd.args(["bench", "direction"]);
    graph_args(&mut cmd, &nodes, &edges, &hierarchy);
    cmd.arg("--max-samples").arg("20").arg("--output").arg(&output);
    assert!(cmd.status().unwrap().success());

    let text = fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("forward_metapath\t"));
    assert!(header.ends_with("\tbetter_direction\tmemory_ratio"));
    for line in lines {
        let better = line.split('\t').nth(10).unwrap();
        assert!(["forward", "reverse", "equal"].contains(&better));
    }
}
