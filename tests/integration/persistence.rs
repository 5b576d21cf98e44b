use codemap_handoff::handoff::hasher::{combined_hash, hash_canonical};
use codemap_handoff::handoff::{
    Artifact, CacheMetrics, DeltaSnapshot, MetricsRecord, PrefixSnapshot, RiskFile,
};
use codemap_handoff::{HandoffBuilder, HandoffStore};
use tempfile::TempDir;

use crate::integration::support::{head_options, init_repo, write};

fn record(n: usize) -> MetricsRecord {
    MetricsRecord {
        generated_at: format!("2026-01-01T00:00:{:02}Z", n % 60),
        branch: "main".to_string(),
        base_ref: "main".to_string(),
        prefix_hash: format!("p{}", n),
        delta_hash: format!("d{}", n),
        combined_hash: format!("c{}", n),
        metrics: CacheMetrics::default(),
    }
}

#[test]
fn metrics_log_keeps_most_recent_records_under_cap() {
    let temp = TempDir::new().unwrap();
    let store = HandoffStore::new(temp.path());
    for n in 0..550 {
        store.append_metrics(&record(n)).unwrap();
    }

    let content = std::fs::read_to_string(store.metrics_path()).unwrap();
    assert_eq!(content.lines().count(), 500);

    let all = store.read_metrics(None).unwrap();
    assert_eq!(all.len(), 500);
    assert_eq!(all.first().unwrap().combined_hash, "c50");
    assert_eq!(all.last().unwrap().combined_hash, "c549");

    let recent = store.read_metrics(Some(3)).unwrap();
    let hashes: Vec<&str> = recent.iter().map(|r| r.combined_hash.as_str()).collect();
    assert_eq!(hashes, vec!["c547", "c548", "c549"]);
}

#[test]
fn persisted_layers_rehash_to_recorded_hashes() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// wip\n");
    write(repo.path(), "b.go", b"package a\n");
    let store = HandoffStore::new(repo.path());

    let mut artifact = HandoffBuilder::new()
        .build(repo.path(), head_options())
        .unwrap();
    store.write_latest(&mut artifact).unwrap();

    let prefix = store.read_prefix().unwrap().expect("prefix file");
    let delta = store.read_delta().unwrap().expect("delta file");
    let latest = store.read_latest().unwrap().expect("latest file");

    let prefix_digest = hash_canonical(&prefix).unwrap();
    let delta_digest = hash_canonical(&delta).unwrap();
    assert_eq!(prefix_digest.hash, latest.prefix_hash);
    assert_eq!(delta_digest.hash, latest.delta_hash);
    assert_eq!(
        combined_hash(&prefix_digest.hash, &delta_digest.hash),
        latest.combined_hash
    );
    assert_eq!(prefix_digest.bytes, latest.metrics.prefix_bytes);
    assert_eq!(latest.changed_files, vec!["a.go", "b.go"]);

    let records = store.read_metrics(None).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].combined_hash, latest.combined_hash);
}

#[test]
fn legacy_artifact_is_normalized_on_read() {
    let temp = TempDir::new().unwrap();
    let store = HandoffStore::new(temp.path());
    std::fs::create_dir_all(store.dir()).unwrap();
    let legacy = serde_json::json!({
        "generated_at": "2026-03-01T12:00:00Z",
        "root": temp.path().display().to_string(),
        "branch": "feature",
        "base_ref": "main",
        "prefix": { "file_count": 12 },
        "changed_files": ["src/a.go", "src/b.go"],
        "risk_files": [
            { "path": "src/a.go", "importers": 2, "is_hub": false, "reason": "imported by 2 files" }
        ],
        "next_steps": ["Run tests covering changed files before handoff."]
    });
    std::fs::write(store.latest_path(), serde_json::to_vec(&legacy).unwrap()).unwrap();

    let artifact = store.read_latest().unwrap().expect("legacy artifact");
    let paths: Vec<&str> = artifact.delta.changed.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(paths, vec!["src/a.go", "src/b.go"]);
    assert!(artifact.delta.changed.iter().all(|s| s.hash.is_none()));
    assert_eq!(artifact.delta.risk_files.len(), 1);
    assert_eq!(artifact.delta.next_steps.len(), 1);

    let expected_prefix = hash_canonical(&PrefixSnapshot {
        file_count: 12,
        hubs: Vec::new(),
    })
    .unwrap();
    assert_eq!(artifact.prefix_hash, expected_prefix.hash);
    assert!(!artifact.delta_hash.is_empty());
    assert_eq!(
        artifact.combined_hash,
        combined_hash(&artifact.prefix_hash, &artifact.delta_hash)
    );
}

#[test]
fn normalize_recovers_delta_then_is_stable() {
    let mut artifact = Artifact {
        changed_files: vec!["x.go".to_string()],
        risk_files: vec![RiskFile {
            path: "x.go".to_string(),
            importers: 4,
            is_hub: true,
            reason: "hub file imported by 4 files".to_string(),
        }],
        ..Default::default()
    };
    artifact.normalize();
    let once = artifact.clone();
    artifact.normalize();

    assert_eq!(artifact, once);
    assert_eq!(artifact.delta.changed[0].path, "x.go");
    assert_eq!(artifact.delta.risk_files[0].importers, 4);
    assert_ne!(artifact.delta, DeltaSnapshot::default());
}

#[test]
fn rewrite_leaves_no_temporary_files() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// wip\n");
    let store = HandoffStore::new(repo.path());
    let builder = HandoffBuilder::new();

    for _ in 0..3 {
        let mut artifact = builder.build(repo.path(), head_options()).unwrap();
        store.write_latest(&mut artifact).unwrap();
    }

    let mut names: Vec<String> = std::fs::read_dir(store.dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "handoff.delta.json",
            "handoff.latest.json",
            "handoff.metrics.log",
            "handoff.prefix.json"
        ]
    );
    assert_eq!(store.read_metrics(None).unwrap().len(), 3);
}
