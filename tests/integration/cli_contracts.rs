use codemap_handoff::config::HandoffConfig;
use codemap_handoff::tooling::{ArtifactPart, CliContext, Commands};
use codemap_handoff::HandoffError;
use serde_json::Value;

use crate::integration::support::{init_repo, write};

fn context(root: &std::path::Path) -> CliContext {
    let mut config = HandoffConfig::default();
    config.handoff.base_ref = Some("HEAD".to_string());
    CliContext::with_config(root.to_path_buf(), config)
}

fn build_command(no_write: bool) -> Commands {
    Commands::Build {
        base_ref: None,
        since: None,
        max_changed: None,
        max_risk: None,
        max_events: None,
        max_hubs: None,
        no_write,
    }
}

fn parse(output: &str) -> Value {
    serde_json::from_str(output).expect("command output must be JSON")
}

#[test]
fn build_json_contract_has_required_fields() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// wip\n");
    let ctx = context(repo.path());

    let json = parse(&ctx.execute(&build_command(false)).unwrap());
    for key in [
        "schema_version",
        "generated_at",
        "root",
        "branch",
        "base_ref",
        "prefix",
        "delta",
        "prefix_hash",
        "delta_hash",
        "combined_hash",
        "metrics",
        "changed_files",
    ] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(json["schema_version"], 1);
    assert_eq!(json["base_ref"], "HEAD");
    assert_eq!(json["delta"]["changed"][0]["path"], "a.go");
    assert_eq!(json["delta"]["changed"][0]["status"], "modified");
    assert_eq!(json["changed_files"][0], "a.go");
    assert_eq!(json["prefix_hash"].as_str().unwrap().len(), 64);
    for key in [
        "prefix_bytes",
        "delta_bytes",
        "total_bytes",
        "unchanged_bytes",
        "reuse_ratio",
        "prefix_reused",
        "delta_reused",
    ] {
        assert!(json["metrics"].get(key).is_some(), "missing metrics.{}", key);
    }
}

#[test]
fn show_parts_match_persisted_build() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// wip\n");
    let ctx = context(repo.path());
    let built = parse(&ctx.execute(&build_command(false)).unwrap());

    let latest = parse(
        &ctx.execute(&Commands::Show {
            part: ArtifactPart::Latest,
        })
        .unwrap(),
    );
    assert_eq!(latest["combined_hash"], built["combined_hash"]);

    let prefix = parse(
        &ctx.execute(&Commands::Show {
            part: ArtifactPart::Prefix,
        })
        .unwrap(),
    );
    assert_eq!(prefix, built["prefix"]);

    let delta = parse(
        &ctx.execute(&Commands::Show {
            part: ArtifactPart::Delta,
        })
        .unwrap(),
    );
    assert_eq!(delta, built["delta"]);
}

#[test]
fn build_without_write_leaves_no_artifact() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// wip\n");
    let ctx = context(repo.path());

    ctx.execute(&build_command(true)).unwrap();
    assert!(!repo.path().join(".codemap").join("handoff.latest.json").exists());
    let err = ctx
        .execute(&Commands::Show {
            part: ArtifactPart::Delta,
        })
        .unwrap_err();
    assert!(matches!(err, HandoffError::MissingArtifact));
}

#[test]
fn metrics_json_contract_lists_recent_builds() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// wip\n");
    let ctx = context(repo.path());
    ctx.execute(&build_command(false)).unwrap();
    write(repo.path(), "a.go", b"package a\n// more\n");
    ctx.execute(&build_command(false)).unwrap();

    let json = parse(&ctx.execute(&Commands::Metrics { limit: 1 }).unwrap());
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    for key in [
        "generated_at",
        "branch",
        "base_ref",
        "prefix_hash",
        "delta_hash",
        "combined_hash",
        "metrics",
    ] {
        assert!(record.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(record["metrics"]["prefix_reused"], true);
    assert_eq!(record["metrics"]["delta_reused"], false);
}

#[test]
fn detail_json_contract_and_errors() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// wip\n");
    let ctx = context(repo.path());

    let err = ctx
        .execute(&Commands::Detail {
            path: "a.go".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, HandoffError::MissingArtifact));

    ctx.execute(&build_command(false)).unwrap();
    let json = parse(
        &ctx.execute(&Commands::Detail {
            path: "a.go".to_string(),
        })
        .unwrap(),
    );
    assert_eq!(json["path"], "a.go");
    assert_eq!(json["status"], "modified");
    assert!(json["importers"].as_array().unwrap().is_empty());
    assert_eq!(json["is_hub"], false);

    let err = ctx
        .execute(&Commands::Detail {
            path: "nope.go".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, HandoffError::FileNotInDelta(_)));
}

#[test]
fn invalid_since_flag_is_config_error() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    let ctx = context(repo.path());
    let err = ctx
        .execute(&Commands::Build {
            base_ref: None,
            since: Some("eventually".to_string()),
            max_changed: None,
            max_risk: None,
            max_events: None,
            max_hubs: None,
            no_write: true,
        })
        .unwrap_err();
    assert!(matches!(err, HandoffError::ConfigError(_)));
}
