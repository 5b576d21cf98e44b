use codemap_handoff::handoff::ChangeStatus;
use codemap_handoff::{BuildOptions, HandoffBuilder, HandoffError, HandoffStore};

use crate::integration::support::{
    builder_with_graph, git, head_options, importer_graph, init_repo, init_repo_on_branch, write,
};

#[test]
fn clean_repository_yields_empty_but_hashed_artifact() {
    let repo = init_repo(&[("main.go", "package main\n")]);

    let artifact = HandoffBuilder::new()
        .build(repo.path(), head_options())
        .unwrap();

    assert!(artifact.delta.changed.is_empty());
    assert!(artifact.changed_files.is_empty());
    assert!(artifact.delta.risk_files.is_empty());
    assert!(artifact
        .delta
        .open_questions
        .iter()
        .any(|q| q.starts_with("No changed files detected vs HEAD")));
    assert!(artifact.delta.next_steps.is_empty());
    assert_eq!(artifact.prefix.file_count, 1);
    assert!(!artifact.prefix_hash.is_empty());
    assert!(!artifact.delta_hash.is_empty());
    assert!(!artifact.combined_hash.is_empty());
    assert_eq!(artifact.branch, "main");
}

#[test]
fn noise_is_excluded_from_changed_files() {
    let repo = init_repo(&[("main.go", "package main\n")]);
    write(repo.path(), "main.go", b"package main\n\nfunc main() {}\n");
    write(repo.path(), "server.log", b"started\n");
    write(repo.path(), "tool", &[0x7f, b'E', b'L', b'F', 2, 1, 1, 0, 0, 0]);
    write(repo.path(), "go.mod", b"module example.com/app\n");
    write(repo.path(), "node_modules/pkg/index.js", b"module.exports = 1;\n");

    let artifact = HandoffBuilder::new()
        .build(repo.path(), head_options())
        .unwrap();

    let paths: Vec<&str> = artifact
        .delta
        .changed
        .iter()
        .map(|s| s.path.as_str())
        .collect();
    assert_eq!(paths, vec!["go.mod", "main.go"]);
    assert_eq!(artifact.delta.changed[0].status, Some(ChangeStatus::Untracked));
    assert_eq!(artifact.delta.changed[1].status, Some(ChangeStatus::Modified));
    assert!(artifact.delta.changed.iter().all(|s| s.hash.is_some()));
}

#[test]
fn staged_change_outranks_working_tree() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// staged\n");
    git(repo.path(), &["add", "a.go"]);
    write(repo.path(), "a.go", b"package a\n// staged\n// and modified\n");

    let artifact = HandoffBuilder::new()
        .build(repo.path(), head_options())
        .unwrap();
    assert_eq!(artifact.delta.changed.len(), 1);
    assert_eq!(artifact.delta.changed[0].status, Some(ChangeStatus::Staged));
}

#[test]
fn hub_file_leads_risk_list_and_prefix_hubs() {
    let repo = init_repo(&[
        ("lib/a.go", "package lib\n"),
        ("cmd/x.go", "package cmd\n"),
        ("cmd/y.go", "package cmd\n"),
        ("cmd/z.go", "package cmd\n"),
    ]);
    write(repo.path(), "lib/a.go", b"package lib\n\nconst V = 2\n");
    write(repo.path(), "cmd/x.go", b"package cmd\n// touched\n");

    let graph = importer_graph(&[("lib/a.go", &["cmd/x.go", "cmd/y.go", "cmd/z.go"])]);
    let artifact = builder_with_graph(graph)
        .build(repo.path(), head_options())
        .unwrap();

    assert_eq!(artifact.delta.risk_files[0].path, "lib/a.go");
    assert!(artifact.delta.risk_files[0].is_hub);
    assert_eq!(
        artifact.delta.risk_files[0].reason,
        "hub file imported by 3 files"
    );
    assert!(artifact.prefix.hubs.iter().any(|h| h.path == "lib/a.go"));
    assert_eq!(
        artifact.delta.next_steps[0],
        "Review downstream dependents for high-impact files before merge."
    );
}

#[test]
fn repeated_builds_keep_hashes_and_timestamp() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// wip\n");
    let store = HandoffStore::new(repo.path());
    let builder = HandoffBuilder::new();

    let mut first = builder.build(repo.path(), head_options()).unwrap();
    assert!(first.metrics.previous_combined_hash.is_none());
    store.write_latest(&mut first).unwrap();

    std::thread::sleep(std::time::Duration::from_millis(20));
    let second = builder.build(repo.path(), head_options()).unwrap();

    // The persisted files under .codemap/ must not leak into the delta.
    assert_eq!(second.delta, first.delta);
    assert_eq!(second.prefix, first.prefix);
    assert_eq!(second.combined_hash, first.combined_hash);
    assert_eq!(second.generated_at, first.generated_at);
    assert!(second.metrics.prefix_reused);
    assert!(second.metrics.delta_reused);
    assert_eq!(second.metrics.reuse_ratio, 1.0);
    assert_eq!(
        second.metrics.previous_combined_hash.as_deref(),
        Some(first.combined_hash.as_str())
    );
}

#[test]
fn changed_content_breaks_delta_reuse_only() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// one\n");
    let builder = HandoffBuilder::new();
    let first = builder.build(repo.path(), head_options()).unwrap();

    write(repo.path(), "a.go", b"package a\n// two\n");
    let second = builder
        .build(
            repo.path(),
            BuildOptions {
                previous: Some(first.clone()),
                ..head_options()
            },
        )
        .unwrap();

    assert_ne!(second.delta_hash, first.delta_hash);
    assert_eq!(second.prefix_hash, first.prefix_hash);
    assert!(second.metrics.prefix_reused);
    assert!(!second.metrics.delta_reused);
    assert_eq!(second.metrics.unchanged_bytes, second.metrics.prefix_bytes);
    assert!(second.metrics.reuse_ratio < 1.0);
}

#[test]
fn non_repository_root_fails_with_changed_files_unavailable() {
    let temp = tempfile::TempDir::new().unwrap();
    let err = HandoffBuilder::new()
        .build(temp.path(), BuildOptions::default())
        .unwrap_err();
    assert!(matches!(err, HandoffError::ChangedFilesUnavailable(_)));
}

#[test]
fn unknown_base_ref_with_local_changes_still_builds() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// wip\n");
    let artifact = HandoffBuilder::new()
        .build(
            repo.path(),
            BuildOptions {
                base_ref: Some("no-such-branch".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(artifact.base_ref, "no-such-branch");
    assert_eq!(artifact.delta.changed.len(), 1);
}

#[test]
fn default_base_ref_prefers_main() {
    let repo = init_repo(&[("main.go", "package main\n")]);
    let artifact = HandoffBuilder::new()
        .build(repo.path(), BuildOptions::default())
        .unwrap();
    assert_eq!(artifact.base_ref, "main");
}

#[test]
fn clean_master_repository_builds_with_default_options() {
    let repo = init_repo_on_branch("master", &[("main.go", "package main\n")]);

    let artifact = HandoffBuilder::new()
        .build(repo.path(), BuildOptions::default())
        .unwrap();

    assert_eq!(artifact.base_ref, "master");
    assert_eq!(artifact.branch, "master");
    assert!(artifact.delta.changed.is_empty());
    assert!(artifact
        .delta
        .open_questions
        .iter()
        .any(|q| q.starts_with("No changed files detected vs master")));
    assert!(!artifact.combined_hash.is_empty());
}

#[test]
fn repository_without_default_branch_diffs_against_head() {
    let repo = init_repo_on_branch("feature/no-default", &[("main.go", "package main\n")]);
    write(repo.path(), "main.go", b"package main\n// wip\n");

    let artifact = HandoffBuilder::new()
        .build(repo.path(), BuildOptions::default())
        .unwrap();

    assert_eq!(artifact.base_ref, "HEAD");
    assert_eq!(artifact.changed_files, vec!["main.go"]);
}

#[test]
fn gitignored_files_do_not_inflate_file_count() {
    let repo = init_repo(&[(".gitignore", "gen/\n"), ("main.go", "package main\n")]);
    for i in 0..2100 {
        write(repo.path(), &format!("gen/f{}.go", i), b"package gen\n");
    }

    let artifact = HandoffBuilder::new()
        .build(repo.path(), head_options())
        .unwrap();

    assert_eq!(artifact.prefix.file_count, 2);
    assert!(artifact.delta.changed.is_empty());
}
