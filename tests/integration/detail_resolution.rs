use std::sync::Arc;

use chrono::{Duration, Utc};
use codemap_handoff::handoff::ChangeStatus;
use codemap_handoff::limits::RepoSizeLimits;
use codemap_handoff::watch::{state_path, EventOp, LiveEvent, LiveState};
use codemap_handoff::{DetailResolver, HandoffBuilder, HandoffError, HandoffStore};

use crate::integration::support::{
    builder_with_graph, head_options, importer_graph, init_repo, write,
};

#[test]
fn detail_expands_changed_file_with_graph_context() {
    let repo = init_repo(&[
        ("lib/a.go", "package lib\n"),
        ("cmd/x.go", "package cmd\n"),
        ("cmd/y.go", "package cmd\n"),
        ("cmd/z.go", "package cmd\n"),
    ]);
    write(repo.path(), "lib/a.go", b"package lib\n\nconst V = 2\n");
    let graph = importer_graph(&[
        ("lib/a.go", &["cmd/z.go", "cmd/x.go", "cmd/y.go", "cmd/x.go"]),
        ("lib/util.go", &["lib/a.go"]),
    ]);
    let store = HandoffStore::new(repo.path());
    let mut artifact = builder_with_graph(graph.clone())
        .build(repo.path(), head_options())
        .unwrap();
    store.write_latest(&mut artifact).unwrap();

    let latest = store.read_latest().unwrap().unwrap();
    let resolver = DetailResolver::new(Arc::new(graph), RepoSizeLimits::default());
    let detail = resolver.resolve(&latest, "./lib/a.go", None).unwrap();

    assert_eq!(detail.path, "lib/a.go");
    assert_eq!(detail.status, Some(ChangeStatus::Modified));
    assert!(detail.hash.is_some());
    assert_eq!(detail.size, Some(25));
    assert_eq!(detail.importers, vec!["cmd/x.go", "cmd/y.go", "cmd/z.go"]);
    assert_eq!(detail.imports, vec!["lib/util.go"]);
    assert!(detail.is_hub);
    assert!(detail.recent_events.is_empty());
}

#[test]
fn detail_uses_daemon_state_and_timeline() {
    let repo = init_repo(&[("a.go", "package a\n"), ("b.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// wip\n");

    let now = Utc::now();
    let mut state = LiveState {
        updated_at: Some(now),
        file_count: 2,
        ..Default::default()
    };
    state
        .importers
        .insert("a.go".to_string(), vec!["b.go".to_string()]);
    state.recent_events = vec![
        LiveEvent {
            time: now - Duration::minutes(5),
            op: EventOp::Write,
            path: "a.go".to_string(),
            delta: 1,
            importers: 1,
            is_hub: false,
        },
        LiveEvent {
            time: now - Duration::minutes(3),
            op: EventOp::Write,
            path: "b.go".to_string(),
            delta: 2,
            importers: 0,
            is_hub: false,
        },
    ];
    let path = state_path(repo.path());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, serde_json::to_vec(&state).unwrap()).unwrap();

    let artifact = HandoffBuilder::new()
        .build(repo.path(), head_options())
        .unwrap();
    assert_eq!(artifact.delta.recent_events.len(), 2);

    let detail = DetailResolver::default()
        .resolve(&artifact, "a.go", Some(state))
        .unwrap();
    assert_eq!(detail.importers, vec!["b.go"]);
    assert!(!detail.is_hub);
    assert_eq!(detail.recent_events.len(), 1);
    assert_eq!(detail.recent_events[0].path, "a.go");
}

#[test]
fn detail_for_path_outside_delta_is_not_found() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    write(repo.path(), "a.go", b"package a\n// wip\n");
    let artifact = HandoffBuilder::new()
        .build(repo.path(), head_options())
        .unwrap();

    let err = DetailResolver::default()
        .resolve(&artifact, "missing.go", None)
        .unwrap_err();
    assert!(matches!(err, HandoffError::FileNotInDelta(ref p) if p == "missing.go"));
}

#[test]
fn detail_rejects_empty_path() {
    let repo = init_repo(&[("a.go", "package a\n")]);
    let artifact = HandoffBuilder::new()
        .build(repo.path(), head_options())
        .unwrap();

    for target in ["", "  ", "./"] {
        let err = DetailResolver::default()
            .resolve(&artifact, target, None)
            .unwrap_err();
        assert!(matches!(err, HandoffError::EmptyPath), "{:?}", target);
    }
}
