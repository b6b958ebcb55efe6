//! End-to-end engine workflows with a fake desktop and a real temp directory tree.

mod common;

use common::{FakeDesktop, FakeProvider, FakeTracker};
use issuedir_core::{
    BacklinkStatus, IssueEngine, IssuedirError, ItemStatus, OpenOutcome, Preferences,
    ResolveContext, ResolveView, Separator, StorageConfig, WalkSearch,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

struct Fixture {
    temp: TempDir,
    search_root: PathBuf,
    new_root: PathBuf,
    desktop: FakeDesktop,
    tracker: FakeTracker,
}

impl Fixture {
    fn new(title: Option<&str>) -> Self {
        let temp = TempDir::new().unwrap();
        let search_root = temp.path().join("work");
        let new_root = search_root.join("inbox");
        fs::create_dir_all(&search_root).unwrap();
        let desktop = match title {
            Some(title) => FakeDesktop::with_title(title),
            None => FakeDesktop::default(),
        };
        Self {
            temp,
            search_root,
            new_root,
            desktop,
            tracker: FakeTracker::new(),
        }
    }

    fn mkdir(&self, relative: &str) {
        fs::create_dir_all(self.search_root.join(relative)).unwrap();
    }

    fn prefs(&self) -> Preferences {
        Preferences {
            search_directory: Some(self.search_root.display().to_string()),
            new_folder_location: Some(self.new_root.display().to_string()),
            backlink_url_scheme: Some("file:///work/{issueId}".to_string()),
            ..Preferences::default()
        }
    }

    fn engine(&self, prefs: Preferences) -> IssueEngine {
        IssueEngine::with_parts(
            prefs,
            StorageConfig::with_root(self.temp.path().join("data")),
            Box::new(self.desktop.clone()),
            Box::new(WalkSearch),
            Box::new(FakeProvider::connected(self.tracker.clone())),
        )
    }
}

fn name_of(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[test]
fn test_open_single_match_opens_it() {
    let fx = Fixture::new(Some("ENG-123 Fix login"));
    fx.mkdir("clients/ENG-123 Fix login");
    fx.mkdir("clients/ENG-12 Other");

    let outcome = fx.engine(fx.prefs()).open_focused_issue().unwrap();

    match outcome {
        OpenOutcome::Opened { issue_id, path } => {
            assert_eq!(issue_id, "ENG-123");
            assert_eq!(name_of(&path), "ENG-123 Fix login");
            assert_eq!(fx.desktop.opened(), vec![path]);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_open_multiple_matches_hands_off() {
    let fx = Fixture::new(Some("ENG-123 Fix login"));
    fx.mkdir("a/ENG-123");
    fx.mkdir("b/ENG-1234 Other");

    let outcome = fx.engine(fx.prefs()).open_focused_issue().unwrap();

    let OpenOutcome::NeedsResolution(ctx) = outcome else {
        panic!("expected hand-off");
    };
    assert_eq!(ctx.issue_id, "ENG-123");
    assert_eq!(ctx.issue_title, "Fix login");
    assert_eq!(ctx.found_paths.as_ref().map(Vec::len), Some(2));
    assert!(fx.desktop.opened().is_empty());
    assert!(matches!(
        ctx.into_error(),
        IssuedirError::AmbiguousFolderMatch { count: 2, .. }
    ));
}

#[test]
fn test_open_no_match_without_auto_create_hands_off() {
    let fx = Fixture::new(Some("ENG-9 Nothing here"));

    let outcome = fx.engine(fx.prefs()).open_focused_issue().unwrap();

    assert!(matches!(
        outcome,
        OpenOutcome::NeedsResolution(ResolveContext { found_paths: Some(ref paths), .. }) if paths.is_empty()
    ));
}

#[test]
fn test_open_auto_creates_missing_folder() {
    let fx = Fixture::new(Some("ENG-9 Ship 🚀 it"));
    let prefs = Preferences {
        auto_create_folders: true,
        ..fx.prefs()
    };

    let outcome = fx.engine(prefs).open_focused_issue().unwrap();

    let OpenOutcome::Created { path, .. } = outcome else {
        panic!("expected creation");
    };
    assert_eq!(name_of(&path), "ENG-9 Ship it");
    assert!(path.is_dir());
    assert!(path.is_absolute());
    assert_eq!(fx.desktop.opened(), vec![path]);
    assert_eq!(fx.tracker.mutations(), 0);
}

#[test]
fn test_auto_create_without_location_is_reported() {
    let fx = Fixture::new(Some("ENG-9 Ship it"));
    let prefs = Preferences {
        auto_create_folders: true,
        new_folder_location: None,
        ..fx.prefs()
    };

    let err = fx.engine(prefs).open_focused_issue().unwrap_err();

    assert!(matches!(err, IssuedirError::NewFolderLocationNotConfigured));
    assert!(!fx.new_root.exists());
}

#[test]
fn test_focus_errors() {
    let fx = Fixture::new(None);
    assert!(matches!(
        fx.engine(fx.prefs()).open_focused_issue().unwrap_err(),
        IssuedirError::NoWindowFound
    ));

    let fx = Fixture::new(Some("My Issues"));
    assert!(matches!(
        fx.engine(fx.prefs()).open_focused_issue().unwrap_err(),
        IssuedirError::NoIssueIdInTitle { ref title } if title == "My Issues"
    ));
}

#[test]
fn test_copy_focused_issue_id() {
    let fx = Fixture::new(Some("Working on ENG-42 now"));

    let id = fx.engine(fx.prefs()).copy_focused_issue_id().unwrap();

    assert_eq!(id, "ENG-42");
    assert_eq!(fx.desktop.clipboard.borrow().as_deref(), Some("ENG-42"));
}

#[test]
fn test_resolve_searches_when_context_has_no_results() {
    let fx = Fixture::new(None);
    fx.mkdir("ENG-5 Docs");

    let view = fx
        .engine(fx.prefs())
        .resolve(&ResolveContext::new("ENG-5", ""))
        .unwrap();

    assert!(matches!(view, ResolveView::Matches { ref paths, .. } if paths.len() == 1));
}

#[test]
fn test_create_suggested_folder_backlinks() {
    let fx = Fixture::new(None);
    let engine = fx.engine(Preferences {
        folder_separator: Separator::Hyphen,
        ..fx.prefs()
    });

    let created = engine
        .create_suggested_folder(&ResolveContext::new("ENG-6", "New API"))
        .unwrap();

    assert_eq!(name_of(&created.path), "ENG-6-New API");
    assert_eq!(
        created.backlink.map(|b| b.status()),
        Some(BacklinkStatus::Created)
    );
    assert_eq!(fx.tracker.attachments("ENG-6").len(), 1);

    let again = engine
        .create_suggested_folder(&ResolveContext::new("ENG-6", "New API"))
        .unwrap_err();
    assert!(matches!(again, IssuedirError::FolderAlreadyExists(_)));
}

#[test]
fn test_create_custom_folder() {
    let fx = Fixture::new(None);
    let engine = fx.engine(Preferences {
        auto_backlink_on_create: false,
        ..fx.prefs()
    });
    let ctx = ResolveContext::new("ENG-7", "");

    let created = engine
        .create_custom_folder(&ctx, "  Notes ✨ ", Separator::Period)
        .unwrap();
    assert_eq!(name_of(&created.path), "ENG-7.Notes");
    assert!(created.backlink.is_none());

    let err = engine.create_custom_folder(&ctx, "🔥 ", Separator::Space).unwrap_err();
    assert!(matches!(err, IssuedirError::InvalidFolderName(_)));
}

#[test]
fn test_scan_and_backlink_all() {
    let fx = Fixture::new(None);
    fx.mkdir("a/ENG-1 First");
    fx.mkdir("a/ENG-1 Duplicate");
    fx.mkdir("b/OPS-22");
    fx.mkdir("b/notes");
    fx.tracker.seed("OPS-22", "Local Folder", "file:///work/OPS-22");
    let engine = fx.engine(fx.prefs());

    let mut items = engine.scan_issue_folders().unwrap();
    let mut ids: Vec<_> = items.iter().map(|item| item.issue_id.clone()).collect();
    ids.sort();
    assert_eq!(ids, vec!["ENG-1", "OPS-22"]);

    let summary = engine
        .backlink_all(&mut items, &AtomicBool::new(false), |_, _| {})
        .unwrap();

    assert_eq!(summary.render(), "Created: 1, Updated: 0, Errors: 0");
    assert_eq!(summary.skipped, 1);
    assert!(items.iter().all(|item| item.status != ItemStatus::Pending));
}

#[test]
fn test_backlink_all_reuses_one_tracker_client() {
    let fx = Fixture::new(None);
    fx.mkdir("ENG-1");
    fx.mkdir("ENG-2");
    fx.mkdir("OPS-3");
    let provider = FakeProvider::connected(fx.tracker.clone());
    let clients_built = provider.clients_built.clone();
    let engine = IssueEngine::with_parts(
        fx.prefs(),
        StorageConfig::with_root(fx.temp.path().join("data")),
        Box::new(fx.desktop.clone()),
        Box::new(WalkSearch),
        Box::new(provider),
    );

    let mut items = engine.scan_issue_folders().unwrap();
    let summary = engine
        .backlink_all(&mut items, &AtomicBool::new(false), |_, _| {})
        .unwrap();

    assert_eq!(summary.created, 3);
    assert_eq!(*clients_built.borrow(), 1);
}

#[test]
fn test_backlink_all_requires_auth() {
    let fx = Fixture::new(None);
    let engine = IssueEngine::with_parts(
        fx.prefs(),
        StorageConfig::with_root(fx.temp.path().join("data")),
        Box::new(fx.desktop.clone()),
        Box::new(WalkSearch),
        Box::new(FakeProvider::disconnected()),
    );

    let err = engine
        .backlink_all(&mut [], &AtomicBool::new(false), |_, _| {})
        .unwrap_err();

    assert!(err.is_auth_required());
    assert!(!engine.is_authenticated());
}
