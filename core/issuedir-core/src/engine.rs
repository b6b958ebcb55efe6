//! IssueEngine - the entry point front ends call into.
//!
//! The engine owns loaded preferences and the outside-world collaborators
//! (desktop, folder search, tracker credentials). It is:
//! - **Synchronous**: no async runtime required
//! - **Stateless between calls**: preferences are read once at construction
//!
//! ```rust,ignore
//! use issuedir_core::{IssueEngine, OpenOutcome};
//!
//! let engine = IssueEngine::new()?;
//! match engine.open_focused_issue()? {
//!     OpenOutcome::Opened { path, .. } => println!("opened {}", path.display()),
//!     OpenOutcome::Created { path, .. } => println!("created {}", path.display()),
//!     OpenOutcome::NeedsResolution(ctx) => { /* show the resolver */ }
//! }
//! ```

use crate::auth::Authenticator;
use crate::backlink::{ensure_backlink, ensure_backlink_with, BacklinkOutcome, BacklinkTarget};
use crate::batch::{run_batch, BatchItem, BatchProgress, BatchSummary};
use crate::config::{load_preferences, Preferences, Separator};
use crate::creator::{build_folder_name, create_issue_folder, folder_name_preview, new_folder_location};
use crate::error::{IssuedirError, Result};
use crate::locator::{find_all_issue_folders, find_issue_folders, search_backend, unique_by_issue, FolderSearch};
use crate::parser::{parse_issue_title, IssueRef};
use crate::platform::{Desktop, SystemDesktop};
use crate::resolver::{ResolveContext, ResolveView};
use crate::storage::StorageConfig;
use crate::text::strip_emoji_preserve_spaces;
use crate::tracker::TrackerProvider;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

/// Result of the one-shot open command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum OpenOutcome {
    Opened { issue_id: String, path: PathBuf },
    Created { issue_id: String, path: PathBuf },
    /// Zero matches without auto-create, or several matches.
    NeedsResolution(ResolveContext),
}

/// A folder created from the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedFolder {
    pub path: PathBuf,
    /// `None` when auto-backlinking is off.
    pub backlink: Option<BacklinkOutcome>,
}

pub struct IssueEngine {
    prefs: Preferences,
    storage: StorageConfig,
    desktop: Box<dyn Desktop>,
    search: Box<dyn FolderSearch>,
    tracker: Box<dyn TrackerProvider>,
}

impl IssueEngine {
    /// Default data directory, real desktop, configured search backend.
    pub fn new() -> Result<Self> {
        Self::with_storage(StorageConfig::default())
    }

    pub fn with_storage(storage: StorageConfig) -> Result<Self> {
        let prefs = load_preferences(&storage)?;
        let search = search_backend(&prefs);
        let tracker = Box::new(Authenticator::from_preferences(&prefs, &storage));
        Ok(Self::with_parts(
            prefs,
            storage,
            Box::new(SystemDesktop),
            search,
            tracker,
        ))
    }

    /// Assembles an engine from explicit collaborators (tests, embedding).
    pub fn with_parts(
        prefs: Preferences,
        storage: StorageConfig,
        desktop: Box<dyn Desktop>,
        search: Box<dyn FolderSearch>,
        tracker: Box<dyn TrackerProvider>,
    ) -> Self {
        Self {
            prefs,
            storage,
            desktop,
            search,
            tracker,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn desktop(&self) -> &dyn Desktop {
        self.desktop.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Focused issue
    // ─────────────────────────────────────────────────────────────────────

    /// Reads the tracker window title and parses the issue out of it.
    pub fn focused_issue(&self) -> Result<IssueRef> {
        let title = self
            .desktop
            .frontmost_window_title(&self.prefs.window_process)
            .ok_or(IssuedirError::NoWindowFound)?;
        tracing::debug!(title = %title, "Read window title");
        parse_issue_title(&title).ok_or(IssuedirError::NoIssueIdInTitle { title })
    }

    pub fn copy_focused_issue_id(&self) -> Result<String> {
        let issue = self.focused_issue()?;
        self.desktop.copy_to_clipboard(issue.id())?;
        tracing::info!(issue_id = %issue.id(), "Copied issue id");
        Ok(issue.id().to_string())
    }

    /// Opens the single matching folder, auto-creates one when enabled, or
    /// hands off to the resolver.
    pub fn open_focused_issue(&self) -> Result<OpenOutcome> {
        let issue = self.focused_issue()?;
        let paths = self.find_folders(issue.id())?;

        if let [path] = paths.as_slice() {
            self.open_folder(path)?;
            return Ok(OpenOutcome::Opened {
                issue_id: issue.id().to_string(),
                path: path.clone(),
            });
        }

        if paths.is_empty() && self.prefs.auto_create_folders {
            let parent = new_folder_location(&self.prefs)?;
            let name = self.suggested_name(issue.id(), issue.title());
            let path = create_issue_folder(&parent, &name)?;
            self.open_folder(&path)?;
            return Ok(OpenOutcome::Created {
                issue_id: issue.id().to_string(),
                path,
            });
        }

        tracing::info!(issue_id = %issue.id(), count = paths.len(), "Handing off to resolver");
        Ok(OpenOutcome::NeedsResolution(ResolveContext::from_search(
            &issue, paths,
        )))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Folders
    // ─────────────────────────────────────────────────────────────────────

    pub fn find_folders(&self, issue_id: &str) -> Result<Vec<PathBuf>> {
        find_issue_folders(self.search.as_ref(), issue_id, &self.prefs.search_root())
    }

    /// Builds the resolver view, searching only when the context carries no results.
    pub fn resolve(&self, ctx: &ResolveContext) -> Result<ResolveView> {
        let paths = match &ctx.found_paths {
            Some(paths) => paths.clone(),
            None => self.find_folders(&ctx.issue_id)?,
        };
        Ok(ResolveView::build(ctx, paths, &self.prefs))
    }

    pub fn suggested_name(&self, issue_id: &str, issue_title: &str) -> String {
        build_folder_name(
            issue_id,
            issue_title,
            self.prefs.folder_separator,
            self.prefs.allow_emojis,
        )
    }

    /// Creates the suggested folder, opens it, and backlinks when enabled.
    pub fn create_suggested_folder(&self, ctx: &ResolveContext) -> Result<CreatedFolder> {
        let name = self.suggested_name(&ctx.issue_id, &ctx.issue_title);
        self.create_and_open(&ctx.issue_id, &name)
    }

    /// Creates `<id><separator><name>`; a blank name is rejected.
    pub fn create_custom_folder(
        &self,
        ctx: &ResolveContext,
        custom_name: &str,
        separator: Separator,
    ) -> Result<CreatedFolder> {
        let name = if self.prefs.allow_emojis {
            custom_name.to_string()
        } else {
            strip_emoji_preserve_spaces(custom_name)
        };
        if name.trim().is_empty() {
            return Err(IssuedirError::InvalidFolderName(custom_name.to_string()));
        }
        let folder_name = folder_name_preview(&ctx.issue_id, &name, separator);
        self.create_and_open(&ctx.issue_id, &folder_name)
    }

    fn create_and_open(&self, issue_id: &str, folder_name: &str) -> Result<CreatedFolder> {
        let parent = new_folder_location(&self.prefs)?;
        let path = create_issue_folder(&parent, folder_name)?;
        self.open_folder(&path)?;

        let backlink = self
            .prefs
            .auto_backlink_on_create
            .then(|| self.backlink(issue_id));
        Ok(CreatedFolder { path, backlink })
    }

    pub fn open_folder(&self, path: &Path) -> Result<()> {
        self.desktop.open_folder(path)?;
        tracing::info!(path = %path.display(), "Opened folder");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Backlinks
    // ─────────────────────────────────────────────────────────────────────

    pub fn backlink(&self, issue_id: &str) -> BacklinkOutcome {
        ensure_backlink(&self.prefs, self.tracker.as_ref(), issue_id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.tracker.is_authenticated()
    }

    /// Every issue folder under the search root, one per issue key.
    pub fn scan_issue_folders(&self) -> Result<Vec<BatchItem>> {
        let folders = find_all_issue_folders(self.search.as_ref(), &self.prefs.search_root())?;
        let items: Vec<BatchItem> = unique_by_issue(folders)
            .into_iter()
            .map(BatchItem::from)
            .collect();
        tracing::info!(count = items.len(), "Scanned issue folders");
        Ok(items)
    }

    /// Backlinks every item in order. Refuses to start without credentials.
    pub fn backlink_all<P>(
        &self,
        items: &mut [BatchItem],
        cancel: &AtomicBool,
        on_progress: P,
    ) -> Result<BatchSummary>
    where
        P: FnMut(&BatchProgress, &BatchItem),
    {
        let tracker = self.tracker.tracker()?;
        Ok(run_batch(
            items,
            |issue_id| match BacklinkTarget::from_preferences(&self.prefs, issue_id) {
                Some(target) => ensure_backlink_with(tracker.as_ref(), issue_id, &target),
                None => BacklinkOutcome::Disabled,
            },
            cancel,
            on_progress,
        ))
    }
}
