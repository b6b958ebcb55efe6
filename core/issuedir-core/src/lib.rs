//! # issuedir-core
//!
//! Core library for issuedir: maps the issue shown in the focused tracker
//! window to a project folder on disk, creates folders on demand, and keeps a
//! backlink attachment on the remote issue pointing at the local folder.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Remote calls block.
//! - **Trait seams**: Window titles, folder search, the file manager, token
//!   storage and the tracker all sit behind traits so front ends and tests can
//!   swap them.
//! - **Errors become notifications**: Front ends turn every `IssuedirError`
//!   into a `Toast`; backlink failures are values, not errors.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use issuedir_core::IssueEngine;
//!
//! let engine = IssueEngine::new()?;
//! let issue = engine.focused_issue()?;
//! let outcome = engine.backlink(issue.id());
//! println!("{}", outcome.describe());
//! ```

pub mod auth;
pub mod backlink;
pub mod batch;
pub mod config;
pub mod creator;
pub mod engine;
pub mod error;
pub mod locator;
pub mod notify;
pub mod parser;
pub mod patterns;
pub mod platform;
pub mod resolver;
pub mod storage;
pub mod text;
pub mod tracker;

pub use auth::{AuthStatus, Authenticator, FileTokenStore, MemoryTokenStore, OAuthTokens, TokenStore};
pub use backlink::{ensure_backlink, BacklinkOutcome, BacklinkStatus, BacklinkTarget, UpdatedField};
pub use batch::{run_batch, BatchItem, BatchProgress, BatchSummary, ItemStatus};
pub use config::{load_preferences, Preferences, SearchBackend, Separator};
pub use creator::{build_folder_name, create_issue_folder, folder_name_preview, new_folder_location};
pub use engine::{CreatedFolder, IssueEngine, OpenOutcome};
pub use error::{IssuedirError, Result};
pub use locator::{
    find_all_issue_folders, find_issue_folders, FolderQuery, FolderSearch, IssueFolder,
    SpotlightSearch, WalkSearch,
};
pub use notify::{Notifier, Toast, ToastAction, ToastStyle};
pub use parser::{extract_issue_id, is_issue_id, normalize_issue_id, parse_issue_title, IssueRef};
pub use platform::{Desktop, SystemDesktop};
pub use resolver::{ResolveContext, ResolveView};
pub use storage::StorageConfig;
pub use tracker::{IssueTracker, TrackerError, TrackerProvider};
