//! In-memory fakes shared by the integration tests.

#![allow(dead_code)]

use issuedir_core::tracker::{
    Attachment, AttachmentChange, IssueTracker, NewAttachment, RemoteIssue, TrackerError,
    TrackerProvider,
};
use issuedir_core::{Desktop, IssuedirError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

// ─────────────────────────────────────────────────────────────────────────────
// Tracker
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct TrackerState {
    /// Attachments per internal issue id.
    pub attachments: HashMap<String, Vec<Attachment>>,
    pub next_id: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub fail_with: Option<TrackerError>,
}

/// Tracker whose issues are `<KEY>` -> internal id `issue-<KEY>`.
#[derive(Clone, Default)]
pub struct FakeTracker {
    pub state: Rc<RefCell<TrackerState>>,
    /// When false, every update goes through delete + create.
    pub in_place: bool,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self {
            state: Rc::default(),
            in_place: true,
        }
    }

    pub fn without_in_place_updates() -> Self {
        Self {
            in_place: false,
            ..Self::new()
        }
    }

    pub fn seed(&self, key: &str, title: &str, url: &str) {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = format!("att-{}", state.next_id);
        state
            .attachments
            .entry(internal_id(key))
            .or_default()
            .push(Attachment {
                id,
                title: title.to_string(),
                url: url.to_string(),
            });
    }

    pub fn attachments(&self, key: &str) -> Vec<Attachment> {
        self.state
            .borrow()
            .attachments
            .get(&internal_id(key))
            .cloned()
            .unwrap_or_default()
    }

    pub fn mutations(&self) -> usize {
        let state = self.state.borrow();
        state.creates + state.updates + state.deletes
    }

    pub fn fail_with(&self, err: TrackerError) {
        self.state.borrow_mut().fail_with = Some(err);
    }

    fn check(&self) -> std::result::Result<(), TrackerError> {
        match &self.state.borrow().fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn internal_id(key: &str) -> String {
    format!("issue-{}", key)
}

impl IssueTracker for FakeTracker {
    fn get_issue(&self, key: &str) -> std::result::Result<RemoteIssue, TrackerError> {
        self.check()?;
        Ok(RemoteIssue {
            id: internal_id(key),
            identifier: key.to_string(),
            title: format!("Issue {}", key),
        })
    }

    fn list_attachments(&self, issue_id: &str) -> std::result::Result<Vec<Attachment>, TrackerError> {
        self.check()?;
        Ok(self
            .state
            .borrow()
            .attachments
            .get(issue_id)
            .cloned()
            .unwrap_or_default())
    }

    fn create_attachment(&self, attachment: &NewAttachment) -> std::result::Result<Attachment, TrackerError> {
        self.check()?;
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.creates += 1;
        let created = Attachment {
            id: format!("att-{}", state.next_id),
            title: attachment.title.clone(),
            url: attachment.url.clone(),
        };
        state
            .attachments
            .entry(attachment.issue_id.clone())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    fn update_attachment(
        &self,
        attachment_id: &str,
        change: &AttachmentChange,
    ) -> std::result::Result<Attachment, TrackerError> {
        self.check()?;
        let mut state = self.state.borrow_mut();
        state.updates += 1;
        let attachment = state
            .attachments
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|a| a.id == attachment_id)
            .ok_or_else(|| TrackerError::NotFound(attachment_id.to_string()))?;
        if let Some(title) = &change.title {
            attachment.title = title.clone();
        }
        if let Some(url) = &change.url {
            attachment.url = url.clone();
        }
        Ok(attachment.clone())
    }

    fn delete_attachment(&self, attachment_id: &str) -> std::result::Result<(), TrackerError> {
        self.check()?;
        let mut state = self.state.borrow_mut();
        state.deletes += 1;
        for list in state.attachments.values_mut() {
            list.retain(|a| a.id != attachment_id);
        }
        Ok(())
    }

    fn supports_in_place(&self, _change: &AttachmentChange) -> bool {
        self.in_place
    }
}

/// Hands out clones of one fake tracker, or fails as if unauthenticated.
#[derive(Clone, Default)]
pub struct FakeProvider {
    pub tracker: Option<FakeTracker>,
    pub clients_built: Rc<RefCell<usize>>,
}

impl FakeProvider {
    pub fn connected(tracker: FakeTracker) -> Self {
        Self {
            tracker: Some(tracker),
            clients_built: Rc::default(),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }
}

impl TrackerProvider for FakeProvider {
    fn tracker(&self) -> Result<Box<dyn IssueTracker>> {
        *self.clients_built.borrow_mut() += 1;
        match &self.tracker {
            Some(tracker) => Ok(Box::new(tracker.clone())),
            None => Err(IssuedirError::AuthRequired("not connected".to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Desktop
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeDesktop {
    pub window_title: Option<String>,
    pub opened: Rc<RefCell<Vec<PathBuf>>>,
    pub clipboard: Rc<RefCell<Option<String>>>,
}

impl FakeDesktop {
    pub fn with_title(title: &str) -> Self {
        Self {
            window_title: Some(title.to_string()),
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.borrow().clone()
    }
}

impl Desktop for FakeDesktop {
    fn frontmost_window_title(&self, _process: &str) -> Option<String> {
        self.window_title.clone()
    }

    fn open_folder(&self, path: &Path) -> Result<()> {
        self.opened.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        *self.clipboard.borrow_mut() = Some(text.to_string());
        Ok(())
    }

    fn open_url(&self, _url: &str) -> Result<()> {
        Ok(())
    }
}
