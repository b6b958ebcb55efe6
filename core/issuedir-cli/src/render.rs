//! Terminal rendering of notifications and view models.

use issuedir_core::{
    BacklinkOutcome, BatchItem, BatchProgress, ItemStatus, Notifier, ResolveView, Toast,
    ToastAction, ToastStyle,
};
use std::path::PathBuf;

/// Prints toasts to stderr so stdout stays usable for `--json` output.
pub struct TerminalNotifier {
    config_path: PathBuf,
}

impl TerminalNotifier {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    fn action_hint(&self, action: ToastAction) -> String {
        match action {
            ToastAction::ConnectTracker => format!("{}: run `issuedir authorize`", action.label()),
            ToastAction::OpenPreferences => format!(
                "{}: edit {} (`issuedir config --init` writes a template)",
                action.label(),
                self.config_path.display()
            ),
        }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, toast: &Toast) {
        let marker = match toast.style {
            ToastStyle::Success => "✓",
            ToastStyle::Failure => "✗",
            ToastStyle::Animated => "…",
        };
        match &toast.message {
            Some(message) => eprintln!("{} {}: {}", marker, toast.title, message),
            None => eprintln!("{} {}", marker, toast.title),
        }
        if let Some(action) = toast.action {
            eprintln!("  → {}", self.action_hint(action));
        }
    }
}

/// Toast for a backlink attempt made as part of another command.
pub fn backlink_toast(outcome: &BacklinkOutcome) -> Toast {
    match outcome {
        BacklinkOutcome::Failed { .. } if outcome.is_auth_required() => {
            Toast::failure(outcome.describe(), None).with_action(ToastAction::ConnectTracker)
        }
        BacklinkOutcome::Failed { .. } => Toast::failure(outcome.describe(), None),
        BacklinkOutcome::Disabled => Toast::success(
            outcome.describe(),
            Some("Set backlink_url_scheme to enable".to_string()),
        )
        .with_action(ToastAction::OpenPreferences),
        _ => Toast::success(outcome.describe(), outcome.url().map(str::to_string)),
    }
}

pub fn print_view(view: &ResolveView) {
    match view {
        ResolveView::Matches { issue_id, paths } => {
            println!("Folders for {}:", issue_id);
            for (index, path) in paths.iter().enumerate() {
                println!("  {:>2}. {}", index + 1, path.display());
            }
        }
        ResolveView::Missing {
            display_title,
            suggested_name,
            manual,
            ..
        } => {
            println!("No folder found for {}", display_title);
            if *manual {
                println!("  1. Create Custom Folder");
                println!("  2. Create Suggested Folder ({})", suggested_name);
            } else {
                println!("  1. Create Suggested Folder ({})", suggested_name);
                println!("  2. Create Custom Folder");
            }
        }
    }
}

pub fn print_batch_items(items: &[BatchItem]) {
    for item in items {
        println!("  {:<10} {}", item.issue_id, item.path.display());
    }
}

pub fn print_batch_progress(progress: &BatchProgress, item: &BatchItem) {
    let marker = match item.status {
        ItemStatus::Done => "✓",
        ItemStatus::Skipped => "-",
        ItemStatus::Error => "✗",
        ItemStatus::Pending | ItemStatus::Processing => " ",
    };
    eprintln!(
        "[{}/{}] {} {:<10} {}",
        progress.current,
        progress.total,
        marker,
        item.issue_id,
        item.result.as_deref().unwrap_or_default()
    );
}
