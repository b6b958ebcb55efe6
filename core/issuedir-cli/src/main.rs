//! issuedir: open, create and backlink the local folder for a Linear issue.
//!
//! ## Subcommands
//!
//! - `open`: Folder for the issue in the focused Linear window
//! - `query`: Folder for a typed issue id, with create options
//! - `copy-id`: Copy the focused issue id to the clipboard
//! - `parse`: Parse a window title (JSON on stdout)
//! - `backlink` / `backlink-all`: Reconcile the folder backlink on Linear
//! - `authorize` / `auth-status` / `disconnect`: Linear credentials
//! - `config`: Show or initialize the configuration file
//!
//! Every command ends in a notification on stderr. The exit code is 1 when
//! that notification is a failure.

mod interrupt;
mod logging;
mod prompt;
mod render;

use clap::{Parser, Subcommand};
use issuedir_core::config::{init_config_file, load_preferences};
use issuedir_core::{
    folder_name_preview, is_issue_id, normalize_issue_id, parse_issue_title, text, Authenticator,
    AuthStatus, CreatedFolder, IssueEngine, IssuedirError, Notifier, OpenOutcome, ResolveContext,
    ResolveView, Separator, StorageConfig, Toast, ToastAction,
};
use render::{backlink_toast, TerminalNotifier};

#[derive(Parser)]
#[command(name = "issuedir")]
#[command(about = "Open, create and backlink local folders for Linear issues")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the folder for the issue in the focused Linear window
    Open {
        /// Report ambiguity as an error instead of prompting
        #[arg(long)]
        no_interactive: bool,
    },

    /// Find, open or create the folder for an issue id
    Query {
        /// Issue id, e.g. ENG-123
        #[arg(value_name = "ISSUE_ID")]
        issue_id: String,

        /// Title used for the suggested folder name
        #[arg(long, default_value = "")]
        title: String,

        /// Open the Nth match (1-based) without prompting
        #[arg(long, value_name = "N")]
        pick: Option<usize>,

        /// Create the suggested folder when none exists
        #[arg(long)]
        create: bool,

        /// Create `<ID><separator><NAME>` when none exists
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Separator for --name: space, hyphen or period
        #[arg(long)]
        separator: Option<Separator>,
    },

    /// Copy the focused issue id to the clipboard
    CopyId,

    /// Parse an issue id and title out of a window title
    Parse {
        #[arg(value_name = "TITLE")]
        title: String,
    },

    /// Ensure the folder backlink exists on one issue
    Backlink {
        #[arg(value_name = "ISSUE_ID")]
        issue_id: String,
    },

    /// Backlink every issue folder under the search directory
    BacklinkAll {
        /// List the folders without contacting Linear
        #[arg(long)]
        dry_run: bool,
    },

    /// Connect to Linear with OAuth in the browser
    Authorize,

    /// Show how Linear would be authenticated
    AuthStatus,

    /// Forget stored OAuth tokens
    Disconnect,

    /// Show the effective configuration
    Config {
        /// Write a commented template if no config file exists
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let storage = StorageConfig::default();
    let _logging_guard = logging::init(&storage.logs_dir());
    let cli = Cli::parse();
    let notifier = TerminalNotifier::new(storage.config_file());

    let toast = match run(cli.command, &storage, &notifier) {
        Ok(toast) => toast,
        Err(err) => {
            tracing::error!(error = %err, "issuedir command failed");
            Toast::from_error(&err)
        }
    };
    notifier.notify(&toast);

    if toast.is_failure() {
        std::process::exit(1);
    }
}

fn run(command: Commands, storage: &StorageConfig, notifier: &dyn Notifier) -> Result<Toast, IssuedirError> {
    let engine = || IssueEngine::with_storage(storage.clone());

    match command {
        Commands::Open { no_interactive } => open(&engine()?, notifier, no_interactive),
        Commands::Query {
            issue_id,
            title,
            pick,
            create,
            name,
            separator,
        } => {
            let issue_id = normalize_issue_id(&issue_id);
            if !is_issue_id(&issue_id) {
                return Ok(invalid_issue_id(&issue_id));
            }
            let engine = engine()?;
            let options = ResolveOptions {
                pick,
                create,
                name,
                separator: separator.unwrap_or(engine.preferences().folder_separator),
                interactive: prompt::is_interactive(),
            };
            resolve(&engine, notifier, ResolveContext::new(issue_id, title), &options)
        }
        Commands::CopyId => {
            let issue_id = engine()?.copy_focused_issue_id()?;
            Ok(Toast::success("Copied to Clipboard", Some(issue_id)))
        }
        Commands::Parse { title } => Ok(parse(&title)),
        Commands::Backlink { issue_id } => {
            let issue_id = normalize_issue_id(&issue_id);
            if !is_issue_id(&issue_id) {
                return Ok(invalid_issue_id(&issue_id));
            }
            let engine = engine()?;
            notifier.notify(&Toast::progress("Creating backlink...", Some(issue_id.clone())));
            Ok(backlink_toast(&engine.backlink(&issue_id)))
        }
        Commands::BacklinkAll { dry_run } => backlink_all(&engine()?, notifier, dry_run),
        Commands::Authorize => {
            let engine = engine()?;
            let auth = Authenticator::from_preferences(engine.preferences(), storage);
            notifier.notify(&Toast::progress(
                "Waiting for authorization in the browser...",
                None,
            ));
            match auth.authorize(engine.desktop()) {
                Ok(status) => Ok(Toast::success("Authorized Linear", Some(status.describe()))),
                Err(err) => Ok(Toast::failure("Authorization failed", Some(err.to_string()))),
            }
        }
        Commands::AuthStatus => {
            let prefs = load_preferences(storage)?;
            let status = Authenticator::from_preferences(&prefs, storage).status();
            Ok(match status {
                AuthStatus::NotConnected { .. } => {
                    Toast::failure("Not connected", Some(status.describe()))
                        .with_action(ToastAction::ConnectTracker)
                }
                _ => Toast::success("Linear", Some(status.describe())),
            })
        }
        Commands::Disconnect => {
            let prefs = load_preferences(storage)?;
            Authenticator::from_preferences(&prefs, storage).disconnect()?;
            Ok(Toast::success("Disconnected from Linear", None))
        }
        Commands::Config { init } => config(storage, init),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Open / resolve
// ─────────────────────────────────────────────────────────────────────────────

fn open(engine: &IssueEngine, notifier: &dyn Notifier, no_interactive: bool) -> Result<Toast, IssuedirError> {
    match engine.open_focused_issue()? {
        OpenOutcome::Opened { path, .. } => {
            Ok(Toast::success("Opened Folder", Some(path.display().to_string())))
        }
        OpenOutcome::Created { path, .. } => {
            Ok(Toast::success("Created Folder", Some(path.display().to_string())))
        }
        OpenOutcome::NeedsResolution(ctx) => {
            let interactive = !no_interactive && prompt::is_interactive();
            if !interactive {
                return Err(ctx.into_error());
            }
            let options = ResolveOptions {
                pick: None,
                create: false,
                name: None,
                separator: engine.preferences().folder_separator,
                interactive,
            };
            resolve(engine, notifier, ctx, &options)
        }
    }
}

struct ResolveOptions {
    pick: Option<usize>,
    create: bool,
    name: Option<String>,
    separator: Separator,
    interactive: bool,
}

fn resolve(
    engine: &IssueEngine,
    notifier: &dyn Notifier,
    ctx: ResolveContext,
    options: &ResolveOptions,
) -> Result<Toast, IssuedirError> {
    let view = engine.resolve(&ctx)?;

    match &view {
        ResolveView::Matches { paths, .. } => {
            let index = if let Some(pick) = options.pick {
                match pick.checked_sub(1).filter(|index| *index < paths.len()) {
                    Some(index) => index,
                    None => {
                        return Ok(Toast::failure(
                            "Invalid selection",
                            Some(format!("Choose a number between 1 and {}", paths.len())),
                        ))
                    }
                }
            } else if paths.len() == 1 {
                0
            } else if options.interactive {
                render::print_view(&view);
                let prompt = format!("Open folder [1-{}, q to cancel]: ", paths.len());
                match prompt::choose(&prompt, paths.len()).map_err(prompt_error)? {
                    Some(index) => index,
                    None => return Ok(cancelled()),
                }
            } else {
                render::print_view(&view);
                return Err(IssuedirError::AmbiguousFolderMatch {
                    issue_id: ctx.issue_id,
                    count: paths.len(),
                });
            };

            let path = &paths[index];
            engine.open_folder(path)?;
            Ok(Toast::success("Opened Folder", Some(path.display().to_string())))
        }
        ResolveView::Missing { manual, .. } => {
            if let Some(name) = &options.name {
                let created = engine.create_custom_folder(&ctx, name, options.separator)?;
                return Ok(report_created(notifier, created));
            }
            if options.create {
                let created = engine.create_suggested_folder(&ctx)?;
                return Ok(report_created(notifier, created));
            }
            if !options.interactive {
                return Err(IssuedirError::NoFolderMatch(ctx.issue_id));
            }

            render::print_view(&view);
            let custom = match prompt::choose("Choose [1-2, q to cancel]: ", 2).map_err(prompt_error)? {
                None => return Ok(cancelled()),
                Some(0) => *manual,
                Some(_) => !*manual,
            };

            if !custom {
                let created = engine.create_suggested_folder(&ctx)?;
                return Ok(report_created(notifier, created));
            }

            let Some(name) = ask_custom_name(engine, &ctx, options.separator)? else {
                return Ok(Toast::failure(
                    "Folder name required",
                    Some("Enter a name to create the folder.".to_string()),
                ));
            };
            let created = engine.create_custom_folder(&ctx, &name, options.separator)?;
            Ok(report_created(notifier, created))
        }
    }
}

/// Prompts for a custom name, offering the issue title as the default.
fn ask_custom_name(
    engine: &IssueEngine,
    ctx: &ResolveContext,
    separator: Separator,
) -> Result<Option<String>, IssuedirError> {
    let initial = if engine.preferences().allow_emojis {
        ctx.issue_title.trim().to_string()
    } else {
        text::strip_emoji(&ctx.issue_title)
    };

    let prompt = if initial.is_empty() {
        "Folder name: ".to_string()
    } else {
        format!(
            "Folder name [{}] (creates \"{}\"): ",
            initial,
            folder_name_preview(&ctx.issue_id, &initial, separator)
        )
    };

    let reply = prompt::ask(&prompt).map_err(prompt_error)?.unwrap_or_default();
    let name = if reply.is_empty() { initial } else { reply };
    Ok((!name.trim().is_empty()).then_some(name))
}

fn report_created(notifier: &dyn Notifier, created: CreatedFolder) -> Toast {
    let toast = Toast::success("Created Folder", Some(created.path.display().to_string()));
    match created.backlink {
        None => toast,
        Some(outcome) => {
            notifier.notify(&toast);
            backlink_toast(&outcome)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Batch
// ─────────────────────────────────────────────────────────────────────────────

fn backlink_all(engine: &IssueEngine, notifier: &dyn Notifier, dry_run: bool) -> Result<Toast, IssuedirError> {
    notifier.notify(&Toast::progress("Scanning for folders...", None));
    let mut items = match engine.scan_issue_folders() {
        Ok(items) => items,
        Err(err) => return Ok(Toast::failure("Scan failed", Some(err.to_string()))),
    };

    println!("Found {} issue folders:", items.len());
    render::print_batch_items(&items);
    if dry_run {
        return Ok(Toast::success(
            "Scan Complete",
            Some(format!("{} folders", items.len())),
        ));
    }

    if !engine.is_authenticated() {
        return Ok(Toast::failure(
            "Authentication Required",
            Some("Please connect Linear first.".to_string()),
        )
        .with_action(ToastAction::ConnectTracker));
    }

    let cancel = interrupt::install();
    let summary = engine.backlink_all(&mut items, cancel, render::print_batch_progress)?;

    if summary.cancelled {
        return Ok(Toast::failure("Batch Cancelled", Some(summary.render())));
    }
    Ok(Toast::success("Batch Complete", Some(summary.render())))
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine-free commands
// ─────────────────────────────────────────────────────────────────────────────

fn parse(title: &str) -> Toast {
    match parse_issue_title(title) {
        Some(issue) => {
            match serde_json::to_string_pretty(&issue) {
                Ok(json) => println!("{}", json),
                Err(err) => return Toast::failure("Something went wrong", Some(err.to_string())),
            }
            Toast::success("Parsed", Some(issue.id().to_string()))
        }
        None => Toast::failure(
            "No Issue ID found",
            Some(format!("Current title: {:?}", title)),
        ),
    }
}

fn config(storage: &StorageConfig, init: bool) -> Result<Toast, IssuedirError> {
    let path = storage.config_file();
    if init {
        return Ok(if init_config_file(storage)? {
            Toast::success("Wrote configuration template", Some(path.display().to_string()))
        } else {
            Toast::success("Configuration already exists", Some(path.display().to_string()))
        });
    }

    let prefs = load_preferences(storage)?;
    let rendered = toml::to_string_pretty(&prefs.redacted()).map_err(|err| IssuedirError::ConfigMalformed {
        path: path.clone(),
        details: err.to_string(),
    })?;
    println!("# {}", path.display());
    if !path.exists() {
        println!("# (file not found; showing defaults)");
    }
    print!("{}", rendered);
    Ok(Toast::success("Configuration", Some(path.display().to_string())))
}

fn invalid_issue_id(issue_id: &str) -> Toast {
    Toast::failure(
        "Invalid issue ID",
        Some(format!("{:?} does not look like ENG-123", issue_id)),
    )
}

fn cancelled() -> Toast {
    Toast::success("Cancelled", None)
}

fn prompt_error(source: std::io::Error) -> IssuedirError {
    IssuedirError::Io {
        context: "reading from terminal".to_string(),
        source,
    }
}
