//! Desktop integration: focused window title, file manager, clipboard, browser.
//!
//! Every path or URL is passed to the child process as an argument. The only
//! script string built here is the AppleScript window query, and the process
//! name is quoted before it is interpolated.

use crate::error::{IssuedirError, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

pub trait Desktop {
    /// Title of the frontmost window of `process`, if it can be determined.
    fn frontmost_window_title(&self, process: &str) -> Option<String>;

    fn open_folder(&self, path: &Path) -> Result<()>;

    fn copy_to_clipboard(&self, text: &str) -> Result<()>;

    fn open_url(&self, url: &str) -> Result<()>;
}

/// The real desktop of the host OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDesktop;

impl Desktop for SystemDesktop {
    fn frontmost_window_title(&self, process: &str) -> Option<String> {
        window_title(process)
    }

    fn open_folder(&self, path: &Path) -> Result<()> {
        #[cfg(target_os = "macos")]
        let mut command = {
            let mut command = Command::new("open");
            command.arg(path);
            command
        };

        #[cfg(target_os = "windows")]
        let mut command = {
            let mut command = Command::new("explorer");
            command.arg(path);
            command
        };

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let mut command = {
            let mut command = Command::new("xdg-open");
            command.arg(path);
            command
        };

        spawn_detached(&mut command, "open folder")
    }

    fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        #[cfg(target_os = "macos")]
        return pipe_to("pbcopy", &[], text);

        #[cfg(target_os = "windows")]
        return pipe_to("clip", &[], text);

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            if std::env::var_os("WAYLAND_DISPLAY").is_some() && pipe_to("wl-copy", &[], text).is_ok() {
                return Ok(());
            }
            pipe_to("xclip", &["-selection", "clipboard"], text)
        }
    }

    fn open_url(&self, url: &str) -> Result<()> {
        #[cfg(target_os = "macos")]
        let mut command = {
            let mut command = Command::new("open");
            command.arg(url);
            command
        };

        #[cfg(target_os = "windows")]
        let mut command = {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", "", url]);
            command
        };

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let mut command = {
            let mut command = Command::new("xdg-open");
            command.arg(url);
            command
        };

        spawn_detached(&mut command, "open url")
    }
}

#[cfg(target_os = "macos")]
fn window_title(process: &str) -> Option<String> {
    let script = format!(
        r#"tell application "System Events"
    if not (exists process {name}) then return ""
    tell process {name}
        if (count of windows) is 0 then return ""
        return name of front window
    end tell
end tell"#,
        name = applescript_quote(process)
    );

    let output = Command::new("osascript").arg("-e").arg(&script).output().ok()?;
    if !output.status.success() {
        tracing::debug!(
            process,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "Window title query failed"
        );
        return None;
    }

    let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!title.is_empty()).then_some(title)
}

#[cfg(not(target_os = "macos"))]
fn window_title(process: &str) -> Option<String> {
    tracing::debug!(process, "No window title source on this platform");
    None
}

/// Quotes `value` as an AppleScript string literal.
pub fn applescript_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

fn spawn_detached(command: &mut Command, action: &str) -> Result<()> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|err| IssuedirError::CommandFailed {
            command: action.to_string(),
            details: err.to_string(),
        })
}

fn pipe_to(program: &str, args: &[&str], input: &str) -> Result<()> {
    let failed = |details: String| IssuedirError::CommandFailed {
        command: program.to_string(),
        details,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| failed(err.to_string()))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .map_err(|err| failed(err.to_string()))?;
    }

    let status = child.wait().map_err(|err| failed(err.to_string()))?;
    if !status.success() {
        return Err(failed(format!("exited with {}", status)));
    }
    Ok(())
}
