//! Shell command execution for `<system>`.

use crate::text::single_line;
use std::process::Command;

/// Returned instead of output when a command cannot be run.
pub const APOLOGY: &str = "There was an error while computing my response.  Please inform my botmaster.";

/// Run `command` through the platform shell and return its standard output
/// collapsed onto one line. Blocks until the command exits.
pub(crate) fn run(command: &str) -> String {
    let command = command.trim();
    log::debug!("running shell command: {command}");
    let output = if cfg!(windows) {
        Command::new("cmd").args(["/C", command]).output()
    } else {
        Command::new("sh").args(["-c", command]).output()
    };
    match output {
        Ok(out) => {
            if !out.status.success() {
                log::warn!("shell command '{command}' exited with {}", out.status);
            }
            single_line(&String::from_utf8_lossy(&out.stdout))
        }
        Err(err) => {
            log::warn!("failed to run shell command '{command}': {err}");
            APOLOGY.to_string()
        }
    }
}
