use std::fmt::{Display, Formatter};
use std::process::Command;

use crate::model::{substitute_query, Target};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    EmptyPattern,
    Spawn(String),
}

impl Display for LaunchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPattern => write!(f, "target has an empty url pattern"),
            Self::Spawn(error) => write!(f, "failed to hand url to the shell: {error}"),
        }
    }
}

impl std::error::Error for LaunchError {}

/// Hands a fully substituted URL to something that opens it. Production
/// goes through the shell; tests record instead.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), LaunchError>;
}

/// Opens URLs with the platform's default handler.
pub struct ShellOpener;

impl UrlOpener for ShellOpener {
    fn open(&self, url: &str) -> Result<(), LaunchError> {
        open_command(url)
            .spawn()
            .map(|_| ())
            .map_err(|error| LaunchError::Spawn(error.to_string()))
    }
}

#[cfg(target_os = "windows")]
fn open_command(url: &str) -> Command {
    let mut command = Command::new("cmd");
    // The empty string is the window title slot of `start`.
    command.args(["/C", "start", "", url]);
    command
}

#[cfg(target_os = "macos")]
fn open_command(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn open_command(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}

/// Substitutes the query into the target's pattern and opens the result.
/// Returns the opened URL so callers can report it.
pub fn launch_target(
    target: &Target,
    query: &str,
    opener: &dyn UrlOpener,
) -> Result<String, LaunchError> {
    let url = substitute_query(&target.url_pattern, query);
    if url.trim().is_empty() {
        return Err(LaunchError::EmptyPattern);
    }
    opener.open(&url)?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::{launch_target, LaunchError, UrlOpener};
    use crate::model::{IconMode, Target};

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl UrlOpener for RecordingOpener {
        fn open(&self, url: &str) -> Result<(), LaunchError> {
            self.opened
                .lock()
                .expect("recorder lock should hold")
                .push(url.to_string());
            Ok(())
        }
    }

    fn target(url_pattern: &str) -> Target {
        Target::new(
            1,
            1,
            "Example",
            url_pattern,
            "",
            IconMode::Resolved,
            "",
            0x336699ff,
            0,
        )
    }

    #[test]
    fn launch_substitutes_and_opens() {
        let opener = RecordingOpener::default();
        let url = launch_target(&target("https://example.com/s?q=%s"), "rust lang", &opener)
            .expect("launch should succeed");

        assert_eq!(url, "https://example.com/s?q=rust+lang");
        assert_eq!(
            opener.opened.lock().expect("recorder lock should hold").as_slice(),
            &[url]
        );
    }

    #[test]
    fn empty_pattern_is_rejected_before_the_shell() {
        let opener = RecordingOpener::default();
        let error = launch_target(&target("   "), "anything", &opener)
            .expect_err("launch should fail");

        assert_eq!(error, LaunchError::EmptyPattern);
        assert!(opener
            .opened
            .lock()
            .expect("recorder lock should hold")
            .is_empty());
    }
}
