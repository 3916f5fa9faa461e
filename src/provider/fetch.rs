//! Audio retrieval through an external fetch command.
//!
//! Audio bytes are not served by the public metadata API, so the provider
//! hands them off to a configurable program invoked as
//!
//! ```text
//! <program> [extra args...] <category> <id> <target-without-extension> <format>
//! ```
//!
//! The program must write the file and print its final path as the last
//! non-empty line on stdout. A non-zero exit, an empty stdout, or a printed
//! path that does not exist all count as "nothing fetched".

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::{debug, instrument, warn};

use super::ProviderError;
use crate::catalog::ContentCategory;
use crate::config::AudioFormat;

/// Program used when no fetch command is configured.
pub const DEFAULT_FETCH_PROGRAM: &str = "zspot-fetch";

/// External command that turns an item id into an audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFetcher {
    program: String,
    args: Vec<String>,
}

impl Default for CommandFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_PROGRAM, Vec::new())
    }
}

impl CommandFetcher {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parses a whitespace-separated command line such as
    /// `"zspot-fetch --quality high"`. Returns `None` for a blank line.
    #[must_use]
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Runs the command for one item.
    ///
    /// Returns `Ok(None)` when the command ran but produced no file.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Spawn`] when the program cannot be started
    /// or the target directory cannot be created.
    #[instrument(skip(self, target_without_ext), fields(program = %self.program, target = %target_without_ext.display()))]
    pub async fn fetch(
        &self,
        id: &str,
        category: ContentCategory,
        target_without_ext: &Path,
        format: AudioFormat,
    ) -> Result<Option<PathBuf>, ProviderError> {
        if let Some(parent) = target_without_ext.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.spawn_error(source))?;
        }

        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(category.as_str())
            .arg(id)
            .arg(target_without_ext)
            .arg(format.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| self.spawn_error(source))?;

        if !output.status.success() {
            warn!(
                status = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "fetch command failed"
            );
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(last_line) = stdout.lines().map(str::trim).rfind(|line| !line.is_empty()) else {
            debug!("fetch command printed no output path");
            return Ok(None);
        };

        let path = PathBuf::from(last_line);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Ok(Some(path))
        } else {
            warn!(path = %path.display(), "fetch command reported a missing file");
            Ok(None)
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> ProviderError {
        ProviderError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}
