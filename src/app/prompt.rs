//! Terminal input for selections and the interactive search loop, plus the
//! countdown shown during pauses.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use zspot_core::{PaceKind, PaceListener, SelectionPrompt};

/// Reads selections and queries from stdin.
#[derive(Debug, Default)]
pub(crate) struct TerminalPrompt;

impl TerminalPrompt {
    /// Prints `prompt` without a newline and reads one line.
    ///
    /// Returns `None` at end of input.
    pub(crate) async fn read_line(&self, prompt: &str) -> Option<String> {
        let prompt = prompt.to_string();
        let read = tokio::task::spawn_blocking(move || -> io::Result<Option<String>> {
            {
                let mut stdout = io::stdout().lock();
                write!(stdout, "{prompt}")?;
                stdout.flush()?;
            }

            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line)? == 0 {
                return Ok(None);
            }
            Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
        })
        .await;

        match read {
            Ok(Ok(line)) => line,
            Ok(Err(error)) => {
                debug!(error = %error, "stdin read failed");
                None
            }
            Err(error) => {
                debug!(error = %error, "stdin reader task failed");
                None
            }
        }
    }
}

#[async_trait]
impl SelectionPrompt for TerminalPrompt {
    async fn choose(&self, listing: &[String], instructions: &str) -> Option<String> {
        print_listing(listing).ok()?;
        self.read_line(instructions).await
    }
}

fn print_listing(listing: &[String]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for line in listing {
        writeln!(out, "{line}")?;
    }
    writeln!(out)
}

/// Shows a spinner with the remaining pause while the pacer sleeps.
#[derive(Debug, Default)]
pub(crate) struct CountdownListener {
    bar: Mutex<Option<ProgressBar>>,
}

impl PaceListener for CountdownListener {
    fn pause_started(&self, kind: PaceKind, duration: Duration) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Waiting {}s ({kind} pause)", duration.as_secs()));
        spinner.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(spinner);
        }
    }

    fn pause_finished(&self, _kind: PaceKind) {
        if let Ok(mut bar) = self.bar.lock()
            && let Some(spinner) = bar.take()
        {
            spinner.finish_and_clear();
        }
    }
}
