//! "Thinking..." spinner shown while waiting for the model

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::console::{Console, Tone, LEFT_PADDING};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// A running spinner. Stop it before writing anything else.
pub struct Spinner {
    task: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
    console: Arc<Console>,
}

impl Spinner {
    /// Start drawing. Does nothing when the console is not a terminal.
    pub fn start(console: Arc<Console>) -> Self {
        if !console.is_interactive() {
            return Self {
                task: None,
                console,
            };
        }

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let draw = console.clone();
        let handle = tokio::spawn(async move {
            let pad = " ".repeat(LEFT_PADDING);
            let label = draw.paint_text("Thinking...", Tone::Dim);
            let mut frame = 0;
            loop {
                draw.write_raw(&format!("\r{}{} {}", pad, FRAMES[frame], label));
                frame = (frame + 1) % FRAMES.len();
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = tokio::time::sleep(FRAME_INTERVAL) => {}
                }
            }
        });

        Self {
            task: Some((stop_tx, handle)),
            console,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Stop the spinner and erase its line
    pub async fn stop(&mut self) {
        let Some((stop_tx, handle)) = self.task.take() else {
            return;
        };
        let _ = stop_tx.send(());
        if let Err(e) = handle.await {
            tracing::warn!("Spinner task failed: {}", e);
        }
        self.console.clear_line();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.task.take() {
            handle.abort();
            self.console.clear_line();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::SharedBuffer;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_spinner_silent_without_terminal() {
        let out = SharedBuffer::new();
        let console = Arc::new(Console::with_io(Cursor::new(String::new()), out.clone(), 80));
        let mut spinner = Spinner::start(console);
        assert!(!spinner.is_running());
        spinner.stop().await;
        assert_eq!(out.contents(), "");
    }
}
