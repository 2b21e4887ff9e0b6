//! Ctrl-C as something the chat loop can await
//!
//! Prompts, permission questions and model turns all race against the same
//! [`Interrupt`]. A session on the terminal listens for the real signal; tests
//! build a manual one and fire it with [`Interrupt::trigger`].

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

struct Inner {
    notify: Notify,
    signals: bool,
    listening: AtomicBool,
}

/// Shared handle to the user's interrupt key
#[derive(Clone)]
pub struct Interrupt {
    inner: Arc<Inner>,
}

impl Interrupt {
    /// Fires on Ctrl-C. The signal listener starts on the first wait.
    pub fn ctrl_c() -> Self {
        Self::build(true)
    }

    /// Fires only through [`Interrupt::trigger`]
    pub fn manual() -> Self {
        Self::build(false)
    }

    fn build(signals: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                notify: Notify::new(),
                signals,
                listening: AtomicBool::new(false),
            }),
        }
    }

    /// Wake everything currently waiting on this interrupt
    pub fn trigger(&self) {
        tracing::info!("Interrupt received");
        self.inner.notify.notify_waiters();
    }

    /// Resolve on the next interrupt
    ///
    /// The returned future counts interrupts from the moment it is created,
    /// before it is first polled.
    pub fn wait(&self) -> Notified<'_> {
        self.listen();
        self.inner.notify.notified()
    }

    fn listen(&self) {
        if !self.inner.signals || self.inner.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("No tokio runtime, Ctrl-C will not be caught");
                self.inner.listening.store(false, Ordering::SeqCst);
                return;
            }
        };

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                    break;
                }
                match inner.upgrade() {
                    Some(inner) => Interrupt { inner }.trigger(),
                    None => break,
                }
            }
        });
    }
}

impl std::fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interrupt")
            .field("signals", &self.inner.signals)
            .finish()
    }
}

/// The error a prompt returns when the user interrupts it
pub fn interrupted_error() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "interrupted")
}

/// Whether an error chain was caused by an interrupted prompt
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::Interrupted)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_a_waiter_created_before_it() {
        let interrupt = Interrupt::manual();
        let waiting = interrupt.wait();
        interrupt.trigger();
        waiting.await;
    }

    #[tokio::test]
    async fn test_trigger_without_waiters_is_not_remembered() {
        let interrupt = Interrupt::manual();
        interrupt.trigger();

        let fired = tokio::time::timeout(std::time::Duration::from_millis(20), interrupt.wait()).await;
        assert!(fired.is_err());
    }

    #[test]
    fn test_is_interrupted() {
        let err = anyhow::Error::new(interrupted_error()).context("asking for permission");
        assert!(is_interrupted(&err));
        assert!(!is_interrupted(&anyhow::anyhow!("boom")));
    }
}
