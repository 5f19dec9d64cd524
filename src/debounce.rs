//! Request coalescing for the interactive one-shot mode.
//!
//! [`Debouncer`] is a cancellable timer: every `schedule` cancels the
//! pending task and starts a fresh window. [`LiveTranslator`] feeds user
//! edits through one and publishes results on a channel.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::errors::GenerationError;
use crate::generation::TextGenerator;
use linguaflow_common::{GenerationRequest, Mode, Purpose};

/// Runs only the last task scheduled within a quiet window.
pub struct Debouncer {
    window: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Cancel any pending task and schedule `task` after the window.
    ///
    /// Once the window elapses the task is detached: later calls cancel
    /// only tasks whose timer is still running.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            tokio::spawn(task);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The editable inputs of the one-shot mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveInput {
    pub text: String,
    pub audience: Option<String>,
    pub context: Option<String>,
    pub purpose: Option<Purpose>,
}

/// A result published by [`LiveTranslator`].
#[derive(Debug, Clone, PartialEq)]
pub struct LiveUpdate {
    /// Sequence number of the edit that produced this result.
    pub seq: u64,
    pub result: Result<String, GenerationError>,
}

/// Debounced TRANSLATOR / PROOFREADER / POLISH over a stream of edits.
///
/// Results of superseded edits are dropped, so the receiver only ever
/// sees output for the latest input.
pub struct LiveTranslator {
    generator: Arc<dyn TextGenerator>,
    mode: Mode,
    debouncer: Debouncer,
    latest: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<LiveUpdate>,
}

impl LiveTranslator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        mode: Mode,
        window: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<LiveUpdate>), GenerationError> {
        if !matches!(mode, Mode::Translate | Mode::Proofread | Mode::Polish) {
            return Err(GenerationError::Validation(format!(
                "{} is not available in live mode",
                mode
            )));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let translator = Self {
            generator,
            mode,
            debouncer: Debouncer::new(window),
            latest: Arc::new(AtomicU64::new(0)),
            tx,
        };
        Ok((translator, rx))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Sequence number of the most recent edit, `0` before any edit.
    pub fn last_seq(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Register an edit. Blank text clears the output immediately;
    /// anything else is sent once the input has been quiet for a window.
    pub fn edit(&mut self, input: LiveInput) {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        if input.text.trim().is_empty() {
            self.debouncer.cancel();
            self.publish(LiveUpdate {
                seq,
                result: Ok(String::new()),
            });
            return;
        }

        let request = GenerationRequest::new(self.mode, input.text)
            .with_audience(input.audience.as_deref())
            .with_context(input.context.as_deref())
            .with_purpose(input.purpose);
        let generator = Arc::clone(&self.generator);
        let latest = Arc::clone(&self.latest);
        let tx = self.tx.clone();

        self.debouncer.schedule(async move {
            debug!(seq, mode = %request.mode, "Debounce window elapsed; sending request");
            let result = generator.generate(&request).await.map(|r| r.text);
            if latest.load(Ordering::SeqCst) != seq {
                debug!(seq, "Dropping result of superseded edit");
                return;
            }
            if tx.send(LiveUpdate { seq, result }).is_err() {
                debug!("Live receiver closed");
            }
        });
    }

    fn publish(&self, update: LiveUpdate) {
        if self.tx.send(update).is_err() {
            debug!("Live receiver closed");
        }
    }
}
