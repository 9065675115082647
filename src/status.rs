//! Per-module lifecycle events and the sinks that consume them.
//!
//! The resolver never talks to a sink directly. Each lookup gets a
//! [`StatusHandle`] that pushes [`StatusEvent`]s into an unbounded channel;
//! a single dispatcher task drains the channel into a [`Sink`] (usually a
//! [`MultiSink`] fanning out to terminal, CSV and JSON writers). A slow
//! writer therefore never holds a concurrency permit.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::{Module, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Normal,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub enum Phase {
    Start,
    Update { kind: UpdateKind, message: String },
    Finish(Resolution),
}

#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub module: Module,
    pub phase: Phase,
}

/// A presentation collaborator.
///
/// Methods take `&self`: events for different modules arrive from a single
/// dispatcher but in arbitrary order, so implementations keep their
/// aggregation behind a lock.
pub trait Sink: Send + Sync {
    fn start(&self, module: &Module);
    fn update(&self, module: &Module, kind: UpdateKind, message: &str);
    fn finish(&self, resolution: &Resolution);
    fn close(&self) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn start(&self, module: &Module) {
        (**self).start(module)
    }

    fn update(&self, module: &Module, kind: UpdateKind, message: &str) {
        (**self).update(module, kind, message)
    }

    fn finish(&self, resolution: &Resolution) {
        (**self).finish(resolution)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

/// Fans every event out to a list of sinks.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn Sink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }
}

impl Sink for MultiSink {
    fn start(&self, module: &Module) {
        for sink in &self.sinks {
            sink.start(module);
        }
    }

    fn update(&self, module: &Module, kind: UpdateKind, message: &str) {
        for sink in &self.sinks {
            sink.update(module, kind, message);
        }
    }

    fn finish(&self, resolution: &Resolution) {
        for sink in &self.sinks {
            sink.finish(resolution);
        }
    }

    /// Closes every sink even if an earlier one fails; the first error wins.
    fn close(&self) -> Result<()> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.close() {
                tracing::error!("closing report sink: {:#}", e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Publishing side of the status stream.
#[derive(Clone)]
pub struct StatusChannel {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl StatusChannel {
    /// Start a dispatcher that forwards every event to `sink`.
    ///
    /// The dispatcher exits once every clone of the returned channel (and
    /// every handle derived from it) has been dropped.
    pub fn spawn(sink: Arc<dyn Sink>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<StatusEvent>();
        let dispatcher = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                dispatch(sink.as_ref(), &event);
            }
        });
        (Self { tx }, dispatcher)
    }

    /// A channel nobody listens to; events are dropped.
    pub fn detached() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }

    pub fn handle(&self, module: &Module) -> StatusHandle {
        StatusHandle {
            module: module.clone(),
            tx: self.tx.clone(),
        }
    }
}

fn dispatch(sink: &dyn Sink, event: &StatusEvent) {
    match &event.phase {
        Phase::Start => sink.start(&event.module),
        Phase::Update { kind, message } => sink.update(&event.module, *kind, message),
        Phase::Finish(resolution) => sink.finish(resolution),
    }
}

/// Status publisher scoped to one module's lookup.
///
/// Passed explicitly through the translator and finder chains so they can
/// report progress without knowing who is listening.
#[derive(Clone)]
pub struct StatusHandle {
    module: Module,
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl StatusHandle {
    pub fn start(&self) {
        self.send(Phase::Start);
    }

    pub fn update(&self, kind: UpdateKind, message: impl Into<String>) {
        self.send(Phase::Update {
            kind,
            message: message.into(),
        });
    }

    pub fn finish(&self, resolution: Resolution) {
        self.send(Phase::Finish(resolution));
    }

    fn send(&self, phase: Phase) {
        // A closed receiver only means nobody is listening anymore.
        let _ = self.tx.send(StatusEvent {
            module: self.module.clone(),
            phase,
        });
    }
}
