//! # Diagnostics Channel
//!
//! Out-of-band reports from the simulation to whoever supervises it
//! (a server shell, a test harness, a debug overlay).
//!
//! Uses a bounded crossbeam channel. Sending never blocks the tick: when the
//! channel is full the report is dropped.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::simulation::{MatchState, Stage};

/// Reports emitted by a [`Simulation`](crate::Simulation).
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// A stage failed; the simulation is now paused.
    TickFault {
        /// Tick that failed.
        tick: u64,
        /// Stage that failed, if known.
        stage: Option<Stage>,
        /// Rendered error.
        message: String,
    },

    /// The director raised the escalation level.
    WorldEvent {
        /// Tick of the escalation.
        tick: u64,
        /// New level.
        level: u32,
        /// Bosses actually spawned.
        bosses: u32,
    },

    /// The match finished.
    MatchOver {
        /// Tick the outcome was decided.
        tick: u64,
        /// Final state.
        outcome: MatchState,
    },
}

/// Creates a bounded diagnostics channel.
#[must_use]
pub fn diagnostic_channel(capacity: usize) -> (DiagnosticSender, DiagnosticReceiver) {
    let (sender, receiver) = bounded(capacity);
    (DiagnosticSender { sender }, DiagnosticReceiver { receiver })
}

/// Handle for sending diagnostics.
#[derive(Clone)]
pub struct DiagnosticSender {
    sender: Sender<Diagnostic>,
}

impl DiagnosticSender {
    /// Sends a report (non-blocking).
    ///
    /// Returns `false` if the channel is full or nobody is listening.
    #[inline]
    pub fn send(&self, diagnostic: Diagnostic) -> bool {
        match self.sender.try_send(diagnostic) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving diagnostics.
#[derive(Clone)]
pub struct DiagnosticReceiver {
    receiver: Receiver<Diagnostic>,
}

impl DiagnosticReceiver {
    /// Receives one report (non-blocking).
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<Diagnostic> {
        self.receiver.try_recv().ok()
    }

    /// Receives every pending report.
    #[must_use]
    pub fn drain(&self) -> Vec<Diagnostic> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending reports.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}
