//! Host audio-session integration.
//!
//! `AudioSession` abstracts the shared output session of the host: the engine
//! activates it before playback (re)starts, and the host pushes interruption
//! and route-change notifications back in. Notifications may originate on any
//! thread; `SessionGuard` turns them into messages on the engine's single
//! event queue so they never touch playback state directly.

use std::sync::mpsc::Sender;

use crate::engine::EngineEvent;
use crate::error::PlaybackError;

/// Reason attached to an audio route change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteChangeReason {
    /// The route playback was using disappeared (headphones unplugged).
    /// Policy: force a pause rather than continue aloud on the fallback
    /// device.
    OldDeviceUnavailable,
    /// A new preferred route appeared.
    NewDeviceAvailable,
    /// Category/configuration change on the session itself.
    ConfigurationChange,
    /// Anything else the host reports; logged, no state transition.
    Other(String),
}

/// System notifications relevant to playback, delivered via `SessionGuard`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Competing audio took over (phone call, another player). The host has
    /// already silenced output; the engine only keeps its state consistent.
    InterruptionBegan,
    /// The interruption ended. `should_resume` carries the host's hint that
    /// resuming playback is appropriate.
    InterruptionEnded { should_resume: bool },
    RouteChanged(RouteChangeReason),
}

/// Host audio output session.
///
/// Activation runs on the engine thread right before playback starts or
/// resumes. Failures are logged and playback proceeds anyway; if the session
/// is truly unusable the backend's own status callback reports it.
pub trait AudioSession: Send {
    fn activate(&mut self) -> Result<(), PlaybackError>;
}

/// Default session for hosts with no exclusive session handshake: activation
/// always succeeds.
pub struct SystemSession;

impl AudioSession for SystemSession {
    fn activate(&mut self) -> Result<(), PlaybackError> {
        tracing::debug!("audio session active (shared output)");
        Ok(())
    }
}

/// Cloneable handle through which host notification callbacks feed the
/// engine. Safe to call from arbitrary threads; each call is one message on
/// the engine queue.
#[derive(Clone)]
pub struct SessionGuard {
    tx: Sender<EngineEvent>,
}

impl SessionGuard {
    pub(crate) fn new(tx: Sender<EngineEvent>) -> Self {
        Self { tx }
    }

    pub fn interruption_began(&self) {
        self.push(SessionEvent::InterruptionBegan);
    }

    pub fn interruption_ended(&self, should_resume: bool) {
        self.push(SessionEvent::InterruptionEnded { should_resume });
    }

    pub fn route_changed(&self, reason: RouteChangeReason) {
        self.push(SessionEvent::RouteChanged(reason));
    }

    fn push(&self, event: SessionEvent) {
        // A closed channel means the engine is shutting down; late
        // notifications are dropped on purpose.
        let _ = self.tx.send(EngineEvent::Session(event));
    }
}
