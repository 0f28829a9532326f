//! Single-track audio playback engine for podcast-style streams.
//!
//! [`engine::PlaybackEngine`] owns one active track at a time and serializes
//! every mutation — transport commands, backend callbacks, position sampler
//! ticks and audio-session notifications — through one event thread. Around
//! it: a rodio [`backend`], a [`sampler`] that drives position updates, the
//! [`nowplaying`] projection for external displays, and an MPRIS
//! [`remote`] control surface.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod nowplaying;
pub mod remote;
pub mod runtime;
pub mod sampler;
pub mod session;
pub mod telemetry;
pub mod track;
