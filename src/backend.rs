//! Backend player abstraction.
//!
//! A backend player is the object that actually decodes and renders audio for
//! exactly one source URL. The engine owns at most one player at a time and is
//! the only component holding a reference to it; everything the player has to
//! say (readiness, failure, rate changes, seek completions) travels back
//! through an event sink the engine wires into its own serialized queue.

mod rodio;
mod types;

pub use rodio::RodioBackend;
pub use types::*;
