//! Now Playing projection.
//!
//! The publisher turns the engine's `PlaybackState` into the metadata record
//! shown on the host's external now-playing surface, and holds it in a shared
//! handle the remote-control interface reads. Projection is pure: the same
//! state always yields the same record, and `Idle`/no-track states clear the
//! display entirely instead of showing stale zeros.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::engine::{PlaybackState, PlaybackStatus};

/// Media type projected for every track this engine plays.
pub const MEDIA_TYPE: &str = "podcast";

/// Pixel edge of the generated placeholder artwork.
pub const PLACEHOLDER_ART_SIZE: u32 = 256;

/// The record pushed to the external now-playing display.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingInfo {
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub source_url: String,
    pub duration: Option<Duration>,
    pub position: Duration,
    /// 1.0 while audio renders, 0.0 otherwise.
    pub rate: f64,
    pub media_type: &'static str,
    /// PNG `data:` URL; empty when no artwork could be produced.
    pub art_url: String,
}

/// Shared, read-only view for the remote surface. `None` means the display
/// is cleared.
pub type NowPlayingHandle = Arc<Mutex<Option<NowPlayingInfo>>>;

/// Projects playback state onto the shared now-playing handle.
#[derive(Clone)]
pub struct NowPlayingPublisher {
    shared: NowPlayingHandle,
    art_url: Arc<str>,
}

impl NowPlayingPublisher {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(None)),
            art_url: placeholder_art_data_url(PLACEHOLDER_ART_SIZE).into(),
        }
    }

    pub fn handle(&self) -> NowPlayingHandle {
        self.shared.clone()
    }

    /// Re-project `state` onto the external display. Idle states clear it.
    pub fn publish(&self, state: &PlaybackState) {
        let info = project(state, &self.art_url);
        if let Ok(mut shared) = self.shared.lock() {
            *shared = info;
        }
    }

    /// Clear the external display entirely.
    pub fn clear(&self) {
        if let Ok(mut shared) = self.shared.lock() {
            *shared = None;
        }
    }
}

impl Default for NowPlayingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure projection of `PlaybackState` into a now-playing record.
///
/// Returns `None` (clear the display) when stopped or no track is loaded.
pub fn project(state: &PlaybackState, art_url: &str) -> Option<NowPlayingInfo> {
    if matches!(state.status, PlaybackStatus::Idle) {
        return None;
    }
    let track = state.current_track.as_ref()?;

    let rate = if matches!(state.status, PlaybackStatus::Playing) {
        1.0
    } else {
        0.0
    };

    Some(NowPlayingInfo {
        title: track.title.clone(),
        artist: track.artist.clone(),
        album: track.album.clone(),
        source_url: track.source_url.to_string(),
        duration: state.duration,
        position: state.position,
        rate,
        media_type: MEDIA_TYPE,
        art_url: art_url.to_string(),
    })
}

/// Generate placeholder artwork: a diagonal gradient, deterministic for a
/// given size. Used when no richer artwork is available.
pub fn placeholder_artwork(size: u32) -> Vec<u8> {
    let size = size.max(1);
    let img = image::RgbaImage::from_fn(size, size, |x, y| {
        let tx = x as f32 / size as f32;
        let ty = y as f32 / size as f32;
        // teal -> indigo sweep
        let r = (30.0 + 70.0 * tx) as u8;
        let g = (160.0 - 110.0 * ty) as u8;
        let b = (170.0 + 60.0 * ty) as u8;
        image::Rgba([r, g, b, 255])
    });

    let mut png = Vec::new();
    match image::DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png) {
        Ok(()) => png,
        Err(e) => {
            tracing::warn!("placeholder artwork encoding failed: {e}");
            Vec::new()
        }
    }
}

/// Placeholder artwork as a `data:image/png;base64,...` URL, or an empty
/// string when encoding fails.
pub fn placeholder_art_data_url(size: u32) -> String {
    let png = placeholder_artwork(size);
    if png.is_empty() {
        return String::new();
    }
    format!("data:image/png;base64,{}", BASE64.encode(png))
}
