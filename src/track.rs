use std::path::{Path, PathBuf};

use lofty::prelude::*;
use url::Url;

use crate::error::PlaybackError;

/// The audio resource currently loaded by the engine.
///
/// Immutable once built; a `play()` call with a different URL replaces the
/// whole value rather than mutating it.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub source_url: Url,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub display: String,
}

fn make_display(title: &str, artist: Option<&str>) -> String {
    match artist {
        Some(a) if !a.trim().is_empty() => format!("{} - {}", a.trim(), title),
        _ => title.to_string(),
    }
}

/// Title fallback when a source carries no readable tags: the last path
/// segment without its extension.
fn stem_title(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut s| s.next_back())
        .filter(|s| !s.is_empty())
        .map(|s| {
            Path::new(s)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(s)
                .to_string()
        })
        .unwrap_or_else(|| url.as_str().to_string())
}

impl Track {
    /// Validate `source` and build a `Track` for it.
    ///
    /// Accepts any absolute URL plus bare absolute filesystem paths (turned
    /// into `file:` URLs). A string that parses as neither is an
    /// `InvalidSource` error; nothing else in the engine is touched in that
    /// case.
    pub fn from_source(source: &str) -> Result<Self, PlaybackError> {
        let url = match Url::parse(source) {
            Ok(u) => u,
            Err(_) if source.starts_with('/') => Url::from_file_path(source)
                .map_err(|()| PlaybackError::InvalidSource(source.to_string()))?,
            Err(e) => {
                return Err(PlaybackError::InvalidSource(format!("{source}: {e}")));
            }
        };

        let mut title = stem_title(&url);
        let mut artist: Option<String> = None;
        let mut album: Option<String> = None;

        // Local files often carry tags; remote streams keep the stem title
        // until richer metadata is available to the caller.
        if let Ok(path) = url.to_file_path() {
            if let Some((t, ar, al)) = probe_tags(&path) {
                if let Some(t) = t {
                    title = t;
                }
                artist = ar;
                album = al;
            }
        }

        let display = make_display(&title, artist.as_deref());

        Ok(Self {
            source_url: url,
            title,
            artist,
            album,
            display,
        })
    }

    /// Filesystem path for `file:` sources, `None` for remote URLs.
    pub fn local_path(&self) -> Option<PathBuf> {
        self.source_url.to_file_path().ok()
    }
}

type ProbedTags = (Option<String>, Option<String>, Option<String>);

fn probe_tags(path: &Path) -> Option<ProbedTags> {
    let tagged = lofty::read_from_path(path).ok()?;
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;

    let non_empty = |v: Option<&str>| {
        v.map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    Some((
        non_empty(tag.get_string(&ItemKey::TrackTitle)),
        non_empty(tag.get_string(&ItemKey::TrackArtist)),
        non_empty(tag.get_string(&ItemKey::AlbumTitle)),
    ))
}
