//! Resolution tag and segment count from the HLS playlists.
//!
//! The master playlist lists variants lowest first, so its last stream
//! variant (`<resolution>/video.m3u8`) is the best one; I-frame-only variants
//! are skipped. The variant playlist's last segment is `video<max>.jpeg`.

use m3u8_rs::{parse_playlist_res, MasterPlaylist, MediaPlaylist, Playlist};
use thiserror::Error;
use url::Url;

use crate::fetch::{FetchOutcome, HttpGet, RetryingFetcher};
use crate::job::{check_path_segment, with_trailing_slash, JobSpecError};

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("invalid playlist URL: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Source(#[from] JobSpecError),
    #[error("could not fetch {url} after {attempts} attempts")]
    Fetch { url: Url, attempts: u32 },
    #[error("unparsable playlist: {0}")]
    Parse(String),
    #[error("expected a {expected} playlist")]
    WrongKind { expected: &'static str },
    #[error("master playlist has no variant entry")]
    NoVariant,
    #[error("variant playlist has no numbered segment entry")]
    NoSegments,
}

/// What the playlists say about a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub resolution_tag: String,
    pub segment_count: usize,
}

fn parse_master(bytes: &[u8]) -> Result<MasterPlaylist, PlaylistError> {
    match parse_playlist_res(bytes) {
        Ok(Playlist::MasterPlaylist(pl)) => Ok(pl),
        Ok(Playlist::MediaPlaylist(_)) => Err(PlaylistError::WrongKind { expected: "master" }),
        Err(e) => Err(PlaylistError::Parse(e.to_string())),
    }
}

fn parse_media(bytes: &[u8]) -> Result<MediaPlaylist, PlaylistError> {
    match parse_playlist_res(bytes) {
        Ok(Playlist::MediaPlaylist(pl)) => Ok(pl),
        Ok(Playlist::MasterPlaylist(_)) => Err(PlaylistError::WrongKind { expected: "media" }),
        Err(e) => Err(PlaylistError::Parse(e.to_string())),
    }
}

/// URI of the last non-I-frame variant, e.g. `1280x720/video.m3u8`.
pub fn variant_from_master(master: &[u8]) -> Result<String, PlaylistError> {
    parse_master(master)?
        .variants
        .into_iter()
        .filter(|v| !v.is_i_frame)
        .last()
        .map(|v| v.uri)
        .ok_or(PlaylistError::NoVariant)
}

/// Resolution directory of a variant entry (`1280x720/video.m3u8` → `1280x720`).
pub fn resolution_of_variant(variant: &str) -> &str {
    variant.split('/').next().unwrap_or(variant)
}

/// `max + 1`, where `max` is the number in the last segment's URI.
pub fn segment_count_from_media(media: &[u8]) -> Result<usize, PlaylistError> {
    let pl = parse_media(media)?;
    let last = pl.segments.last().ok_or(PlaylistError::NoSegments)?;
    let name = last.uri.rsplit('/').next().unwrap_or(&last.uri);
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<usize>()
        .map(|max| max + 1)
        .map_err(|_| PlaylistError::NoSegments)
}

/// Fetches `<base>/<source_id>/playlist.m3u8` and the best variant's playlist.
pub fn resolve<G: HttpGet>(
    fetcher: &RetryingFetcher<G>,
    base: &Url,
    source_id: &str,
) -> Result<Resolved, PlaylistError> {
    check_path_segment("segment source id", source_id)?;
    let source_dir = with_trailing_slash(base)?.join(&format!("{}/", source_id))?;
    let master_url = source_dir.join("playlist.m3u8")?;
    let master = fetch_bytes(fetcher, &master_url)?;
    let variant = variant_from_master(&master)?;
    let resolution_tag = resolution_of_variant(&variant).to_string();
    check_path_segment("resolution tag", &resolution_tag)?;

    let media_url = source_dir.join(&variant)?;
    let media = fetch_bytes(fetcher, &media_url)?;
    let segment_count = segment_count_from_media(&media)?;

    tracing::info!(source_id, %resolution_tag, segment_count, "playlist resolved");
    Ok(Resolved {
        resolution_tag,
        segment_count,
    })
}

fn fetch_bytes<G: HttpGet>(fetcher: &RetryingFetcher<G>, url: &Url) -> Result<Vec<u8>, PlaylistError> {
    match fetcher.fetch(url) {
        FetchOutcome::Fetched(bytes) => Ok(bytes),
        FetchOutcome::NotFound { attempts, last_error, .. } => {
            tracing::warn!(%url, attempts, error = %last_error, "playlist fetch failed");
            Err(PlaylistError::Fetch {
                url: url.clone(),
                attempts,
            })
        }
    }
}
