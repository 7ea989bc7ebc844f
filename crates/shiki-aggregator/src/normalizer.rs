//! Mapping from upstream payloads to the normalized `Anime` model.
//!
//! Absent upstream fields stay `None`. Values that cannot be represented
//! faithfully (negative episode counts, scores outside 0-10, unknown status
//! tokens) are dropped to `None` as well rather than coerced.

use crate::api::catalog::Operation;
use crate::api::types::{AnimeEnvelope, RawAnime, RawGenre, RawIncompleteDate, RawPoster};
use crate::error::{AggregatorError, Result};
use shared::{AiredOn, Anime, AnimeStatus, Genre, Poster};
use tracing::debug;

/// Normalize every element of a collection response, keeping upstream order
pub fn to_anime_list(envelope: AnimeEnvelope) -> Vec<Anime> {
    envelope.animes.into_iter().map(to_anime).collect()
}

/// Normalize the first element of a single-item response
///
/// An empty collection yields `NotFound`.
pub fn to_single_anime(envelope: AnimeEnvelope, operation: Operation, id: &str) -> Result<Anime> {
    envelope
        .animes
        .into_iter()
        .next()
        .map(to_anime)
        .ok_or_else(|| AggregatorError::NotFound {
            operation,
            id: id.to_string(),
        })
}

/// Normalize a single upstream anime
pub fn to_anime(raw: RawAnime) -> Anime {
    let episodes = raw.episodes.and_then(|n| u32::try_from(n).ok());
    let score = raw
        .score
        .filter(|s| s.is_finite() && (0.0..=10.0).contains(s));
    let status = raw.status.as_deref().and_then(|s| match s.parse::<AnimeStatus>() {
        Ok(status) => Some(status),
        Err(_) => {
            debug!(id = %raw.id, status = s, "Unknown anime status, dropping");
            None
        }
    });

    Anime {
        mal_id: non_blank(raw.mal_id),
        name: raw.name,
        russian: non_blank(raw.russian),
        score,
        age_rating: non_blank(raw.rating),
        description: raw.description,
        episodes,
        status,
        poster: raw.poster.and_then(to_poster),
        genres: raw
            .genres
            .map(|genres| genres.into_iter().map(to_genre).collect()),
        aired_on: raw.aired_on.and_then(to_aired_on),
        id: raw.id,
    }
}

fn to_poster(raw: RawPoster) -> Option<Poster> {
    let original_url = non_blank(raw.original_url);
    let main_url = non_blank(raw.main_url);
    if original_url.is_none() && main_url.is_none() {
        return None;
    }
    Some(Poster {
        id: non_blank(raw.id),
        original_url,
        main_url,
    })
}

fn to_genre(raw: RawGenre) -> Genre {
    Genre {
        id: raw.id,
        name: raw.name,
        russian: non_blank(raw.russian),
        kind: non_blank(raw.kind),
    }
}

fn to_aired_on(raw: RawIncompleteDate) -> Option<AiredOn> {
    let aired = AiredOn {
        year: raw.year,
        month: raw.month.filter(|m| (1..=12).contains(m)),
        day: raw.day.filter(|d| (1..=31).contains(d)),
        date: non_blank(raw.date),
    };
    if aired.year.is_none()
        && aired.month.is_none()
        && aired.day.is_none()
        && aired.date.is_none()
    {
        None
    } else {
        Some(aired)
    }
}

/// The upstream sends `""` for some missing strings; treat those as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
