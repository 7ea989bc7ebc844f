//! Shikimori GraphQL response types.
//!
//! These mirror the JSON the upstream sends back. Every field is optional
//! except the anime id; the normalizer decides what an omission means.

use serde::{Deserialize, Serialize};

/// Top-level GraphQL response
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

/// Error entry reported by the GraphQL endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

/// Decoded `data` object; every template selects the `animes` collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimeEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub animes: Vec<RawAnime>,
}

impl AnimeEnvelope {
    pub fn new(animes: Vec<RawAnime>) -> Self {
        Self { animes }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RawAnime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<RawAnime>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Anime as returned by the upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnime {
    pub id: String,
    #[serde(default)]
    pub mal_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub russian: Option<String>,
    /// Age rating enum, e.g. "pg_13"
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub episodes: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub poster: Option<RawPoster>,
    #[serde(default)]
    pub genres: Option<Vec<RawGenre>>,
    #[serde(default)]
    pub aired_on: Option<RawIncompleteDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPoster {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub main_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGenre {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub russian: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

/// Partially known date (any component may be missing)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIncompleteDate {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sparse_anime() {
        let raw: RawAnime = serde_json::from_str(r#"{"id": "5114", "name": null}"#).unwrap();
        assert_eq!(raw.id, "5114");
        assert!(raw.name.is_none());
        assert!(raw.genres.is_none());
        assert!(raw.aired_on.is_none());
    }

    #[test]
    fn test_decode_response_with_null_collection() {
        let resp: GraphQlResponse<AnimeEnvelope> =
            serde_json::from_str(r#"{"data": {"animes": null}}"#).unwrap();
        assert!(resp.data.unwrap().animes.is_empty());
        assert!(resp.errors.is_none());
    }

    #[test]
    fn test_decode_errors() {
        let resp: GraphQlResponse<AnimeEnvelope> = serde_json::from_str(
            r#"{"data": null, "errors": [{"message": "Variable $season is invalid", "locations": []}]}"#,
        )
        .unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors.unwrap()[0].message, "Variable $season is invalid");
    }

    #[test]
    fn test_decode_camel_case_fields() {
        let raw: RawAnime = serde_json::from_str(
            r#"{
                "id": "1",
                "malId": "1",
                "poster": {"id": "9", "originalUrl": "https://x/o.jpg", "mainUrl": "https://x/m.jpg"},
                "airedOn": {"year": 1998, "month": 4, "day": 3, "date": "1998-04-03"}
            }"#,
        )
        .unwrap();
        assert_eq!(raw.mal_id.as_deref(), Some("1"));
        assert_eq!(raw.poster.unwrap().main_url.as_deref(), Some("https://x/m.jpg"));
        assert_eq!(raw.aired_on.unwrap().year, Some(1998));
    }
}
