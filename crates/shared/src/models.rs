//! Data models for the aggregation layer.
//!
//! These are the normalized shapes handed to callers. Every field except the
//! upstream identifier is optional, and an absent field stays absent when
//! serialized instead of collapsing into an empty string or a zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Normalized anime entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anime {
    /// Upstream-assigned identifier
    pub id: String,

    /// MyAnimeList identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mal_id: Option<String>,

    // Titles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub russian: Option<String>,

    /// Score in the range 0.0 to 10.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Age rating token (e.g. "pg_13")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_rating: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AnimeStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<Poster>,

    /// Genres in upstream order; `None` when the upstream omitted the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<Genre>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aired_on: Option<AiredOn>,
}

impl Anime {
    /// Create an entry carrying only its identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mal_id: None,
            name: None,
            russian: None,
            score: None,
            age_rating: None,
            description: None,
            episodes: None,
            status: None,
            poster: None,
            genres: None,
            aired_on: None,
        }
    }
}

/// Broadcast status of a title
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnimeStatus {
    Anons,
    Ongoing,
    Released,
}

impl AnimeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimeStatus::Anons => "anons",
            AnimeStatus::Ongoing => "ongoing",
            AnimeStatus::Released => "released",
        }
    }
}

impl std::fmt::Display for AnimeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnimeStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anons" => Ok(AnimeStatus::Anons),
            "ongoing" => Ok(AnimeStatus::Ongoing),
            "released" => Ok(AnimeStatus::Released),
            _ => Err(anyhow::anyhow!("Invalid anime status: {}", s)),
        }
    }
}

/// Poster reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_url: Option<String>,
}

/// Genre record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub russian: Option<String>,
    /// Genre kind (genre, theme, demographic)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// First air date, as reported by the upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiredOn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    /// Precomputed date string (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl AiredOn {
    /// Calendar date, when year, month and day are all known and valid
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        match (self.year, self.month, self.day) {
            (Some(year), Some(month), Some(day)) => NaiveDate::from_ymd_opt(year, month, day),
            _ => self
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        }
    }
}

/// Broadcast season
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Season for a calendar month. Months outside 1-12 are clamped.
    pub fn from_month(month: u32) -> Self {
        match month {
            0..=3 => Season::Winter,
            4..=6 => Season::Spring,
            7..=9 => Season::Summer,
            _ => Season::Fall,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Season {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" => Ok(Season::Fall),
            _ => Err(anyhow::anyhow!("Invalid season: {}", s)),
        }
    }
}

/// Season and year pair, rendered as `<season>_<year>` (e.g. "winter_2025")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeasonToken {
    pub season: Season,
    pub year: i32,
}

impl SeasonToken {
    pub fn new(season: Season, year: i32) -> Self {
        Self { season, year }
    }
}

impl std::fmt::Display for SeasonToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.season, self.year)
    }
}

impl std::str::FromStr for SeasonToken {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (season, year) = s
            .split_once('_')
            .ok_or_else(|| anyhow::anyhow!("Invalid season token: {}", s))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| anyhow::anyhow!("Invalid season year: {}", s))?;
        Ok(Self::new(season.parse()?, year))
    }
}
