/*!
 * Wanted-item model and the catalog wire format.
 *
 * `WantedItem` is what the rest of the pipeline works with. The `Wanted*Dto`
 * structs mirror the JSON returned by the catalog's wanted endpoints and are
 * converted into `WantedItem`s right after decoding.
 */

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kind of media a wanted item refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Episode,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Episode => write!(f, "episode"),
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaKind::Movie),
            "episode" | "episodes" | "series" => Ok(MediaKind::Episode),
            _ => Err(anyhow::anyhow!("Invalid media kind: {}", s)),
        }
    }
}

/// Stable identity of a wanted item across runs
///
/// Movie and episode ids come from different id spaces, so the kind is part
/// of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub kind: MediaKind,
    pub id: i64,
}

impl ItemKey {
    pub fn new(kind: MediaKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Kind-specific part of a wanted item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WantedKind {
    Movie,
    Episode {
        series_title: String,
        season: u32,
        episode: u32,
    },
}

/// An item the catalog reports as missing subtitles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WantedItem {
    /// Stable catalog id (radarr id for movies, sonarr episode id for episodes)
    pub id: i64,
    /// Movie title or episode title
    pub title: String,
    /// Path as seen by the catalog host, if reported
    pub catalog_path: Option<String>,
    pub monitored: bool,
    pub year: Option<u16>,
    /// Language codes the catalog reports as missing
    pub missing_languages: Vec<String>,
    pub kind: WantedKind,
}

impl WantedItem {
    /// Create a movie item
    pub fn movie(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            catalog_path: None,
            monitored: true,
            year: None,
            missing_languages: Vec::new(),
            kind: WantedKind::Movie,
        }
    }

    /// Create an episode item
    pub fn episode(
        id: i64,
        series_title: impl Into<String>,
        season: u32,
        episode: u32,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            catalog_path: None,
            monitored: true,
            year: None,
            missing_languages: Vec::new(),
            kind: WantedKind::Episode {
                series_title: series_title.into(),
                season,
                episode,
            },
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_monitored(mut self, monitored: bool) -> Self {
        self.monitored = monitored;
        self
    }

    pub fn with_missing_languages(mut self, languages: Vec<String>) -> Self {
        self.missing_languages = languages;
        self
    }

    pub fn media_kind(&self) -> MediaKind {
        match self.kind {
            WantedKind::Movie => MediaKind::Movie,
            WantedKind::Episode { .. } => MediaKind::Episode,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.media_kind(), self.id)
    }

    /// Title used to match library directories: the series title for
    /// episodes, the movie title otherwise
    pub fn title_hint(&self) -> &str {
        match &self.kind {
            WantedKind::Movie => &self.title,
            WantedKind::Episode { series_title, .. } => series_title,
        }
    }

    /// Season and episode numbers, for episodes
    pub fn episode_number(&self) -> Option<(u32, u32)> {
        match &self.kind {
            WantedKind::Movie => None,
            WantedKind::Episode { season, episode, .. } => Some((*season, *episode)),
        }
    }

    /// Human readable label for log lines
    pub fn display_name(&self) -> String {
        match &self.kind {
            WantedKind::Movie => match self.year {
                Some(year) => format!("{} ({})", self.title, year),
                None => self.title.clone(),
            },
            WantedKind::Episode {
                series_title,
                season,
                episode,
            } => format!("{} S{:02}E{:02}", series_title, season, episode),
        }
    }
}

/// Wanted endpoints answer either with `{"data": [...]}` or a bare list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WantedResponse<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> WantedResponse<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            WantedResponse::Wrapped { data } => data,
            WantedResponse::Bare(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MissingSubtitleDto {
    #[serde(default)]
    pub code2: Option<String>,
    #[serde(default)]
    pub code3: Option<String>,
}

fn default_monitored() -> bool {
    true
}

fn missing_codes(missing: &[MissingSubtitleDto]) -> Vec<String> {
    missing
        .iter()
        .filter_map(|m| m.code2.clone().or_else(|| m.code3.clone()))
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct WantedMovieDto {
    pub title: String,
    #[serde(rename = "radarrId")]
    pub radarr_id: i64,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default = "default_monitored")]
    pub monitored: bool,
    #[serde(default)]
    pub missing_subtitles: Vec<MissingSubtitleDto>,
}

impl From<WantedMovieDto> for WantedItem {
    fn from(dto: WantedMovieDto) -> Self {
        WantedItem {
            id: dto.radarr_id,
            missing_languages: missing_codes(&dto.missing_subtitles),
            title: dto.title,
            catalog_path: dto.path.filter(|p| !p.is_empty()),
            monitored: dto.monitored,
            year: dto.year,
            kind: WantedKind::Movie,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WantedEpisodeDto {
    #[serde(rename = "seriesTitle")]
    pub series_title: String,
    #[serde(rename = "episodeTitle", default)]
    pub episode_title: Option<String>,
    /// "SxE" notation, e.g. "1x49"
    #[serde(default)]
    pub episode_number: Option<String>,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
    #[serde(rename = "sonarrEpisodeId")]
    pub sonarr_episode_id: i64,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_monitored")]
    pub monitored: bool,
    #[serde(default)]
    pub missing_subtitles: Vec<MissingSubtitleDto>,
}

static EPISODE_NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*[xX]\s*(\d+)\s*$").unwrap());

/// Parse "1x49" into (1, 49)
pub fn parse_episode_number(value: &str) -> Option<(u32, u32)> {
    let caps = EPISODE_NUMBER_REGEX.captures(value)?;
    let season = caps.get(1)?.as_str().parse().ok()?;
    let episode = caps.get(2)?.as_str().parse().ok()?;
    Some((season, episode))
}

impl WantedEpisodeDto {
    pub fn into_item(self) -> Result<WantedItem, String> {
        let (season, episode) = match (self.season, self.episode) {
            (Some(s), Some(e)) => (s, e),
            _ => self
                .episode_number
                .as_deref()
                .and_then(parse_episode_number)
                .ok_or_else(|| {
                    format!(
                        "episode {} of '{}' has no usable season/episode number",
                        self.sonarr_episode_id, self.series_title
                    )
                })?,
        };

        Ok(WantedItem {
            id: self.sonarr_episode_id,
            title: self.episode_title.unwrap_or_default(),
            catalog_path: self.path.filter(|p| !p.is_empty()),
            monitored: self.monitored,
            year: None,
            missing_languages: missing_codes(&self.missing_subtitles),
            kind: WantedKind::Episode {
                series_title: self.series_title,
                season,
                episode,
            },
        })
    }
}
