/*!
 * Catalog path to local path resolution.
 *
 * The catalog reports paths as seen by its own host. Resolution first
 * rewrites the longest matching remote prefix from the configured mappings;
 * if that does not land on an existing file it falls back to matching the
 * title against directory names under the library roots.
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::PathConfig;
use crate::catalog::{MediaKind, WantedItem};
use crate::file_utils::FileManager;

pub mod fuzzy;

pub use fuzzy::TitleMatcher;

static SXXEYY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)s(\d{1,2})[ ._-]?e(\d{1,3})").unwrap());
static NXNN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^0-9a-z])(\d{1,2})x(\d{2,3})(?:[^0-9]|$)").unwrap());

/// How a path was found
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveMethod {
    /// Prefix rewrite of the catalog path
    DirectMapping,
    /// Title match against a library directory
    Fuzzy { directory: PathBuf, score: f32 },
}

/// Local video file for a catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub method: ResolveMethod,
}

/// Whether a file name carries the given season/episode marker
pub fn matches_episode(file_name: &str, season: u32, episode: u32) -> bool {
    let parse_pair = |caps: regex::Captures| -> Option<(u32, u32)> {
        Some((caps.get(1)?.as_str().parse().ok()?, caps.get(2)?.as_str().parse().ok()?))
    };

    SXXEYY_REGEX
        .captures_iter(file_name)
        .chain(NXNN_REGEX.captures_iter(file_name))
        .filter_map(parse_pair)
        .any(|pair| pair == (season, episode))
}

/// Resolves catalog paths against the local filesystem
#[derive(Debug, Clone)]
pub struct PathResolver {
    mappings: BTreeMap<String, PathBuf>,
    movie_roots: Vec<PathBuf>,
    series_roots: Vec<PathBuf>,
    exact_episode_match: bool,
    matcher: TitleMatcher,
}

impl PathResolver {
    pub fn new(config: &PathConfig) -> Self {
        Self {
            mappings: config.mappings.clone(),
            movie_roots: config.movie_roots.clone(),
            series_roots: config.series_roots.clone(),
            exact_episode_match: config.exact_episode_match,
            matcher: TitleMatcher::new(config.fuzzy_threshold),
        }
    }

    /// Rewrite `catalog_path` with the longest matching remote prefix
    ///
    /// Prefixes match whole path components only. No filesystem access.
    pub fn map_prefix(&self, catalog_path: &str) -> Option<PathBuf> {
        let catalog_path = Path::new(catalog_path);

        self.mappings
            .iter()
            .filter_map(|(remote, local)| {
                let remote_path = Path::new(remote);
                catalog_path
                    .strip_prefix(remote_path)
                    .ok()
                    .map(|rest| (remote_path.components().count(), local.join(rest)))
            })
            .max_by_key(|(depth, _)| *depth)
            .map(|(_, mapped)| mapped)
    }

    /// Resolve a wanted item to a local video file
    pub fn resolve_item(&self, item: &WantedItem) -> Option<ResolvedPath> {
        self.resolve_with(
            item.catalog_path.as_deref(),
            item.media_kind(),
            item.title_hint(),
            item.year,
            item.episode_number(),
        )
    }

    /// Resolve by catalog path and title alone
    ///
    /// Episodes resolved this way have no episode number to match, so the
    /// first video of the series directory is returned.
    pub fn resolve(
        &self,
        catalog_path: Option<&str>,
        kind: MediaKind,
        title_hint: &str,
        year_hint: Option<u16>,
    ) -> Option<ResolvedPath> {
        self.resolve_with(catalog_path, kind, title_hint, year_hint, None)
    }

    fn resolve_with(
        &self,
        catalog_path: Option<&str>,
        kind: MediaKind,
        title_hint: &str,
        year_hint: Option<u16>,
        episode: Option<(u32, u32)>,
    ) -> Option<ResolvedPath> {
        if let Some(mapped) = catalog_path.and_then(|p| self.map_prefix(p)) {
            if mapped.is_file() {
                debug!("Direct mapping hit: {:?}", mapped);
                return Some(ResolvedPath {
                    path: mapped,
                    method: ResolveMethod::DirectMapping,
                });
            }
            if mapped.is_dir() {
                if let Some(video) = self.pick_video(&mapped, kind, episode) {
                    debug!("Direct mapping hit inside directory: {:?}", video);
                    return Some(ResolvedPath {
                        path: video,
                        method: ResolveMethod::DirectMapping,
                    });
                }
            }
            debug!("Mapped path {:?} does not exist, trying title match", mapped);
        }

        self.resolve_fuzzy(kind, title_hint, year_hint, episode)
    }

    fn resolve_fuzzy(
        &self,
        kind: MediaKind,
        title_hint: &str,
        year_hint: Option<u16>,
        episode: Option<(u32, u32)>,
    ) -> Option<ResolvedPath> {
        let roots = match kind {
            MediaKind::Movie => &self.movie_roots,
            MediaKind::Episode => &self.series_roots,
        };

        let mut directories: Vec<(String, PathBuf)> = Vec::new();
        for root in roots {
            match FileManager::sorted_subdirs(root) {
                Ok(subdirs) => directories.extend(subdirs.into_iter().filter_map(|dir| {
                    let name = dir.file_name()?.to_string_lossy().to_string();
                    Some((name, dir))
                })),
                Err(e) => warn!("Skipping library root {:?}: {}", root, e),
            }
        }

        directories.sort_by(|a, b| a.0.cmp(&b.0));

        let names: Vec<&str> = directories.iter().map(|(name, _)| name.as_str()).collect();
        let (best_name, score) = self.matcher.find_best_match(title_hint, year_hint, &names)?;
        let directory = directories
            .iter()
            .find(|(name, _)| name == best_name)
            .map(|(_, dir)| dir.clone())?;

        let video = self.pick_video(&directory, kind, episode);
        match &video {
            Some(path) => info!(
                "Matched '{}' to {:?} (score {:.2}): {:?}",
                title_hint, directory, score, path
            ),
            None => debug!("Directory {:?} matched '{}' but holds no usable video", directory, title_hint),
        }

        video.map(|path| ResolvedPath {
            path,
            method: ResolveMethod::Fuzzy { directory, score },
        })
    }

    /// Pick the video for an item inside a matched directory
    fn pick_video(&self, dir: &Path, kind: MediaKind, episode: Option<(u32, u32)>) -> Option<PathBuf> {
        match (kind, episode) {
            (MediaKind::Movie, _) => {
                let top_level = FileManager::sorted_files(dir)
                    .ok()?
                    .into_iter()
                    .find(|p| FileManager::is_video_file(p));
                top_level.or_else(|| FileManager::find_videos(dir).ok()?.into_iter().next())
            }
            (MediaKind::Episode, Some((season, number))) if self.exact_episode_match => {
                FileManager::find_videos(dir).ok()?.into_iter().find(|p| {
                    p.file_name()
                        .map(|name| matches_episode(&name.to_string_lossy(), season, number))
                        .unwrap_or(false)
                })
            }
            (MediaKind::Episode, _) => FileManager::find_videos(dir).ok()?.into_iter().next(),
        }
    }
}
