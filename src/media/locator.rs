use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};

use super::StreamToolkit;
use crate::file_utils::{EXTRACTED_MARKER, FileManager};
use crate::language_utils::{self, UNKNOWN_LANGUAGE};

/// Where a candidate subtitle came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOrigin {
    /// Subtitle file beside the video
    ExternalFile,
    /// Stream extracted from the video container
    ExtractedStream { stream_index: usize },
}

/// A subtitle that could serve as translation source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCandidate {
    pub path: PathBuf,
    // ISO 639-1 where one exists, `unknown` otherwise
    pub language: String,
    pub origin: CandidateOrigin,
}

impl SubtitleCandidate {
    pub fn new(path: PathBuf, language: impl Into<String>, origin: CandidateOrigin) -> Self {
        Self {
            path,
            language: language.into(),
            origin,
        }
    }

    /// Only SRT documents can be fed to the translation pipeline
    pub fn is_translatable(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"))
    }

    pub fn is_extracted(&self) -> bool {
        matches!(self.origin, CandidateOrigin::ExtractedStream { .. })
    }
}

/// Language encoded in a subtitle file name after the video's stem
///
/// `Movie.en.srt`, `Movie.forced.eng.srt` and `Movie.Spanish.srt` give
/// `en`, `en` and `es`.
pub fn language_from_subtitle_name(video_stem: &str, subtitle: &Path) -> String {
    let stem = subtitle
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    stem.get(video_stem.len()..)
        .unwrap_or_default()
        .split(['.', '_', '-'])
        .filter(|token| !token.is_empty())
        .find_map(language_utils::language_from_token)
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
}

/// Finds source subtitles for a video
#[derive(Debug, Clone)]
pub struct SubtitleLocator {
    toolkit: Arc<dyn StreamToolkit>,
}

impl SubtitleLocator {
    pub fn new(toolkit: Arc<dyn StreamToolkit>) -> Self {
        Self { toolkit }
    }

    /// Subtitle files sharing the video's base name
    ///
    /// Files this tool wrote itself are never returned.
    pub fn locate_external(&self, video: &Path) -> Result<Vec<SubtitleCandidate>> {
        let Some(dir) = video.parent() else {
            return Ok(Vec::new());
        };
        let video_stem = video
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let prefix = format!("{}.", video_stem);

        let candidates = FileManager::sorted_files(dir)?
            .into_iter()
            .filter(|path| FileManager::is_subtitle_file(path) && !FileManager::is_translated_output(path))
            .filter(|path| {
                path.file_stem()
                    .map(|s| s.to_string_lossy())
                    .is_some_and(|stem| stem == video_stem || stem.starts_with(&prefix))
            })
            .map(|path| {
                let language = language_from_subtitle_name(&video_stem, &path);
                SubtitleCandidate::new(path, language, CandidateOrigin::ExternalFile)
            })
            .collect::<Vec<_>>();

        debug!("Found {} external subtitles for {:?}", candidates.len(), video);
        Ok(candidates)
    }

    /// Extract text subtitle streams to files beside the video
    ///
    /// Streams already in `target_language` and bitmap streams are skipped.
    /// A failing stream is logged and skipped.
    pub async fn extract_embedded(&self, video: &Path, target_language: &str) -> Result<Vec<SubtitleCandidate>> {
        let streams = self.toolkit.list_subtitle_streams(video).await?;
        let mut candidates = Vec::new();

        for stream in streams {
            let language = stream
                .language
                .as_deref()
                .and_then(|l| language_utils::normalize_to_part1_or_part2t(l).ok())
                .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());

            if language_utils::language_codes_match(&language, target_language) {
                debug!("Skipping stream {}: already in {}", stream.index, target_language);
                continue;
            }
            if stream.is_bitmap() {
                debug!("Skipping bitmap stream {} ({})", stream.index, stream.codec_name);
                continue;
            }

            let output = FileManager::extracted_subtitle_path(video, candidates.len(), &language);
            match self.toolkit.extract_stream(video, stream.index, &output).await {
                Ok(()) => candidates.push(SubtitleCandidate::new(
                    output,
                    language,
                    CandidateOrigin::ExtractedStream {
                        stream_index: stream.index,
                    },
                )),
                Err(e) => {
                    warn!("Could not extract stream {} of {:?}: {}", stream.index, video, e);
                    // ffmpeg may leave a partial file behind
                    let _ = fs::remove_file(&output);
                }
            }
        }

        if !candidates.is_empty() {
            info!("Extracted {} subtitle streams from {:?}", candidates.len(), video);
        }
        Ok(candidates)
    }

    /// External subtitles, or extracted streams when there are none
    pub async fn locate(&self, video: &Path, target_language: &str) -> Result<Vec<SubtitleCandidate>> {
        let external = self.locate_external(video)?;
        if !external.is_empty() {
            return Ok(external);
        }
        self.extract_embedded(video, target_language).await
    }

    /// Remove files produced by `extract_embedded`
    pub fn cleanup_extracted(candidates: &[SubtitleCandidate]) {
        for candidate in candidates.iter().filter(|c| c.is_extracted()) {
            let is_ours = candidate
                .path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().contains(EXTRACTED_MARKER));
            if !is_ours {
                continue;
            }
            if let Err(e) = fs::remove_file(&candidate.path) {
                warn!("Failed to remove extracted subtitle {:?}: {}", candidate.path, e);
            }
        }
    }
}
