use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::language_utils;

// @module: File classification, naming and atomic writes

/// Video container extensions recognized when looking for media files
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "wmv", "m4v", "flv", "webm", "mpg", "mpeg", "ts", "m2ts",
];

/// Subtitle extensions recognized beside a video
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "vtt", "ass", "ssa", "sub"];

/// Marker inserted before the extension of files this tool writes
pub const TRANSLATED_MARKER: &str = "translated";

/// Prefix of the token naming a subtitle stream pulled out of a container
pub const EXTRACTED_MARKER: &str = "extracted_";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    fn extension_in(path: &Path, list: &[&str]) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                list.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    pub fn is_video_file<P: AsRef<Path>>(path: P) -> bool {
        Self::extension_in(path.as_ref(), VIDEO_EXTENSIONS)
    }

    pub fn is_subtitle_file<P: AsRef<Path>>(path: P) -> bool {
        Self::extension_in(path.as_ref(), SUBTITLE_EXTENSIONS)
    }

    /// Files directly inside `dir`, sorted by file name
    pub fn sorted_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Subdirectories directly inside `dir`, sorted by name
    pub fn sorted_subdirs<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut dirs = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Video files below `dir` in depth-first order, siblings sorted by name
    pub fn find_videos<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        for entry in WalkDir::new(dir.as_ref())
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.context("Failed to read directory entry")?;
            if entry.file_type().is_file() && Self::is_video_file(entry.path()) {
                result.push(entry.into_path());
            }
        }
        Ok(result)
    }

    /// Read a text file, falling back to Latin-1 when it is not valid UTF-8
    pub fn read_text<P: AsRef<Path>>(path: P) -> std::io::Result<String> {
        let bytes = fs::read(path)?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => err.into_bytes().iter().map(|&b| b as char).collect(),
        };
        Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
    }

    /// Write `content` to a temporary file beside `path`, then rename it into place
    ///
    /// Readers either see the previous file or the complete new one.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::Builder::new()
            .prefix(".subsync-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
        tmp.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write temporary file for {:?}", path))?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)
            .map_err(|e| anyhow::anyhow!("Failed to move output into place at {:?}: {}", path, e.error))?;
        Ok(())
    }

    // @generates: `{video stem}.{lang}.translated.srt` beside the video
    pub fn translated_output_for_video<P: AsRef<Path>>(video: P, target_language: &str) -> PathBuf {
        let video = video.as_ref();
        let stem = video.file_stem().unwrap_or_default().to_string_lossy();
        video.with_file_name(format!(
            "{}.{}.{}.srt",
            stem, target_language, TRANSLATED_MARKER
        ))
    }

    // @generates: output name for a translated subtitle, from the source subtitle's name
    //
    // Trailing language, variant and extraction tokens of the source stem are
    // dropped, so `Movie.en.forced.srt` and `Movie.extracted_0_eng.srt` both
    // give `Movie.{lang}.translated.srt`.
    pub fn translated_output_path<P: AsRef<Path>>(subtitle: P, target_language: &str) -> PathBuf {
        let subtitle = subtitle.as_ref();
        let stem = subtitle.file_stem().unwrap_or_default().to_string_lossy().to_string();
        let mut tokens: Vec<&str> = stem.split('.').collect();

        while tokens.len() > 1 {
            let last = tokens[tokens.len() - 1];
            let removable = last.starts_with(EXTRACTED_MARKER)
                || last.eq_ignore_ascii_case(TRANSLATED_MARKER)
                || language_utils::is_flag_token(last)
                || language_utils::language_from_token(last).is_some();
            if !removable {
                break;
            }
            tokens.pop();
        }

        subtitle.with_file_name(format!(
            "{}.{}.{}.srt",
            tokens.join("."),
            target_language,
            TRANSLATED_MARKER
        ))
    }

    /// Whether a file name carries the translated marker this tool writes
    pub fn is_translated_output<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .file_stem()
            .map(|stem| {
                stem.to_string_lossy()
                    .rsplit('.')
                    .next()
                    .is_some_and(|last| last.eq_ignore_ascii_case(TRANSLATED_MARKER))
            })
            .unwrap_or(false)
    }

    // @generates: `{video stem}.extracted_{n}_{lang}.srt` beside the video
    pub fn extracted_subtitle_path<P: AsRef<Path>>(video: P, ordinal: usize, language: &str) -> PathBuf {
        let video = video.as_ref();
        let stem = video.file_stem().unwrap_or_default().to_string_lossy();
        video.with_file_name(format!(
            "{}.{}{}_{}.srt",
            stem, EXTRACTED_MARKER, ordinal, language
        ))
    }
}
