use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ProviderError, SubtitleError};
use crate::file_utils::FileManager;

// @module: SRT documents: parsing, rebuilding and writing

// @const: SRT timing line; `.` is accepted as millisecond separator
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{1,3}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,3}):(\d{2}):(\d{2})[,.](\d{3})(?:\s.*)?$",
    )
    .unwrap()
});

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Index as written in the file
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Subtitle text, lines joined with '\n'
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: impl Into<String>) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text: text.into(),
        }
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(
            f,
            "{} --> {}",
            Self::format_timestamp(self.start_time_ms),
            Self::format_timestamp(self.end_time_ms)
        )?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

fn timestamp_ms(h: &str, m: &str, s: &str, ms: &str) -> Option<u64> {
    let hours: u64 = h.parse().ok()?;
    let minutes: u64 = m.parse().ok()?;
    let seconds: u64 = s.parse().ok()?;
    let millis: u64 = ms.parse().ok()?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
}

/// Parse an SRT timing line into (start, end) milliseconds
pub fn parse_timing_line(line: &str) -> Option<(u64, u64)> {
    let caps = TIMESTAMP_REGEX.captures(line.trim())?;
    let start = timestamp_ms(&caps[1], &caps[2], &caps[3], &caps[4])?;
    let end = timestamp_ms(&caps[5], &caps[6], &caps[7], &caps[8])?;
    (end >= start).then_some((start, end))
}

/// Ordered subtitle document
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// File the entries were read from
    pub source_file: PathBuf,

    /// Entries in file order
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    pub fn new(source_file: PathBuf, entries: Vec<SubtitleEntry>) -> Self {
        SubtitleCollection { source_file, entries }
    }

    /// Load and parse an SRT file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let is_srt = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));
        if !is_srt {
            return Err(SubtitleError::UnsupportedFormat(path.display().to_string()));
        }

        let content = FileManager::read_text(path).map_err(|source| SubtitleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = Self::parse_srt_string(&content)?;
        debug!("Parsed {} entries from {:?}", entries.len(), path);

        Ok(Self::new(path.to_path_buf(), entries))
    }

    /// Parse SRT content
    ///
    /// Blocks are separated by blank lines. Each block must start with a
    /// numeric index followed by a timing line; anything else fails the whole
    /// document rather than silently dropping entries.
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
        let mut entries = Vec::new();
        let mut block: Vec<&str> = Vec::new();
        let mut block_no = 0;

        let mut flush = |block: &mut Vec<&str>, block_no: &mut usize| -> Result<(), SubtitleError> {
            if block.is_empty() {
                return Ok(());
            }
            *block_no += 1;

            let index_line = block[0].trim();
            let seq_num = index_line.parse::<usize>().map_err(|_| SubtitleError::MalformedIndex {
                block: *block_no,
                line: index_line.to_string(),
            })?;

            let timing_line = block.get(1).copied().unwrap_or_default();
            let (start, end) =
                parse_timing_line(timing_line).ok_or_else(|| SubtitleError::MalformedTiming {
                    block: *block_no,
                    line: timing_line.to_string(),
                })?;

            let text = block[2.min(block.len())..].join("\n");
            entries.push(SubtitleEntry::new(seq_num, start, end, text));
            block.clear();
            Ok(())
        };

        for line in content.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                flush(&mut block, &mut block_no)?;
            } else {
                block.push(line);
            }
        }
        flush(&mut block, &mut block_no)?;

        if entries.is_empty() {
            return Err(SubtitleError::Empty);
        }
        Ok(entries)
    }

    /// Texts of all entries, in order
    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.text.clone()).collect()
    }

    /// Same timing, new text; `texts` must line up one-to-one with the entries
    pub fn with_texts(&self, texts: Vec<String>) -> Result<Self, ProviderError> {
        if texts.len() != self.entries.len() {
            return Err(ProviderError::MisalignedBatch {
                expected: self.entries.len(),
                actual: texts.len(),
            });
        }

        let entries = self
            .entries
            .iter()
            .zip(texts)
            .map(|(entry, text)| SubtitleEntry {
                text,
                ..entry.clone()
            })
            .collect();

        Ok(Self::new(self.source_file.clone(), entries))
    }

    pub fn to_srt_string(&self) -> String {
        self.entries.iter().map(|e| e.to_string()).collect()
    }

    /// Write the document as SRT via a temporary file and rename
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        FileManager::write_atomic(path, &self.to_srt_string())
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))
    }
}
