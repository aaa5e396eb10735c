/*!
 * Subtitle discovery beside and inside video files.
 *
 * - `locator`: sibling subtitle files and embedded stream extraction
 * - `selector`: source language choice by priority list
 * - `ffmpeg`: the `StreamToolkit` backed by ffprobe/ffmpeg
 */

use std::fmt::Debug;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

pub mod ffmpeg;
pub mod locator;
pub mod selector;

pub use ffmpeg::FfmpegToolkit;
pub use locator::{CandidateOrigin, SubtitleCandidate, SubtitleLocator};
pub use selector::select;

/// A subtitle stream inside a container
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleStream {
    // @field: Absolute stream index in the container
    pub index: usize,

    // @field: Codec as reported by the probe (subrip, ass, hdmv_pgs_subtitle...)
    pub codec_name: String,

    // @field: Language tag, if any
    pub language: Option<String>,

    // @field: Stream title tag, if any
    pub title: Option<String>,
}

impl SubtitleStream {
    /// Image-based streams cannot be turned into SRT text
    pub fn is_bitmap(&self) -> bool {
        is_bitmap_codec(&self.codec_name)
    }
}

/// Check if a subtitle codec is bitmap-based
pub fn is_bitmap_codec(codec_name: &str) -> bool {
    matches!(
        codec_name,
        "hdmv_pgs_subtitle" | "dvd_subtitle" | "dvb_subtitle" | "xsub"
    )
}

/// Stream inspection and extraction for video containers
#[async_trait]
pub trait StreamToolkit: Send + Sync + Debug {
    /// List the subtitle streams of a video
    async fn list_subtitle_streams(&self, video: &Path) -> Result<Vec<SubtitleStream>>;

    /// Write one subtitle stream to `output` as SRT
    async fn extract_stream(&self, video: &Path, stream_index: usize, output: &Path) -> Result<()>;
}
