use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, error};
use serde::Deserialize;
use tokio::process::Command;

use super::{StreamToolkit, SubtitleStream};

/// Default time allowed for probing a container
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default time allowed for extracting one stream
pub const EXTRACT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    index: usize,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    tags: Option<ProbeTags>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Parse the JSON printed by `ffprobe -print_format json -show_streams`
pub fn parse_probe_output(json: &str) -> Result<Vec<SubtitleStream>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let output: ProbeOutput = serde_json::from_str(json).context("Failed to parse ffprobe JSON output")?;

    Ok(output
        .streams
        .into_iter()
        .map(|stream| {
            let tags = stream.tags.unwrap_or_default();
            SubtitleStream {
                index: stream.index,
                codec_name: stream.codec_name.unwrap_or_else(|| "unknown".to_string()),
                language: tags.language.filter(|l| !l.is_empty() && l != "und"),
                title: tags.title,
            }
        })
        .collect())
}

/// Keep only the meaningful lines of ffmpeg stderr
///
/// Drops the version banner, build configuration and stream metadata.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    const NOISE_PREFIXES: &[&str] = &[
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "title",
        "BPS",
        "DURATION",
        "NUMBER_OF",
        "_STATISTICS",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !NOISE_PREFIXES.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// `StreamToolkit` running the ffprobe and ffmpeg binaries
#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    ffprobe: String,
    ffmpeg: String,
    probe_timeout: Duration,
    extract_timeout: Duration,
}

impl Default for FfmpegToolkit {
    fn default() -> Self {
        Self {
            ffprobe: "ffprobe".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            probe_timeout: PROBE_TIMEOUT,
            extract_timeout: EXTRACT_TIMEOUT,
        }
    }
}

impl FfmpegToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeouts(mut self, probe: Duration, extract: Duration) -> Self {
        self.probe_timeout = probe;
        self.extract_timeout = extract;
        self
    }

    async fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<Output> {
        let child = Command::new(program).args(args).kill_on_drop(true).output();

        tokio::select! {
            result = child => {
                result.map_err(|e| anyhow!("Failed to execute {} command: {}", program, e))
            },
            _ = tokio::time::sleep(timeout) => {
                Err(anyhow!("{} command timed out after {} seconds", program, timeout.as_secs()))
            }
        }
    }
}

#[async_trait]
impl StreamToolkit for FfmpegToolkit {
    async fn list_subtitle_streams(&self, video: &Path) -> Result<Vec<SubtitleStream>> {
        if !video.exists() {
            return Err(anyhow!("Video file not found: {:?}", video));
        }
        let video_arg = video.to_string_lossy();

        let output = self
            .run(
                &self.ffprobe,
                &[
                    "-v",
                    "quiet",
                    "-print_format",
                    "json",
                    "-show_streams",
                    "-select_streams",
                    "s",
                    &video_arg,
                ],
                self.probe_timeout,
            )
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("ffprobe failed on {:?}: {}", video, stderr.trim());
            return Err(anyhow!("ffprobe command failed: {}", stderr.trim()));
        }

        let streams = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Found {} subtitle streams in {:?}", streams.len(), video);
        Ok(streams)
    }

    async fn extract_stream(&self, video: &Path, stream_index: usize, output_path: &Path) -> Result<()> {
        let video_arg = video.to_string_lossy();
        let output_arg = output_path.to_string_lossy();
        let map_arg = format!("0:{}", stream_index);

        let output = self
            .run(
                &self.ffmpeg,
                &["-y", "-nostdin", "-i", &video_arg, "-map", &map_arg, "-c:s", "srt", &output_arg],
                self.extract_timeout,
            )
            .await?;

        if !output.status.success() {
            let filtered = filter_ffmpeg_stderr(&String::from_utf8_lossy(&output.stderr));
            return Err(anyhow!("ffmpeg extraction of stream {} failed: {}", stream_index, filtered));
        }

        let size = tokio::fs::metadata(output_path)
            .await
            .with_context(|| format!("ffmpeg produced no file at {:?}", output_path))?
            .len();
        if size == 0 {
            return Err(anyhow!("Extracted file is empty, stream {} holds no subtitles", stream_index));
        }
        Ok(())
    }
}
