/*!
 * Tests for SRT parsing and writing
 */

use anyhow::Result;

use subsync::errors::SubtitleError;
use subsync::subtitle_processor::{SubtitleCollection, SubtitleEntry, parse_timing_line};
use crate::common;

/// Load, replace texts, save and reload
#[test]
fn test_subtitleWorkflow_withFullProcess_shouldKeepTiming() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_subtitle(temp_dir.path(), "movie.en.srt")?;

    let document = SubtitleCollection::load(&source)?;
    assert_eq!(document.entries.len(), 3);

    let texts = document.texts().iter().map(|t| t.to_uppercase()).collect();
    let translated = document.with_texts(texts)?;
    let output = temp_dir.path().join("movie.nl.translated.srt");
    translated.write_to_srt(&output)?;

    let reloaded = SubtitleCollection::load(&output)?;
    assert_eq!(reloaded.entries.len(), 3);
    assert_eq!(reloaded.entries[0].text, "THIS IS A TEST SUBTITLE.");
    for (before, after) in document.entries.iter().zip(&reloaded.entries) {
        assert_eq!(before.seq_num, after.seq_num);
        assert_eq!(before.start_time_ms, after.start_time_ms);
        assert_eq!(before.end_time_ms, after.end_time_ms);
    }
    Ok(())
}

#[test]
fn test_parseSrtString_withMultilineText_shouldJoinWithNewline() -> Result<()> {
    let content = "7\n01:02:03,004 --> 01:02:05,000\n- Who?\n- Me.\n\n\n\n8\n01:02:06,000 --> 01:02:07,000\nOk\n";

    let entries = SubtitleCollection::parse_srt_string(content)?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq_num, 7);
    assert_eq!(entries[0].start_time_ms, 3_723_004);
    assert_eq!(entries[0].text, "- Who?\n- Me.");
    Ok(())
}

#[test]
fn test_parseSrtString_withCorruptSecondBlock_shouldReportBlock() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nFine\n\n2\n00:00:03 --> 00:00:04\nBroken\n";

    let err = SubtitleCollection::parse_srt_string(content).unwrap_err();

    assert!(matches!(err, SubtitleError::MalformedTiming { block: 2, .. }));
}

#[test]
fn test_parseTimingLine_withPositionSuffix_shouldIgnoreIt() {
    assert_eq!(
        parse_timing_line("00:00:01,000 --> 00:00:02,000 X1:100 X2:200 Y1:10 Y2:20"),
        Some((1_000, 2_000))
    );
    assert_eq!(parse_timing_line("00:61:00,000 --> 00:62:00,000"), None);
}

#[test]
fn test_writeToSrt_shouldLeaveNoTemporaryFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let output = temp_dir.path().join("out.srt");
    let document = SubtitleCollection::new(
        output.clone(),
        vec![SubtitleEntry::new(1, 0, 1_000, "Hi"), SubtitleEntry::new(2, 1_000, 2_000, "Bye")],
    );

    document.write_to_srt(&output)?;

    let names: Vec<String> = std::fs::read_dir(temp_dir.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["out.srt".to_string()]);
    assert!(std::fs::read_to_string(&output)?.starts_with("1\n00:00:00,000 --> 00:00:01,000\nHi\n"));
    Ok(())
}
