/*!
 * Batch planning.
 *
 * Lines are grouped into consecutive ranges that respect a backend's
 * character and entry limits. Every line lands in exactly one range and
 * ranges are returned in order, so concatenating the translated ranges
 * restores the document.
 */

use std::ops::Range;

use log::debug;

use crate::providers::BatchLimits;

/// Split `texts` into consecutive index ranges within `limits`
///
/// A line longer than the character limit gets a range of its own.
pub fn split_into_batches<S: AsRef<str>>(texts: &[S], limits: BatchLimits) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut current_chars = 0;

    for (i, text) in texts.iter().enumerate() {
        let chars = text.as_ref().chars().count();
        let current_entries = i - start;

        let over_chars = current_chars + chars > limits.max_chars;
        let over_entries = current_entries >= limits.max_entries;
        if current_entries > 0 && (over_chars || over_entries) {
            batches.push(start..i);
            start = i;
            current_chars = 0;
        }

        if chars > limits.max_chars {
            debug!("Line {} is oversized ({} chars), sending it alone", i, chars);
        }
        current_chars += chars;
    }

    if start < texts.len() {
        batches.push(start..texts.len());
    }
    batches
}
