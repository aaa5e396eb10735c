use super::SubtitleCandidate;
use crate::language_utils;

/// Pick the source subtitle by language priority
///
/// Walks `priority` in order and returns the first candidate in that
/// language. Candidates of unknown language are never chosen.
pub fn select<'a, S: AsRef<str>>(
    candidates: &'a [SubtitleCandidate],
    priority: &[S],
) -> Option<&'a SubtitleCandidate> {
    priority.iter().find_map(|wanted| {
        candidates
            .iter()
            .find(|c| language_utils::language_codes_match(&c.language, wanted.as_ref()))
    })
}
