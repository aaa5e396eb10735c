/*!
 * Title matching for library directories.
 *
 * Directory names such as `Spider Man Far From Home (2019)` are compared
 * with catalog titles such as `Spider-Man: Far From Home` using a
 * normalized Levenshtein similarity. Known years must agree.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Default acceptance threshold for directory matches
///
/// The bound is inclusive: a score equal to the threshold is accepted, so a
/// threshold of 1.0 accepts exact title matches only.
pub const DEFAULT_THRESHOLD: f32 = 0.85;

static BRACKETED_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<title>.*?)\s*[\(\[](?P<year>(?:18|19|20)\d{2})[\)\]]").unwrap());

/// Lower-case, turn punctuation into spaces and collapse whitespace
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split `Title (2019) [extra]` into `("Title", Some(2019))`
pub fn split_directory_year(name: &str) -> (&str, Option<u16>) {
    match BRACKETED_YEAR.captures(name) {
        Some(caps) => {
            let title = caps.name("title").map(|m| m.as_str()).unwrap_or(name);
            let year = caps.name("year").and_then(|m| m.as_str().parse().ok());
            (title, year)
        }
        None => (name, None),
    }
}

/// Fuzzy matcher for titles
#[derive(Debug, Clone)]
pub struct TitleMatcher {
    threshold: f32,
}

impl Default for TitleMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl TitleMatcher {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Similarity of two already-normalized strings (0.0-1.0)
    pub fn similarity(&self, a: &str, b: &str) -> f32 {
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let distance = levenshtein_distance(a, b);
        let max_len = a.chars().count().max(b.chars().count());

        1.0 - (distance as f32 / max_len as f32)
    }

    /// Score a directory name against a title and optional year
    ///
    /// A year in the directory name that contradicts `year_hint` scores 0.
    pub fn score(&self, title_hint: &str, year_hint: Option<u16>, directory_name: &str) -> f32 {
        let (dir_title, dir_year) = split_directory_year(directory_name);
        if let (Some(wanted), Some(found)) = (year_hint, dir_year) {
            if wanted != found {
                return 0.0;
            }
        }
        self.similarity(&normalize_title(title_hint), &normalize_title(dir_title))
    }

    /// Whether the directory name is an acceptable match
    pub fn matches(&self, title_hint: &str, year_hint: Option<u16>, directory_name: &str) -> bool {
        self.score(title_hint, year_hint, directory_name) >= self.threshold
    }

    /// Highest-scoring name at or above the threshold
    ///
    /// Ties keep the earliest candidate, so callers pass names in sorted order.
    pub fn find_best_match<'a>(
        &self,
        title_hint: &str,
        year_hint: Option<u16>,
        names: &[&'a str],
    ) -> Option<(&'a str, f32)> {
        let mut best: Option<(&str, f32)> = None;

        for name in names {
            let score = self.score(title_hint, year_hint, name);
            if score < self.threshold {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((name, score)),
            }
        }

        best
    }
}

/// Levenshtein distance over chars
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row: Vec<usize> = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_chars.len()]
}
