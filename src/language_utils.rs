use anyhow::{Result, anyhow};
use isolang::Language;

/// ISO 639 language code helpers
///
/// Codes may arrive as ISO 639-1 (`en`), ISO 639-2/T (`eng`, `nld`) or the
/// bibliographic ISO 639-2/B variants (`dut`, `ger`). Everything is resolved
/// to an `isolang::Language` before comparing.

/// Language tag for subtitles whose language could not be identified
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Filename tokens that describe a subtitle variant rather than a language
const FLAG_TOKENS: &[&str] = &["forced", "sdh", "hi", "cc", "default", "full"];

/// Whether a filename token is a subtitle variant flag such as `forced`
pub fn is_flag_token(token: &str) -> bool {
    FLAG_TOKENS.contains(&token.to_lowercase().as_str())
}

/// Resolve a 2- or 3-letter code to a language
pub fn resolve_language(code: &str) -> Option<Language> {
    let code = code.trim().to_lowercase();
    match code.len() {
        2 => Language::from_639_1(&code),
        3 => {
            let part2t = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(b, _)| *b == code)
                .map(|(_, t)| *t)
                .unwrap_or(code.as_str());
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Check that a code is a usable ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<()> {
    resolve_language(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    resolve_language(code)
        .map(|lang| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize to ISO 639-1 when the language has a 2-letter code, else ISO 639-2/T
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let lang = resolve_language(code)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;
    Ok(lang
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| lang.to_639_3().to_string()))
}

/// Check if two language codes represent the same language
///
/// `unknown` and invalid codes never match anything, themselves included.
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (resolve_language(code1), resolve_language(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// English name of the language behind a code
pub fn get_language_name(code: &str) -> Result<String> {
    resolve_language(code)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))
}

/// Interpret a single filename token as a language
///
/// Accepts ISO 639-1 codes, 3-letter codes of languages that also have an
/// ISO 639-1 code (so `aac` or `dts` never pass as languages) and English
/// language names. Returns the normalized ISO 639-1 code.
pub fn language_from_token(token: &str) -> Option<String> {
    let token = token.trim().to_lowercase();
    if token.is_empty() || is_flag_token(&token) {
        return None;
    }

    let lang = match token.len() {
        2 | 3 => resolve_language(&token),
        _ => {
            let mut chars = token.chars();
            let title_case = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => return None,
            };
            Language::from_name(&title_case)
        }
    }?;

    lang.to_639_1().map(str::to_string)
}
