/*!
 * Tests for ISO language code utilities
 */

use subsync::language_utils::{
    get_language_name, language_codes_match, normalize_to_part1_or_part2t, normalize_to_part2t, validate_language_code,
};

#[test]
fn test_validateLanguageCode_withVariousCodes_shouldValidateCorrectly() {
    assert!(validate_language_code("en").is_ok());
    assert!(validate_language_code("eng").is_ok());
    assert!(validate_language_code("DUT").is_ok());
    assert!(validate_language_code("xx").is_err());
    assert!(validate_language_code("english").is_err());
    assert!(validate_language_code("").is_err());
}

#[test]
fn test_normalizeToPart2t_withBibliographicCode_shouldUseTerminologyCode() {
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("nl").unwrap(), "nld");
}

#[test]
fn test_normalizeToPart1OrPart2t_withoutTwoLetterCode_shouldKeepThreeLetters() {
    assert_eq!(normalize_to_part1_or_part2t("nld").unwrap(), "nl");
    // Hawaiian has no ISO 639-1 code
    assert_eq!(normalize_to_part1_or_part2t("haw").unwrap(), "haw");
}

#[test]
fn test_languageCodesMatch_acrossCodeForms_shouldBeSymmetric() {
    let pairs = [("en", "eng"), ("nl", "dut"), ("de", "ger"), ("pt", "por")];
    for (a, b) in pairs {
        assert!(language_codes_match(a, b), "{} vs {}", a, b);
        assert!(language_codes_match(b, a), "{} vs {}", b, a);
    }
    assert!(!language_codes_match("en", "nl"));
}

#[test]
fn test_getLanguageName_withValidAndInvalidCode() {
    assert_eq!(get_language_name("fr").unwrap(), "French");
    assert!(get_language_name("zz").is_err());
}
