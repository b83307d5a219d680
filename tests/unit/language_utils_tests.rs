/*!
 * Tests for language utility functions
 */

use chapterguard::language_utils::{
    ScriptFamily, get_language_name, language_codes_match, normalize_to_part2t, script_family,
    validate_language_code,
};

/// Test validation of language codes
#[test]
fn test_validateLanguageCode_withVariousCodes_shouldAcceptKnownOnes() {
    assert!(validate_language_code("en").is_ok());
    assert!(validate_language_code("fra").is_ok());
    assert!(validate_language_code("ger").is_ok());
    assert!(validate_language_code(" JA ").is_ok());

    assert!(validate_language_code("").is_err());
    assert!(validate_language_code("e").is_err());
    assert!(validate_language_code("123").is_err());
    assert!(validate_language_code("english").is_err());
}

/// Test normalization of language codes to ISO 639-2/T format
#[test]
fn test_normalizeToPart2t_withValidCodes_shouldNormalizeCorrectly() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("ja").unwrap(), "jpn");
    assert_eq!(normalize_to_part2t("zho").unwrap(), "zho");
    assert_eq!(normalize_to_part2t("chi").unwrap(), "zho");
    assert_eq!(normalize_to_part2t("FRE").unwrap(), "fra");
    assert_eq!(normalize_to_part2t(" de ").unwrap(), "deu");
}

/// Test matching of different language code formats
#[test]
fn test_languageCodesMatch_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("fre", "fr"));
    assert!(language_codes_match("chi", "zh"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("en", "not-a-code"));
}

#[test]
fn test_getLanguageName_shouldResolveAllFormats() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("deu").unwrap(), "German");
    assert_eq!(get_language_name("ger").unwrap(), "German");
    assert!(get_language_name("zz").is_err());
}

#[test]
fn test_scriptFamily_shouldSelectSentenceRules() {
    assert_eq!(script_family("ja"), ScriptFamily::Cjk);
    assert_eq!(script_family("zh"), ScriptFamily::Cjk);
    assert_eq!(script_family("ko"), ScriptFamily::Cjk);
    assert_eq!(script_family("fr"), ScriptFamily::Latin);
    assert_eq!(script_family("unknown"), ScriptFamily::Latin);

    assert!(ScriptFamily::Latin.requires_space_after_terminator());
    assert!(!ScriptFamily::Cjk.requires_space_after_terminator());
    assert!(ScriptFamily::Cjk.is_terminator('。'));
}
