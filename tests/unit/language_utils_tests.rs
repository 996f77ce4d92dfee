/*!
 * Tests for language utility functions
 */

use gameloc::language_utils::{
    get_language_name, language_codes_match, normalize_to_part3, primary_subtag, to_baidu_code, to_tencent_code,
};

#[test]
fn test_normalize_to_part3_withTaggedCodes_shouldUsePrimarySubtag() {
    assert_eq!(normalize_to_part3("ja").unwrap(), "jpn");
    assert_eq!(normalize_to_part3("zh-Hans").unwrap(), "zho");
    assert_eq!(normalize_to_part3("ENG").unwrap(), "eng");
    assert!(normalize_to_part3("xx").is_err());
    assert!(normalize_to_part3("").is_err());
}

#[test]
fn test_get_language_name_withValidCodes_shouldReturnEnglishName() {
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert_eq!(get_language_name("zh-Hant").unwrap(), "Chinese");
    assert!(get_language_name("klingon").is_err());
}

#[test]
fn test_language_codes_match_withDifferentSpellings_shouldMatch() {
    assert!(language_codes_match("zh-Hans", "zho"));
    assert!(language_codes_match("ja", "jpn"));
    assert!(!language_codes_match("ja", "zh"));
    assert!(!language_codes_match("ja", "??"));
}

#[test]
fn test_primary_subtag_withSeparators_shouldLowercase() {
    assert_eq!(primary_subtag("zh_TW"), "zh");
    assert_eq!(primary_subtag("EN-us"), "en");
}

#[test]
fn test_provider_codes_shouldFollowEachApi() {
    assert_eq!(to_baidu_code("ja"), "jp");
    assert_eq!(to_baidu_code("zh-Hant"), "cht");
    assert_eq!(to_baidu_code("en"), "en");
    assert_eq!(to_tencent_code("zh-Hans"), "zh");
    assert_eq!(to_tencent_code("zh-Hant"), "zh-TW");
    assert_eq!(to_tencent_code("ja"), "ja");
}
