/*!
 * Tests for ISO language code utilities
 */

use captionlex::language_utils::{get_language_name, to_request_code};

#[test]
fn test_toRequestCode_withPart2Code_shouldReturnPart1() {
    assert_eq!(to_request_code("spa").unwrap(), "es");
    assert_eq!(to_request_code("fra").unwrap(), "fr");
    assert_eq!(to_request_code(" auto ").unwrap(), "auto");
}

#[test]
fn test_toRequestCode_withInvalidCode_shouldFail() {
    assert!(to_request_code("xx").is_err());
    assert!(to_request_code("").is_err());
}

#[test]
fn test_getLanguageName_withCommonCodes_shouldReturnEnglishName() {
    assert_eq!(get_language_name("de").unwrap(), "German");
    assert_eq!(get_language_name("jpn").unwrap(), "Japanese");
}

#[test]
fn test_toRequestCode_withBibliographicAndTerminologyCodes_shouldAgree() {
    assert_eq!(to_request_code("ger").unwrap(), to_request_code("deu").unwrap());
    assert_eq!(to_request_code("dut").unwrap(), "nl");
    assert_ne!(to_request_code("de").unwrap(), to_request_code("nl").unwrap());
}
