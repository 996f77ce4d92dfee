use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Game text uses tags like `zh-Hans` or `ja`. Validation works on the
/// primary subtag, while each provider gets the spelling its API expects.

/// Split off the primary language subtag (`zh-Hans` -> `zh`)
pub fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Normalize a language code to ISO 639-3 (3-letter) format
pub fn normalize_to_part3(code: &str) -> Result<String> {
    let primary = primary_subtag(code);

    if primary.len() == 2 {
        if let Some(lang) = Language::from_639_1(&primary) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if primary.len() == 3 && Language::from_639_3(&primary).is_some() {
        return Ok(primary);
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part3(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Check if two language codes name the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part3(code1), normalize_to_part3(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Baidu Fanyi uses its own short codes for a few languages
pub fn to_baidu_code(code: &str) -> String {
    match code {
        "zh-Hans" | "zh-CN" => "zh".to_string(),
        "zh-Hant" | "zh-TW" => "cht".to_string(),
        "ja" => "jp".to_string(),
        "ko" => "kor".to_string(),
        "fr" => "fra".to_string(),
        "es" => "spa".to_string(),
        other => other.to_string(),
    }
}

/// Tencent TMT takes plain ISO 639-1 codes, with `zh-TW` for traditional Chinese
pub fn to_tencent_code(code: &str) -> String {
    match code {
        "zh-Hans" | "zh-CN" => "zh".to_string(),
        "zh-Hant" => "zh-TW".to_string(),
        other => other.to_string(),
    }
}
