//! Language display name → provider locale.

/// Locale used when the configured language is unknown.
pub const DEFAULT_LOCALE: &str = "en-US";

const LOCALES: &[(&str, &str)] = &[
    ("English", "en-US"),
    ("Spanish", "es-ES"),
    ("French", "fr-FR"),
    ("German", "de-DE"),
    ("Italian", "it-IT"),
    ("Portuguese", "pt-PT"),
    ("Brazilian Portuguese", "pt-BR"),
    ("Russian", "ru-RU"),
    ("Japanese", "ja-JP"),
    ("Korean", "ko-KR"),
    ("Chinese (Simplified)", "zh-CN"),
    ("Chinese (Traditional)", "zh-TW"),
    ("Arabic", "ar-SA"),
    ("Dutch", "nl-NL"),
    ("Hindi", "hi-IN"),
    ("Swedish", "sv-SE"),
    ("Norwegian", "no-NO"),
    ("Danish", "da-DK"),
    ("Finnish", "fi-FI"),
    ("Polish", "pl-PL"),
    ("Turkish", "tr-TR"),
    ("Czech", "cs-CZ"),
    ("Hungarian", "hu-HU"),
    ("Thai", "th-TH"),
    ("Greek", "el-GR"),
    ("Hebrew", "he-IL"),
    ("Indonesian", "id-ID"),
    ("Vietnamese", "vi-VN"),
    ("Romanian", "ro-RO"),
    ("Malay", "ms-MY"),
];

/// Resolves a language name (`"japanese"`) or locale (`"ja-JP"`) to a locale.
///
/// Names match case-insensitively; values already shaped like `xx-YY` pass
/// through; anything else falls back to [`DEFAULT_LOCALE`].
#[must_use]
pub fn locale_for(language: &str) -> &str {
    let wanted = language.trim();
    if let Some((_, iso)) = LOCALES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
    {
        return *iso;
    }
    if looks_like_locale(wanted) {
        return wanted;
    }
    DEFAULT_LOCALE
}

fn looks_like_locale(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 5
        && b[0].is_ascii_lowercase()
        && b[1].is_ascii_lowercase()
        && b[2] == b'-'
        && b[3].is_ascii_uppercase()
        && b[4].is_ascii_uppercase()
}
