//! Target language table: display names and content-script signatures

use regex::Regex;
use std::sync::LazyLock;

/// Code of the language source documents are written in.
pub const SOURCE_LANGUAGE: &str = "en";

struct Signature {
    code: &'static str,
    name: &'static str,
    /// Character class a translation into this language must contain.
    script: Option<&'static str>,
}

const SIGNATURES: &[Signature] = &[
    Signature { code: "ru", name: "Russian", script: Some(r"[\u{0400}-\u{04FF}]") },
    Signature { code: "ar", name: "Arabic", script: Some(r"[\u{0600}-\u{06FF}]") },
    Signature { code: "zh", name: "Chinese", script: Some(r"[\u{4E00}-\u{9FFF}]") },
    Signature {
        code: "ja",
        name: "Japanese",
        script: Some(r"[\u{3040}-\u{309F}\u{30A0}-\u{30FF}\u{4E00}-\u{9FFF}]"),
    },
    Signature {
        code: "ko",
        name: "Korean",
        script: Some(r"[\u{AC00}-\u{D7AF}\u{1100}-\u{11FF}]"),
    },
    Signature { code: "he", name: "Hebrew", script: Some(r"[\u{0590}-\u{05FF}]") },
    Signature { code: "th", name: "Thai", script: Some(r"[\u{0E00}-\u{0E7F}]") },
    Signature { code: "hi", name: "Hindi", script: Some(r"[\u{0900}-\u{097F}]") },
    Signature { code: "el", name: "Greek", script: Some(r"[\u{0370}-\u{03FF}]") },
    Signature { code: "en", name: "English", script: None },
    Signature { code: "es", name: "Spanish", script: None },
    Signature { code: "fr", name: "French", script: None },
    Signature { code: "de", name: "German", script: None },
    Signature { code: "it", name: "Italian", script: None },
    Signature { code: "pt", name: "Portuguese", script: None },
    Signature { code: "nl", name: "Dutch", script: None },
    Signature { code: "pl", name: "Polish", script: None },
    Signature { code: "sv", name: "Swedish", script: None },
    Signature { code: "tr", name: "Turkish", script: None },
    Signature { code: "id", name: "Indonesian", script: None },
    Signature { code: "vi", name: "Vietnamese", script: None },
];

static SCRIPT_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SIGNATURES
        .iter()
        .filter_map(|s| {
            s.script
                .map(|p| (s.code, Regex::new(p).expect("static script pattern")))
        })
        .collect()
});

/// A resolved target language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    code: String,
    name: String,
}

impl Language {
    /// Resolve a user supplied code (`ru`, `zh-CN`, `PT_br`) against the table.
    /// Unknown codes are accepted and validated without a script check.
    pub fn from_code(code: &str) -> Self {
        let code = normalize_code(code);
        let name = SIGNATURES
            .iter()
            .find(|s| s.code == code)
            .map(|s| s.name.to_string())
            .unwrap_or_else(|| code.clone());
        Self { code, name }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// English display name, used when prompting the model.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_source(&self) -> bool {
        self.code == SOURCE_LANGUAGE
    }

    /// Whether translations into this language must show its script.
    pub fn is_strict(&self) -> bool {
        self.script().is_some()
    }

    /// True when `text` contains the language's script, or when the
    /// language has no recognizable script to look for.
    pub fn matches_script(&self, text: &str) -> bool {
        match self.script() {
            Some(re) => re.is_match(text),
            None => true,
        }
    }

    fn script(&self) -> Option<&'static Regex> {
        SCRIPT_PATTERNS
            .iter()
            .find(|(code, _)| *code == self.code)
            .map(|(_, re)| re)
    }
}

/// `zh-CN` -> `zh`, `PT_br` -> `pt`
pub fn normalize_code(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_set() {
        for code in ["ru", "ar", "zh", "ja", "ko", "he", "th", "hi", "el"] {
            assert!(Language::from_code(code).is_strict(), "{code} should be strict");
        }
        for code in ["es", "fr", "de", "xx"] {
            assert!(!Language::from_code(code).is_strict(), "{code} should not be strict");
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("zh-CN"), "zh");
        assert_eq!(normalize_code("PT_br"), "pt");
        assert_eq!(normalize_code(" RU "), "ru");
        assert_eq!(Language::from_code("zh-TW").name(), "Chinese");
    }

    #[test]
    fn test_script_matching() {
        let ru = Language::from_code("ru");
        assert!(ru.matches_script("Привет"));
        assert!(!ru.matches_script("Hello world"));

        let ja = Language::from_code("ja");
        assert!(ja.matches_script("こんにちは"));
        assert!(ja.matches_script("カタカナ"));

        let el = Language::from_code("el");
        assert!(el.matches_script("Καλημέρα"));

        // no rule, nothing to check
        assert!(Language::from_code("es").matches_script("Hello"));
    }

    #[test]
    fn test_source_language() {
        assert!(Language::from_code("EN").is_source());
        assert!(Language::from_code("en-US").is_source());
        assert!(!Language::from_code("es").is_source());
    }

    #[test]
    fn test_unknown_code_keeps_code_as_name() {
        let lang = Language::from_code("sw");
        assert_eq!(lang.code(), "sw");
        assert_eq!(lang.name(), "sw");
    }
}
