//! Error signature catalog for multiple target languages.
//!
//! This module provides the static table of error patterns used to classify
//! a line of child-process output, with:
//! - Per-language signatures (Python, JavaScript, Java, npm)
//! - Generic shell fallbacks evaluated after the language-specific entries
//! - First-match classification in a fixed priority order

use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Languages a signature can be attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Java,
    Shell,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::JavaScript => write!(f, "javascript"),
            Language::Java => write!(f, "java"),
            Language::Shell => write!(f, "shell"),
        }
    }
}

/// A single error signature: language tag, compiled matcher, human label
pub struct ErrorSignature {
    pub language: Language,
    pub label: &'static str,
    pattern: Regex,
}

impl ErrorSignature {
    fn new(language: Language, label: &'static str, pattern: &str) -> Self {
        Self {
            language,
            label,
            // Patterns are compile-time constants, validated by tests
            pattern: Regex::new(pattern).expect("invalid builtin signature pattern"),
        }
    }

    /// Check whether this signature matches a line of output
    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

impl fmt::Debug for ErrorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorSignature")
            .field("language", &self.language)
            .field("label", &self.label)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Ordered catalog of error signatures.
///
/// Classification is first-match wins: language-specific signatures are
/// registered before the generic fallbacks, so a line like
/// `TypeError: x is not a function` is attributed to JavaScript rather than
/// swallowed by the generic `SomethingError:` entry.
pub struct SignatureCatalog {
    signatures: Vec<ErrorSignature>,
}

impl SignatureCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            signatures: Vec::new(),
        }
    }

    /// Create a catalog with all built-in signatures in priority order
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();

        // Python
        catalog.register(ErrorSignature::new(
            Language::Python,
            "Python traceback",
            r"Traceback \(most recent call last\)",
        ));
        catalog.register(ErrorSignature::new(
            Language::Python,
            "Python exception",
            r"^\s*(ZeroDivisionError|IndexError|KeyError|NameError|ValueError|AttributeError|ImportError|ModuleNotFoundError|RuntimeError|StopIteration|OSError|FileNotFoundError):",
        ));

        // JavaScript / Node
        catalog.register(ErrorSignature::new(
            Language::JavaScript,
            "JavaScript TypeError",
            r"TypeError:",
        ));
        catalog.register(ErrorSignature::new(
            Language::JavaScript,
            "JavaScript SyntaxError",
            r"SyntaxError:",
        ));
        catalog.register(ErrorSignature::new(
            Language::JavaScript,
            "JavaScript ReferenceError",
            r"ReferenceError:",
        ));
        catalog.register(ErrorSignature::new(
            Language::JavaScript,
            "JavaScript RangeError",
            r"RangeError:",
        ));
        catalog.register(ErrorSignature::new(
            Language::JavaScript,
            "npm error",
            r"npm ERR!",
        ));

        // Java
        catalog.register(ErrorSignature::new(
            Language::Java,
            "Java exception",
            r"Exception in thread",
        ));
        catalog.register(ErrorSignature::new(
            Language::Java,
            "Java exception cause",
            r"^\s*Caused by:",
        ));

        // Generic fallbacks, evaluated last
        catalog.register(ErrorSignature::new(
            Language::Shell,
            "error",
            r"[A-Za-z]+Error:",
        ));
        catalog.register(ErrorSignature::new(
            Language::Shell,
            "error",
            r"(?i)^(error|fatal|panic)\b",
        ));
        catalog.register(ErrorSignature::new(
            Language::Shell,
            "command failure",
            r"(command not found|No such file or directory|[Pp]ermission denied|[Ss]egmentation fault)",
        ));

        catalog
    }

    /// Register a signature at the end of the priority order
    pub fn register(&mut self, signature: ErrorSignature) {
        self.signatures.push(signature);
    }

    /// Classify a line: first matching signature wins, None for clean lines
    pub fn classify(&self, line: &str) -> Option<&ErrorSignature> {
        self.signatures.iter().find(|sig| sig.matches(line))
    }

    /// Number of registered signatures
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl Default for SignatureCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_compile() {
        let catalog = SignatureCatalog::with_builtins();
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_classify_python_traceback() {
        let catalog = SignatureCatalog::with_builtins();
        let sig = catalog
            .classify("Traceback (most recent call last):")
            .unwrap();
        assert_eq!(sig.language, Language::Python);
        assert_eq!(sig.label, "Python traceback");
    }

    #[test]
    fn test_classify_python_exception() {
        let catalog = SignatureCatalog::with_builtins();
        let sig = catalog.classify("KeyError: 'missing_key'").unwrap();
        assert_eq!(sig.language, Language::Python);
    }

    #[test]
    fn test_classify_javascript_type_error() {
        let catalog = SignatureCatalog::with_builtins();
        let sig = catalog
            .classify("TypeError: num.toLowerCase is not a function")
            .unwrap();
        assert_eq!(sig.language, Language::JavaScript);
        assert_eq!(sig.label, "JavaScript TypeError");
    }

    #[test]
    fn test_classify_java_exception() {
        let catalog = SignatureCatalog::with_builtins();
        let sig = catalog
            .classify("Exception in thread \"main\" java.lang.NullPointerException")
            .unwrap();
        assert_eq!(sig.language, Language::Java);
    }

    #[test]
    fn test_classify_npm_error() {
        let catalog = SignatureCatalog::with_builtins();
        let sig = catalog.classify("npm ERR! code ELIFECYCLE").unwrap();
        assert_eq!(sig.label, "npm error");
    }

    #[test]
    fn test_classify_generic_error_prefix() {
        let catalog = SignatureCatalog::with_builtins();
        let sig = catalog.classify("error: linker `cc` not found").unwrap();
        assert_eq!(sig.language, Language::Shell);
    }

    #[test]
    fn test_classify_command_not_found() {
        let catalog = SignatureCatalog::with_builtins();
        let sig = catalog.classify("sh: foo: command not found").unwrap();
        assert_eq!(sig.label, "command failure");
    }

    #[test]
    fn test_language_specific_wins_over_generic() {
        // TypeError: would also match the generic `[A-Za-z]+Error:` fallback,
        // but the JavaScript signature is registered first.
        let catalog = SignatureCatalog::with_builtins();
        let sig = catalog.classify("TypeError: boom").unwrap();
        assert_eq!(sig.language, Language::JavaScript);
    }

    #[test]
    fn test_clean_lines_do_not_match() {
        let catalog = SignatureCatalog::with_builtins();
        assert!(catalog.classify("Compiling watchit v0.1.0").is_none());
        assert!(catalog.classify("all tests passed").is_none());
        assert!(catalog.classify("").is_none());
    }

    #[test]
    fn test_language_display() {
        assert_eq!(format!("{}", Language::Python), "python");
        assert_eq!(format!("{}", Language::JavaScript), "javascript");
        assert_eq!(format!("{}", Language::Java), "java");
        assert_eq!(format!("{}", Language::Shell), "shell");
    }
}
