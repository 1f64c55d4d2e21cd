//! Cache-first fix dispatch.
//!
//! The dispatcher turns a confirmed [`ErrorContext`] into a fix suggestion:
//! it fingerprints the matched line, serves repeats from the response cache,
//! and otherwise performs exactly one provider call. The provider itself is
//! built lazily on the first dispatch so credential resolution (which may
//! prompt the user) never runs for sessions that produce no errors.

use anyhow::Result;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::cache::ResponseCache;
use crate::config::{resolve_credentials, CredentialSpec};
use crate::detector::ErrorContext;
use crate::patterns::Language;
use crate::providers::{create_provider, FixRequest, Provider};

/// Outcome of one dispatch
#[derive(Debug, Clone)]
pub struct FixResult {
    /// Suggested fix text, when the dispatch succeeded
    pub fix: Option<String>,
    /// Whether the fix came from the cache rather than a provider call
    pub cached: bool,
    /// Human-readable reason when the dispatch failed
    pub failure: Option<String>,
}

impl FixResult {
    fn hit(fix: String) -> Self {
        Self {
            fix: Some(fix),
            cached: true,
            failure: None,
        }
    }

    fn fresh(fix: String) -> Self {
        Self {
            fix: Some(fix),
            cached: false,
            failure: None,
        }
    }

    fn failed(reason: String) -> Self {
        Self {
            fix: None,
            cached: false,
            failure: Some(reason),
        }
    }

    /// Whether this dispatch failed
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Compute the cache key for an error: a whitespace-insensitive,
/// case-preserving hash of the matched line plus its language tag.
pub fn fingerprint(language: Language, line: &str) -> u64 {
    let normalized = line.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut hasher = DefaultHasher::new();
    language.to_string().hash(&mut hasher);
    normalized.hash(&mut hasher);
    hasher.finish()
}

/// Where the dispatcher gets its provider from
pub enum ProviderSource {
    /// Already constructed (tests, or fully specified on the command line)
    Ready(Box<dyn Provider>),
    /// Resolve credentials and build on first use
    Lazy(CredentialSpec),
}

/// Cache-consulting dispatcher over one provider
pub struct Dispatcher {
    cache: ResponseCache,
    source: ProviderSource,
}

impl Dispatcher {
    pub fn new(cache: ResponseCache, source: ProviderSource) -> Self {
        Self { cache, source }
    }

    /// Dispatch one confirmed error context.
    ///
    /// Cache hits return immediately with no network call. Provider and
    /// credential failures are captured in the result; the cache is only
    /// populated on success and monitoring is never aborted from here.
    pub async fn dispatch(&mut self, context: &ErrorContext) -> FixResult {
        let fp = fingerprint(context.language, &context.line);

        if let Some(entry) = self.cache.get(fp) {
            return FixResult::hit(entry.fix.clone());
        }

        if let Err(reason) = self.ensure_provider().await {
            return FixResult::failed(reason);
        }

        let request = FixRequest {
            language: context.language,
            error_line: context.line.clone(),
            context_lines: context.preceding.clone(),
        };

        let outcome = match &self.source {
            ProviderSource::Ready(provider) => provider.request_fix(&request).await,
            ProviderSource::Lazy(_) => unreachable!("provider resolved above"),
        };

        match outcome {
            Ok(fix) => {
                self.cache.put(fp, fix.clone());
                // Persist as we go; a failed write surfaces at flush time
                self.cache.save().ok();
                FixResult::fresh(fix)
            }
            Err(err) => FixResult::failed(format!("{err:#}")),
        }
    }

    /// Write out the cache file, if this session uses one
    pub fn flush(&self) -> Result<()> {
        self.cache.save()
    }

    async fn ensure_provider(&mut self) -> std::result::Result<(), String> {
        if let ProviderSource::Lazy(spec) = &self.source {
            let spec = spec.clone();
            // Credential resolution may prompt on the terminal; keep the
            // blocking reads off the async runtime.
            let resolved = tokio::task::spawn_blocking(move || resolve_credentials(&spec))
                .await
                .map_err(|err| err.to_string())?;
            match resolved {
                Ok(credentials) => {
                    self.source = ProviderSource::Ready(create_provider(
                        credentials.provider,
                        credentials.api_key,
                    ));
                }
                Err(err) => return Err(err.to_string()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderType;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::SystemTime;

    struct MockProvider {
        calls: Arc<AtomicUsize>,
        last_error_line: Arc<std::sync::Mutex<String>>,
        fail: bool,
    }

    impl MockProvider {
        fn new(fail: bool) -> (Self, Arc<AtomicUsize>, Arc<std::sync::Mutex<String>>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let last = Arc::new(std::sync::Mutex::new(String::new()));
            (
                Self {
                    calls: Arc::clone(&calls),
                    last_error_line: Arc::clone(&last),
                    fail,
                },
                calls,
                last,
            )
        }
    }

    #[async_trait]
    impl Provider for MockProvider {
        fn provider_type(&self) -> ProviderType {
            ProviderType::OpenAI
        }

        fn name(&self) -> &'static str {
            "Mock"
        }

        fn model_name(&self) -> &str {
            "mock-1"
        }

        async fn request_fix(&self, request: &FixRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_error_line.lock().unwrap() = request.error_line.clone();
            if self.fail {
                bail!("request timed out");
            }
            Ok("convert num to a string first".to_string())
        }
    }

    fn context(line: &str) -> ErrorContext {
        ErrorContext {
            language: Language::JavaScript,
            label: "JavaScript TypeError",
            line: line.to_string(),
            preceding: vec!["processing input".to_string()],
            detected_at: SystemTime::now(),
        }
    }

    fn dispatcher(provider: MockProvider) -> Dispatcher {
        Dispatcher::new(
            ResponseCache::new(8),
            ProviderSource::Ready(Box::new(provider)),
        )
    }

    #[test]
    fn test_fingerprint_is_whitespace_insensitive() {
        let a = fingerprint(Language::Python, "KeyError:   'c'");
        let b = fingerprint(Language::Python, "KeyError: 'c'");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_preserves_case() {
        let a = fingerprint(Language::Python, "KeyError: 'c'");
        let b = fingerprint(Language::Python, "keyerror: 'c'");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_distinguishes_language() {
        let a = fingerprint(Language::Python, "TypeError: boom");
        let b = fingerprint(Language::JavaScript, "TypeError: boom");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_second_dispatch_served_from_cache() {
        let (provider, calls, _) = MockProvider::new(false);
        let mut dispatcher = dispatcher(provider);
        let ctx = context("TypeError: num.toLowerCase is not a function");

        let first = dispatcher.dispatch(&ctx).await;
        assert!(!first.cached);
        assert_eq!(first.fix.as_deref(), Some("convert num to a string first"));

        let second = dispatcher.dispatch(&ctx).await;
        assert!(second.cached);
        assert_eq!(second.fix, first.fix);

        // Exactly one provider call for the pair
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_whitespace_variant_hits_cache() {
        let (provider, calls, _) = MockProvider::new(false);
        let mut dispatcher = dispatcher(provider);

        dispatcher.dispatch(&context("TypeError:  boom")).await;
        let result = dispatcher.dispatch(&context("TypeError: boom")).await;

        assert!(result.cached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_captured_and_not_cached() {
        let (provider, calls, _) = MockProvider::new(true);
        let mut dispatcher = dispatcher(provider);
        let ctx = context("TypeError: boom");

        let result = dispatcher.dispatch(&ctx).await;
        assert!(result.is_failed());
        assert!(result.failure.as_ref().unwrap().contains("timed out"));
        assert!(result.fix.is_none());

        // The failure was not cached: a retry calls the provider again
        dispatcher.dispatch(&ctx).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dispatch_sends_matched_line_as_error_text() {
        let (provider, _, last_line) = MockProvider::new(false);
        let mut dispatcher = dispatcher(provider);
        let line = "TypeError: num.toLowerCase is not a function";

        dispatcher.dispatch(&context(line)).await;
        assert_eq!(*last_line.lock().unwrap(), line);
    }
}
