//! Network-backed transliteration completion.
//!
//! While the annotator types a word prefix, the host widget asks a
//! [`CompletionSession`] for ranked transliteration candidates. The session
//! allows at most one outstanding request: entering a new request aborts the
//! previous one, a fixed 1000 ms timer bounds how long the caller waits, and
//! a reply that arrives after the timer fired is absorbed silently into the
//! cached candidate list for the next query instead of resurrecting the
//! expired one.
//!
//! The network seam is the [`SuggestionProvider`] trait so the state machine
//! can be driven by a stub in tests; [`GoogleInputTools`] is the production
//! transport.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;

/// Boxed future returned by suggestion providers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// How long a request may stay unanswered before the caller is released
/// with a timeout advisory.
pub const REPLY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Transport for fetching the raw suggestion payload.
pub trait SuggestionProvider: Send + Sync {
    /// Fetch the suggestion payload for a word prefix and language code.
    ///
    /// Errors are advisory strings shown to the user, not failures of the
    /// session itself.
    fn fetch(&self, prefix: &str, lang_code: &str)
    -> BoxFuture<'static, Result<String, String>>;
}

/// Production provider backed by the Google Input Tools endpoint.
#[derive(Debug, Clone, Default)]
pub struct GoogleInputTools {
    client: reqwest::Client,
}

const SUGGEST_ENDPOINT: &str = "http://inputtools.google.com/request";

impl GoogleInputTools {
    /// Create a provider with a default HTTP client.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SuggestionProvider for GoogleInputTools {
    fn fetch(
        &self,
        prefix: &str,
        lang_code: &str,
    ) -> BoxFuture<'static, Result<String, String>> {
        let client = self.client.clone();
        let prefix = prefix.to_string();
        let itc = format!("{lang_code}-t-i0-und");
        Box::pin(async move {
            let response = client
                .get(SUGGEST_ENDPOINT)
                .query(&[
                    ("text", prefix.as_str()),
                    ("itc", itc.as_str()),
                    ("num", "10"),
                    ("cp", "0"),
                    ("cs", "1"),
                    ("ie", "utf-8"),
                    ("oe", "utf-8"),
                    ("app", "test"),
                ])
                .send()
                .await
                .map_err(|e| e.to_string())?;
            response.text().await.map_err(|e| e.to_string())
        })
    }
}

/// Outcome of one completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The service answered in time; the ranked candidate list (possibly
    /// empty for a short or malformed payload).
    Replied(Vec<String>),
    /// No reply within [`REPLY_TIMEOUT`]; the network is slow or
    /// unreachable. A late reply still refreshes the cached list.
    TimedOut,
    /// The transport reported an error; the cached list is unchanged.
    Failed(String),
    /// Nothing was requested (empty prefix) or the request was aborted.
    Cancelled,
}

#[derive(Debug, Default)]
struct Shared {
    candidates: Vec<String>,
    /// Generation of the most recently issued request. A completed fetch
    /// only stores its candidates while its generation is still current, so
    /// a stale reply can never clobber a newer one.
    latest_request: u64,
}

/// Suggestion session for one input widget.
///
/// Must be driven from within a tokio runtime.
#[derive(Debug)]
pub struct CompletionSession {
    provider: Arc<dyn SuggestionProvider>,
    shared: Arc<Mutex<Shared>>,
    inflight: Option<AbortHandle>,
}

impl std::fmt::Debug for dyn SuggestionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SuggestionProvider")
    }
}

impl CompletionSession {
    /// Create a session over an arbitrary provider.
    pub fn new(provider: Arc<dyn SuggestionProvider>) -> Self {
        Self {
            provider,
            shared: Arc::new(Mutex::new(Shared::default())),
            inflight: None,
        }
    }

    /// Create a session over the Google Input Tools transport.
    pub fn google() -> Self {
        Self::new(Arc::new(GoogleInputTools::new()))
    }

    /// The cached candidate list from the most recent absorbed reply.
    pub fn candidates(&self) -> Vec<String> {
        self.shared.lock().unwrap().candidates.clone()
    }

    /// Confirm a candidate chosen by the caller; returns it when it is
    /// present in the cached list. Insertion into the text is the view's
    /// business.
    pub fn accept(&self, candidate: &str) -> Option<String> {
        let shared = self.shared.lock().unwrap();
        shared
            .candidates
            .iter()
            .find(|c| c.as_str() == candidate)
            .cloned()
    }

    /// Abort any in-flight request. Idempotent; aborting a completed or
    /// already cancelled request is a no-op.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.inflight.take() {
            handle.abort();
        }
    }

    /// Request candidates for a non-empty word prefix.
    ///
    /// Any previously in-flight request is aborted first; at most one
    /// request is ever live. The call resolves after at most
    /// [`REPLY_TIMEOUT`].
    pub async fn request(&mut self, prefix: &str, lang_code: &str) -> Completion {
        if prefix.is_empty() {
            return Completion::Cancelled;
        }
        self.cancel();

        let generation = {
            let mut shared = self.shared.lock().unwrap();
            shared.latest_request += 1;
            shared.latest_request
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let fetch = self.provider.fetch(prefix, lang_code);
        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            match fetch.await {
                Ok(payload) => {
                    let candidates = parse_candidates(&payload);
                    {
                        let mut shared = shared.lock().unwrap();
                        if shared.latest_request == generation {
                            shared.candidates = candidates.clone();
                        }
                    }
                    let _ = reply_tx.send(Ok(candidates));
                }
                Err(advisory) => {
                    let _ = reply_tx.send(Err(advisory));
                }
            }
        });
        self.inflight = Some(task.abort_handle());

        match tokio::time::timeout(REPLY_TIMEOUT, reply_rx).await {
            Ok(Ok(Ok(candidates))) => {
                self.inflight = None;
                Completion::Replied(candidates)
            }
            Ok(Ok(Err(advisory))) => {
                self.inflight = None;
                log::warn!("suggestion request failed: {advisory}");
                Completion::Failed(advisory)
            }
            Ok(Err(_closed)) => {
                self.inflight = None;
                Completion::Cancelled
            }
            Err(_elapsed) => {
                // The fetch task keeps running; a late reply updates the
                // cached list for the next query via the generation guard.
                log::warn!("no suggestion reply within {REPLY_TIMEOUT:?}");
                Completion::TimedOut
            }
        }
    }
}

impl Drop for CompletionSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Extract the ranked candidate list from a suggestion payload.
///
/// The payload is a nested bracketed/quoted list; the candidates are the
/// quoted strings of the 4th top-level bracketed group. Fewer than 4 groups
/// means no candidates.
pub fn parse_candidates(payload: &str) -> Vec<String> {
    let groups: Vec<&str> = payload.split("[\"").collect();
    if groups.len() < 4 {
        return Vec::new();
    }

    let group = groups[3].split(']').next().unwrap_or_default();
    let mut tokens: Vec<String> = group.split("\",\"").map(str::to_string).collect();
    if let Some(last) = tokens.last_mut() {
        if last.ends_with('"') {
            last.pop();
        }
    }
    tokens.retain(|t| !t.is_empty());
    tokens
}
