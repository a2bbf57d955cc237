//! The Word Oracle port and its resilient wrapper.

use std::future::Future;
use std::time::Duration;

use impostor_protocol::Difficulty;
use serde::{Deserialize, Serialize};

use crate::{OracleError, fallback_word};

/// Characters stripped from both ends of an oracle answer.
const QUOTES: &[char] = &['"', '\'', '`', '“', '”', '‘', '’', '«', '»'];

/// A source of secret words.
///
/// May be a static table, a generative text API, or anything else that
/// turns `(topic, difficulty)` into a word. Implementations are allowed
/// to fail; callers go through [`ResilientOracle`], which never does.
pub trait WordOracle: Send + Sync + 'static {
    fn fetch_word(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> impl Future<Output = Result<String, OracleError>> + Send;
}

/// Limits applied to every oracle answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// How long to wait for the oracle before falling back.
    pub timeout: Duration,

    /// Longest acceptable word, in characters.
    pub max_word_len: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(4),
            max_word_len: 50,
        }
    }
}

/// Wraps a [`WordOracle`] so that asking for a word always succeeds.
///
/// The inner oracle's answer is bounded by [`OracleConfig::timeout`],
/// trimmed of whitespace and quote characters, and rejected if empty or
/// longer than [`OracleConfig::max_word_len`]. Any failure is replaced by
/// [`fallback_word`] for the same topic and difficulty.
#[derive(Debug, Clone)]
pub struct ResilientOracle<O> {
    inner: O,
    config: OracleConfig,
}

impl<O: WordOracle> ResilientOracle<O> {
    pub fn new(inner: O) -> Self {
        Self::with_config(inner, OracleConfig::default())
    }

    pub fn with_config(inner: O, config: OracleConfig) -> Self {
        Self { inner, config }
    }

    /// Returns the secret word for a round. Never fails.
    pub async fn secret_word(&self, topic: &str, difficulty: Difficulty) -> String {
        match self.try_word(topic, difficulty).await {
            Ok(word) => word,
            Err(error) => {
                let word = fallback_word(topic, difficulty);
                tracing::warn!(%error, topic, %difficulty, word, "word oracle failed, using fallback");
                word.to_string()
            }
        }
    }

    async fn try_word(&self, topic: &str, difficulty: Difficulty) -> Result<String, OracleError> {
        let raw = tokio::time::timeout(self.config.timeout, self.inner.fetch_word(topic, difficulty))
            .await
            .map_err(|_| OracleError::Timeout(self.config.timeout))??;
        sanitize(&raw, self.config.max_word_len)
    }
}

/// Trims whitespace and surrounding quotes, then checks the length.
pub fn sanitize(raw: &str, max_len: usize) -> Result<String, OracleError> {
    let word = raw.trim().trim_matches(QUOTES).trim();
    if word.is_empty() {
        return Err(OracleError::Empty);
    }
    let len = word.chars().count();
    if len > max_len {
        return Err(OracleError::TooLong { len, max: max_len });
    }
    Ok(word.to_string())
}
