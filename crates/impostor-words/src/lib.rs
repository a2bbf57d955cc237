//! Secret words for Impostor Protocol.
//!
//! - [`WordOracle`]: the port, `(topic, difficulty) → word`, may fail
//! - [`WordTable`]: the built-in five-topic table
//! - [`ResilientOracle`]: timeout, sanitizing, and fallback around any
//!   oracle, so a round start is never blocked on a word
//! - [`fallback_word`]: the deterministic substitute for a failed lookup

mod error;
mod oracle;
mod table;

pub use error::OracleError;
pub use oracle::{OracleConfig, ResilientOracle, WordOracle, sanitize};
pub use table::{DEFAULT_TOPIC, TOPICS, WordTable, fallback_word, topic_names, words_for};
