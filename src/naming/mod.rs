//! Chunk Naming
//!
//! A chunk is identified by the pair `(chunk index, DFS path)`. The pair is
//! flattened into a single token, `"{index}/{path}"`, which serves both as the
//! archive key and as the identifier sent over the wire.
//!
//! The path may itself contain separators; only the *first* separator of a token
//! delimits the index, so decoding is unambiguous.

pub mod token;

pub use token::{ChunkToken, SEPARATOR, decode, encode, strip_leading_separator};
