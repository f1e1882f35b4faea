//! Line-level text handling for the CSV extracts.

/// Quote- and bracket-aware field splitting.
pub mod tokenizer;

pub use tokenizer::{DELIMITER, split_between, split_masked};
