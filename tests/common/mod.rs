use std::{fs, path::PathBuf};

use burn_corpora::tokenizer::{self, Tokenizer};

/// A small word-level tokenizer that needs no network access
pub fn tokenizer() -> Tokenizer {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tokenizer.json");
    let inner = tokenizers::Tokenizer::from_file(path).unwrap();

    Tokenizer::new(inner, &tokenizer::Config::new())
}

/// Write `contents` to `name` inside `dir`
pub fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}
