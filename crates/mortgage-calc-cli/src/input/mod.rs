pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Resolve a typed input from `--input <file>` or piped stdin, in that order.
/// Returns `None` when neither is present so the caller can fall back to flags.
pub fn read_input<T: DeserializeOwned>(path: Option<&str>) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Some(file::read_document(path)?)),
        None => stdin::read_stdin(),
    }
}
