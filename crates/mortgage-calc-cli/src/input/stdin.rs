use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Deserialise a piped JSON or YAML document from stdin.
/// Returns None when stdin is interactive or carries nothing.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_document(&buffer)
}

fn parse_document<T: DeserializeOwned>(raw: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(Some(value)),
        // JSON documents start with a brace; anything else is tried as YAML
        Err(e) if trimmed.starts_with('{') => Err(format!("Failed to parse stdin as JSON: {e}").into()),
        Err(_) => serde_yaml::from_str(trimmed)
            .map(Some)
            .map_err(|e| format!("Failed to parse stdin as YAML: {e}").into()),
    }
}
