//! Composite identifiers such as `team-id/username` and import ids like
//! `org/workspace/var-id`

use thiserror::Error;

pub const SEPARATOR: char = '/';

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("invalid ID {id:?}: expected {expected}")]
    Malformed { id: String, expected: String },
}

/// Joins two identifier parts; neither part may contain the separator
pub fn pack_id(first: &str, second: &str) -> String {
    format!("{}{}{}", first, SEPARATOR, second)
}

pub fn unpack_id(id: &str) -> Result<(String, String), IdError> {
    match split_import_id(id, 2)?.as_slice() {
        [first, second] => Ok((first.clone(), second.clone())),
        _ => Err(malformed(id, 2)),
    }
}

/// Splits `id` into exactly `parts` non-empty segments
pub fn split_import_id(id: &str, parts: usize) -> Result<Vec<String>, IdError> {
    let segments: Vec<&str> = id.split(SEPARATOR).collect();
    if segments.len() != parts || segments.iter().any(|s| s.is_empty()) {
        return Err(malformed(id, parts));
    }
    Ok(segments.into_iter().map(str::to_string).collect())
}

fn malformed(id: &str, parts: usize) -> IdError {
    let placeholder = (1..=parts)
        .map(|i| format!("<part{}>", i))
        .collect::<Vec<_>>()
        .join("/");
    IdError::Malformed {
        id: id.to_string(),
        expected: format!("{} non-empty parts ({})", parts, placeholder),
    }
}
