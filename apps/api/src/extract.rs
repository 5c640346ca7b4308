use axum::{
    async_trait,
    extract::{FromRequest, Request},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::errors::AppError;

const CONTEXT_RADIUS: usize = 50;
const MARKER: &str = " <-- ERROR HERE --> ";

/// JSON body extractor whose rejection pinpoints where parsing failed.
///
/// Unlike `axum::Json` it does not insist on a `Content-Type` header; the
/// frontend posts form data as JSON without always setting one.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        parse_body(&bytes).map(ValidatedJson)
    }
}

pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(bytes).map_err(|e| {
        let position = byte_offset(bytes, e.line(), e.column());
        AppError::MalformedBody {
            message: e.to_string(),
            position,
            context: context_around(bytes, position),
        }
    })
}

/// Converts serde_json's 1-based line / column into a byte offset.
fn byte_offset(bytes: &[u8], line: usize, column: usize) -> usize {
    let line_start: usize = bytes
        .split(|b| *b == b'\n')
        .take(line.saturating_sub(1))
        .map(|l| l.len() + 1)
        .sum();
    (line_start + column.saturating_sub(1)).min(bytes.len())
}

fn context_around(bytes: &[u8], position: usize) -> String {
    let start = position.saturating_sub(CONTEXT_RADIUS);
    let end = (position + CONTEXT_RADIUS).min(bytes.len());
    let before = String::from_utf8_lossy(&bytes[start..position]);
    let after = String::from_utf8_lossy(&bytes[position..end]);
    format!("{before}{MARKER}{after}")
}
