//! Object-created notification intake
//!
//! The storage provider posts `{"Records":[{"s3":{"bucket":{"name"},"object":{"key"}}}]}`.
//! Keys arrive form-encoded and are decoded before validation.

use crate::error::{HttpIngestError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Json};
use mediagate_core::IngestError;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
pub struct EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ObjectEntity {
    pub key: String,
}

/// Decode a notification key: `+` stands for a space, the rest is percent-encoded.
pub fn decode_key(raw: &str) -> Result<String, IngestError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| IngestError::Validation(format!("Object key is not valid UTF-8: {}", e)))
}

pub async fn receive_events(
    State(state): State<AppState>,
    ValidatedJson(envelope): ValidatedJson<EventEnvelope>,
) -> Result<Json<Value>, HttpIngestError> {
    if envelope.records.is_empty() {
        return Err(IngestError::Validation("Event contains no records".to_string()).into());
    }

    tracing::debug!(records = envelope.records.len(), "Received event notification");

    let mut first_payload = None;
    for (index, record) in envelope.records.iter().enumerate() {
        let object_key = decode_key(&record.s3.object.key)?;
        let outcome = state
            .dispatcher
            .handle(&object_key, &record.s3.bucket.name)
            .await?;

        if index == 0 {
            first_payload = outcome.payload();
        }
    }

    Ok(Json(first_payload.unwrap_or(Value::Null)))
}
