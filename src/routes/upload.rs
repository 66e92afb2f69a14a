use axum::extract::Multipart;
use serde::de::DeserializeOwned;

use crate::{error::AppError, services::assets::NewFile};

pub const PAYLOAD_FIELD: &str = "payload";

/// Splits a `multipart/form-data` body into the JSON `payload` field and the
/// files sent under `file_field`. Other fields are ignored.
pub async fn read_upsert_form<T: DeserializeOwned>(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(T, Vec<NewFile>), AppError> {
    let mut payload: Option<T> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == PAYLOAD_FIELD {
            let raw = field.bytes().await?;
            let parsed = serde_json::from_slice(&raw)
                .map_err(|err| AppError::BadRequest(format!("Invalid payload: {err}")))?;
            payload = Some(parsed);
        } else if name == file_field {
            let original_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await?;
            if bytes.is_empty() {
                tracing::debug!(%original_name, "skipping empty upload");
                continue;
            }
            files.push(NewFile {
                original_name,
                bytes: bytes.to_vec(),
            });
        } else {
            tracing::debug!(field = %name, "ignoring unknown multipart field");
        }
    }

    let payload =
        payload.ok_or_else(|| AppError::BadRequest(format!("Missing `{PAYLOAD_FIELD}` field")))?;
    Ok((payload, files))
}
