//! Multipart upload receiver.
//!
//! Streams the single `file` part to `<upload_dir>/<unix_millis>-<name>` and
//! collects the optional `user_id` text field. Field order does not matter.

use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::errors::ApiError;

/// Name used when the client sends an empty or path-only file name.
const FALLBACK_NAME: &str = "upload";

/// A file written to local disk plus the form fields sent with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedUpload {
    /// `user_id` form field, unvalidated.
    pub user_id: Option<String>,
    /// File name as sent by the client.
    pub original_name: String,
    /// `<unix_millis>-<basename>`.
    pub filename: String,
    /// Full path of the stored file.
    pub path: PathBuf,
    /// Bytes written.
    pub size: u64,
}

/// Build the stored file name from a timestamp and the client's file name.
///
/// Only the final path component of `original` is kept, so a name such as
/// `../../etc/passwd` cannot escape the upload directory.
pub fn stored_filename(millis: i64, original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(FALLBACK_NAME);
    format!("{millis}-{base}")
}

fn multipart_error(err: &MultipartError) -> ApiError {
    ApiError::Multipart(err.body_text())
}

async fn write_field(field: &mut Field<'_>, path: &Path) -> Result<u64, ApiError> {
    let mut file = fs::File::create(path).await?;
    let mut size = 0_u64;
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(&e))? {
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(size)
}

/// Consume the multipart body, writing the `file` part into `upload_dir`.
///
/// `millis` becomes the file name prefix. Fails with
/// [`ApiError::MissingFile`] when no `file` part carries a file name and with
/// [`ApiError::ExtraFile`] when more than one does; in the latter case the
/// first file is removed again.
pub async fn receive(
    mut multipart: Multipart,
    upload_dir: &Path,
    millis: i64,
) -> Result<ReceivedUpload, ApiError> {
    fs::create_dir_all(upload_dir).await?;

    let mut user_id = None;
    let mut stored: Option<ReceivedUpload> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let Some(original_name) = field.file_name().map(str::to_string) else {
                    debug!("ignoring file field without a file name");
                    continue;
                };
                if let Some(first) = stored.take() {
                    if let Err(e) = fs::remove_file(&first.path).await {
                        warn!(
                            path = %first.path.display(),
                            error = %e,
                            "failed to remove rejected upload"
                        );
                    }
                    return Err(ApiError::ExtraFile);
                }

                let filename = stored_filename(millis, &original_name);
                let path = upload_dir.join(&filename);
                let size = write_field(&mut field, &path).await?;
                debug!(%filename, size, "upload written");
                stored = Some(ReceivedUpload {
                    user_id: None,
                    original_name,
                    filename,
                    path,
                    size,
                });
            }
            Some("user_id") => {
                user_id = Some(field.text().await.map_err(|e| multipart_error(&e))?);
            }
            _ => {}
        }
    }

    let mut upload = stored.ok_or(ApiError::MissingFile)?;
    upload.user_id = user_id;
    Ok(upload)
}
