// src/upload.rs
use actix_multipart::Multipart;
use futures_util::StreamExt;

use crate::error::AppError;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["xls", "xlsx", "png", "jpg", "jpeg"];

pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Lowercased extension after the last dot, if any.
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn allowed_file(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Keeps `[A-Za-z0-9._-]` and strips leading dots, so the result is a plain file name.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// Reads the file sent under `field_name`, draining every other field.
///
/// Returns `None` when the field is absent or carries no file name.
pub async fn read_file_field(
    payload: &mut Multipart,
    field_name: &str,
    max_bytes: usize,
) -> Result<Option<UploadedFile>, AppError> {
    let mut upload = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            tracing::warn!(error = %e, "malformed multipart body");
            AppError::InvalidFileFormat
        })?;

        let filename = field.content_disposition().and_then(|cd| {
            let is_target = cd.get_name() == Some(field_name);
            cd.get_filename()
                .filter(|_| is_target)
                .map(sanitize_filename)
        });

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                tracing::warn!(error = %e, "multipart stream failed");
                AppError::InvalidFileFormat
            })?;
            if filename.is_some() {
                if bytes.len() + chunk.len() > max_bytes {
                    return Err(AppError::UploadTooLarge(max_bytes));
                }
                bytes.extend_from_slice(&chunk);
            }
        }

        if let Some(filename) = filename.filter(|f| !f.is_empty()) {
            if upload.is_none() {
                upload = Some(UploadedFile { filename, bytes });
            }
        }
    }
    Ok(upload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert!(allowed_file("dates.XLSX"));
        assert!(allowed_file("dates.xls"));
        assert!(allowed_file("qr.JPeG"));
        assert!(!allowed_file("dates.csv"));
        assert!(!allowed_file("xlsx"));
        assert!(!allowed_file(".xlsx"));
        assert!(!allowed_file("dates."));
    }

    #[test]
    fn sanitizing_drops_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\ram\\my dates.xlsx"), "mydates.xlsx");
        assert_eq!(sanitize_filename("..hidden.xls"), "hidden.xls");
        assert_eq!(sanitize_filename("मिति.xlsx"), "xlsx");
    }
}
