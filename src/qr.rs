// src/qr.rs
use actix_web::web;
use image::Luma;
use qrcode::QrCode;
use std::path::{Path, PathBuf};

use crate::AppState;
use crate::error::AppError;

/// Path of a user's generated QR, relative to the static directory.
pub fn default_reference(username: &str) -> String {
    format!("qr/{}_qr.png", username)
}

fn render_png(link: &str, target: &Path) -> Result<(), AppError> {
    let code = QrCode::new(link.as_bytes())?;
    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(10, 10)
        .build();
    image.save(target)?;
    Ok(())
}

/// Renders the subscription link for `username` into `{static_dir}/qr/{username}_qr.png`.
///
/// Overwrites any previous image for the same user.
pub async fn generate_default_qr(state: &AppState, username: &str) -> Result<String, AppError> {
    let reference = default_reference(username);
    let target: PathBuf = state.config.static_dir.join(&reference);

    if let Some(cached) = state.qr_cache.get(username).await {
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            tracing::debug!(username = %username, "qr cache hit");
            return Ok(cached);
        }
    }

    let link = state.config.subscribe_link(username);
    let qr_dir = state.config.qr_dir();
    web::block(move || -> Result<(), AppError> {
        std::fs::create_dir_all(&qr_dir)?;
        render_png(&link, &target)
    })
    .await??;

    state
        .qr_cache
        .insert(username.to_string(), reference.clone())
        .await;
    tracing::info!(username = %username, qr = %reference, "payment qr generated");
    Ok(reference)
}

pub async fn forget(state: &AppState, username: &str) {
    state.qr_cache.invalidate(username).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_png_is_readable() {
        let dir = std::env::temp_dir().join(format!("miti-qr-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("ram_qr.png");

        render_png("https://example.com/subscribe?user=ram", &target).unwrap();

        let img = image::open(&target).expect("png decodes");
        assert!(img.width() > 0);
        assert_eq!(img.width(), img.height());
    }

    #[test]
    fn reference_is_relative_to_static_dir() {
        assert_eq!(default_reference("ram"), "qr/ram_qr.png");
    }
}
