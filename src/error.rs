// src/error.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::converter::Direction;
use crate::views;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username already exists")]
    DuplicateUsername,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not logged in")]
    Unauthenticated,
    #[error("admin access only")]
    Unauthorized,
    #[error("invalid file format")]
    InvalidFileFormat,
    #[error("upload exceeds {0} bytes")]
    UploadTooLarge(usize),
    #[error("no {} date column found", .0.source_label())]
    NoDateColumnFound(Direction),
    #[error("trial expired")]
    TrialExpired { qr: String },
    #[error("user not found")]
    UserNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("qr code error: {0}")]
    Qr(#[from] qrcode::types::QrError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
    #[error("password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
    #[error("session token error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),
    #[error("blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

impl AppError {
    /// User-facing notice and redirect target, for errors recovered at the request boundary.
    fn notice(&self) -> Option<(&'static str, String)> {
        match self {
            AppError::InvalidCredentials => {
                Some(("/login", "Invalid username or password.".to_string()))
            }
            AppError::DuplicateUsername => {
                Some(("/register", "Username already exists.".to_string()))
            }
            AppError::InvalidInput(msg) => Some(("/register", msg.clone())),
            AppError::Unauthorized => Some(("/login", "Admin access only.".to_string())),
            AppError::InvalidFileFormat => Some((
                "/",
                "Invalid file format. Please upload an Excel file.".to_string(),
            )),
            AppError::UploadTooLarge(limit) => Some((
                "/",
                format!("File too large. The limit is {} bytes.", limit),
            )),
            AppError::NoDateColumnFound(direction) => Some((
                "/",
                format!(
                    "No valid {} date column found in file.",
                    direction.source_label()
                ),
            )),
            AppError::UserNotFound => Some(("/admin", "User not found.".to_string())),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::TrialExpired { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::Unauthenticated => StatusCode::SEE_OTHER,
            e if e.notice().is_some() => StatusCode::SEE_OTHER,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::TrialExpired { qr } => {
                tracing::info!(qr = %qr, "trial expired, showing payment prompt");
                HttpResponse::PaymentRequired()
                    .content_type("text/html; charset=utf-8")
                    .body(views::trial_expired_page(qr))
            }
            AppError::Unauthenticated => views::redirect("/login"),
            e => match e.notice() {
                Some((location, notice)) => {
                    tracing::warn!(error = %e, "request rejected");
                    views::redirect_with_notice(location, &notice)
                }
                None => {
                    tracing::error!(error = %e, "internal error");
                    HttpResponse::InternalServerError().body("Internal server error")
                }
            },
        }
    }
}
