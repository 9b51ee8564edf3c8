// src/handlers.rs
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use std::path::Path;

use crate::AppState;
use crate::auth::SessionUser;
use crate::converter::{self, Direction};
use crate::error::AppError;
use crate::models::Role;
use crate::paywall;
use crate::spreadsheet;
use crate::upload;
use crate::views;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index);
    cfg.service(convert_bs_to_ad);
    cfg.service(convert_ad_to_bs);
    cfg.service(qr_image);
}

#[get("/")]
pub async fn index(req: HttpRequest, session: SessionUser) -> HttpResponse {
    let SessionUser(user) = session;
    let notice = views::take_notice(&req);
    views::page(
        views::index_page(&user.username, user.has_role(Role::Admin), notice.as_deref()),
        notice.is_some(),
    )
}

#[post("/convert_bs_to_ad")]
pub async fn convert_bs_to_ad(
    state: web::Data<AppState>,
    session: SessionUser,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    convert_upload(&state, session, payload, Direction::BsToAd).await
}

#[post("/convert_ad_to_bs")]
pub async fn convert_ad_to_bs(
    state: web::Data<AppState>,
    session: SessionUser,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    convert_upload(&state, session, payload, Direction::AdToBs).await
}

async fn convert_upload(
    state: &AppState,
    session: SessionUser,
    mut payload: Multipart,
    direction: Direction,
) -> Result<HttpResponse, AppError> {
    let SessionUser(user) = session;
    paywall::check_gate(state, &user.username)
        .await?
        .into_result()?;

    let file = upload::read_file_field(&mut payload, "file", state.config.max_upload_bytes)
        .await?
        .filter(|f| upload::allowed_file(&f.filename))
        .ok_or(AppError::InvalidFileFormat)?;

    let upload_dir = state.config.upload_dir.clone();
    let stem = Path::new(&file.filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    let output_name = format!("{}{}.xlsx", direction.file_prefix(), stem);
    let output_path = upload_dir.join(&output_name);
    let calendar = state.calendar;
    let bytes = file.bytes;

    let converted = web::block(move || -> Result<Vec<u8>, AppError> {
        let dataset = spreadsheet::read_dataset(&bytes)?;
        let dataset = converter::convert_dataset(&calendar, dataset, direction)?;
        let output = spreadsheet::to_xlsx_bytes(&dataset)?;
        std::fs::create_dir_all(&upload_dir)?;
        std::fs::write(&output_path, &output)?;
        Ok(output)
    })
    .await??;

    tracing::info!(
        username = %user.username,
        direction = direction.source_label(),
        output = %output_name,
        "spreadsheet converted"
    );
    let content_type = mime_guess::from_path(&output_name)
        .first_or_octet_stream()
        .to_string();
    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(output_name)],
        })
        .body(converted))
}

#[get("/static/qr/{name}")]
pub async fn qr_image(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let name = path.into_inner();
    if upload::sanitize_filename(&name) != name || name.is_empty() {
        return Ok(HttpResponse::NotFound().finish());
    }
    let file = state.config.qr_dir().join(&name);
    match tokio::fs::read(&file).await {
        Ok(bytes) => Ok(HttpResponse::Ok()
            .content_type(mime_guess::from_path(&file).first_or_octet_stream().to_string())
            .body(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(HttpResponse::NotFound().finish())
        }
        Err(e) => Err(e.into()),
    }
}
