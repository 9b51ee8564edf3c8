// src/admin.rs
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, get, post, route, web};

use crate::AppState;
use crate::auth::AdminUser;
use crate::db;
use crate::error::AppError;
use crate::qr;
use crate::upload;
use crate::views;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(console);
    cfg.service(subscribe);
    cfg.service(unsubscribe);
    cfg.service(delete);
    cfg.service(upload_qr);
}

#[route("/admin", method = "GET", method = "POST")]
pub async fn console(
    req: HttpRequest,
    state: web::Data<AppState>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let users = db::list_users(&state.pool).await?;
    let notice = views::take_notice(&req);
    Ok(views::page(
        views::admin_page(&users, notice.as_deref()),
        notice.is_some(),
    ))
}

async fn set_subscription(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
    subscribed: bool,
) -> Result<HttpResponse, AppError> {
    if !db::set_subscription(&state.pool, id, subscribed).await? {
        return Err(AppError::UserNotFound);
    }
    tracing::info!(admin = %admin.0.username, user_id = id, subscribed, "subscription changed");
    let notice = if subscribed {
        "User subscribed successfully."
    } else {
        "User unsubscribed successfully."
    };
    Ok(views::redirect_with_notice("/admin", notice))
}

#[get("/admin/subscribe/{id}")]
pub async fn subscribe(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    set_subscription(&state, &admin, path.into_inner(), true).await
}

#[get("/admin/unsubscribe/{id}")]
pub async fn unsubscribe(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    set_subscription(&state, &admin, path.into_inner(), false).await
}

#[get("/admin/delete/{id}")]
pub async fn delete(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let user = db::get_user_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    if !db::delete_user(&state.pool, id).await? {
        return Err(AppError::UserNotFound);
    }
    qr::forget(&state, &user.username).await;
    tracing::info!(admin = %admin.0.username, user_id = id, username = %user.username, "user deleted");
    Ok(views::redirect_with_notice("/admin", "User deleted successfully."))
}

#[post("/admin/upload_qr/{id}")]
pub async fn upload_qr(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<i64>,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let file = upload::read_file_field(&mut payload, "qr_file", state.config.max_upload_bytes)
        .await?
        .filter(|f| upload::allowed_file(&f.filename));
    let Some((file, ext)) = file.and_then(|f| upload::extension(&f.filename).map(|ext| (f, ext)))
    else {
        return Ok(views::redirect_with_notice("/admin", "Invalid file format."));
    };
    if db::get_user_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::UserNotFound);
    }

    let reference = format!("qr/user_{}_qr.{}", id, ext);
    let qr_dir = state.config.qr_dir();
    let target = state.config.static_dir.join(&reference);
    web::block(move || -> Result<(), AppError> {
        std::fs::create_dir_all(&qr_dir)?;
        std::fs::write(&target, &file.bytes)?;
        Ok(())
    })
    .await??;

    if !db::set_custom_qr(&state.pool, id, &reference).await? {
        return Err(AppError::UserNotFound);
    }
    tracing::info!(admin = %admin.0.username, user_id = id, qr = %reference, "custom qr uploaded");
    Ok(views::redirect_with_notice("/admin", "QR uploaded successfully."))
}
