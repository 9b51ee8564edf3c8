// src/auth.rs
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, HttpResponse, get, post, web};
use chrono::{Duration, Utc};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::AppState;
use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::models::{Claims, LoginForm, NewUser, RegisterForm, Role, User};
use crate::paywall::{self, GateDecision};
use crate::views;

pub const SESSION_COOKIE: &str = "session";

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register_form);
    cfg.service(register);
    cfg.service(login_form);
    cfg.service(login);
    cfg.service(logout);
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    Ok(web::block(move || bcrypt::hash(password, cost)).await??)
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    Ok(web::block(move || bcrypt::verify(password, &hash))
        .await?
        .unwrap_or(false))
}

pub fn issue_session(config: &Config, username: &str) -> Result<Cookie<'static>, AppError> {
    let expiration = Utc::now() + Duration::hours(config.session_ttl_hours);
    let claims = Claims {
        sub: username.to_string(),
        exp: expiration.timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )?;
    Ok(Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish())
}

pub fn decode_session(config: &Config, token: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret_key.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn clear_session() -> Cookie<'static> {
    let mut removal = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    removal.make_removal();
    removal
}

/// Usernames are 1 to 64 characters of `[A-Za-z0-9_.-]` and never start with a dot.
pub fn validate_registration(form: &RegisterForm) -> Result<(), AppError> {
    let username = form.username.as_str();
    if username.is_empty() || username.chars().count() > 64 {
        return Err(AppError::InvalidInput(
            "Username must be between 1 and 64 characters.".to_string(),
        ));
    }
    if username.starts_with('.')
        || !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(AppError::InvalidInput(
            "Username may only contain letters, digits, '_', '.' and '-'.".to_string(),
        ));
    }
    if form.password.is_empty() {
        return Err(AppError::InvalidInput("Password must not be empty.".to_string()));
    }
    Ok(())
}

/// The logged-in user, loaded fresh from the store on every request.
pub struct SessionUser(pub User);

impl FromRequest for SessionUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());
        Box::pin(async move {
            let Some(state) = state else {
                tracing::error!("application state is not registered");
                return Err(AppError::Unauthenticated);
            };
            let token = token.ok_or(AppError::Unauthenticated)?;
            let claims = decode_session(&state.config, &token).map_err(|e| {
                tracing::debug!(error = %e, "rejected session cookie");
                AppError::Unauthenticated
            })?;
            let user = db::get_user_by_username(&state.pool, &claims.sub)
                .await?
                .ok_or(AppError::Unauthenticated)?;
            Ok(SessionUser(user))
        })
    }
}

/// A session user holding the admin role.
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = SessionUser::from_request(req, payload);
        Box::pin(async move {
            let SessionUser(user) = session.await?;
            if !user.has_role(Role::Admin) {
                tracing::warn!(username = %user.username, "non-admin reached the admin console");
                return Err(AppError::Unauthorized);
            }
            Ok(AdminUser(user))
        })
    }
}

#[get("/register")]
pub async fn register_form(req: HttpRequest) -> HttpResponse {
    let notice = views::take_notice(&req);
    views::page(views::register_page(notice.as_deref()), notice.is_some())
}

#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    validate_registration(&form)?;

    let password_hash = hash_password(form.password, state.config.bcrypt_cost).await?;
    let user = db::create_user(
        &state.pool,
        &NewUser {
            username: form.username,
            password_hash,
            email: form.email,
            phone_number: form.phone,
            is_subscribed: false,
            role: Role::User,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok(views::redirect_with_notice(
        "/login",
        "Registration successful. Please log in.",
    ))
}

#[get("/login")]
pub async fn login_form(req: HttpRequest) -> HttpResponse {
    let notice = views::take_notice(&req);
    views::page(views::login_page(notice.as_deref()), notice.is_some())
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let LoginForm { username, password } = form.into_inner();

    let Some(user) = db::get_user_by_username(&state.pool, &username).await? else {
        tracing::warn!(username = %username, "login for unknown user");
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(password, user.password_hash.clone()).await? {
        tracing::warn!(username = %username, "wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let user = paywall::record_login(&state.pool, &user.username).await?;
    tracing::info!(username = %user.username, usage = user.usage_count, "login");

    if let GateDecision::Blocked { qr } = paywall::check_gate(&state, &user.username).await? {
        return Err(AppError::TrialExpired { qr });
    }

    let session = issue_session(&state.config, &user.username)?;
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .cookie(session)
        .finish())
}

#[get("/logout")]
pub async fn logout() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/login"))
        .cookie(clear_session())
        .cookie(views::notice_cookie("You have been logged out."))
        .finish()
}
