// src/paywall.rs
use sqlx::SqlitePool;

use crate::AppState;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::qr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    Blocked { qr: String },
}

impl GateDecision {
    /// Turns a block into `AppError::TrialExpired`, so callers can bail with `?`.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            GateDecision::Allowed => Ok(()),
            GateDecision::Blocked { qr } => Err(AppError::TrialExpired { qr }),
        }
    }
}

pub fn trial_exhausted(user: &User, trial_limit: i64) -> bool {
    !user.is_subscribed && user.usage_count >= trial_limit
}

/// Payment QR to show a blocked user: the admin-uploaded one when its file is
/// still on disk, otherwise a freshly generated default.
pub async fn qr_reference(state: &AppState, user: &User) -> Result<String, AppError> {
    if let Some(custom) = &user.custom_qr {
        let path = state.config.static_dir.join(custom);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(custom.clone());
        }
        tracing::warn!(username = %user.username, qr = %custom, "custom qr missing on disk");
    }
    qr::generate_default_qr(state, &user.username).await
}

pub async fn check_gate(state: &AppState, username: &str) -> Result<GateDecision, AppError> {
    let user = db::get_user_by_username(&state.pool, username)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    if !trial_exhausted(&user, state.config.trial_limit) {
        return Ok(GateDecision::Allowed);
    }
    tracing::warn!(
        username = %user.username,
        usage = user.usage_count,
        limit = state.config.trial_limit,
        "trial exhausted"
    );
    let qr = qr_reference(state, &user).await?;
    Ok(GateDecision::Blocked { qr })
}

/// Counts one login against the trial. Subscribed users are left as they are.
pub async fn record_login(pool: &SqlitePool, username: &str) -> Result<User, AppError> {
    db::increment_usage(pool, username)
        .await?
        .ok_or(AppError::Unauthenticated)
}
