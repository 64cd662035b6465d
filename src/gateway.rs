use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::Utc;
use serde_json::json;

use crate::auth::AuthClaims;
use crate::manage_transactions::TransactionBrowser;
use crate::moderation;
use crate::services::{AdminContext, AdminError, InMemoryService, PlatformService};

#[derive(Clone)]
pub struct AppState {
    pub platform: InMemoryService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/transaction", get(list_transactions))
        .route("/transaction/:id/accept", post(accept_transaction))
        .route("/transaction/:id/decline", post(decline_transaction))
        .route("/transaction/:id", delete(delete_transaction))
        .route("/stake", get(list_stake_tiers))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "service": "ok", "timestamp": Utc::now() })),
    )
}

/// Builds the moderation context for an authenticated gateway caller.
fn admin_ctx(claims: &AuthClaims) -> AdminContext {
    let mut ctx = AdminContext::default();
    ctx.user.id = claims.sub.clone();
    match &claims.permissions {
        Some(permissions) => {
            ctx.user.permissions.extend(permissions.iter().cloned());
        }
        // legacy tokens carry a role instead of explicit permissions
        None => {
            if claims.role.as_deref() == Some("admin") {
                ctx.user.permissions.extend([
                    "moderate_transactions".to_string(),
                    "manage_staking".to_string(),
                ]);
            }
        }
    }
    ctx
}

fn envelope(status: StatusCode, message: &str, data: serde_json::Value) -> Response {
    (
        status,
        Json(json!({
            "status": status.as_u16(),
            "message": message,
            "data": data,
        })),
    )
        .into_response()
}

fn error_response(err: AdminError) -> Response {
    let status = match err {
        AdminError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        AdminError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AdminError::NotFound(_) => StatusCode::NOT_FOUND,
        AdminError::Validation(_) | AdminError::Configuration(_) => StatusCode::BAD_REQUEST,
        AdminError::Network(_) | AdminError::Http { .. } => StatusCode::BAD_GATEWAY,
        AdminError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    envelope(status, &err.to_string(), serde_json::Value::Null)
}

async fn list_transactions(State(state): State<AppState>, claims: AuthClaims) -> Response {
    let mut ctx = admin_ctx(&claims);
    let mut browser = TransactionBrowser::new(state.platform.clone());
    if let Err(err) = browser.refresh(&mut ctx) {
        return error_response(err);
    }
    if let Err(err) = browser.publish(&mut ctx) {
        return error_response(err);
    }
    let rows = ctx
        .context
        .get("transaction_rows")
        .cloned()
        .unwrap_or_default();
    envelope(StatusCode::OK, "transactions", rows)
}

async fn accept_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    claims: AuthClaims,
) -> Response {
    let mut ctx = admin_ctx(&claims);
    match moderation::accept_transaction(&state.platform, &mut ctx, &id) {
        Ok(tx) => envelope(
            StatusCode::OK,
            "transaction accepted",
            json!({ "id": tx.id, "status": tx.status, "amount": tx.amount }),
        ),
        Err(err) => error_response(err),
    }
}

async fn decline_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    claims: AuthClaims,
) -> Response {
    let mut ctx = admin_ctx(&claims);
    match moderation::decline_transaction(&state.platform, &mut ctx, &id) {
        Ok(tx) => envelope(
            StatusCode::OK,
            "transaction declined",
            json!({ "id": tx.id, "status": tx.status }),
        ),
        Err(err) => error_response(err),
    }
}

async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    claims: AuthClaims,
) -> Response {
    let mut ctx = admin_ctx(&claims);
    // an explicit DELETE is the caller's confirmation
    ctx.request.set("confirm", true);
    match moderation::delete_transaction(&state.platform, &mut ctx, &id) {
        Ok(()) => envelope(StatusCode::OK, "transaction deleted", json!({ "id": id })),
        Err(err) => error_response(err),
    }
}

async fn list_stake_tiers(State(state): State<AppState>, _claims: AuthClaims) -> Response {
    match state.platform.list_stake_tiers() {
        Ok(tiers) => envelope(StatusCode::OK, "stake tiers", json!(tiers)),
        Err(err) => error_response(err),
    }
}
