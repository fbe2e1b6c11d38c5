use axum::{Json, extract::State};
use serde::Deserialize;

use crate::error::AccountsError;
use crate::handlers::TokenResponse;
use crate::state::AppState;
use crate::usecase::login::GoogleLoginUseCase;

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    pub access_token: Option<String>,
}

// ── POST /api/users/google-login ─────────────────────────────────────────────

pub async fn google_login(
    State(state): State<AppState>,
    Json(body): Json<GoogleLoginRequest>,
) -> Result<Json<TokenResponse>, AccountsError> {
    let access_token = body.access_token.unwrap_or_default();
    if access_token.trim().is_empty() {
        return Err(AccountsError::MissingAccessToken);
    }
    let usecase = GoogleLoginUseCase {
        provider: state.google.clone(),
        linker: state.identity_linker(),
        tokens: state.tokens.clone(),
    };
    let out = usecase.execute(&access_token).await?;
    Ok(Json(out.into()))
}
