use axum::{
    Router,
    extract::State,
    response::Response,
    routing::{get, post},
};
use tower::ServiceBuilder;

use endoville_core::health::{healthz, readiness};
use endoville_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    account::{activate, login, register, request_otp, send_otp, signup, verify_otp},
    google::google_login,
};
use crate::state::AppState;

async fn readyz(State(state): State<AppState>) -> Response {
    readiness("database", state.db.ping().await)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        // Account lifecycle
        .route("/register", post(register))
        .route("/signup", post(signup))
        .route("/activate", post(activate))
        .route("/send-otp", post(send_otp))
        // Login
        .route("/login", post(login))
        .route("/google-login", post(google_login))
        // Standalone OTP
        .route("/request-otp", post(request_otp))
        .route("/verify-otp", post(verify_otp))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/users", user_routes())
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
