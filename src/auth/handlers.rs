use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ErrorResponse, FieldErrors, LoginRequest, LoginResponse, PublicUser, SignUpRequest,
            SignUpResponse,
        },
        errors::AuthError,
        services::SignUpParams,
    },
    state::AppState,
};

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

pub(crate) fn api_error(status: StatusCode, message: &str, details: Option<FieldErrors>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: message.to_string(),
            details,
        }),
    )
}

/// Any body that does not decode into `T` gets the same 400, without serde's
/// message leaking to the client.
fn decode_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "failed to decode request body");
        api_error(StatusCode::BAD_REQUEST, "Invalid request body", None)
    })
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignUpResponse>), ApiError> {
    let payload = decode_body(payload)?;
    if let Err(details) = payload.validate() {
        warn!(email = %payload.email, ?details, "signup validation failed");
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            Some(details),
        ));
    }

    let params = SignUpParams {
        first_name: payload.first_name,
        last_name: payload.last_name,
        date_of_birth: payload.date_of_birth,
        email: payload.email,
        password: payload.password,
        phone_number: payload.phone_number,
    };

    let user = state.auth.sign_up(params).await.map_err(|e| match e {
        AuthError::UserAlreadyExists => api_error(
            StatusCode::CONFLICT,
            "User with this email already exists",
            None,
        ),
        other => {
            error!(error = %other, "signup failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create user",
                None,
            )
        }
    })?;

    info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(SignUpResponse::from(user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let payload = decode_body(payload)?;
    if let Err(details) = payload.validate() {
        warn!(email = %payload.email, ?details, "login validation failed");
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            Some(details),
        ));
    }

    // Unknown email and wrong password get the same answer.
    let session = state
        .auth
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            if e.is_invalid_credentials() {
                warn!(email = %payload.email, "login failed: invalid credentials");
                api_error(StatusCode::UNAUTHORIZED, "Invalid email or password", None)
            } else {
                error!(error = %e, "login failed");
                api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to authenticate user",
                    None,
                )
            }
        })?;

    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: PublicUser {
            id: session.user_id,
            email: payload.email,
        },
    }))
}
