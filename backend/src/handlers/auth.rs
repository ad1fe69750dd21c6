use crate::{
    auth::{encode_jwt, hash_password, verify_password},
    config::Config,
    database::{repository::UserRepository, DbPool},
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use shared::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest, UserInfo};
use tracing::{debug, error, info, warn};

use super::{api_error, ApiError};

/// Register handler - creates a new user account
pub async fn register(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    info!("[REGISTER] 🔐 New user registration");
    debug!("   Username: {}", req.username);

    if req.username.len() < 3 {
        warn!("[REGISTER] ❌ Username too short");
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Username must be at least 3 characters",
        ));
    }

    if let Some(email) = &req.email {
        if !email.contains('@') {
            warn!("[REGISTER] ❌ Invalid email format");
            return Err(api_error(StatusCode::BAD_REQUEST, "Invalid email format"));
        }
    }

    match UserRepository::find_by_username(&pool, &req.username).await {
        Ok(Some(_)) => {
            warn!("[REGISTER] ❌ Username already taken: {}", req.username);
            return Err(api_error(StatusCode::CONFLICT, "Username already taken"));
        }
        Ok(None) => {}
        Err(e) => {
            error!("[REGISTER] ❌ Database error checking username: {}", e);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
            ));
        }
    }

    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("[REGISTER] ❌ Password hashing failed: {}", e);
            return Err(api_error(StatusCode::BAD_REQUEST, e));
        }
    };

    let user =
        match UserRepository::create(&pool, &req.username, req.email.as_deref(), &password_hash)
            .await
        {
            Ok(user) => user,
            Err(e) => {
                error!("[REGISTER] ❌ Failed to create user: {}", e);
                return Err(api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create user",
                ));
            }
        };

    let token = match encode_jwt(
        user.id,
        user.username.clone(),
        user.role.clone(),
        &config.jwt_secret,
        config.jwt_expiration_hours,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!("[REGISTER] ❌ JWT encoding failed: {}", e);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate token",
            ));
        }
    };

    info!("[REGISTER] ✅ User {} created (id {})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserInfo {
                id: user.id.to_string(),
                username: user.username,
                email: user.email,
                role: user.role,
                created_at: user.created_at.to_string(),
            },
            token,
            message: "Registration successful".to_string(),
        }),
    ))
}

/// Login handler - authenticates existing user
pub async fn login(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    info!("[LOGIN] 🔓 Login attempt");
    debug!("   Username: {}", req.username);

    let user = match UserRepository::find_by_username(&pool, &req.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("[LOGIN] ❌ User not found: {}", req.username);
            return Err(api_error(StatusCode::UNAUTHORIZED, "Invalid credentials"));
        }
        Err(e) => {
            error!("[LOGIN] ❌ Database error: {}", e);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
            ));
        }
    };

    if !user.is_active {
        warn!("[LOGIN] ❌ Inactive account: {}", req.username);
        return Err(api_error(StatusCode::FORBIDDEN, "Account is disabled"));
    }

    match verify_password(&req.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!("[LOGIN] ❌ Wrong password for {}", req.username);
            return Err(api_error(StatusCode::UNAUTHORIZED, "Invalid credentials"));
        }
        Err(e) => {
            error!("[LOGIN] ❌ Password verification error: {}", e);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error",
            ));
        }
    }

    let token = match encode_jwt(
        user.id,
        user.username.clone(),
        user.role.clone(),
        &config.jwt_secret,
        config.jwt_expiration_hours,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!("[LOGIN] ❌ JWT encoding failed: {}", e);
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate token",
            ));
        }
    };

    info!("[LOGIN] ✅ {} authenticated", user.username);

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            user: UserInfo {
                id: user.id.to_string(),
                username: user.username,
                email: user.email,
                role: user.role,
                created_at: user.created_at.to_string(),
            },
            token,
            message: "Login successful".to_string(),
        }),
    ))
}

/// Logout handler. Tokens are stateless, so this only confirms the action;
/// clients discard the token.
pub async fn logout() -> (StatusCode, Json<MessageResponse>) {
    info!("[LOGOUT] Session ended");
    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}
