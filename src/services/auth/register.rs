use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::auth::RegisterRequest;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::users::validate_new_user;
use crate::services::{storage_error, try_response};
use crate::utils::password::hash_password;

use super::AuthService;

pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    // 自助注册的账号一律为学生
    let mut create_request = CreateUserRequest {
        name: register_request.name.trim().to_string(),
        email: register_request.email.trim().to_lowercase(),
        password: register_request.password,
        role: UserRole::Student,
    };

    try_response!(validate_new_user(&storage, &create_request).await);

    create_request.password = match hash_password(&create_request.password) {
        Ok(hash) => hash,
        Err(e) => {
            return Ok(storage_error(
                "Registration failed",
                ErrorCode::RegisterFailed,
                e,
            ));
        }
    };

    match storage.create_user(create_request).await {
        Ok(user) => {
            tracing::info!("New student registered: {}", user.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(user, "Registration successful")))
        }
        Err(e) => Ok(storage_error("Registration failed", ErrorCode::RegisterFailed, e)),
    }
}
