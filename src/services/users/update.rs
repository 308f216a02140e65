use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{UserService, ensure_email_available, invalidate_user_cache};
use crate::middlewares::RequireJWT;
use crate::models::users::entities::UserStatus;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{
        requests::{UpdateUserRequest, UpdateUserRoleRequest},
        responses::UserResponse,
    },
};
use crate::services::{storage_error, try_response};
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_name, validate_password_simple};

fn bad_request(code: ErrorCode, msg: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, msg))
}

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    mut update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    // 管理员不能修改自己的角色或停用自己
    if RequireJWT::extract_user_id(request) == Some(user_id) {
        if update_data.role.is_some() {
            return Ok(bad_request(
                ErrorCode::CanNotChangeOwnRole,
                "Cannot change your own role",
            ));
        }
        if update_data
            .status
            .as_ref()
            .is_some_and(|status| *status != UserStatus::Active)
        {
            return Ok(bad_request(
                ErrorCode::UserUpdateFailed,
                "Cannot deactivate your own account",
            ));
        }
    }

    if let Some(name) = update_data.name.take() {
        let name = name.trim().to_string();
        if let Err(msg) = validate_name(&name) {
            return Ok(bad_request(ErrorCode::UserNameInvalid, msg));
        }
        update_data.name = Some(name);
    }

    if let Some(email) = update_data.email.take() {
        let email = email.trim().to_lowercase();
        if let Err(msg) = validate_email(&email) {
            return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
        }
        try_response!(ensure_email_available(&storage, &email, Some(user_id)).await);
        update_data.email = Some(email);
    }

    if let Some(password) = update_data.password.take() {
        if let Err(msg) = validate_password_simple(&password) {
            return Ok(bad_request(ErrorCode::UserPasswordInvalid, msg));
        }
        match hash_password(&password) {
            Ok(hash) => update_data.password = Some(hash),
            Err(e) => {
                return Ok(storage_error(
                    "Failed to update user",
                    ErrorCode::UserUpdateFailed,
                    e,
                ));
            }
        }
    }

    match storage.update_user(user_id, update_data).await {
        Ok(Some(user)) => {
            invalidate_user_cache(request, user_id).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user },
                "User information updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(storage_error(
            "Failed to update user",
            ErrorCode::UserUpdateFailed,
            e,
        )),
    }
}

pub async fn update_user_role(
    service: &UserService,
    user_id: i64,
    role_data: UpdateUserRoleRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if RequireJWT::extract_user_id(request) == Some(user_id) {
        return Ok(bad_request(
            ErrorCode::CanNotChangeOwnRole,
            "Cannot change your own role",
        ));
    }

    let update = UpdateUserRequest {
        role: Some(role_data.role),
        ..Default::default()
    };
    update_user(service, user_id, update, request).await
}
