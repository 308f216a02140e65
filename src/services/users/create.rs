use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{UserService, validate_new_user};
use crate::models::{
    ApiResponse, ErrorCode,
    users::{requests::CreateUserRequest, responses::UserResponse},
};
use crate::services::{storage_error, try_response};
use crate::utils::password::hash_password;

pub async fn create_user(
    service: &UserService,
    mut user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));

    user_data.name = user_data.name.trim().to_string();
    user_data.email = user_data.email.trim().to_lowercase();
    try_response!(validate_new_user(&storage, &user_data).await);

    user_data.password = match hash_password(&user_data.password) {
        Ok(hash) => hash,
        Err(e) => {
            return Ok(storage_error(
                "User creation failed",
                ErrorCode::UserCreationFailed,
                e,
            ));
        }
    };

    match storage.create_user(user_data).await {
        Ok(user) => {
            tracing::info!("User {} created with role {}", user.id, user.role);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                UserResponse { user },
                "User created successfully",
            )))
        }
        Err(e) => Ok(storage_error(
            "User creation failed",
            ErrorCode::UserCreationFailed,
            e,
        )),
    }
}
