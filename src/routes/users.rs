use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{
    CreateUserRequest, UpdateUserRequest, UpdateUserRoleRequest, UserListParams,
};
use crate::services::UserService;
use crate::utils::SafeIDI64;

// 懒加载的全局 UserService 实例
static USER_SERVICE: Lazy<UserService> = Lazy::new(UserService::new_lazy);

// HTTP处理程序
pub async fn list_users(
    req: HttpRequest,
    query: web::Query<UserListParams>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.list_users(query.into_inner(), &req).await
}

pub async fn create_user(
    req: HttpRequest,
    user_data: web::Json<CreateUserRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.create_user(user_data.into_inner(), &req).await
}

pub async fn get_user(req: HttpRequest, user_id: SafeIDI64) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_user(user_id.0, &req).await
}

pub async fn update_user(
    req: HttpRequest,
    user_id: SafeIDI64,
    update_data: web::Json<UpdateUserRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .update_user(user_id.0, update_data.into_inner(), &req)
        .await
}

pub async fn update_user_role(
    req: HttpRequest,
    user_id: SafeIDI64,
    role_data: web::Json<UpdateUserRoleRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .update_user_role(user_id.0, role_data.into_inner(), &req)
        .await
}

pub async fn delete_user(req: HttpRequest, user_id: SafeIDI64) -> ActixResult<HttpResponse> {
    USER_SERVICE.delete_user(user_id.0, &req).await
}

// 配置路由
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/admin/users")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route("", web::get().to(list_users))
                    .route("", web::post().to(create_user))
                    .route("/{id}", web::get().to(get_user))
                    .route("/{id}", web::put().to(update_user))
                    .route("/{id}", web::patch().to(update_user_role))
                    .route("/{id}", web::delete().to(delete_user)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;
    use crate::models::users::entities::User;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::utils::jwt::JwtUtils;
    use actix_web::{App, http::StatusCode, test as actix_test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    async fn seed(storage: &Arc<dyn Storage>, name: &str, role: UserRole) -> User {
        storage
            .create_user(CreateUserRequest {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password: "hashed".to_string(),
                role,
            })
            .await
            .unwrap()
    }

    fn bearer(user: &User) -> (&'static str, String) {
        let token = JwtUtils::generate_access_token(user.id, &user.role.to_string()).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    #[actix_web::test]
    async fn test_admin_user_management() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);
        let admin = seed(&storage, "Root", UserRole::Admin).await;
        let alan = seed(&storage, "Alan", UserRole::Teacher).await;

        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(storage.clone()))
                .configure(configure_user_routes),
        )
        .await;

        // 非管理员无权访问
        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/admin/users")
                .insert_header(bearer(&alan))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        // 新建的用户出现在下一次分页列表中
        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/admin/users")
                .insert_header(bearer(&admin))
                .set_json(json!({
                    "name": "Ada Lovelace",
                    "email": "Ada@Example.com",
                    "password": "Analytical1Engine",
                    "role": "student"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(resp).await;
        let ada_id = body["data"]["user"]["id"].as_i64().unwrap();
        assert_eq!(body["data"]["user"]["email"], "ada@example.com");

        let body: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/admin/users?page=1&limit=50")
                .insert_header(bearer(&admin))
                .to_request(),
        )
        .await;
        let items = body["data"]["items"].as_array().unwrap();
        assert!(items.iter().any(|u| u["id"] == ada_id));
        assert_eq!(body["data"]["pagination"]["page_size"], 50);
        assert_eq!(body["data"]["pagination"]["total"], 3);

        // 超大页码返回空页而不是出错
        let body: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/admin/users?page=9223372036854775807&limit=100")
                .insert_header(bearer(&admin))
                .to_request(),
        )
        .await;
        assert!(body["data"]["items"].as_array().unwrap().is_empty());

        // 修改角色
        let body: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::patch()
                .uri(&format!("/api/v1/admin/users/{ada_id}"))
                .insert_header(bearer(&admin))
                .set_json(json!({ "role": "teacher" }))
                .to_request(),
        )
        .await;
        assert_eq!(body["data"]["user"]["role"], "teacher");

        // 不能修改自己的角色
        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::patch()
                .uri(&format!("/api/v1/admin/users/{}", admin.id))
                .insert_header(bearer(&admin))
                .set_json(json!({ "role": "student" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::CanNotChangeOwnRole as i32);

        // 不能删除自己
        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/v1/admin/users/{}", admin.id))
                .insert_header(bearer(&admin))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::CanNotDeleteCurrentUser as i32);

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/v1/admin/users/{ada_id}"))
                .insert_header(bearer(&admin))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/admin/users/{ada_id}"))
                .insert_header(bearer(&admin))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
