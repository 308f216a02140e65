use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RateLimit};
use crate::models::users::entities::UserRole;
use crate::services::ReminderService;

// 懒加载的全局 ReminderService 实例
static REMINDER_SERVICE: Lazy<ReminderService> = Lazy::new(ReminderService::new_lazy);

pub async fn run_reminders(req: HttpRequest) -> ActixResult<HttpResponse> {
    REMINDER_SERVICE.run_now(&req).await
}

// 配置路由
pub fn configure_reminder_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/admin/reminders")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .service(
                        web::resource("/run")
                            .wrap(RateLimit::reminder_run())
                            .route(web::post().to(run_reminders)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::Mailer;
    use crate::mail::testing::RecordingMailer;
    use crate::models::assignments::requests::CreateAssignmentRequest;
    use crate::models::courses::requests::CreateCourseRequest;
    use crate::models::users::entities::User;
    use crate::models::users::requests::CreateUserRequest;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::utils::jwt::JwtUtils;
    use actix_web::{App, http::StatusCode, test as actix_test};
    use serde_json::Value;
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
    async fn test_admin_runs_reminder_sweep() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);
        let admin = seed(&storage, "Root", UserRole::Admin).await;
        let grace = seed(&storage, "Grace", UserRole::Teacher).await;
        let ada = seed(&storage, "Ada", UserRole::Student).await;

        let course = storage
            .create_course(CreateCourseRequest {
                teacher_id: Some(grace.id),
                title: "Compilers".to_string(),
                description: None,
            })
            .await
            .unwrap();
        storage.enroll_student(course.id, ada.id).await.unwrap();
        storage
            .create_assignment(
                grace.id,
                CreateAssignmentRequest {
                    course_id: course.id,
                    title: "Lexer".to_string(),
                    description: None,
                    max_score: None,
                    deadline: Some(chrono::Utc::now() + chrono::Duration::minutes(20)),
                    allow_late_submission: None,
                },
            )
            .await
            .unwrap();

        let recorder = Arc::new(RecordingMailer::default());
        let mailer: Arc<dyn Mailer> = recorder.clone();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(storage.clone()))
                .app_data(web::Data::new(mailer))
                .configure(configure_reminder_routes),
        )
        .await;

        let run = |user: &User| {
            actix_test::TestRequest::post()
                .uri("/api/v1/admin/reminders/run")
                .insert_header(bearer(user))
                .to_request()
        };

        let resp = actix_test::call_service(&app, run(&grace)).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = actix_test::call_service(&app, run(&admin)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["data"]["assignments_checked"], 1);
        assert_eq!(body["data"]["reminders_sent"], 1);
        assert_eq!(recorder.sent()[0].to, "ada@example.com");

        // 第二次运行不会重复提醒
        let body: Value = actix_test::call_and_read_body_json(&app, run(&admin)).await;
        assert_eq!(body["data"]["reminders_sent"], 0);
        assert_eq!(body["data"]["skipped_already_reminded"], 1);
        assert_eq!(recorder.sent().len(), 1);
    }
}
