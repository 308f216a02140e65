use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::courses::requests::{
    CourseQueryParams, CourseStudentsParams, CreateCourseRequest, EnrollStudentRequest,
    UpdateCourseRequest,
};
use crate::services::CourseService;
use crate::utils::{SafeIDI64, SafeStudentIdI64};

// 懒加载的全局 CourseService 实例
static COURSE_SERVICE: Lazy<CourseService> = Lazy::new(CourseService::new_lazy);

pub async fn list_courses(
    req: HttpRequest,
    query: web::Query<CourseQueryParams>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_courses(&req, query.into_inner()).await
}

pub async fn create_course(
    req: HttpRequest,
    course_data: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .create_course(&req, course_data.into_inner())
        .await
}

pub async fn get_course(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course(&req, course_id.0).await
}

pub async fn update_course(
    req: HttpRequest,
    course_id: SafeIDI64,
    update_data: web::Json<UpdateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .update_course(&req, course_id.0, update_data.into_inner())
        .await
}

pub async fn delete_course(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.delete_course(&req, course_id.0).await
}

pub async fn list_students(
    req: HttpRequest,
    course_id: SafeIDI64,
    query: web::Query<CourseStudentsParams>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .list_students(&req, course_id.0, query.into_inner())
        .await
}

pub async fn enroll_student(
    req: HttpRequest,
    course_id: SafeIDI64,
    enroll_data: web::Json<EnrollStudentRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .enroll_student(&req, course_id.0, enroll_data.into_inner())
        .await
}

pub async fn unenroll_student(
    req: HttpRequest,
    course_id: SafeIDI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .unenroll_student(&req, course_id.0, student_id.0)
        .await
}

pub async fn get_heatmap(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_heatmap(&req, course_id.0).await
}

pub async fn export_heatmap(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.export_heatmap(&req, course_id.0).await
}

// 配置路由
pub fn configure_course_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_courses))
            .route("", web::post().to(create_course))
            .route("/{id}", web::get().to(get_course))
            .route("/{id}", web::put().to(update_course))
            .route("/{id}", web::delete().to(delete_course))
            .route("/{id}/students", web::get().to(list_students))
            .route("/{id}/students", web::post().to(enroll_student))
            .route(
                "/{id}/students/{student_id}",
                web::delete().to(unenroll_student),
            )
            .route("/{id}/heatmap", web::get().to(get_heatmap))
            .route("/{id}/heatmap/export", web::get().to(export_heatmap)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{User, UserRole};
    use crate::models::users::requests::CreateUserRequest;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::utils::jwt::JwtUtils;
    use actix_web::{App, http::StatusCode, test};
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
    async fn test_course_assignment_submission_flow() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);
        let teacher = seed(&storage, "Alan", UserRole::Teacher).await;
        let ada = seed(&storage, "Ada", UserRole::Student).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage.clone()))
                .configure(configure_course_routes)
                .configure(crate::routes::configure_assignment_routes)
                .configure(crate::routes::configure_submission_routes),
        )
        .await;

        // 未登录
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/courses").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        // 教师建课
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/courses")
                .insert_header(bearer(&teacher))
                .set_json(json!({ "title": "Compilers" }))
                .to_request(),
        )
        .await;
        assert_eq!(body["data"]["teacher_id"], teacher.id);
        let course_id = body["data"]["id"].as_i64().unwrap();

        // 学生未选课时无权查看
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/courses/{course_id}"))
                .insert_header(bearer(&ada))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let enroll = || {
            test::TestRequest::post()
                .uri(&format!("/api/v1/courses/{course_id}/students"))
                .insert_header(bearer(&teacher))
                .set_json(json!({ "student_id": ada.id }))
                .to_request()
        };
        let resp = test::call_service(&app, enroll()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let resp = test::call_service(&app, enroll()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/courses/{course_id}"))
                .insert_header(bearer(&ada))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        // 布置作业并提交
        let deadline = (chrono::Utc::now() + chrono::Duration::days(1)).to_rfc3339();
        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/assignments")
                .insert_header(bearer(&teacher))
                .set_json(json!({
                    "course_id": course_id,
                    "title": "Lexer",
                    "deadline": deadline,
                    "max_score": 100.0
                }))
                .to_request(),
        )
        .await;
        let assignment_id = body["data"]["id"].as_i64().unwrap();

        let submit = || {
            test::TestRequest::post()
                .uri(&format!("/api/v1/assignments/{assignment_id}/submissions"))
                .insert_header(bearer(&ada))
                .set_json(json!({ "content": "tokens.rs" }))
                .to_request()
        };
        let body: Value = test::call_and_read_body_json(&app, submit()).await;
        assert_eq!(body["data"]["is_late"], false);
        let submission_id = body["data"]["id"].as_i64().unwrap();

        let grade = |score: f64| {
            test::TestRequest::put()
                .uri(&format!("/api/v1/submissions/{submission_id}/grade"))
                .insert_header(bearer(&teacher))
                .set_json(json!({ "score": score, "feedback": "Good" }))
                .to_request()
        };
        let resp = test::call_service(&app, grade(105.0)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = test::call_service(&app, grade(90.0)).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // 已评分的提交不可覆盖
        let resp = test::call_service(&app, submit()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/courses/{course_id}/heatmap"))
                .insert_header(bearer(&teacher))
                .to_request(),
        )
        .await;
        assert_eq!(body["data"]["rows"][0]["cells"][0]["status"], "graded");
        assert_eq!(body["data"]["assignments"][0]["submission_rate"], 1.0);

        // 学生不能查看热力图
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/courses/{course_id}/heatmap"))
                .insert_header(bearer(&ada))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
