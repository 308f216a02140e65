use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{CourseAccess, current_user, load_course};
use crate::services::{storage_error, try_response};

pub async fn delete_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    try_response!(load_course(&storage, &user, course_id, CourseAccess::Manage).await);

    // 选课、作业与提交通过外键级联删除
    match storage.delete_course(course_id).await {
        Ok(true) => {
            tracing::info!("Course {} deleted by user {}", course_id, user.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Course deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::CourseNotFound,
            "Course not found",
        ))),
        Err(e) => Ok(storage_error(
            "Course deletion failed",
            ErrorCode::CourseDeleteFailed,
            e,
        )),
    }
}
