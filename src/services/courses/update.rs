use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use super::create::ensure_teacher;
use crate::models::courses::requests::UpdateCourseRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{CourseAccess, current_user, load_course};
use crate::services::{storage_error, try_response};
use crate::utils::validate::validate_title;

pub async fn update_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    mut update_data: UpdateCourseRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    try_response!(load_course(&storage, &user, course_id, CourseAccess::Manage).await);

    if let Some(title) = update_data.title.take() {
        let title = title.trim().to_string();
        if let Err(msg) = validate_title(&title) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::CourseTitleInvalid, msg)));
        }
        update_data.title = Some(title);
    }

    // 只有管理员可以转交课程
    if let Some(teacher_id) = update_data.teacher_id {
        if !user.is_admin() {
            return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::CoursePermissionDenied,
                "Only an administrator can reassign a course",
            )));
        }
        try_response!(ensure_teacher(&storage, teacher_id).await);
    }

    match storage.update_course(course_id, update_data).await {
        Ok(Some(course)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            course,
            "Course updated successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::CourseNotFound,
            "Course not found",
        ))),
        Err(e) => Ok(storage_error(
            "Course update failed",
            ErrorCode::CourseUpdateFailed,
            e,
        )),
    }
}
