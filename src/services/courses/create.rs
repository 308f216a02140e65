use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::CourseService;
use crate::models::courses::requests::CreateCourseRequest;
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::current_user;
use crate::services::{storage_error, try_response};
use crate::storage::Storage;
use crate::utils::validate::validate_title;

/// 确认指定用户存在且为教师
pub(crate) async fn ensure_teacher(
    storage: &Arc<dyn Storage>,
    teacher_id: i64,
) -> Result<(), HttpResponse> {
    match storage.get_user_by_id(teacher_id).await {
        Ok(Some(user)) if user.role == UserRole::Teacher => Ok(()),
        Ok(Some(_)) => Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "The assigned user is not a teacher",
        ))),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "Teacher not found",
        ))),
        Err(e) => Err(storage_error(
            "Failed to load teacher",
            ErrorCode::InternalServerError,
            e,
        )),
    }
}

pub async fn create_course(
    service: &CourseService,
    request: &HttpRequest,
    mut course_data: CreateCourseRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    course_data.title = course_data.title.trim().to_string();
    if let Err(msg) = validate_title(&course_data.title) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::CourseTitleInvalid, msg)));
    }

    // 教师只能为自己创建课程；管理员必须指定授课教师
    match user.role {
        UserRole::Teacher => course_data.teacher_id = Some(user.id),
        UserRole::Admin => match course_data.teacher_id {
            Some(teacher_id) => try_response!(ensure_teacher(&storage, teacher_id).await),
            None => {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::BadRequest,
                    "teacher_id is required when an administrator creates a course",
                )));
            }
        },
        UserRole::Student => {
            return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::Forbidden,
                "Students cannot create courses",
            )));
        }
    }

    match storage.create_course(course_data).await {
        Ok(course) => {
            tracing::info!("Course {} created by user {}", course.id, user.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                course,
                "Course created successfully",
            )))
        }
        Err(e) => Ok(storage_error(
            "Course creation failed",
            ErrorCode::CourseCreationFailed,
            e,
        )),
    }
}
