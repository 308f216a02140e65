use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::models::courses::requests::{CourseStudentsParams, EnrollStudentRequest};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{CourseAccess, current_user, load_course};
use crate::services::{storage_error, try_response};

pub async fn list_students(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    query: CourseStudentsParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    try_response!(load_course(&storage, &user, course_id, CourseAccess::Manage).await);

    match storage
        .list_course_students_with_pagination(
            course_id,
            Some(query.pagination.page),
            Some(query.pagination.size),
            query.search,
        )
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Course students retrieved successfully",
        ))),
        Err(e) => Ok(storage_error(
            "Failed to retrieve course students",
            ErrorCode::InternalServerError,
            e,
        )),
    }
}

pub async fn enroll_student(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    enroll_data: EnrollStudentRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    try_response!(load_course(&storage, &user, course_id, CourseAccess::Manage).await);

    let student_id = enroll_data.student_id;
    match storage.get_user_by_id(student_id).await {
        Ok(Some(student)) if student.role == UserRole::Student => {}
        Ok(Some(_)) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                "Only students can be enrolled in a course",
            )));
        }
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "Student not found",
            )));
        }
        Err(e) => {
            return Ok(storage_error(
                "Failed to load student",
                ErrorCode::InternalServerError,
                e,
            ));
        }
    }

    match storage.get_enrollment(course_id, student_id).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::AlreadyEnrolled,
                "Student is already enrolled in this course",
            )));
        }
        Ok(None) => {}
        Err(e) => {
            return Ok(storage_error(
                "Failed to check enrollment",
                ErrorCode::InternalServerError,
                e,
            ));
        }
    }

    match storage.enroll_student(course_id, student_id).await {
        Ok(enrollment) => {
            tracing::info!("Student {} enrolled in course {}", student_id, course_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                enrollment,
                "Student enrolled successfully",
            )))
        }
        Err(e) => Ok(storage_error(
            "Enrollment failed",
            ErrorCode::EnrollmentFailed,
            e,
        )),
    }
}

pub async fn unenroll_student(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    try_response!(load_course(&storage, &user, course_id, CourseAccess::Manage).await);

    match storage.unenroll_student(course_id, student_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Student removed from course successfully",
        ))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::EnrollmentNotFound,
            "Student is not enrolled in this course",
        ))),
        Err(e) => Ok(storage_error(
            "Failed to remove student from course",
            ErrorCode::EnrollmentFailed,
            e,
        )),
    }
}
