use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, validate_max_score};
use crate::models::assignments::requests::CreateAssignmentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{CourseAccess, current_user, load_course};
use crate::services::{storage_error, try_response};
use crate::utils::validate::validate_title;

fn invalid(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::AssignmentInvalid, message))
}

pub async fn create_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    mut assignment_data: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    assignment_data.title = assignment_data.title.trim().to_string();
    if let Err(msg) = validate_title(&assignment_data.title) {
        return Ok(invalid(msg));
    }
    if assignment_data.deadline.is_none() {
        return Ok(invalid("deadline is required"));
    }
    if let Some(max_score) = assignment_data.max_score
        && let Err(msg) = validate_max_score(max_score)
    {
        return Ok(invalid(msg));
    }

    try_response!(
        load_course(&storage, &user, assignment_data.course_id, CourseAccess::Manage).await
    );

    match storage.create_assignment(user.id, assignment_data).await {
        Ok(assignment) => {
            tracing::info!(
                "Assignment {} created in course {} by user {}",
                assignment.id,
                assignment.course_id,
                user.id
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                assignment,
                "Assignment created successfully",
            )))
        }
        Err(e) => Ok(storage_error(
            "Assignment creation failed",
            ErrorCode::AssignmentCreationFailed,
            e,
        )),
    }
}
