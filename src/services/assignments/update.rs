use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, validate_max_score};
use crate::models::assignments::requests::UpdateAssignmentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{CourseAccess, current_user, load_assignment};
use crate::services::{storage_error, try_response};
use crate::utils::validate::validate_title;

pub async fn update_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    mut update_data: UpdateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    try_response!(load_assignment(&storage, &user, assignment_id, CourseAccess::Manage).await);

    if let Some(title) = update_data.title.take() {
        let title = title.trim().to_string();
        if let Err(msg) = validate_title(&title) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::AssignmentInvalid, msg)));
        }
        update_data.title = Some(title);
    }
    if let Some(max_score) = update_data.max_score
        && let Err(msg) = validate_max_score(max_score)
    {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::AssignmentInvalid, msg)));
    }

    match storage.update_assignment(assignment_id, update_data).await {
        Ok(Some(assignment)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            assignment,
            "Assignment updated successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::AssignmentNotFound,
            "Assignment not found",
        ))),
        Err(e) => Ok(storage_error(
            "Assignment update failed",
            ErrorCode::AssignmentUpdateFailed,
            e,
        )),
    }
}
