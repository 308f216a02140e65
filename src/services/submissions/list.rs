use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::submissions::requests::{SubmissionListParams, SubmissionListQuery};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{CourseAccess, current_user, load_assignment};
use crate::services::{storage_error, try_response};

pub async fn list_assignment_submissions(
    service: &SubmissionService,
    request: &HttpRequest,
    assignment_id: i64,
    query: SubmissionListParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    try_response!(load_assignment(&storage, &user, assignment_id, CourseAccess::Manage).await);

    let list_query = SubmissionListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        assignment_id: Some(assignment_id),
        student_id: None,
        graded: query.graded,
    };

    match storage.list_submissions_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Submission list retrieved successfully",
        ))),
        Err(e) => Ok(storage_error(
            "Failed to retrieve submission list",
            ErrorCode::InternalServerError,
            e,
        )),
    }
}

pub async fn list_my_submissions(
    service: &SubmissionService,
    request: &HttpRequest,
    query: SubmissionListParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    let list_query = SubmissionListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        assignment_id: None,
        student_id: Some(user.id),
        graded: query.graded,
    };

    match storage.list_submissions_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Submission list retrieved successfully",
        ))),
        Err(e) => Ok(storage_error(
            "Failed to retrieve submission list",
            ErrorCode::InternalServerError,
            e,
        )),
    }
}
