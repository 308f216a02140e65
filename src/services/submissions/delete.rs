use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{SubmissionService, already_graded, load_submission};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_user, forbidden};
use crate::services::{storage_error, try_response};

pub async fn delete_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    let submission = try_response!(load_submission(&storage, submission_id).await);

    // 管理员可删除任意提交；提交者仅能在评分前撤回
    if !user.is_admin() {
        if submission.student_id != user.id {
            return Ok(forbidden("You can only withdraw your own submissions"));
        }
        if submission.is_graded() {
            return Ok(already_graded());
        }
    }

    match storage.delete_submission(submission_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Submission deleted successfully",
        ))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubmissionNotFound,
            "Submission not found",
        ))),
        Err(e) => Ok(storage_error(
            "Submission deletion failed",
            ErrorCode::InternalServerError,
            e,
        )),
    }
}
