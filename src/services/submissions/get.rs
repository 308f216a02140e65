use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{SubmissionService, load_submission};
use crate::models::ApiResponse;
use crate::services::access::{CourseAccess, current_user, load_assignment};
use crate::services::try_response;

pub async fn get_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    let submission = try_response!(load_submission(&storage, submission_id).await);

    // 提交者本人可直接查看，其余需课程管理权限
    if submission.student_id != user.id {
        try_response!(
            load_assignment(&storage, &user, submission.assignment_id, CourseAccess::Manage).await
        );
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        submission,
        "Submission retrieved successfully",
    )))
}
