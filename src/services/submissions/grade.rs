use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{SubmissionService, load_submission};
use crate::models::submissions::requests::GradeSubmissionRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{CourseAccess, current_user, load_assignment};
use crate::services::{storage_error, try_response};

/// 分数须在 [0, max_score] 内
pub(crate) fn validate_score(score: f64, max_score: f64) -> Result<(), String> {
    if !score.is_finite() || score < 0.0 || score > max_score {
        return Err(format!("Score must be between 0 and {max_score}"));
    }
    Ok(())
}

pub async fn grade_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
    grade_data: GradeSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    let submission = try_response!(load_submission(&storage, submission_id).await);
    let (assignment, _) = try_response!(
        load_assignment(&storage, &user, submission.assignment_id, CourseAccess::Manage).await
    );

    if let Err(msg) = validate_score(grade_data.score, assignment.max_score) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::GradeInvalid,
            msg,
        )));
    }

    let feedback = grade_data
        .feedback
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty());

    match storage
        .grade_submission(submission_id, user.id, grade_data.score, feedback)
        .await
    {
        Ok(Some(graded)) => {
            tracing::info!(
                "Submission {} graded {} by user {}",
                submission_id,
                grade_data.score,
                user.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                graded,
                "Submission graded successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubmissionNotFound,
            "Submission not found",
        ))),
        Err(e) => Ok(storage_error(
            "Grading failed",
            ErrorCode::InternalServerError,
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_score_bounds() {
        assert!(validate_score(0.0, 10.0).is_ok());
        assert!(validate_score(10.0, 10.0).is_ok());
        assert!(validate_score(7.25, 10.0).is_ok());
        assert!(validate_score(-0.5, 10.0).is_err());
        assert!(validate_score(10.5, 10.0).is_err());
        assert!(validate_score(f64::NAN, 10.0).is_err());
    }
}
