use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};

use super::{SubmissionService, already_graded};
use crate::models::assignments::entities::Assignment;
use crate::models::submissions::requests::CreateSubmissionRequest;
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{CourseAccess, current_user, load_assignment};
use crate::services::{storage_error, try_response};

/// 截止判定结果
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DeadlineCheck {
    OnTime,
    Late,
    Closed,
}

pub(crate) fn check_deadline(assignment: &Assignment, now: DateTime<Utc>) -> DeadlineCheck {
    if !assignment.is_past_deadline(now) {
        DeadlineCheck::OnTime
    } else if assignment.allow_late_submission {
        DeadlineCheck::Late
    } else {
        DeadlineCheck::Closed
    }
}

pub async fn submit_assignment(
    service: &SubmissionService,
    request: &HttpRequest,
    assignment_id: i64,
    submission_data: CreateSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    if user.role != UserRole::Student {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::NotEnrolled,
            "Only enrolled students can submit assignments",
        )));
    }

    // 学生的 Member 级别即代表已选课
    let (assignment, _) =
        try_response!(load_assignment(&storage, &user, assignment_id, CourseAccess::Member).await);

    if submission_data.content.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Submission content cannot be empty",
        )));
    }

    let is_late = match check_deadline(&assignment, Utc::now()) {
        DeadlineCheck::OnTime => false,
        DeadlineCheck::Late => true,
        DeadlineCheck::Closed => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::SubmissionDeadlinePassed,
                "The deadline has passed and late submissions are not allowed",
            )));
        }
    };

    match storage.get_student_submission(assignment_id, user.id).await {
        Ok(Some(existing)) if existing.is_graded() => return Ok(already_graded()),
        Ok(_) => {}
        Err(e) => {
            return Ok(storage_error(
                "Failed to check existing submission",
                ErrorCode::InternalServerError,
                e,
            ));
        }
    }

    match storage
        .upsert_submission(assignment_id, user.id, submission_data.content, is_late)
        .await
    {
        Ok(submission) => {
            tracing::info!(
                "Student {} submitted assignment {} (late: {})",
                user.id,
                assignment_id,
                is_late
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                submission,
                "Submission saved successfully",
            )))
        }
        Err(e) => Ok(storage_error(
            "Submission failed",
            ErrorCode::SubmissionFailed,
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn assignment(allow_late_submission: bool) -> Assignment {
        let now = Utc::now();
        Assignment {
            id: 1,
            course_id: 1,
            title: "Lab 1".to_string(),
            description: None,
            deadline: now,
            max_score: Assignment::DEFAULT_MAX_SCORE,
            allow_late_submission,
            created_by: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_check_deadline() {
        let strict = assignment(false);
        let lenient = assignment(true);
        let before = strict.deadline - Duration::minutes(1);
        let after = strict.deadline + Duration::minutes(1);

        assert_eq!(check_deadline(&strict, before), DeadlineCheck::OnTime);
        assert_eq!(check_deadline(&strict, strict.deadline), DeadlineCheck::OnTime);
        assert_eq!(check_deadline(&strict, after), DeadlineCheck::Closed);
        assert_eq!(check_deadline(&lenient, after), DeadlineCheck::Late);
    }
}
