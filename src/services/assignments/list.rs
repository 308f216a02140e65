use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::models::assignments::requests::{AssignmentListParams, AssignmentListQuery};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::current_user;
use crate::services::{storage_error, try_response};

pub async fn list_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
    query: AssignmentListParams,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    let mut list_query = AssignmentListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        course_id: query.course_id,
        search: query.search,
        ..Default::default()
    };

    // 只返回调用者可见课程下的作业
    match user.role {
        UserRole::Admin => {}
        UserRole::Teacher => list_query.teacher_id = Some(user.id),
        UserRole::Student => list_query.student_id = Some(user.id),
    }

    match storage.list_assignments_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Assignment list retrieved successfully",
        ))),
        Err(e) => Ok(storage_error(
            "Failed to retrieve assignment list",
            ErrorCode::InternalServerError,
            e,
        )),
    }
}
