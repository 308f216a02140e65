use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::models::ApiResponse;
use crate::services::access::{CourseAccess, current_user, load_course};
use crate::services::try_response;

pub async fn get_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));

    let course = try_response!(load_course(&storage, &user, course_id, CourseAccess::Member).await);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        course,
        "Course information retrieved successfully",
    )))
}
