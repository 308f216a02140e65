//! 课程级权限判断
//!
//! 管理员可访问全部课程；教师只能管理自己授课的课程；学生只能查看已选课程。

use actix_web::{HttpRequest, HttpResponse};
use std::sync::Arc;

use super::{storage_error, unauthorized};
use crate::middlewares::RequireJWT;
use crate::models::assignments::entities::Assignment;
use crate::models::courses::entities::Course;
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// 课程访问级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CourseAccess {
    None,
    /// 已选课学生
    Member,
    /// 授课教师或管理员
    Manage,
}

/// 当前登录用户，未登录时返回 401 响应
pub(crate) fn current_user(request: &HttpRequest) -> Result<User, HttpResponse> {
    RequireJWT::extract_user_claims(request).ok_or_else(unauthorized)
}

pub(crate) fn can_manage_course(user: &User, course: &Course) -> bool {
    user.is_admin() || (user.role == UserRole::Teacher && course.teacher_id == user.id)
}

pub(crate) async fn course_access(
    storage: &Arc<dyn Storage>,
    user: &User,
    course: &Course,
) -> crate::errors::Result<CourseAccess> {
    if can_manage_course(user, course) {
        return Ok(CourseAccess::Manage);
    }
    if user.role == UserRole::Student
        && storage.get_enrollment(course.id, user.id).await?.is_some()
    {
        return Ok(CourseAccess::Member);
    }
    Ok(CourseAccess::None)
}

pub(crate) fn forbidden(message: &str) -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error_empty(
        ErrorCode::CoursePermissionDenied,
        message,
    ))
}

/// 加载课程并确认访问级别不低于 `required`
pub(crate) async fn load_course(
    storage: &Arc<dyn Storage>,
    user: &User,
    course_id: i64,
    required: CourseAccess,
) -> Result<Course, HttpResponse> {
    let course = match storage.get_course_by_id(course_id).await {
        Ok(Some(course)) => course,
        Ok(None) => {
            return Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::CourseNotFound,
                "Course not found",
            )));
        }
        Err(e) => {
            return Err(storage_error(
                "Failed to load course",
                ErrorCode::InternalServerError,
                e,
            ));
        }
    };

    let access = course_access(storage, user, &course)
        .await
        .map_err(|e| storage_error("Failed to check course access", ErrorCode::InternalServerError, e))?;

    if access < required {
        return Err(forbidden(match required {
            CourseAccess::Manage => "Only the course teacher or an administrator can do this",
            _ => "You do not have access to this course",
        }));
    }
    Ok(course)
}

/// 加载作业及其课程，并确认对课程的访问级别
pub(crate) async fn load_assignment(
    storage: &Arc<dyn Storage>,
    user: &User,
    assignment_id: i64,
    required: CourseAccess,
) -> Result<(Assignment, Course), HttpResponse> {
    let assignment = match storage.get_assignment_by_id(assignment_id).await {
        Ok(Some(assignment)) => assignment,
        Ok(None) => {
            return Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::AssignmentNotFound,
                "Assignment not found",
            )));
        }
        Err(e) => {
            return Err(storage_error(
                "Failed to load assignment",
                ErrorCode::InternalServerError,
                e,
            ));
        }
    };

    let course = load_course(storage, user, assignment.course_id, required).await?;
    Ok((assignment, course))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserStatus;
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    fn user(id: i64, role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id,
            name: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn course(teacher_id: i64) -> Course {
        let now = chrono::Utc::now();
        Course {
            id: 1,
            title: "Compilers".to_string(),
            description: None,
            teacher_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_manage_course() {
        let compilers = course(2);
        assert!(can_manage_course(&user(1, UserRole::Admin), &compilers));
        assert!(can_manage_course(&user(2, UserRole::Teacher), &compilers));
        assert!(!can_manage_course(&user(3, UserRole::Teacher), &compilers));
        // 学生即使 ID 相同也不能管理
        assert!(!can_manage_course(&user(2, UserRole::Student), &compilers));
    }

    #[test]
    fn test_access_ordering() {
        assert!(CourseAccess::Manage > CourseAccess::Member);
        assert!(CourseAccess::Member > CourseAccess::None);
    }

    #[tokio::test]
    async fn test_unenrolled_student_has_no_access() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);
        let access = course_access(&storage, &user(5, UserRole::Student), &course(2))
            .await
            .unwrap();
        assert_eq!(access, CourseAccess::None);
    }
}
