//! 课程提交热力图
//!
//! 行为选课学生，列为课程作业，单元格为该学生对该作业的提交状态。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::CourseService;
use crate::errors::Result;
use crate::models::assignments::entities::Assignment;
use crate::models::courses::entities::{Course, HeatmapStatus};
use crate::models::courses::responses::{
    CourseHeatmapResponse, HeatmapAssignment, HeatmapCell, HeatmapRow,
};
use crate::models::submissions::entities::Submission;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{CourseAccess, current_user, load_course};
use crate::services::{storage_error, try_response};
use crate::storage::Storage;

fn cell_status(submission: Option<&Submission>) -> HeatmapStatus {
    match submission {
        None => HeatmapStatus::Missing,
        Some(s) if s.is_graded() => HeatmapStatus::Graded,
        Some(s) if s.is_late => HeatmapStatus::Late,
        Some(_) => HeatmapStatus::Submitted,
    }
}

/// 组装热力图；已退课学生的提交不计入
pub fn build_heatmap(
    course: Course,
    assignments: Vec<Assignment>,
    students: Vec<User>,
    submissions: Vec<Submission>,
) -> CourseHeatmapResponse {
    let enrolled: HashSet<i64> = students.iter().map(|s| s.id).collect();
    let by_key: HashMap<(i64, i64), Submission> = submissions
        .into_iter()
        .filter(|s| enrolled.contains(&s.student_id))
        .map(|s| ((s.student_id, s.assignment_id), s))
        .collect();

    let student_count = students.len();
    let columns = assignments
        .iter()
        .map(|assignment| {
            let submitted = students
                .iter()
                .filter(|s| by_key.contains_key(&(s.id, assignment.id)))
                .count();
            let submission_rate = if student_count == 0 {
                0.0
            } else {
                submitted as f64 / student_count as f64
            };
            HeatmapAssignment {
                id: assignment.id,
                title: assignment.title.clone(),
                deadline: assignment.deadline,
                max_score: assignment.max_score,
                submission_rate,
            }
        })
        .collect();

    let rows = students
        .into_iter()
        .map(|student| {
            let cells = assignments
                .iter()
                .map(|assignment| {
                    let submission = by_key.get(&(student.id, assignment.id));
                    HeatmapCell {
                        assignment_id: assignment.id,
                        status: cell_status(submission),
                        score: submission.and_then(|s| s.score),
                    }
                })
                .collect();
            HeatmapRow {
                student_id: student.id,
                student_name: student.name,
                cells,
            }
        })
        .collect();

    CourseHeatmapResponse {
        course,
        assignments: columns,
        rows,
    }
}

/// 读取课程的作业、学生与提交并组装热力图
pub(crate) async fn load_heatmap(
    storage: &Arc<dyn Storage>,
    course: Course,
) -> Result<CourseHeatmapResponse> {
    let assignments = storage.list_course_assignments(course.id).await?;
    let students = storage.list_course_students(course.id).await?;
    let submissions = storage.list_course_submissions(course.id).await?;
    Ok(build_heatmap(course, assignments, students, submissions))
}

pub async fn get_heatmap(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let user = try_response!(current_user(request));
    let course = try_response!(load_course(&storage, &user, course_id, CourseAccess::Manage).await);

    match load_heatmap(&storage, course).await {
        Ok(heatmap) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            heatmap,
            "Course heatmap retrieved successfully",
        ))),
        Err(e) => Ok(storage_error(
            "Failed to build course heatmap",
            ErrorCode::InternalServerError,
            e,
        )),
    }
}
