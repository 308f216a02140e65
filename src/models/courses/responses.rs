use super::entities::{Course, HeatmapStatus};
use crate::models::common::PaginationInfo;
use crate::models::users::entities::User;
use serde::Serialize;
use ts_rs::TS;

// 课程列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseListResponse {
    pub pagination: PaginationInfo,
    pub items: Vec<Course>,
}

// 课程学生
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseStudent {
    pub user: User,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseStudentListResponse {
    pub pagination: PaginationInfo,
    pub items: Vec<CourseStudent>,
}

/// 热力图列（作业）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct HeatmapAssignment {
    pub id: i64,
    pub title: String,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub max_score: f64,
    /// 已提交人数 / 选课人数
    pub submission_rate: f64,
}

/// 热力图单元格
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct HeatmapCell {
    pub assignment_id: i64,
    pub status: HeatmapStatus,
    pub score: Option<f64>,
}

/// 热力图行（学生）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct HeatmapRow {
    pub student_id: i64,
    pub student_name: String,
    pub cells: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseHeatmapResponse {
    pub course: Course,
    pub assignments: Vec<HeatmapAssignment>,
    pub rows: Vec<HeatmapRow>,
}
