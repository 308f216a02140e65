use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct Assignment {
    // 唯一 ID
    pub id: i64,
    // 所属课程 ID
    pub course_id: i64,
    // 作业标题
    pub title: String,
    // 作业描述
    pub description: Option<String>,
    // 截止时间
    pub deadline: chrono::DateTime<chrono::Utc>,
    // 满分
    pub max_score: f64,
    // 是否允许迟交
    pub allow_late_submission: bool,
    // 创建者 ID
    pub created_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Assignment {
    pub const DEFAULT_MAX_SCORE: f64 = 100.0;

    pub fn is_past_deadline(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now > self.deadline
    }
}
