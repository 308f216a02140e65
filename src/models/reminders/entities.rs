use serde::Serialize;
use ts_rs::TS;

/// 已发送的提醒记录，每个 (作业, 学生, 截止时间) 至多一条
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/reminder.ts")]
pub struct ReminderLog {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub sent_at: chrono::DateTime<chrono::Utc>,
}

/// 单次提醒扫描的统计结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/reminder.ts")]
pub struct ReminderReport {
    pub assignments_checked: u32,
    pub reminders_sent: u32,
    pub skipped_submitted: u32,
    pub skipped_already_reminded: u32,
    pub failures: u32,
}
