//! 截止提醒记录存储操作

use super::SeaOrmStorage;
use crate::entity::reminder_logs::{ActiveModel, Column, Entity as ReminderLogs};
use crate::errors::{LmsError, Result};
use crate::models::reminders::ReminderLog;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set, TryInsertResult};

impl SeaOrmStorage {
    /// 抢占一次提醒：插入记录，冲突则说明已被提醒（或正被另一次扫描处理），返回 None
    pub async fn claim_reminder_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
        deadline: DateTime<Utc>,
        claimed_at: DateTime<Utc>,
    ) -> Result<Option<ReminderLog>> {
        let model = ActiveModel {
            assignment_id: Set(assignment_id),
            student_id: Set(student_id),
            deadline: Set(deadline.timestamp()),
            sent_at: Set(claimed_at.timestamp()),
            ..Default::default()
        };

        let result = ReminderLogs::insert(model)
            .on_conflict_do_nothing_on([
                Column::AssignmentId,
                Column::StudentId,
                Column::Deadline,
            ])
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("记录提醒失败: {e}")))?;

        match result {
            TryInsertResult::Inserted(inserted) => Ok(Some(ReminderLog {
                id: inserted.last_insert_id,
                assignment_id,
                student_id,
                deadline: DateTime::<Utc>::from_timestamp(deadline.timestamp(), 0)
                    .unwrap_or_default(),
                sent_at: DateTime::<Utc>::from_timestamp(claimed_at.timestamp(), 0)
                    .unwrap_or_default(),
            })),
            TryInsertResult::Conflicted | TryInsertResult::Empty => Ok(None),
        }
    }

    /// 发送失败时撤销抢占，下次扫描重试
    pub async fn release_reminder_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
        deadline: DateTime<Utc>,
    ) -> Result<bool> {
        let result = ReminderLogs::delete_many()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Deadline.eq(deadline.timestamp()))
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("撤销提醒记录失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 列出作业的全部提醒记录
    pub async fn list_reminder_logs_impl(&self, assignment_id: i64) -> Result<Vec<ReminderLog>> {
        let rows = ReminderLogs::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询提醒记录失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_reminder_log()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::assignments::tests::seed_assignment;
    use crate::storage::sea_orm_storage::courses::tests::seed_course;
    use crate::storage::sea_orm_storage::users::tests::seed_user;
    use chrono::Duration;

    #[tokio::test]
    async fn test_reminder_is_claimed_once_per_deadline() {
        let storage = SeaOrmStorage::in_memory().await;
        let grace = seed_user(&storage, "Grace", "grace@example.com", UserRole::Teacher).await;
        let ada = seed_user(&storage, "Ada", "ada@example.com", UserRole::Student).await;
        let course = seed_course(&storage, grace.id, "Compilers").await;
        let now = Utc::now();
        let deadline = now + Duration::minutes(30);
        let assignment =
            seed_assignment(&storage, course.id, grace.id, "Lexer", deadline).await;

        let log = storage
            .claim_reminder_impl(assignment.id, ada.id, deadline, now)
            .await
            .unwrap()
            .expect("first claim should insert");
        assert_eq!(log.sent_at.timestamp(), now.timestamp());
        assert_eq!(log.deadline.timestamp(), deadline.timestamp());

        // 重复抢占不报错，只返回 None
        assert!(
            storage
                .claim_reminder_impl(assignment.id, ada.id, deadline, now)
                .await
                .unwrap()
                .is_none()
        );

        // 新的截止时间可以再次提醒
        let postponed = deadline + Duration::days(1);
        assert!(
            storage
                .claim_reminder_impl(assignment.id, ada.id, postponed, now)
                .await
                .unwrap()
                .is_some()
        );
        assert_eq!(
            storage
                .list_reminder_logs_impl(assignment.id)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_released_reminder_can_be_claimed_again() {
        let storage = SeaOrmStorage::in_memory().await;
        let grace = seed_user(&storage, "Grace", "grace@example.com", UserRole::Teacher).await;
        let ada = seed_user(&storage, "Ada", "ada@example.com", UserRole::Student).await;
        let course = seed_course(&storage, grace.id, "Compilers").await;
        let now = Utc::now();
        let deadline = now + Duration::minutes(30);
        let assignment =
            seed_assignment(&storage, course.id, grace.id, "Lexer", deadline).await;

        storage
            .claim_reminder_impl(assignment.id, ada.id, deadline, now)
            .await
            .unwrap();
        assert!(
            storage
                .release_reminder_impl(assignment.id, ada.id, deadline)
                .await
                .unwrap()
        );
        assert!(
            storage
                .list_reminder_logs_impl(assignment.id)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            storage
                .claim_reminder_impl(assignment.id, ada.id, deadline, now)
                .await
                .unwrap()
                .is_some()
        );
    }
}
