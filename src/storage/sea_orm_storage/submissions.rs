//! 提交存储操作

use super::SeaOrmStorage;
use crate::entity::assignments::{Column as AssignmentColumn, Entity as Assignments};
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo, normalize_page,
    submissions::{
        entities::Submission, requests::SubmissionListQuery, responses::SubmissionListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

impl SeaOrmStorage {
    /// 新建提交，或覆盖该学生已有的提交
    ///
    /// 已评分的提交不应再被覆盖，调用方负责检查。
    pub async fn upsert_submission_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
        content: String,
        is_late: bool,
    ) -> Result<Submission> {
        let now = chrono::Utc::now().timestamp();

        let existing = Submissions::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询提交失败: {e}")))?;

        let result = match existing {
            Some(existing) => {
                let mut model: ActiveModel = existing.into();
                model.content = Set(content);
                model.is_late = Set(is_late);
                model.submitted_at = Set(now);
                model
                    .update(&self.db)
                    .await
                    .map_err(|e| LmsError::database_operation(format!("更新提交失败: {e}")))?
            }
            None => {
                let model = ActiveModel {
                    assignment_id: Set(assignment_id),
                    student_id: Set(student_id),
                    content: Set(content),
                    is_late: Set(is_late),
                    submitted_at: Set(now),
                    ..Default::default()
                };
                model
                    .insert(&self.db)
                    .await
                    .map_err(|e| LmsError::database_operation(format!("创建提交失败: {e}")))?
            }
        };

        Ok(result.into_submission())
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(&self, submission_id: i64) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 获取学生在某作业下的提交
    pub async fn get_student_submission_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 分页列出提交
    pub async fn list_submissions_with_pagination_impl(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        let (page, size) = normalize_page(query.page, query.size);

        let mut select = Submissions::find();

        if let Some(assignment_id) = query.assignment_id {
            select = select.filter(Column::AssignmentId.eq(assignment_id));
        }

        if let Some(student_id) = query.student_id {
            select = select.filter(Column::StudentId.eq(student_id));
        }

        // 评分状态筛选
        match query.graded {
            Some(true) => select = select.filter(Column::GradedAt.is_not_null()),
            Some(false) => select = select.filter(Column::GradedAt.is_null()),
            None => {}
        }

        select = select
            .order_by_desc(Column::SubmittedAt)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询提交总数失败: {e}")))?;

        let submissions = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询提交列表失败: {e}")))?;

        Ok(SubmissionListResponse {
            items: submissions
                .into_iter()
                .map(|m| m.into_submission())
                .collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 评分
    pub async fn grade_submission_impl(
        &self,
        submission_id: i64,
        grader_id: i64,
        score: f64,
        feedback: Option<String>,
    ) -> Result<Option<Submission>> {
        let existing = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询提交失败: {e}")))?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let now = chrono::Utc::now().timestamp();
        let mut model: ActiveModel = existing.into();
        model.score = Set(Some(score));
        model.feedback = Set(feedback);
        model.graded_by = Set(Some(grader_id));
        model.graded_at = Set(Some(now));

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("评分失败: {e}")))?;

        Ok(Some(result.into_submission()))
    }

    /// 删除提交
    pub async fn delete_submission_impl(&self, submission_id: i64) -> Result<bool> {
        let result = Submissions::delete_by_id(submission_id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除提交失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 课程下全部提交
    pub async fn list_course_submissions_impl(&self, course_id: i64) -> Result<Vec<Submission>> {
        let assignment_ids: Vec<i64> = Assignments::find()
            .select_only()
            .column(AssignmentColumn::Id)
            .filter(AssignmentColumn::CourseId.eq(course_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程作业失败: {e}")))?;

        if assignment_ids.is_empty() {
            return Ok(vec![]);
        }

        let submissions = Submissions::find()
            .filter(Column::AssignmentId.is_in(assignment_ids))
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程提交失败: {e}")))?;

        Ok(submissions
            .into_iter()
            .map(|m| m.into_submission())
            .collect())
    }

    /// 已提交某作业的学生 ID
    pub async fn list_submitted_student_ids_impl(&self, assignment_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = Submissions::find()
            .select_only()
            .column(Column::StudentId)
            .filter(Column::AssignmentId.eq(assignment_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询已提交学生失败: {e}")))?;

        Ok(ids)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::assignments::tests::seed_assignment;
    use crate::storage::sea_orm_storage::courses::tests::seed_course;
    use crate::storage::sea_orm_storage::users::tests::seed_user;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_resubmission_replaces_content() {
        let storage = SeaOrmStorage::in_memory().await;
        let grace = seed_user(&storage, "Grace", "grace@example.com", UserRole::Teacher).await;
        let ada = seed_user(&storage, "Ada", "ada@example.com", UserRole::Student).await;
        let course = seed_course(&storage, grace.id, "Compilers").await;
        let assignment =
            seed_assignment(&storage, course.id, grace.id, "Lexer", Utc::now() + Duration::days(1))
                .await;

        let first = storage
            .upsert_submission_impl(assignment.id, ada.id, "draft".to_string(), false)
            .await
            .unwrap();
        let second = storage
            .upsert_submission_impl(assignment.id, ada.id, "final".to_string(), true)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.content, "final");
        assert!(second.is_late);
        assert_eq!(
            storage
                .list_submitted_student_ids_impl(assignment.id)
                .await
                .unwrap(),
            vec![ada.id]
        );
    }

    #[tokio::test]
    async fn test_grade_and_filter() {
        let storage = SeaOrmStorage::in_memory().await;
        let grace = seed_user(&storage, "Grace", "grace@example.com", UserRole::Teacher).await;
        let ada = seed_user(&storage, "Ada", "ada@example.com", UserRole::Student).await;
        let bob = seed_user(&storage, "Bob", "bob@example.com", UserRole::Student).await;
        let course = seed_course(&storage, grace.id, "Compilers").await;
        let assignment =
            seed_assignment(&storage, course.id, grace.id, "Lexer", Utc::now() + Duration::days(1))
                .await;

        let ada_sub = storage
            .upsert_submission_impl(assignment.id, ada.id, "tokens".to_string(), false)
            .await
            .unwrap();
        storage
            .upsert_submission_impl(assignment.id, bob.id, "regex".to_string(), false)
            .await
            .unwrap();

        let graded = storage
            .grade_submission_impl(ada_sub.id, grace.id, 92.5, Some("Nice".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert!(graded.is_graded());
        assert_eq!(graded.score, Some(92.5));
        assert_eq!(graded.graded_by, Some(grace.id));

        let ungraded = storage
            .list_submissions_with_pagination_impl(SubmissionListQuery {
                assignment_id: Some(assignment.id),
                graded: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ungraded.pagination.total, 1);
        assert_eq!(ungraded.items[0].student_id, bob.id);

        assert_eq!(
            storage
                .list_course_submissions_impl(course.id)
                .await
                .unwrap()
                .len(),
            2
        );
        assert!(
            storage
                .grade_submission_impl(9999, grace.id, 1.0, None)
                .await
                .unwrap()
                .is_none()
        );
    }
}
