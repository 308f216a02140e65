//! 作业存储操作

use super::SeaOrmStorage;
use crate::entity::assignments::{ActiveModel, Column, Entity as Assignments};
use crate::entity::courses::{Column as CourseColumn, Entity as Courses};
use crate::entity::enrollments::{Column as EnrollmentColumn, Entity as Enrollments};
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo, normalize_page,
    assignments::{
        entities::Assignment,
        requests::{AssignmentListQuery, CreateAssignmentRequest, UpdateAssignmentRequest},
        responses::AssignmentListResponse,
    },
};
use crate::utils::escape_like_pattern;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 创建作业
    pub async fn create_assignment_impl(
        &self,
        created_by: i64,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment> {
        let now = chrono::Utc::now().timestamp();

        // deadline 必须由服务层校验
        let deadline = req.deadline.ok_or_else(|| {
            LmsError::validation("deadline must be set before calling create_assignment")
        })?;

        let model = ActiveModel {
            course_id: Set(req.course_id),
            created_by: Set(created_by),
            title: Set(req.title),
            description: Set(req.description),
            max_score: Set(req.max_score.unwrap_or(Assignment::DEFAULT_MAX_SCORE)),
            deadline: Set(deadline.timestamp()),
            allow_late_submission: Set(req.allow_late_submission.unwrap_or(false)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建作业失败: {e}")))?;

        Ok(result.into_assignment())
    }

    /// 通过 ID 获取作业
    pub async fn get_assignment_by_id_impl(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询作业失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    /// 分页列出作业
    pub async fn list_assignments_with_pagination_impl(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse> {
        let (page, size) = normalize_page(query.page, query.size);

        let mut select = Assignments::find();

        if let Some(course_id) = query.course_id {
            select = select.filter(Column::CourseId.eq(course_id));
        }

        // 可见课程范围：教师为授课课程，学生为已选课程
        let mut visible_courses: Option<Vec<i64>> = None;

        if let Some(teacher_id) = query.teacher_id {
            let ids = Courses::find()
                .filter(CourseColumn::TeacherId.eq(teacher_id))
                .all(&self.db)
                .await
                .map_err(|e| LmsError::database_operation(format!("查询授课课程失败: {e}")))?
                .into_iter()
                .map(|c| c.id)
                .collect();
            visible_courses = Some(ids);
        }

        if let Some(student_id) = query.student_id {
            let ids = Enrollments::find()
                .filter(EnrollmentColumn::StudentId.eq(student_id))
                .all(&self.db)
                .await
                .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?
                .into_iter()
                .map(|e| e.course_id)
                .collect();
            visible_courses = Some(ids);
        }

        if let Some(course_ids) = visible_courses {
            if course_ids.is_empty() {
                return Ok(AssignmentListResponse {
                    items: vec![],
                    pagination: PaginationInfo::new(page, size, 0),
                });
            }
            select = select.filter(Column::CourseId.is_in(course_ids));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(Column::Title.contains(&escaped));
        }

        // 按截止时间升序，最紧急的在前
        select = select.order_by_asc(Column::Deadline).order_by_asc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询作业总数失败: {e}")))?;

        let assignments = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询作业列表失败: {e}")))?;

        Ok(AssignmentListResponse {
            items: assignments.into_iter().map(|m| m.into_assignment()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 更新作业
    pub async fn update_assignment_impl(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        let existing = self.get_assignment_by_id_impl(assignment_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(assignment_id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }

        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }

        if let Some(max_score) = update.max_score {
            model.max_score = Set(max_score);
        }

        if let Some(deadline) = update.deadline {
            model.deadline = Set(deadline.timestamp());
        }

        if let Some(allow_late) = update.allow_late_submission {
            model.allow_late_submission = Set(allow_late);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新作业失败: {e}")))?;

        self.get_assignment_by_id_impl(assignment_id).await
    }

    /// 删除作业
    pub async fn delete_assignment_impl(&self, assignment_id: i64) -> Result<bool> {
        let result = Assignments::delete_by_id(assignment_id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除作业失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 课程下全部作业
    pub async fn list_course_assignments_impl(&self, course_id: i64) -> Result<Vec<Assignment>> {
        let assignments = Assignments::find()
            .filter(Column::CourseId.eq(course_id))
            .order_by_asc(Column::Deadline)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程作业失败: {e}")))?;

        Ok(assignments.into_iter().map(|m| m.into_assignment()).collect())
    }

    /// 截止时间在 [from, to] 之间的作业
    pub async fn list_assignments_due_between_impl(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Assignment>> {
        let assignments = Assignments::find()
            .filter(Column::Deadline.gte(from.timestamp()))
            .filter(Column::Deadline.lte(to.timestamp()))
            .order_by_asc(Column::Deadline)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询临近截止作业失败: {e}")))?;

        Ok(assignments.into_iter().map(|m| m.into_assignment()).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::courses::tests::seed_course;
    use crate::storage::sea_orm_storage::users::tests::seed_user;
    use chrono::Duration;

    pub(crate) async fn seed_assignment(
        storage: &SeaOrmStorage,
        course_id: i64,
        created_by: i64,
        title: &str,
        deadline: DateTime<Utc>,
    ) -> Assignment {
        storage
            .create_assignment_impl(
                created_by,
                CreateAssignmentRequest {
                    course_id,
                    title: title.to_string(),
                    description: None,
                    max_score: None,
                    deadline: Some(deadline),
                    allow_late_submission: None,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_assignment_defaults() {
        let storage = SeaOrmStorage::in_memory().await;
        let grace = seed_user(&storage, "Grace", "grace@example.com", UserRole::Teacher).await;
        let course = seed_course(&storage, grace.id, "Compilers").await;
        let deadline = Utc::now() + Duration::days(3);

        let assignment = seed_assignment(&storage, course.id, grace.id, "Lexer", deadline).await;
        assert_eq!(assignment.max_score, 100.0);
        assert!(!assignment.allow_late_submission);
        assert_eq!(assignment.deadline.timestamp(), deadline.timestamp());

        let missing_deadline = storage
            .create_assignment_impl(
                grace.id,
                CreateAssignmentRequest {
                    course_id: course.id,
                    title: "Parser".to_string(),
                    description: None,
                    max_score: None,
                    deadline: None,
                    allow_late_submission: None,
                },
            )
            .await;
        assert!(missing_deadline.is_err());
    }

    #[tokio::test]
    async fn test_due_between_window() {
        let storage = SeaOrmStorage::in_memory().await;
        let grace = seed_user(&storage, "Grace", "grace@example.com", UserRole::Teacher).await;
        let course = seed_course(&storage, grace.id, "Compilers").await;
        let now = Utc::now();

        seed_assignment(&storage, course.id, grace.id, "Past", now - Duration::minutes(5)).await;
        let soon =
            seed_assignment(&storage, course.id, grace.id, "Soon", now + Duration::minutes(30))
                .await;
        seed_assignment(&storage, course.id, grace.id, "Later", now + Duration::hours(5)).await;

        let due = storage
            .list_assignments_due_between_impl(now, now + Duration::minutes(60))
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, soon.id);
    }

    #[tokio::test]
    async fn test_listing_scoped_to_enrolled_student() {
        let storage = SeaOrmStorage::in_memory().await;
        let grace = seed_user(&storage, "Grace", "grace@example.com", UserRole::Teacher).await;
        let ada = seed_user(&storage, "Ada", "ada@example.com", UserRole::Student).await;
        let compilers = seed_course(&storage, grace.id, "Compilers").await;
        let networks = seed_course(&storage, grace.id, "Networks").await;
        let deadline = Utc::now() + Duration::days(1);
        seed_assignment(&storage, compilers.id, grace.id, "Lexer", deadline).await;
        seed_assignment(&storage, networks.id, grace.id, "Sockets", deadline).await;

        let none = storage
            .list_assignments_with_pagination_impl(AssignmentListQuery {
                student_id: Some(ada.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.items.is_empty());

        storage
            .enroll_student_impl(compilers.id, ada.id)
            .await
            .unwrap();
        let visible = storage
            .list_assignments_with_pagination_impl(AssignmentListQuery {
                student_id: Some(ada.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(visible.items.len(), 1);
        assert_eq!(visible.items[0].title, "Lexer");

        let taught = storage
            .list_assignments_with_pagination_impl(AssignmentListQuery {
                teacher_id: Some(grace.id),
                search: Some("sock".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(taught.items.len(), 1);
        assert_eq!(taught.items[0].course_id, networks.id);
    }
}
