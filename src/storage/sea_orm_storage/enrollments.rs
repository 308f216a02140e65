//! 选课存储操作

use super::SeaOrmStorage;
use crate::entity::enrollments::{ActiveModel, Column, Entity as Enrollments, Relation};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo, normalize_page,
    courses::{
        entities::Enrollment,
        responses::{CourseStudent, CourseStudentListResponse},
    },
    users::entities::User,
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use std::collections::HashMap;

impl SeaOrmStorage {
    /// 学生选课
    pub async fn enroll_student_impl(&self, course_id: i64, student_id: i64) -> Result<Enrollment> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            course_id: Set(course_id),
            student_id: Set(student_id),
            enrolled_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("选课失败: {e}")))?;

        Ok(result.into_enrollment())
    }

    /// 退课
    pub async fn unenroll_student_impl(&self, course_id: i64, student_id: i64) -> Result<bool> {
        let result = Enrollments::delete_many()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::StudentId.eq(student_id))
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("退课失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 查询选课记录
    pub async fn get_enrollment_impl(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Option<Enrollment>> {
        let result = Enrollments::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?;

        Ok(result.map(|m| m.into_enrollment()))
    }

    /// 分页列出课程学生
    pub async fn list_course_students_with_pagination_impl(
        &self,
        course_id: i64,
        page: Option<i64>,
        size: Option<i64>,
        search: Option<String>,
    ) -> Result<CourseStudentListResponse> {
        let (page, size) = normalize_page(page, size);

        let mut select = Enrollments::find().filter(Column::CourseId.eq(course_id));

        // 按姓名或邮箱搜索，需要 join users 表
        if let Some(ref search) = search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.join(JoinType::InnerJoin, Relation::Student.def()).filter(
                Condition::any()
                    .add(UserColumn::Name.contains(&escaped))
                    .add(UserColumn::Email.contains(&escaped)),
            );
        }

        select = select.order_by_asc(Column::EnrolledAt).order_by_asc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程学生总数失败: {e}")))?;

        let enrollments = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程学生列表失败: {e}")))?;

        let student_ids: Vec<i64> = enrollments.iter().map(|e| e.student_id).collect();
        let mut users: HashMap<i64, User> = Users::find()
            .filter(UserColumn::Id.is_in(student_ids))
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询学生信息失败: {e}")))?
            .into_iter()
            .map(|m| (m.id, m.into_user()))
            .collect();

        let items = enrollments
            .into_iter()
            .filter_map(|e| {
                users.remove(&e.student_id).map(|user| CourseStudent {
                    user,
                    enrolled_at: chrono::DateTime::<chrono::Utc>::from_timestamp(e.enrolled_at, 0)
                        .unwrap_or_default(),
                })
            })
            .collect();

        Ok(CourseStudentListResponse {
            items,
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 课程全部学生，按姓名排序
    pub async fn list_course_students_impl(&self, course_id: i64) -> Result<Vec<User>> {
        let student_ids: Vec<i64> = Enrollments::find()
            .filter(Column::CourseId.eq(course_id))
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?
            .into_iter()
            .map(|e| e.student_id)
            .collect();

        if student_ids.is_empty() {
            return Ok(vec![]);
        }

        let users = Users::find()
            .filter(UserColumn::Id.is_in(student_ids))
            .order_by_asc(UserColumn::Name)
            .order_by_asc(UserColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询学生信息失败: {e}")))?;

        Ok(users.into_iter().map(|m| m.into_user()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::courses::tests::seed_course;
    use crate::storage::sea_orm_storage::users::tests::seed_user;

    #[tokio::test]
    async fn test_enroll_list_and_unenroll() {
        let storage = SeaOrmStorage::in_memory().await;
        let grace = seed_user(&storage, "Grace", "grace@example.com", UserRole::Teacher).await;
        let ada = seed_user(&storage, "Ada", "ada@example.com", UserRole::Student).await;
        let bob = seed_user(&storage, "Bob", "bob@example.com", UserRole::Student).await;
        let course = seed_course(&storage, grace.id, "Compilers").await;

        storage.enroll_student_impl(course.id, bob.id).await.unwrap();
        storage.enroll_student_impl(course.id, ada.id).await.unwrap();

        // 同一学生重复选课被唯一索引拒绝
        assert!(storage.enroll_student_impl(course.id, ada.id).await.is_err());

        let names: Vec<String> = storage
            .list_course_students_impl(course.id)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["Ada", "Bob"]);

        let searched = storage
            .list_course_students_with_pagination_impl(
                course.id,
                None,
                None,
                Some("bob".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(searched.pagination.total, 1);
        assert_eq!(searched.items[0].user.id, bob.id);

        assert!(storage.unenroll_student_impl(course.id, bob.id).await.unwrap());
        assert!(
            storage
                .get_enrollment_impl(course.id, bob.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            storage
                .get_enrollment_impl(course.id, ada.id)
                .await
                .unwrap()
                .is_some()
        );
    }
}
