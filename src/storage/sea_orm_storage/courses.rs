//! 课程存储操作

use super::SeaOrmStorage;
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::enrollments::{Column as EnrollmentColumn, Entity as Enrollments};
use crate::errors::{LmsError, Result};
use crate::models::{
    PaginationInfo, normalize_page,
    courses::{
        entities::Course,
        requests::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest},
        responses::CourseListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 创建课程
    pub async fn create_course_impl(&self, req: CreateCourseRequest) -> Result<Course> {
        let now = chrono::Utc::now().timestamp();

        // teacher_id 必须由服务层确保已设置
        let teacher_id = req.teacher_id.ok_or_else(|| {
            LmsError::database_operation("teacher_id must be set before calling create_course")
        })?;

        let model = ActiveModel {
            teacher_id: Set(teacher_id),
            title: Set(req.title),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建课程失败: {e}")))?;

        Ok(result.into_course())
    }

    /// 通过 ID 获取课程
    pub async fn get_course_by_id_impl(&self, course_id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(course_id)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 分页列出课程
    pub async fn list_courses_with_pagination_impl(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        let (page, size) = normalize_page(query.page, query.size);

        let mut select = Courses::find();

        // 教师筛选
        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        // 学生筛选：仅已选课程
        if let Some(student_id) = query.student_id {
            let course_ids: Vec<i64> = Enrollments::find()
                .filter(EnrollmentColumn::StudentId.eq(student_id))
                .all(&self.db)
                .await
                .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?
                .into_iter()
                .map(|e| e.course_id)
                .collect();

            if course_ids.is_empty() {
                return Ok(CourseListResponse {
                    items: vec![],
                    pagination: PaginationInfo::new(page, size, 0),
                });
            }
            select = select.filter(Column::Id.is_in(course_ids));
        }

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(Column::Title.contains(&escaped));
        }

        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程总数失败: {e}")))?;

        let courses = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程列表失败: {e}")))?;

        Ok(CourseListResponse {
            items: courses.into_iter().map(|m| m.into_course()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 更新课程信息
    pub async fn update_course_impl(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        let existing = self.get_course_by_id_impl(course_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(course_id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }

        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }

        if let Some(teacher_id) = update.teacher_id {
            model.teacher_id = Set(teacher_id);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新课程失败: {e}")))?;

        self.get_course_by_id_impl(course_id).await
    }

    /// 删除课程（选课、作业与提交级联删除）
    pub async fn delete_course_impl(&self, course_id: i64) -> Result<bool> {
        let result = Courses::delete_by_id(course_id)
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除课程失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::users::tests::seed_user;

    pub(crate) async fn seed_course(storage: &SeaOrmStorage, teacher_id: i64, title: &str) -> Course {
        storage
            .create_course_impl(CreateCourseRequest {
                teacher_id: Some(teacher_id),
                title: title.to_string(),
                description: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_course_listing_is_scoped() {
        let storage = SeaOrmStorage::in_memory().await;
        let grace = seed_user(&storage, "Grace", "grace@example.com", UserRole::Teacher).await;
        let alan = seed_user(&storage, "Alan", "alan@example.com", UserRole::Teacher).await;
        let ada = seed_user(&storage, "Ada", "ada@example.com", UserRole::Student).await;

        let compilers = seed_course(&storage, grace.id, "Compilers").await;
        seed_course(&storage, alan.id, "Cryptography").await;
        storage
            .enroll_student_impl(compilers.id, ada.id)
            .await
            .unwrap();

        let all = storage
            .list_courses_with_pagination_impl(CourseListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);

        let taught = storage
            .list_courses_with_pagination_impl(CourseListQuery {
                teacher_id: Some(alan.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(taught.items.len(), 1);
        assert_eq!(taught.items[0].title, "Cryptography");

        let enrolled = storage
            .list_courses_with_pagination_impl(CourseListQuery {
                student_id: Some(ada.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(enrolled.items.len(), 1);
        assert_eq!(enrolled.items[0].id, compilers.id);

        let nothing = storage
            .list_courses_with_pagination_impl(CourseListQuery {
                student_id: Some(grace.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(nothing.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_update_and_delete_course() {
        let storage = SeaOrmStorage::in_memory().await;
        let grace = seed_user(&storage, "Grace", "grace@example.com", UserRole::Teacher).await;
        let course = seed_course(&storage, grace.id, "Compilers").await;

        let updated = storage
            .update_course_impl(
                course.id,
                UpdateCourseRequest {
                    description: Some("Parsing and codegen".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Compilers");
        assert_eq!(updated.description.as_deref(), Some("Parsing and codegen"));

        assert!(storage.delete_course_impl(course.id).await.unwrap());
        assert!(!storage.delete_course_impl(course.id).await.unwrap());
    }
}
