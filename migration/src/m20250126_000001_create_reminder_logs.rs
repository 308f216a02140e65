use sea_orm_migration::prelude::*;

use crate::m20250123_000001_create_tables::{Assignments, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ==================== 截止提醒发送记录表 ====================
        manager
            .create_table(
                Table::create()
                    .table(ReminderLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReminderLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReminderLogs::AssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReminderLogs::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReminderLogs::Deadline)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReminderLogs::SentAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReminderLogs::Table, ReminderLogs::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReminderLogs::Table, ReminderLogs::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一截止时间下每个学生只提醒一次；截止时间变更后重新提醒
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .unique()
                    .name("idx_reminder_logs_assignment_student_deadline")
                    .table(ReminderLogs::Table)
                    .col(ReminderLogs::AssignmentId)
                    .col(ReminderLogs::StudentId)
                    .col(ReminderLogs::Deadline)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReminderLogs::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ReminderLogs {
    #[sea_orm(iden = "reminder_logs")]
    Table,
    Id,
    AssignmentId,
    StudentId,
    Deadline,
    SentAt,
}
