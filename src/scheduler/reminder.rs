//! 作业截止提醒
//!
//! 每个周期查找即将截止（`now <= deadline <= now + window`）的作业，
//! 给尚未提交且未被提醒过的已选课学生发送邮件。发送前先写入提醒记录，
//! 发送失败则撤销，下次扫描重试。截止时间变更后会重新提醒。

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::config::ReminderConfig;
use crate::errors::Result;
use crate::mail::{Mailer, OutgoingEmail};
use crate::models::assignments::entities::Assignment;
use crate::models::reminders::ReminderReport;
use crate::models::users::entities::User;
use crate::storage::Storage;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct ReminderWorker {
    storage: Arc<dyn Storage>,
    mailer: Arc<dyn Mailer>,
    clock: Clock,
    interval: Duration,
    window: ChronoDuration,
}

impl ReminderWorker {
    pub fn new(storage: Arc<dyn Storage>, mailer: Arc<dyn Mailer>, config: &ReminderConfig) -> Self {
        Self {
            storage,
            mailer,
            clock: Arc::new(Utc::now),
            interval: Duration::from_secs(config.interval_secs.max(1)),
            window: ChronoDuration::minutes(config.window_minutes),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// 在后台持续运行
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run_loop().await;
        })
    }

    async fn run_loop(self) {
        info!(
            interval_secs = self.interval.as_secs(),
            window_minutes = self.window.num_minutes(),
            "Deadline reminder worker started"
        );
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = self.run_once().await {
                error!(error = %err, "Deadline reminder run failed");
            }
        }
    }

    /// 执行一次扫描；查询失败中止本次运行，单封邮件失败只计数
    pub async fn run_once(&self) -> Result<ReminderReport> {
        let now = (self.clock)();
        let due = self
            .storage
            .list_assignments_due_between(now, now + self.window)
            .await?;

        let mut report = ReminderReport::default();
        for assignment in &due {
            report.assignments_checked += 1;
            self.remind_assignment(assignment, now, &mut report).await?;
        }

        if report.assignments_checked > 0 {
            info!(
                assignments = report.assignments_checked,
                sent = report.reminders_sent,
                skipped_submitted = report.skipped_submitted,
                skipped_reminded = report.skipped_already_reminded,
                failures = report.failures,
                "Deadline reminder run completed"
            );
        } else {
            debug!("No assignments due within the reminder window");
        }

        Ok(report)
    }

    async fn remind_assignment(
        &self,
        assignment: &Assignment,
        now: DateTime<Utc>,
        report: &mut ReminderReport,
    ) -> Result<()> {
        let students = self.storage.list_course_students(assignment.course_id).await?;
        let submitted = self
            .storage
            .list_submitted_student_ids(assignment.id)
            .await?;

        for student in &students {
            if submitted.contains(&student.id) {
                report.skipped_submitted += 1;
                continue;
            }
            // 先抢占记录再发送，并发扫描时只有一方能拿到
            let claimed = self
                .storage
                .claim_reminder(assignment.id, student.id, assignment.deadline, now)
                .await?;
            if claimed.is_none() {
                report.skipped_already_reminded += 1;
                continue;
            }

            let email = reminder_email(assignment, student);
            match self.mailer.send(&email).await {
                Ok(()) => {
                    report.reminders_sent += 1;
                    debug!(
                        assignment_id = assignment.id,
                        student_id = student.id,
                        "Reminder sent to {}",
                        student.email
                    );
                }
                Err(err) => {
                    report.failures += 1;
                    warn!(
                        assignment_id = assignment.id,
                        student_id = student.id,
                        error = %err,
                        "Failed to send reminder"
                    );
                    if let Err(release_err) = self
                        .storage
                        .release_reminder(assignment.id, student.id, assignment.deadline)
                        .await
                    {
                        error!(
                            assignment_id = assignment.id,
                            student_id = student.id,
                            error = %release_err,
                            "Failed to release reminder claim"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

pub(crate) fn reminder_email(assignment: &Assignment, student: &User) -> OutgoingEmail {
    OutgoingEmail {
        to: student.email.clone(),
        to_name: Some(student.name.clone()),
        subject: format!("⏰ Reminder: Assignment \"{}\" is due soon", assignment.title),
        body: format!(
            "Hi {},\n\nJust a reminder that your assignment \"{}\" is due at {}.\n\nPlease submit it before the deadline.\n\nLMS Team",
            student.name,
            assignment.title,
            assignment.deadline.format("%Y-%m-%d %H:%M UTC"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::testing::RecordingMailer;
    use crate::models::courses::requests::CreateCourseRequest;
    use crate::models::users::entities::UserRole;
    use crate::models::users::requests::CreateUserRequest;
    use crate::models::assignments::requests::{CreateAssignmentRequest, UpdateAssignmentRequest};
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use chrono::TimeZone;

    struct Fixture {
        storage: Arc<dyn Storage>,
        mailer: Arc<RecordingMailer>,
        now: DateTime<Utc>,
        ada: User,
        bob: User,
        assignment: Assignment,
    }

    async fn user(storage: &Arc<dyn Storage>, name: &str, role: UserRole) -> User {
        storage
            .create_user(CreateUserRequest {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password: "hashed".to_string(),
                role,
            })
            .await
            .unwrap()
    }

    async fn fixture() -> Fixture {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

        let grace = user(&storage, "Grace", UserRole::Teacher).await;
        let ada = user(&storage, "Ada", UserRole::Student).await;
        let bob = user(&storage, "Bob", UserRole::Student).await;

        let course = storage
            .create_course(CreateCourseRequest {
                teacher_id: Some(grace.id),
                title: "Compilers".to_string(),
                description: None,
            })
            .await
            .unwrap();
        storage.enroll_student(course.id, ada.id).await.unwrap();
        storage.enroll_student(course.id, bob.id).await.unwrap();

        let assignment = storage
            .create_assignment(
                grace.id,
                CreateAssignmentRequest {
                    course_id: course.id,
                    title: "Lexer".to_string(),
                    description: None,
                    max_score: None,
                    deadline: Some(now + ChronoDuration::minutes(30)),
                    allow_late_submission: None,
                },
            )
            .await
            .unwrap();
        // 窗口外的作业不应触发提醒
        storage
            .create_assignment(
                grace.id,
                CreateAssignmentRequest {
                    course_id: course.id,
                    title: "Parser".to_string(),
                    description: None,
                    max_score: None,
                    deadline: Some(now + ChronoDuration::hours(3)),
                    allow_late_submission: None,
                },
            )
            .await
            .unwrap();

        Fixture {
            storage,
            mailer: Arc::new(RecordingMailer::default()),
            now,
            ada,
            bob,
            assignment,
        }
    }

    fn worker(fx: &Fixture) -> ReminderWorker {
        let config = ReminderConfig {
            enabled: true,
            interval_secs: 600,
            window_minutes: 60,
        };
        let now = fx.now;
        ReminderWorker::new(fx.storage.clone(), fx.mailer.clone(), &config)
            .with_clock(Arc::new(move || now))
    }

    #[tokio::test]
    async fn test_reminds_students_without_submission() {
        let fx = fixture().await;
        fx.storage
            .upsert_submission(fx.assignment.id, fx.bob.id, "done".to_string(), false)
            .await
            .unwrap();

        let report = worker(&fx).run_once().await.unwrap();
        assert_eq!(
            report,
            ReminderReport {
                assignments_checked: 1,
                reminders_sent: 1,
                skipped_submitted: 1,
                skipped_already_reminded: 0,
                failures: 0,
            }
        );

        let sent = fx.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert_eq!(sent[0].subject, "⏰ Reminder: Assignment \"Lexer\" is due soon");
        assert_eq!(
            sent[0].body,
            "Hi Ada,\n\nJust a reminder that your assignment \"Lexer\" is due at 2026-03-02 09:30 UTC.\n\nPlease submit it before the deadline.\n\nLMS Team"
        );
    }

    #[tokio::test]
    async fn test_second_run_does_not_repeat() {
        let fx = fixture().await;
        let worker = worker(&fx);

        let first = worker.run_once().await.unwrap();
        assert_eq!(first.reminders_sent, 2);

        let second = worker.run_once().await.unwrap();
        assert_eq!(second.reminders_sent, 0);
        assert_eq!(second.skipped_already_reminded, 2);
        assert_eq!(fx.mailer.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_send_is_retried_next_run() {
        let fx = fixture().await;
        fx.mailer.fail_for(&fx.ada.email);
        let worker = worker(&fx);

        let report = worker.run_once().await.unwrap();
        assert_eq!(report.failures, 1);
        assert_eq!(report.reminders_sent, 1);
        let logs = fx.storage.list_reminder_logs(fx.assignment.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].student_id, fx.bob.id);

        let retry = worker.run_once().await.unwrap();
        assert_eq!(retry.failures, 1);
        assert_eq!(retry.skipped_already_reminded, 1);
    }

    #[tokio::test]
    async fn test_concurrent_runs_remind_each_student_once() {
        let fx = fixture().await;
        let a = worker(&fx);
        let b = worker(&fx);

        let (first, second) = tokio::join!(a.run_once(), b.run_once());
        let first = first.unwrap();
        let second = second.unwrap();

        assert_eq!(first.reminders_sent + second.reminders_sent, 2);
        assert_eq!(
            first.skipped_already_reminded + second.skipped_already_reminded,
            2
        );
        assert_eq!(fx.mailer.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_postponed_deadline_is_reminded_again() {
        let fx = fixture().await;
        assert_eq!(worker(&fx).run_once().await.unwrap().reminders_sent, 2);

        let postponed = fx.assignment.deadline + ChronoDuration::days(1);
        fx.storage
            .update_assignment(
                fx.assignment.id,
                UpdateAssignmentRequest {
                    title: None,
                    description: None,
                    max_score: None,
                    deadline: Some(postponed),
                    allow_late_submission: None,
                },
            )
            .await
            .unwrap();

        let config = ReminderConfig {
            enabled: true,
            interval_secs: 600,
            window_minutes: 60,
        };
        let tomorrow = fx.now + ChronoDuration::days(1);
        let report = ReminderWorker::new(fx.storage.clone(), fx.mailer.clone(), &config)
            .with_clock(Arc::new(move || tomorrow))
            .run_once()
            .await
            .unwrap();

        assert_eq!(report.reminders_sent, 2);
        assert_eq!(report.skipped_already_reminded, 0);
        assert_eq!(fx.mailer.sent().len(), 4);
    }

    #[tokio::test]
    async fn test_nothing_due() {
        let fx = fixture().await;
        let later = fx.now + ChronoDuration::days(2);
        let config = ReminderConfig {
            enabled: true,
            interval_secs: 600,
            window_minutes: 60,
        };
        let worker = ReminderWorker::new(fx.storage.clone(), fx.mailer.clone(), &config)
            .with_clock(Arc::new(move || later));

        assert_eq!(worker.run_once().await.unwrap(), ReminderReport::default());
        assert!(fx.mailer.sent().is_empty());
    }
}
