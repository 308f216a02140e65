use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ReminderService;
use crate::config::AppConfig;
use crate::models::{ApiResponse, ErrorCode};
use crate::scheduler::ReminderWorker;
use crate::services::try_response;

pub async fn run_reminders(
    service: &ReminderService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = try_response!(service.get_storage(request));
    let mailer = try_response!(service.get_mailer(request));

    let worker = ReminderWorker::new(storage, mailer, &AppConfig::get().reminder);
    match worker.run_once().await {
        Ok(report) => {
            tracing::info!(
                "Manual reminder sweep finished: {} sent, {} failed",
                report.reminders_sent,
                report.failures
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                report,
                "Reminder sweep completed",
            )))
        }
        Err(e) => {
            tracing::error!("Manual reminder sweep failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::ReminderRunFailed,
                    "Reminder sweep failed, please try again later",
                )),
            )
        }
    }
}
