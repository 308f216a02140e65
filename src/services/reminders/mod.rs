pub mod run;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::mail::Mailer;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct ReminderService {
    storage: Option<Arc<dyn Storage>>,
}

impl ReminderService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>, HttpResponse> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub(crate) fn get_mailer(&self, request: &HttpRequest) -> Result<Arc<dyn Mailer>, HttpResponse> {
        request
            .app_data::<web::Data<Arc<dyn Mailer>>>()
            .map(|data| data.get_ref().clone())
            .ok_or_else(|| {
                tracing::error!("Mailer not found in app data");
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error, please try again later",
                ))
            })
    }

    /// 立即执行一次截止提醒扫描
    pub async fn run_now(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        run::run_reminders(self, request).await
    }
}
