use async_trait::async_trait;
use tracing::info;

use crate::declare_mailer_plugin;
use crate::errors::Result;
use crate::mail::{Mailer, OutgoingEmail};

declare_mailer_plugin!("log", LogMailer);

/// 只写日志，不实际投递
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> std::result::Result<Self, String> {
        Ok(Self)
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        info!(
            to = %email.to,
            subject = %email.subject,
            "Mail delivery skipped (log backend):\n{}",
            email.body
        );
        Ok(())
    }
}
