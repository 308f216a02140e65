//! 邮件发送
//!
//! 发送后端与缓存一样以插件形式注册：`smtp` 通过 lettre 投递，
//! `log` 只把邮件写入日志（开发环境默认）。

pub mod backends;
pub mod register;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::Result;

pub use register::{get_mailer_plugin, register_builtin_mailers};

/// 待发送的纯文本邮件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// 为邮件后端生成 `register()` 函数，由 `register_builtin_mailers` 调用
#[macro_export]
macro_rules! declare_mailer_plugin {
    ($name:literal, $ty:ty) => {
        pub(crate) fn register() {
            $crate::mail::register::register_mailer_plugin(
                $name,
                std::sync::Arc::new(|| {
                    Box::pin(async {
                        <$ty>::new()
                            .map(|mailer| Box::new(mailer) as Box<dyn $crate::mail::Mailer>)
                            .map_err($crate::errors::LmsError::mail_config)
                    })
                }),
            );
        }
    };
}
