use crate::errors::Result;
use crate::mail::Mailer;
use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, Once, RwLock},
};

pub type BoxedMailerFuture = Pin<Box<dyn Future<Output = Result<Box<dyn Mailer>>> + Send>>;
pub type MailerConstructor = Arc<dyn Fn() -> BoxedMailerFuture + Send + Sync>;

static MAILER_REGISTRY: Lazy<RwLock<HashMap<String, MailerConstructor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

static BUILTIN_REGISTERED: Once = Once::new();

pub fn register_mailer_plugin<S: Into<String>>(name: S, constructor: MailerConstructor) {
    let mut registry = MAILER_REGISTRY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.insert(name.into(), constructor);
}

/// 注册内置邮件后端，可重复调用
pub fn register_builtin_mailers() {
    BUILTIN_REGISTERED.call_once(|| {
        super::backends::log::register();
        super::backends::smtp::register();
    });
}

pub fn get_mailer_plugin(name: &str) -> Option<MailerConstructor> {
    MAILER_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(name)
        .cloned()
}

pub fn debug_mailer_registry() {
    let registry = MAILER_REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    for key in registry.keys() {
        tracing::debug!("Registered mailer plugin: {}", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::OutgoingEmail;

    #[tokio::test]
    async fn test_log_mailer_from_registry() {
        register_builtin_mailers();
        assert!(get_mailer_plugin("smtp").is_some());
        assert!(get_mailer_plugin("sendmail").is_none());

        let constructor = get_mailer_plugin("log").unwrap();
        let mailer = constructor().await.unwrap();
        let email = OutgoingEmail {
            to: "ada@example.com".to_string(),
            to_name: Some("Ada".to_string()),
            subject: "Hello".to_string(),
            body: "World".to_string(),
        };
        assert!(mailer.send(&email).await.is_ok());
    }
}
