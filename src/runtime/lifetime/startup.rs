use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::mail::Mailer;
use crate::mail::register::get_mailer_plugin;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::scheduler::ReminderWorker;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const DEFAULT_ADMIN_EMAIL: &str = "admin@lms.local";

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub mailer: Arc<dyn Mailer>,
    // 提醒任务句柄，关闭时中止
    pub reminder_handle: Option<JoinHandle<()>>,
}

/// 按名称构造缓存后端
async fn build_cache(name: &str) -> Result<Arc<dyn ObjectCache>, String> {
    let constructor = get_object_cache_plugin(name)
        .ok_or_else(|| format!("cache backend '{name}' not found in registry"))?;
    constructor().await.map(Arc::from).map_err(|e| e.to_string())
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>, Box<dyn std::error::Error>> {
    let cache_type = &AppConfig::get().cache.cache_type;

    warn!("Attempting to create {} cache backend", cache_type);
    match build_cache(cache_type).await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", cache_type);
            return Ok(cache);
        }
        Err(e) => warn!("Failed to create {} cache: {}", cache_type, e),
    }

    if cache_type != "moka" {
        warn!("Falling back to memory cache");
        match build_cache("moka").await {
            Ok(cache) => {
                warn!("Successfully created fallback Moka (in-memory) cache backend");
                return Ok(cache);
            }
            Err(e) => warn!("Failed to create fallback Moka cache: {}", e),
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

/// 按名称构造邮件后端
async fn build_mailer(name: &str) -> Result<Arc<dyn Mailer>, String> {
    let constructor = get_mailer_plugin(name)
        .ok_or_else(|| format!("mail backend '{name}' not found in registry"))?;
    constructor().await.map(Arc::from).map_err(|e| e.to_string())
}

/// 创建邮件发送器，SMTP 不可用时回退到日志后端
async fn create_mailer() -> Result<Arc<dyn Mailer>, Box<dyn std::error::Error>> {
    let backend = &AppConfig::get().mail.backend;

    match build_mailer(backend).await {
        Ok(mailer) => {
            warn!("Mail backend '{}' initialized", backend);
            return Ok(mailer);
        }
        Err(e) => warn!("Failed to create {} mail backend: {}", backend, e),
    }

    if backend != "log" {
        warn!("Falling back to log mail backend, reminders will not be delivered");
        if let Ok(mailer) = build_mailer("log").await {
            return Ok(mailer);
        }
    }

    Err(format!("No mail backend available (tried: {backend})").into())
}

/// 生成随机密码
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// 初始化默认管理员账号
/// 如果数据库中没有任何用户，则创建一个默认的 admin 账号
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users().await {
        Ok(count) if count > 0 => {
            debug!(
                "Database already has {} user(s), skipping admin seed",
                count
            );
            return;
        }
        Ok(_) => {
            info!("No users found in database, creating default admin account...");
        }
        Err(e) => {
            warn!("Failed to count users: {}, skipping admin seed", e);
            return;
        }
    }

    // 优先使用环境变量，否则生成随机密码
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        let pwd = generate_random_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let admin_request = CreateUserRequest {
        name: "Administrator".to_string(),
        email: DEFAULT_ADMIN_EMAIL.to_string(),
        password: password_hash,
        role: UserRole::Admin,
    };

    match storage.create_user(admin_request).await {
        Ok(user) => {
            info!(
                "Default admin account created successfully (ID: {}, email: {})",
                user.id, user.email
            );
        }
        Err(e) => {
            warn!("Failed to create admin account: {}", e);
        }
    }
}

/// 准备服务器启动的上下文
/// 包括存储、缓存、邮件与提醒任务
pub async fn prepare_server_startup() -> Result<StartupContext, Box<dyn std::error::Error>> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    crate::cache::register::register_builtin_object_caches();
    crate::mail::register::register_builtin_mailers();

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        crate::mail::register::debug_mailer_registry();
        debug!("Debug mode: plugin registries are enabled");
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    // 初始化默认管理员账号（如果需要）
    seed_admin(&storage).await;

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    let mailer = create_mailer().await?;

    let reminder_config = &AppConfig::get().reminder;
    let reminder_handle = if reminder_config.enabled {
        let worker = ReminderWorker::new(storage.clone(), mailer.clone(), reminder_config);
        warn!(
            "Reminder worker started (every {}s, {} minute window)",
            reminder_config.interval_secs, reminder_config.window_minutes
        );
        Some(worker.spawn())
    } else {
        warn!("Reminder worker disabled by configuration");
        None
    };

    Ok(StartupContext {
        storage,
        cache,
        mailer,
        reminder_handle,
    })
}
