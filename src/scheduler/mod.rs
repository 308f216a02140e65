//! 后台定时任务

pub mod reminder;

pub use reminder::ReminderWorker;
