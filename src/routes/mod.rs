pub mod assignments;

pub mod auth;

pub mod courses;

pub mod reminders;

pub mod submissions;

pub mod users;

pub use assignments::configure_assignment_routes;
pub use auth::configure_auth_routes;
pub use courses::configure_course_routes;
pub use reminders::configure_reminder_routes;
pub use submissions::configure_submission_routes;
pub use users::configure_user_routes;
