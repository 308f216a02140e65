// 业务错误码
// 0 成功；1xxx 通用；2xxx 认证；3xxx 用户；4xxx 课程；6xxx 作业；7xxx 提交；8xxx 任务与导出；5000 服务器错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    RateLimitExceeded = 1029,

    AuthFailed = 2000,
    RegisterFailed = 2001,
    UserInactive = 2002,

    UserNotFound = 3000,
    UserAlreadyExists = 3001,
    UserNameInvalid = 3002,
    UserEmailInvalid = 3003,
    UserPasswordInvalid = 3004,
    UserCreationFailed = 3005,
    UserUpdateFailed = 3006,
    UserDeleteFailed = 3007,
    CanNotDeleteCurrentUser = 3008,
    CanNotChangeOwnRole = 3009,

    CourseNotFound = 4000,
    CoursePermissionDenied = 4001,
    CourseCreationFailed = 4002,
    CourseUpdateFailed = 4003,
    CourseDeleteFailed = 4004,
    CourseTitleInvalid = 4005,
    EnrollmentNotFound = 4010,
    AlreadyEnrolled = 4011,
    EnrollmentFailed = 4012,
    NotEnrolled = 4013,

    InternalServerError = 5000,

    AssignmentNotFound = 6000,
    AssignmentInvalid = 6001,
    AssignmentCreationFailed = 6002,
    AssignmentUpdateFailed = 6003,
    AssignmentDeleteFailed = 6004,

    SubmissionNotFound = 7000,
    SubmissionDeadlinePassed = 7001,
    SubmissionAlreadyGraded = 7002,
    SubmissionFailed = 7003,
    GradeInvalid = 7004,

    ReminderRunFailed = 8000,
    ExportFailed = 8100,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success as i32, 0);
        assert_eq!(ErrorCode::Unauthorized as i32, 1001);
        assert_eq!(ErrorCode::InternalServerError as i32, 5000);
        assert_eq!(ErrorCode::SubmissionDeadlinePassed as i32, 7001);
    }
}
