//! 路径参数提取器
//!
//! 路径中的 ID 必须是正整数，否则直接返回 400，处理程序无需再解析。

use actix_web::{
    FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError,
};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn bad_path_param(param: &str, raw: Option<&str>) -> actix_web::Error {
    let message = match raw {
        Some(raw) => format!("Invalid path parameter '{param}': {raw}"),
        None => format!("Missing path parameter '{param}'"),
    };
    let response = HttpResponse::BadRequest()
        .json(ApiResponse::<()>::error_empty(ErrorCode::BadRequest, &message));
    InternalError::from_response(message, response).into()
}

/// 解析为正整数 ID
pub(crate) fn parse_positive_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}

macro_rules! define_safe_i64_extractor {
    ($(#[$meta:meta])* $name:ident, $param:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                let raw = req.match_info().get($param);
                ready(
                    raw.and_then(parse_positive_id)
                        .map($name)
                        .ok_or_else(|| bad_path_param($param, raw)),
                )
            }
        }
    };
}

define_safe_i64_extractor!(
    /// 通用 `{id}` 路径参数
    SafeIDI64,
    "id"
);
define_safe_i64_extractor!(SafeStudentIdI64, "student_id");

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test as actix_test, web};

    #[test]
    fn test_parse_positive_id() {
        assert_eq!(parse_positive_id("12"), Some(12));
        assert_eq!(parse_positive_id("0"), None);
        assert_eq!(parse_positive_id("-3"), None);
        assert_eq!(parse_positive_id("1e3"), None);
        assert_eq!(parse_positive_id("99999999999999999999"), None);
    }

    #[actix_web::test]
    async fn test_extractors_in_handler() {
        let app = actix_test::init_service(App::new().route(
            "/courses/{id}/students/{student_id}",
            web::get().to(|id: SafeIDI64, student: SafeStudentIdI64| async move {
                HttpResponse::Ok().body(format!("{}:{}", id.0, student.0))
            }),
        ))
        .await;

        let ok = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/courses/3/students/9")
                .to_request(),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(ok).await, "3:9");

        let bad = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/courses/abc/students/9")
                .to_request(),
        )
        .await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }
}
