//! 按配置构建 CORS 中间件
//!
//! 列表为空或包含 `*` 时放开对应限制；无法解析的方法或请求头会被跳过并记录警告。

use actix_cors::Cors;
use actix_web::http::{Method, header::HeaderName};
use tracing::warn;

use crate::config::CorsConfig;

fn is_wildcard(values: &[String]) -> bool {
    values.is_empty() || values.iter().any(|v| v.trim() == "*")
}

pub fn build_cors(config: &CorsConfig) -> Cors {
    let mut cors = Cors::default().max_age(config.max_age);

    if is_wildcard(&config.allowed_origins) {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.allowed_origins {
            cors = cors.allowed_origin(origin.trim());
        }
    }

    if is_wildcard(&config.allowed_methods) {
        cors = cors.allow_any_method();
    } else {
        let methods: Vec<Method> = config
            .allowed_methods
            .iter()
            .filter_map(|m| match Method::from_bytes(m.trim().to_uppercase().as_bytes()) {
                Ok(method) => Some(method),
                Err(_) => {
                    warn!("Ignoring invalid CORS method: {}", m);
                    None
                }
            })
            .collect();
        cors = cors.allowed_methods(methods);
    }

    if is_wildcard(&config.allowed_headers) {
        cors = cors.allow_any_header();
    } else {
        let headers: Vec<HeaderName> = config
            .allowed_headers
            .iter()
            .filter_map(|h| match HeaderName::from_bytes(h.trim().as_bytes()) {
                Ok(header) => Some(header),
                Err(_) => {
                    warn!("Ignoring invalid CORS header: {}", h);
                    None
                }
            })
            .collect();
        cors = cors.allowed_headers(headers);
    }

    cors
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, HttpResponse, test as actix_test, web};

    fn config(origins: &[&str]) -> CorsConfig {
        CorsConfig {
            allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
            allowed_methods: vec!["GET".to_string(), "post".to_string()],
            allowed_headers: vec!["Authorization".to_string(), "Content-Type".to_string()],
            max_age: 600,
        }
    }

    #[test]
    fn test_wildcard_detection() {
        assert!(is_wildcard(&[]));
        assert!(is_wildcard(&["*".to_string()]));
        assert!(!is_wildcard(&["http://localhost:5173".to_string()]));
    }

    #[actix_web::test]
    async fn test_configured_origin_is_allowed() {
        let app = actix_test::init_service(
            App::new()
                .wrap(build_cors(&config(&["http://localhost:5173"])))
                .route("/ping", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::default()
                .method(Method::OPTIONS)
                .uri("/ping")
                .insert_header((header::ORIGIN, "http://localhost:5173"))
                .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:5173"
        );

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/ping")
                .insert_header((header::ORIGIN, "http://localhost:5173"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:5173"
        );
    }

    #[actix_web::test]
    async fn test_wildcard_origin_allows_any() {
        let app = actix_test::init_service(
            App::new()
                .wrap(build_cors(&config(&["*"])))
                .route("/ping", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/ping")
                .insert_header((header::ORIGIN, "https://lms.example.org"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(
            resp.headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }
}
