use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 分页查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationQuery {
    #[serde(
        default = "default_page",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub page: i64,
    // 兼容前端的 `limit` 参数
    #[serde(
        default = "default_size",
        alias = "limit",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub size: i64,
}

/// 每页数量上限
pub const MAX_PAGE_SIZE: i64 = 100;
/// 页码上限，保证 (page - 1) * size 不会溢出偏移量
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// 规范化页码与每页数量：1 <= page <= MAX_PAGE，1 <= size <= 100，缺省为第 1 页每页 10 条
pub fn normalize_page(page: Option<i64>, size: Option<i64>) -> (u64, u64) {
    (
        page.unwrap_or(1).clamp(1, MAX_PAGE) as u64,
        size.unwrap_or(10).clamp(1, MAX_PAGE_SIZE) as u64,
    )
}

// 分页响应信息
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationInfo {
    pub fn new(page: u64, page_size: u64, total: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };
        Self {
            page: page as i64,
            page_size: page_size as i64,
            total: total as i64,
            total_pages: total_pages as i64,
        }
    }
}

// 分页列表响应
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginatedResponse<T: TS> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

// 自定义反序列化函数，支持字符串到i64的转换
fn deserialize_string_to_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Unexpected, Visitor};
    use std::fmt;

    struct I64Visitor;

    impl<'de> Visitor<'de> for I64Visitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            if value <= i64::MAX as u64 {
                Ok(value as i64)
            } else {
                Err(Error::invalid_value(Unexpected::Unsigned(value), &self))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            value
                .parse()
                .map_err(|_| Error::invalid_value(Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(I64Visitor)
}

/// 查询串中 `#[serde(flatten)]` 会把所有值缓冲为字符串，数值筛选字段需宽松解析
pub(crate) fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(value)) => Ok(Some(value)),
        Some(Raw::Str(value)) if value.trim().is_empty() => Ok(None),
        Some(Raw::Str(value)) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid integer: {value}"))),
    }
}

pub(crate) fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Str(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Bool(value)) => Ok(Some(value)),
        Some(Raw::Str(value)) => match value.trim() {
            "" => Ok(None),
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!("invalid boolean: {other}"))),
        },
    }
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    10
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self { page: 1, size: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(flatten)]
        pagination: PaginationQuery,
        search: Option<String>,
    }

    #[test]
    fn test_pagination_from_query_string() {
        let parsed: PaginationQuery = serde_json::from_str(r#"{"page":"2","size":"5"}"#).unwrap();
        assert_eq!(parsed.page, 2);
        assert_eq!(parsed.size, 5);
    }

    #[test]
    fn test_limit_alias() {
        let parsed: PaginationQuery = serde_json::from_str(r#"{"page":3,"limit":5}"#).unwrap();
        assert_eq!(parsed.page, 3);
        assert_eq!(parsed.size, 5);
    }

    #[test]
    fn test_defaults_with_flatten() {
        let parsed: Wrapper = serde_json::from_str(r#"{"search":"rust"}"#).unwrap();
        assert_eq!(parsed.pagination.page, 1);
        assert_eq!(parsed.pagination.size, 10);
        assert_eq!(parsed.search.as_deref(), Some("rust"));
    }

    #[derive(Debug, Deserialize)]
    struct Filtered {
        #[serde(flatten)]
        #[allow(dead_code)]
        pagination: PaginationQuery,
        #[serde(default, deserialize_with = "deserialize_optional_i64")]
        course_id: Option<i64>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        graded: Option<bool>,
    }

    #[test]
    fn test_optional_filters_from_strings() {
        let parsed: Filtered =
            serde_json::from_str(r#"{"page":"1","course_id":"7","graded":"false"}"#).unwrap();
        assert_eq!(parsed.course_id, Some(7));
        assert_eq!(parsed.graded, Some(false));

        let parsed: Filtered = serde_json::from_str(r#"{"course_id":3,"graded":true}"#).unwrap();
        assert_eq!(parsed.course_id, Some(3));
        assert_eq!(parsed.graded, Some(true));

        let parsed: Filtered = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(parsed.course_id, None);
        assert_eq!(parsed.graded, None);

        assert!(serde_json::from_str::<Filtered>(r#"{"course_id":"abc"}"#).is_err());
    }

    #[test]
    fn test_normalize_page_clamps_values() {
        assert_eq!(normalize_page(None, None), (1, 10));
        assert_eq!(normalize_page(Some(0), Some(500)), (1, 100));
        assert_eq!(normalize_page(Some(4), Some(0)), (4, 1));
    }

    #[test]
    fn test_huge_page_does_not_overflow_offset() {
        let (page, size) = normalize_page(Some(i64::MAX), Some(100));
        assert_eq!(page, MAX_PAGE as u64);
        assert!(
            (page - 1)
                .checked_mul(size)
                .is_some_and(|offset| offset <= i64::MAX as u64)
        );
    }

    #[test]
    fn test_pagination_info_total_pages() {
        let info = PaginationInfo::new(1, 5, 11);
        assert_eq!(info.total_pages, 3);
        let info = PaginationInfo::new(1, 5, 0);
        assert_eq!(info.total_pages, 0);
    }
}
