/// JSON response envelope and pagination helpers
///
/// Every success response is `{success: true, data, message?, pagination?}`;
/// the matching error envelope lives in [`crate::error`]. List endpoints take
/// `page`/`limit` query parameters and echo totals back in `pagination`.

use serde::{Deserialize, Serialize};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Plain `{success, data}` envelope
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
        }
    }

    /// Envelope with a pagination block
    pub fn paginated(data: T, pagination: Pagination) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: Some(pagination),
        }
    }
}

impl ApiResponse<()> {
    /// Message-only envelope for deletes and state changes
    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
            pagination: None,
        }
    }
}

/// Pagination block echoed on list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    /// Builds the block from the request page/limit and the filtered total
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: if limit > 0 {
                (total + limit - 1) / limit
            } else {
                0
            },
        }
    }
}

/// `page`/`limit` query parameters with clamped defaults
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Resolves to (page, limit, offset), clamping limit to 1..=100
    pub fn resolve(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (page, limit, (page - 1) * limit)
    }

    /// Same as [`PageParams::resolve`] with a different default limit
    pub fn resolve_with_default(&self, default_limit: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT);
        (page, limit, (page - 1) * limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).pages, 1);
        assert_eq!(Pagination::new(1, 10, 11).pages, 2);
        assert_eq!(Pagination::new(1, 10, 95).pages, 10);
    }

    #[test]
    fn test_page_params_defaults() {
        let params = PageParams {
            page: None,
            limit: None,
        };
        assert_eq!(params.resolve(), (1, 10, 0));
    }

    #[test]
    fn test_page_params_offset() {
        let params = PageParams {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(params.resolve(), (3, 20, 40));
    }

    #[test]
    fn test_page_params_clamps() {
        let params = PageParams {
            page: Some(0),
            limit: Some(10_000),
        };
        let (page, limit, offset) = params.resolve();
        assert_eq!(page, 1);
        assert_eq!(limit, 100);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::data(vec![1, 2, 3])).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], serde_json::json!([1, 2, 3]));
        assert!(body.get("pagination").is_none());

        let body = serde_json::to_value(ApiResponse::message("Task archived successfully")).unwrap();
        assert_eq!(body["message"], "Task archived successfully");
        assert!(body.get("data").is_none());
    }
}
