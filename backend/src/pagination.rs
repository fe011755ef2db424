//! Page-window arithmetic shared by every listable collection.
//!
//! Windows are computed as `offset = (page - 1) * limit` and the page count as
//! `ceil(total / limit)`. The requested page is echoed back untouched: a page past
//! the end yields an empty window, never an error, and clamping is left to the UI.

use serde::Deserialize;
use utoipa::IntoParams;

/// PageParams
///
/// Raw `?page=&limit=` query parameters. Kept as text so that a malformed value falls
/// back to the default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PageParams {
    /// 1-based page number. Non-numeric or zero means 1.
    pub page: Option<String>,
    /// Items per page. Non-numeric, zero or negative means the route default.
    pub limit: Option<String>,
}

impl PageParams {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page.to_string()),
            limit: Some(limit.to_string()),
        }
    }

    /// Resolves the request against a route's default page size.
    pub fn resolve(&self, default_limit: i64) -> PageRequest {
        let page = self
            .page
            .as_deref()
            .and_then(parse_leading_int)
            .filter(|p| *p != 0)
            .unwrap_or(1);
        let limit = self
            .limit
            .as_deref()
            .and_then(parse_leading_int)
            .filter(|l| *l > 0)
            .unwrap_or(default_limit.max(1));
        PageRequest { page, limit }
    }
}

/// PageRequest
///
/// A resolved request. `limit` is always at least 1; `page` may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Offset of the first row of the page. Negative for pages below 1.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Offset handed to the store, floored at zero.
    pub fn query_offset(&self) -> i64 {
        self.offset().max(0)
    }
}

/// Window
///
/// Outcome of `paginate`: where to start reading and how many pages exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub total_pages: i64,
}

/// Pure pagination: `offset = (page-1)*limit`, `total_pages = ceil(total/limit)`.
///
/// An empty collection has `total_pages == 0`, which callers tell apart from a page
/// that merely lies past the end (`page > total_pages > 0`).
pub fn paginate(total_count: i64, page: i64, limit: i64) -> Window {
    let limit = limit.max(1);
    let total = total_count.max(0);
    Window {
        offset: (page - 1).saturating_mul(limit),
        total_pages: total_pages(total, limit),
    }
}

/// `ceil(total / limit)` without the `total + limit - 1` sum, which overflows for a
/// client-supplied limit near `i64::MAX`.
pub fn total_pages(total_count: i64, limit: i64) -> i64 {
    let limit = limit.max(1);
    let total = total_count.max(0);
    total / limit + i64::from(total % limit != 0)
}

/// Parses an optional sign followed by leading digits, ignoring anything after them
/// ("3abc" is 3, "abc" is nothing).
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::parse_leading_int;

    #[test]
    fn leading_int_parse() {
        assert_eq!(parse_leading_int("12"), Some(12));
        assert_eq!(parse_leading_int(" 7px"), Some(7));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }
}
