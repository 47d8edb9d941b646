//! Cursor-based pagination utilities for list endpoints.

use gatewatch_access::Page;
use serde::{Deserialize, Serialize};

use crate::RpcError;

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Common pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Opaque cursor from a previous response (hex-encoded offset).
    pub cursor: Option<String>,
    /// Number of items per page (default 100, max 1000).
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Resolve effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Offset encoded in the cursor; `0` when there is no cursor.
    pub fn decode_offset(&self) -> Result<u64, RpcError> {
        match self.cursor.as_deref() {
            None | Some("") => Ok(0),
            Some(c) => decode_cursor(c)
                .ok_or_else(|| RpcError::InvalidRequest(format!("malformed cursor '{c}'"))),
        }
    }

    pub fn page(&self) -> Result<Page, RpcError> {
        let offset = usize::try_from(self.decode_offset()?)
            .map_err(|_| RpcError::InvalidRequest("cursor out of range".into()))?;
        Ok(Page {
            offset,
            limit: self.effective_count() as usize,
        })
    }
}

/// One page of a list response.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Cursor to pass for the next page, or absent if this is the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: Page) -> Self {
        let cursor = next_cursor(page.offset as u64, items.len(), page.limit as u32);
        Self { items, cursor }
    }
}

/// Encode a numeric offset into an opaque cursor string.
pub fn encode_cursor(offset: u64) -> String {
    hex::encode(offset.to_be_bytes())
}

/// Decode a cursor string back to a numeric offset.
pub fn decode_cursor(cursor: &str) -> Option<u64> {
    let bytes: [u8; 8] = hex::decode(cursor).ok()?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Compute the next-page cursor given the current offset and the number of
/// items returned. Returns `None` when fewer items than `count` were returned
/// (meaning we've reached the end).
pub fn next_cursor(current_offset: u64, returned: usize, page_size: u32) -> Option<String> {
    if (returned as u32) < page_size {
        None
    } else {
        Some(encode_cursor(current_offset + returned as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_roundtrip() {
        for offset in [0u64, 1, 42, 100, 999, 123456789] {
            let encoded = encode_cursor(offset);
            assert_eq!(decode_cursor(&encoded), Some(offset), "roundtrip failed for {offset}");
        }
    }

    #[test]
    fn malformed_cursor_is_rejected() {
        assert_eq!(decode_cursor("zz"), None);
        assert_eq!(decode_cursor("00ff"), None);
        let p = PaginationParams {
            cursor: Some("not-hex".into()),
            count: None,
        };
        assert!(matches!(p.page(), Err(RpcError::InvalidRequest(_))));
    }

    #[test]
    fn next_cursor_returns_none_at_end() {
        assert!(next_cursor(0, 50, 100).is_none());
    }

    #[test]
    fn next_cursor_returns_some_when_full_page() {
        let c = next_cursor(0, 100, 100);
        assert_eq!(decode_cursor(c.as_deref().unwrap()), Some(100));
    }

    #[test]
    fn effective_count_defaults_and_clamps() {
        let p = PaginationParams::default();
        assert_eq!(p.effective_count(), 100);
        assert_eq!(p.page().unwrap(), Page { offset: 0, limit: 100 });

        let big = PaginationParams {
            cursor: None,
            count: Some(5000),
        };
        assert_eq!(big.effective_count(), 1000);

        let zero = PaginationParams {
            cursor: None,
            count: Some(0),
        };
        assert_eq!(zero.effective_count(), 1);
    }
}
