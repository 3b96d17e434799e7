use serde::{Deserialize, Serialize};

use super::AdminError;
use crate::db::{Cursor, CursorDirection, ListParams};

/// Largest page size a list endpoint will return.
pub const MAX_LIMIT: i64 = 1000;

/// Query parameters shared by paginated list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Maximum number of results to return
    pub limit: Option<i64>,
    /// Cursor for keyset pagination, as returned in `next_cursor`/`prev_cursor`
    pub cursor: Option<String>,
    /// "forward" (default) or "backward"
    #[serde(default)]
    pub direction: Option<String>,
}

impl ListQuery {
    /// Convert to ListParams, rejecting malformed cursors and directions.
    pub fn try_into_params(self) -> Result<ListParams, AdminError> {
        let limit = match self.limit {
            Some(l) if l < 1 => {
                return Err(AdminError::BadRequest(format!(
                    "Invalid limit {}: must be at least 1",
                    l
                )));
            }
            Some(l) => Some(l.min(MAX_LIMIT)),
            None => None,
        };

        let cursor = match &self.cursor {
            Some(c) => Some(
                Cursor::decode(c)
                    .map_err(|e| AdminError::BadRequest(format!("Invalid cursor: {}", e)))?,
            ),
            None => None,
        };

        let direction = match self.direction.as_deref() {
            Some("backward") => CursorDirection::Backward,
            Some("forward") | None => CursorDirection::Forward,
            Some(other) => {
                return Err(AdminError::BadRequest(format!(
                    "Invalid direction '{}': must be 'forward' or 'backward'",
                    other
                )));
            }
        };

        Ok(ListParams {
            limit,
            cursor,
            direction,
            sort_order: Default::default(),
        })
    }
}

/// Pagination metadata for cursor-based list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub limit: i64,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
}

impl PaginationMeta {
    pub fn with_cursors(
        limit: i64,
        has_more: bool,
        next_cursor: Option<String>,
        prev_cursor: Option<String>,
    ) -> Self {
        Self {
            limit,
            has_more,
            next_cursor,
            prev_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_cursor_and_direction() {
        let query = ListQuery {
            cursor: Some("not-a-cursor".into()),
            ..Default::default()
        };
        assert!(matches!(
            query.try_into_params(),
            Err(AdminError::BadRequest(_))
        ));

        let query = ListQuery {
            direction: Some("sideways".into()),
            ..Default::default()
        };
        assert!(matches!(
            query.try_into_params(),
            Err(AdminError::BadRequest(_))
        ));

        let params = ListQuery {
            limit: Some(5),
            direction: Some("backward".into()),
            ..Default::default()
        }
        .try_into_params()
        .unwrap();
        assert_eq!(params.limit, Some(5));
        assert_eq!(params.direction, CursorDirection::Backward);
    }

    #[test]
    fn test_limit_bounds() {
        for bad in [0, -1, i64::MIN] {
            let query = ListQuery {
                limit: Some(bad),
                ..Default::default()
            };
            assert!(matches!(
                query.try_into_params(),
                Err(AdminError::BadRequest(_))
            ));
        }

        let params = ListQuery {
            limit: Some(i64::MAX),
            ..Default::default()
        }
        .try_into_params()
        .unwrap();
        assert_eq!(params.limit, Some(MAX_LIMIT));

        let params = ListQuery::default().try_into_params().unwrap();
        assert_eq!(params.limit, None);
    }
}
