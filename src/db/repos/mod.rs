pub mod cursor;
mod groups;
mod identity_sync_configs;
mod identity_sync_mappings;
mod organizations;
mod projects;
mod sync_logs;
mod users;

pub use cursor::*;
pub use groups::*;
pub use identity_sync_configs::*;
pub use identity_sync_mappings::*;
pub use organizations::*;
pub use projects::*;
pub use sync_logs::*;
pub use users::*;

/// Sort order for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first
    Asc,
    /// Newest first
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// SQL pieces for a keyset query: `(comparison, ORDER BY direction, reverse_results)`.
    ///
    /// Backward pages are fetched in the opposite order and reversed so the
    /// caller always receives items in this sort order.
    pub fn cursor_query_params(
        &self,
        direction: CursorDirection,
    ) -> (&'static str, &'static str, bool) {
        match (self, direction) {
            (SortOrder::Desc, CursorDirection::Forward) => ("<", "DESC", false),
            (SortOrder::Desc, CursorDirection::Backward) => (">", "ASC", true),
            (SortOrder::Asc, CursorDirection::Forward) => (">", "ASC", false),
            (SortOrder::Asc, CursorDirection::Backward) => ("<", "DESC", true),
        }
    }
}

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Maximum number of records to return (repositories default to 100).
    pub limit: Option<i64>,
    /// Start after this position.
    pub cursor: Option<Cursor>,
    pub direction: CursorDirection,
    pub sort_order: SortOrder,
}

/// One page of a list query.
#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub cursors: PageCursors,
}

impl<T> ListResult<T> {
    pub fn new(items: Vec<T>, has_more: bool, cursors: PageCursors) -> Self {
        Self {
            items,
            has_more,
            cursors,
        }
    }
}
