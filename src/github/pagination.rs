//! Cursor state for GraphQL connection pagination.
//!
//! GitHub's GraphQL connections expose `pageInfo { endCursor hasNextPage }`.
//! `PageCursor` holds the position a walker resumes from and whether another
//! page exists. Cursors live only in memory for the duration of one walk.

use serde::Deserialize;

/// Position within a paginated GraphQL connection.
///
/// # Example
///
/// ```
/// use devtalk::github::pagination::PageCursor;
///
/// let start = PageCursor::start();
/// assert!(start.has_next());
/// assert_eq!(start.after(), None);
///
/// let next = PageCursor::new(Some("Y3Vyc29yOjI=".to_owned()), false);
/// assert!(next.is_last_page());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageCursor {
    /// Opaque cursor to pass as `after` for the next page.
    end_cursor: Option<String>,
    /// Whether more pages exist after this position.
    has_next: bool,
    /// False only for the position before the first page.
    reported: bool,
}

impl PageCursor {
    /// Creates a cursor from the values reported by GitHub.
    #[must_use]
    pub const fn new(end_cursor: Option<String>, has_next: bool) -> Self {
        Self {
            end_cursor,
            has_next,
            reported: true,
        }
    }

    /// Cursor positioned before the first page.
    #[must_use]
    pub const fn start() -> Self {
        Self {
            end_cursor: None,
            has_next: true,
            reported: false,
        }
    }

    /// Cursor for a connection with nothing left to fetch.
    #[must_use]
    pub const fn exhausted() -> Self {
        Self {
            end_cursor: None,
            has_next: false,
            reported: true,
        }
    }

    /// Value to send as the `after` variable.
    #[must_use]
    pub fn after(&self) -> Option<&str> {
        self.end_cursor.as_deref()
    }

    /// Returns true if more pages exist after the current position.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.has_next
    }

    /// Returns true if this is the last page.
    #[must_use]
    pub const fn is_last_page(&self) -> bool {
        !self.has_next
    }

    /// Returns true when GitHub claims another page exists but supplied no
    /// cursor to reach it.
    #[must_use]
    pub const fn is_stuck(&self) -> bool {
        self.reported && self.has_next && self.end_cursor.is_none()
    }
}

/// Wire form of `pageInfo`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct ApiPageInfo {
    pub(crate) end_cursor: Option<String>,
    pub(crate) has_next_page: bool,
}

impl From<ApiPageInfo> for PageCursor {
    fn from(value: ApiPageInfo) -> Self {
        Self::new(value.end_cursor, value.has_next_page)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::PageCursor;

    #[rstest]
    #[case::start(PageCursor::start(), true, false)]
    #[case::exhausted(PageCursor::exhausted(), false, false)]
    #[case::middle(PageCursor::new(Some("abc".to_owned()), true), true, false)]
    #[case::stuck(PageCursor::new(None, true), true, true)]
    fn navigation_predicates(
        #[case] cursor: PageCursor,
        #[case] has_next: bool,
        #[case] stuck: bool,
    ) {
        assert_eq!(cursor.has_next(), has_next);
        assert_eq!(cursor.is_last_page(), !has_next);
        assert_eq!(cursor.is_stuck(), stuck);
    }
}
