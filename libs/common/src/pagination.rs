//! Pagination over composed aggregation pipelines
//!
//! [`paginate`] executes a composed pipeline twice — once under a `$count`
//! stage for the total, once with `$skip`/`$limit` for the requested slice —
//! and shapes the outcome into the uniform [`Page`] envelope. Requests past
//! the last page are not an error: they yield an empty slice with accurate
//! metadata.

use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::{Bson, Document, from_document};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{DatabaseError, DatabaseResult};
use crate::pipeline::stage;

/// Default page number when none is supplied
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size when none is supplied
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound on the page size accepted from a request
pub const MAX_LIMIT: u32 = 100;

/// A validated page/limit pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Build a request from raw query parameters, clamping the page to at
    /// least 1 and the limit into `1..=100`
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    /// Number of documents skipped before the requested slice
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// The uniform page envelope returned by every paginated endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub has_prev_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    /// Assemble a page from an already-fetched slice and the total match
    /// count
    pub fn from_slice(items: Vec<T>, total_items: u64, request: PageRequest) -> Self {
        let total_pages = total_items.div_ceil(u64::from(request.limit));

        Self {
            items,
            total_items,
            total_pages,
            current_page: request.page,
            has_prev_page: request.page > 1 && total_pages > 0,
            has_next_page: u64::from(request.page) < total_pages,
        }
    }
}

/// Execute a composed pipeline and return the requested page
pub async fn paginate<T>(
    collection: &Collection<Document>,
    pipeline: Vec<Document>,
    request: PageRequest,
) -> DatabaseResult<Page<T>>
where
    T: DeserializeOwned,
{
    let count_pipeline: Vec<Document> = pipeline
        .iter()
        .cloned()
        .chain([stage::count("total")])
        .collect();

    let mut cursor = collection
        .aggregate(count_pipeline)
        .await
        .map_err(DatabaseError::Query)?;

    // No document at all means the pipeline matched nothing.
    let total_items = match cursor.try_next().await.map_err(DatabaseError::Query)? {
        Some(doc) => read_count(&doc),
        None => 0,
    };

    let data_pipeline: Vec<Document> = pipeline
        .into_iter()
        .chain([
            stage::skip(request.skip()),
            stage::limit(i64::from(request.limit)),
        ])
        .collect();

    let mut cursor = collection
        .aggregate(data_pipeline)
        .await
        .map_err(DatabaseError::Query)?;

    let mut items = Vec::new();
    while let Some(doc) = cursor.try_next().await.map_err(DatabaseError::Query)? {
        items.push(from_document(doc).map_err(DatabaseError::Decode)?);
    }

    Ok(Page::from_slice(items, total_items, request))
}

/// Read the integer produced by a `$count` stage, whatever width the
/// server chose for it
fn read_count(doc: &Document) -> u64 {
    match doc.get("total") {
        Some(Bson::Int32(n)) => (*n).max(0) as u64,
        Some(Bson::Int64(n)) => (*n).max(0) as u64,
        Some(Bson::Double(n)) => n.max(0.0) as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn request_clamps_page_and_limit() {
        let request = PageRequest::new(Some(0), Some(0));
        assert_eq!(request, PageRequest { page: 1, limit: 1 });

        let request = PageRequest::new(None, Some(1000));
        assert_eq!(
            request,
            PageRequest {
                page: 1,
                limit: MAX_LIMIT
            }
        );

        let request = PageRequest::new(None, None);
        assert_eq!(
            request,
            PageRequest {
                page: DEFAULT_PAGE,
                limit: DEFAULT_LIMIT
            }
        );
    }

    #[test]
    fn request_skip_offsets_by_whole_pages() {
        assert_eq!(PageRequest::new(Some(1), Some(10)).skip(), 0);
        assert_eq!(PageRequest::new(Some(3), Some(10)).skip(), 20);
        assert_eq!(PageRequest::new(Some(7), Some(25)).skip(), 150);
    }

    #[test]
    fn page_metadata_for_a_middle_page() {
        let page: Page<i32> =
            Page::from_slice(vec![1, 2, 3], 9, PageRequest::new(Some(2), Some(3)));

        assert_eq!(page.total_items, 9);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);
        assert!(page.has_prev_page);
        assert!(page.has_next_page);
    }

    #[test]
    fn page_beyond_the_last_is_empty_with_accurate_counts() {
        let page: Page<i32> = Page::from_slice(vec![], 9, PageRequest::new(Some(5), Some(3)));

        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 9);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 5);
        assert!(page.has_prev_page);
        assert!(!page.has_next_page);
    }

    #[test]
    fn page_of_an_empty_result_set() {
        let page: Page<i32> = Page::from_slice(vec![], 0, PageRequest::new(Some(1), Some(10)));

        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_prev_page);
        assert!(!page.has_next_page);
    }

    #[test]
    fn partial_final_page_rounds_page_count_up() {
        let page: Page<i32> = Page::from_slice(vec![1], 7, PageRequest::new(Some(3), Some(3)));

        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next_page);
        assert!(page.has_prev_page);
    }

    #[test]
    fn count_reader_handles_server_integer_widths() {
        assert_eq!(read_count(&doc! { "total": 5_i32 }), 5);
        assert_eq!(read_count(&doc! { "total": 5_i64 }), 5);
        assert_eq!(read_count(&doc! {}), 0);
    }
}
