//! Product catalog: CSV parsing, the identifier index, and the cache.
//!
//! The catalog is a small comma-delimited file with a header row. Parsing is
//! deliberately naive:
//!
//! - lines are split on `'\n'` (a trailing `'\r'` is dropped),
//! - the first line is the header,
//! - every other line is split on `,` and zipped against the header.
//!
//! There is no quoting support, so a value containing a comma shifts every
//! later column of its row. A trailing blank line yields a row whose values
//! are all absent; [`CatalogIndex`] skips rows without an identifier.
//!
//! # Caching
//!
//! The catalog is static for the lifetime of a session. [`CatalogCache`]
//! fetches it once through a [`SimilarityBackend`] and hands out the same
//! [`CatalogIndex`] until [`invalidate`](CatalogCache::invalidate) is called.
//! With caching disabled every call re-fetches.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::client::SimilarityBackend;
use crate::error::Result;
use crate::models::CatalogRow;

/// Parse catalog text into rows, in file order.
///
/// Empty text yields no rows. An empty first line still counts as the
/// header, with one column named `""`.
///
/// # Example
///
/// ```rust
/// use lookbook::catalog::parse_catalog;
///
/// let rows = parse_catalog("Image,ImageURL,ProductTitle\n1.jpg,http://x/1.jpg,Red Shoe");
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].product_title(), Some("Red Shoe"));
/// ```
pub fn parse_catalog(text: &str) -> Vec<CatalogRow> {
    let mut lines = text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

    // `split` always yields at least one item; an empty header line is a
    // single column named "".
    let headers: Vec<&str> = match lines.next() {
        Some(header) => header.split(',').collect(),
        None => return Vec::new(),
    };

    lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').collect();
            let mut row = CatalogRow::new();
            for (index, header) in headers.iter().enumerate() {
                // An empty line splits into one empty field; treat it as absent.
                let value = values
                    .get(index)
                    .filter(|v| !(line.is_empty() && v.is_empty()))
                    .map(|v| v.to_string());
                row.insert(*header, value);
            }
            row
        })
        .collect()
}

/// Catalog rows keyed by image identifier.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    rows: HashMap<String, CatalogRow>,
}

impl CatalogIndex {
    /// Build the index; a later row with the same identifier replaces an earlier one.
    pub fn from_rows(rows: Vec<CatalogRow>) -> Self {
        let total = rows.len();
        let mut index = HashMap::with_capacity(total);
        for row in rows {
            match row.image() {
                Some(image) if !image.is_empty() => {
                    index.insert(image.to_string(), row);
                }
                _ => {}
            }
        }
        if total > 0 && index.is_empty() {
            warn!(rows = total, "catalog has no rows with an Image column value");
        }
        Self { rows: index }
    }

    pub fn parse(text: &str) -> Self {
        Self::from_rows(parse_catalog(text))
    }

    /// Exact-string lookup.
    pub fn get(&self, identifier: &str) -> Option<&CatalogRow> {
        self.rows.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Process-wide catalog, fetched once and reused across submissions.
pub struct CatalogCache {
    enabled: bool,
    slot: Mutex<Option<Arc<CatalogIndex>>>,
}

impl CatalogCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            slot: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the cached index, fetching the catalog if needed.
    ///
    /// The lock is held across the fetch, so concurrent first callers
    /// share one request.
    pub async fn get_or_fetch(&self, backend: &dyn SimilarityBackend) -> Result<Arc<CatalogIndex>> {
        if !self.enabled {
            return fetch_index(backend).await;
        }

        let mut slot = self.slot.lock().await;
        if let Some(index) = slot.as_ref() {
            debug!(entries = index.len(), "catalog cache hit");
            return Ok(Arc::clone(index));
        }

        let index = fetch_index(backend).await?;
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Drop the cached catalog; the next submission fetches it again.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        if slot.take().is_some() {
            debug!("catalog cache invalidated");
        }
    }
}

async fn fetch_index(backend: &dyn SimilarityBackend) -> Result<Arc<CatalogIndex>> {
    let text = backend.fetch_catalog().await?;
    let index = CatalogIndex::parse(&text);
    debug!(entries = index.len(), bytes = text.len(), "catalog fetched");
    Ok(Arc::new(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageUpload;
    use crate::models::SimilarityResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HEADER: &str = "Image,ImageURL,ProductTitle";

    #[test]
    fn test_parse_single_row() {
        let rows = parse_catalog(&format!("{HEADER}\n1.jpg,http://cdn/1.jpg,Red Shoe"));
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(
            row.columns().collect::<Vec<_>>(),
            vec!["Image", "ImageURL", "ProductTitle"]
        );
        assert_eq!(row.image(), Some("1.jpg"));
        assert_eq!(row.image_url(), Some("http://cdn/1.jpg"));
        assert_eq!(row.product_title(), Some("Red Shoe"));
    }

    #[test]
    fn test_parse_trailing_newline_yields_blank_row() {
        let rows = parse_catalog(&format!("{HEADER}\n1.jpg,u,T\n"));
        assert_eq!(rows.len(), 2);
        assert!(rows[1].is_blank());
        assert_eq!(rows[1].len(), 3);
        assert_eq!(rows[1].image(), None);
    }

    #[test]
    fn test_parse_short_row_has_absent_values() {
        let rows = parse_catalog(&format!("{HEADER}\n1.jpg"));
        assert_eq!(rows[0].image(), Some("1.jpg"));
        assert_eq!(rows[0].image_url(), None);
        assert_eq!(rows[0].product_title(), None);
    }

    #[test]
    fn test_parse_comma_in_value_shifts_columns() {
        let rows = parse_catalog(&format!("{HEADER}\n1.jpg,u,Shoe, Red"));
        assert_eq!(rows[0].product_title(), Some("Shoe"));
        assert_eq!(rows[0].len(), 3);
    }

    #[test]
    fn test_parse_crlf() {
        let rows = parse_catalog("Image,ImageURL,ProductTitle\r\n1.jpg,u,Hat\r\n");
        assert_eq!(rows[0].product_title(), Some("Hat"));
        assert_eq!(rows[0].columns().last(), Some("ProductTitle"));
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(parse_catalog("").is_empty());
        assert!(parse_catalog(HEADER).is_empty());
    }

    #[test]
    fn test_parse_empty_header_is_one_unnamed_column() {
        let rows = parse_catalog("\nfoo\nbar,baz");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec![""]);
        assert_eq!(rows[0].get(""), Some("foo"));
        assert_eq!(rows[1].get(""), Some("bar"));
        assert_eq!(rows[1].len(), 1);
        assert!(CatalogIndex::from_rows(rows).is_empty());
    }

    #[test]
    fn test_index_last_duplicate_wins_and_skips_blank() {
        let index = CatalogIndex::parse(&format!(
            "{HEADER}\n1.jpg,u1,First\n2.jpg,u2,Other\n1.jpg,u3,Second\n"
        ));
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("1.jpg").unwrap().product_title(), Some("Second"));
        assert!(index.get("").is_none());
        assert!(index.get("1.JPG").is_none());
    }

    struct CountingBackend {
        catalog_fetches: AtomicUsize,
    }

    #[async_trait]
    impl SimilarityBackend for CountingBackend {
        async fn upload(&self, _image: &ImageUpload) -> Result<SimilarityResponse> {
            Ok(SimilarityResponse::Matches(vec![]))
        }

        async fn fetch_catalog(&self) -> Result<String> {
            self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{HEADER}\n1.jpg,u,T\n"))
        }
    }

    #[tokio::test]
    async fn test_cache_fetches_once_until_invalidated() {
        let backend = CountingBackend {
            catalog_fetches: AtomicUsize::new(0),
        };
        let cache = CatalogCache::new(true);

        let first = cache.get_or_fetch(&backend).await.unwrap();
        let second = cache.get_or_fetch(&backend).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(backend.catalog_fetches.load(Ordering::SeqCst), 1);

        cache.invalidate().await;
        cache.get_or_fetch(&backend).await.unwrap();
        assert_eq!(backend.catalog_fetches.load(Ordering::SeqCst), 2);
    }

    struct SlowBackend {
        catalog_fetches: AtomicUsize,
    }

    #[async_trait]
    impl SimilarityBackend for SlowBackend {
        async fn upload(&self, _image: &ImageUpload) -> Result<SimilarityResponse> {
            Ok(SimilarityResponse::Matches(vec![]))
        }

        async fn fetch_catalog(&self) -> Result<String> {
            self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(format!("{HEADER}\n1.jpg,u,T\n"))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_fetches_share_one_request() {
        let backend = Arc::new(SlowBackend {
            catalog_fetches: AtomicUsize::new(0),
        });
        let cache = Arc::new(CatalogCache::new(true));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let backend = Arc::clone(&backend);
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_or_fetch(backend.as_ref()).await })
            })
            .collect();

        let mut indexes = Vec::new();
        for handle in handles {
            indexes.push(handle.await.unwrap().unwrap());
        }
        assert_eq!(backend.catalog_fetches.load(Ordering::SeqCst), 1);
        assert!(indexes.iter().all(|index| Arc::ptr_eq(index, &indexes[0])));
    }

    #[tokio::test]
    async fn test_disabled_cache_always_fetches() {
        let backend = CountingBackend {
            catalog_fetches: AtomicUsize::new(0),
        };
        let cache = CatalogCache::new(false);
        for _ in 0..3 {
            cache.get_or_fetch(&backend).await.unwrap();
        }
        assert_eq!(backend.catalog_fetches.load(Ordering::SeqCst), 3);
    }
}
