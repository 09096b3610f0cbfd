//! Catalog Paginator: drains page 0, 1, 2, ... of one host.
//!
//! Any non-`Items` result ends the walk and whatever was collected so far
//! is returned. A mid-run network blip therefore truncates the catalog
//! instead of failing the run.

use crate::api::CatalogItem;
use crate::client::{PageFetcher, PageResult};
use crate::config::HarvestConfig;
use tracing::{debug, info, warn};

pub struct Paginator<'a, F: PageFetcher> {
    fetcher: &'a F,
    config: &'a HarvestConfig,
}

impl<'a, F: PageFetcher> Paginator<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a HarvestConfig) -> Self {
        Self { fetcher, config }
    }

    pub async fn paginate(&self, host: &str) -> Vec<CatalogItem> {
        let mut items = Vec::new();
        let mut page = 0u32;

        loop {
            let url = self.config.page_url(host, page);
            info!("Fetching page {}", page);

            match self.fetch_page(&url).await {
                PageResult::Items(batch) => {
                    debug!("Page {} returned {} items", page, batch.len());
                    items.extend(batch);
                    page += 1;
                }
                PageResult::Empty => {
                    info!("Page {} is empty, catalog complete", page);
                    break;
                }
                other => {
                    warn!(
                        "Stopping at page {} ({}), keeping {} items",
                        page,
                        other.describe(),
                        items.len()
                    );
                    break;
                }
            }
        }

        items
    }

    /// One page with the configured number of immediate retries.
    /// Only retryable transport failures are attempted again.
    async fn fetch_page(&self, url: &str) -> PageResult {
        let mut attempt = 0;
        loop {
            let result = self.fetcher.fetch(url).await;
            match &result {
                PageResult::TransportError(kind)
                    if kind.is_retryable() && attempt < self.config.page_retries =>
                {
                    attempt += 1;
                    warn!("Page request failed ({}), retry {}", kind, attempt);
                }
                _ => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportKind;
    use crate::scripted::ScriptedFetcher;

    const HOST: &str = "https://m.mirror1.sbs";

    fn config(retries: u32) -> HarvestConfig {
        HarvestConfig {
            api_path_template: "/api/{page}".into(),
            page_retries: retries,
            ..Default::default()
        }
    }

    fn item(id: i64) -> CatalogItem {
        CatalogItem {
            id: id.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_items_then_empty() {
        let fetcher = ScriptedFetcher::new()
            .respond(format!("{HOST}/api/0"), PageResult::Items(vec![item(1), item(2)]))
            .respond(format!("{HOST}/api/1"), PageResult::Empty);
        let config = config(0);

        let items = Paginator::new(&fetcher, &config).paginate(HOST).await;

        assert_eq!(items, vec![item(1), item(2)]);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_on_first_page() {
        let fetcher =
            ScriptedFetcher::new().respond(format!("{HOST}/api/0"), PageResult::HttpError(500));
        let config = config(2);

        let items = Paginator::new(&fetcher, &config).paginate(HOST).await;

        assert!(items.is_empty());
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_truncates() {
        let fetcher = ScriptedFetcher::new()
            .respond(format!("{HOST}/api/0"), PageResult::Items(vec![item(1)]))
            .respond(format!("{HOST}/api/1"), PageResult::Items(vec![item(2)]))
            .respond(
                format!("{HOST}/api/2"),
                PageResult::TransportError(TransportKind::Timeout),
            );
        let config = config(0);

        let items = Paginator::new(&fetcher, &config).paginate(HOST).await;

        assert_eq!(items, vec![item(1), item(2)]);
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_retry_recovers_page() {
        let fetcher = ScriptedFetcher::new()
            .respond(
                format!("{HOST}/api/0"),
                PageResult::TransportError(TransportKind::Connect),
            )
            .respond(format!("{HOST}/api/0"), PageResult::Items(vec![item(9)]))
            .respond(format!("{HOST}/api/1"), PageResult::Empty);
        let config = config(1);

        let items = Paginator::new(&fetcher, &config).paginate(HOST).await;

        assert_eq!(items, vec![item(9)]);
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_parse_error_not_retried() {
        let fetcher = ScriptedFetcher::new().respond(
            format!("{HOST}/api/0"),
            PageResult::TransportError(TransportKind::Parse),
        );
        let config = config(3);

        let items = Paginator::new(&fetcher, &config).paginate(HOST).await;

        assert!(items.is_empty());
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicates_across_pages_kept() {
        let fetcher = ScriptedFetcher::new()
            .respond(format!("{HOST}/api/0"), PageResult::Items(vec![item(1)]))
            .respond(format!("{HOST}/api/1"), PageResult::Items(vec![item(1)]))
            .respond(format!("{HOST}/api/2"), PageResult::Empty);
        let config = config(0);

        let items = Paginator::new(&fetcher, &config).paginate(HOST).await;
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_loosely_typed_page_does_not_stop_the_walk() {
        let page = |body: &str| crate::client::classify_body(body.as_bytes());
        let fetcher = ScriptedFetcher::new()
            .respond(
                format!("{HOST}/api/0"),
                page(r#"[{"title": "A", "sources": [{"url": "https://c/a.m3u8"}]}]"#),
            )
            .respond(
                format!("{HOST}/api/1"),
                page(r#"[{"title": 2012, "genres": [null], "sources": [{"url": "https://c/b.m3u8", "quality": 720}]}]"#),
            )
            .respond(
                format!("{HOST}/api/2"),
                page(r#"[{"title": "C", "sources": [{"url": "https://c/c.m3u8"}]}]"#),
            )
            .respond(format!("{HOST}/api/3"), PageResult::Empty);
        let config = config(0);

        let items = Paginator::new(&fetcher, &config).paginate(HOST).await;

        let titles: Vec<_> = items.iter().map(|i| i.title()).collect();
        assert_eq!(titles, vec!["A", "2012", "C"]);
        assert!(items.iter().all(|i| i.has_usable_link()));
        assert_eq!(fetcher.calls().len(), 4);
    }
}
