//! Probe → paginate → build → write, as one run.

use crate::client::PageFetcher;
use crate::config::HarvestConfig;
use crate::errors::HarvestError;
use crate::paginator::Paginator;
use crate::playlist::{Playlist, RenderOptions};
use crate::prober::{DiscoveredHost, Prober};
use crate::writer::write_playlist;
use std::path::PathBuf;
use tracing::info;

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestReport {
    pub host: DiscoveredHost,
    pub items_fetched: usize,
    pub entries_written: usize,
    pub categories: Vec<(String, usize)>,
    pub output_path: PathBuf,
}

/// Result of the network phase, before anything touches the disk
#[derive(Debug, Clone)]
pub struct Harvest {
    pub host: DiscoveredHost,
    pub items_fetched: usize,
    pub playlist: Playlist,
}

/// Discover a host, drain its catalog and build the playlist.
///
/// Fails only when no mirror is accepted or the catalog holds no playable
/// link; every per-request failure is handled further down.
pub async fn harvest<F: PageFetcher>(
    fetcher: &F,
    config: &HarvestConfig,
) -> Result<Harvest, HarvestError> {
    let host = Prober::new(fetcher, config)
        .probe()
        .await
        .ok_or(HarvestError::NoUsableServer {
            start: config.range_start,
            end: config.range_end,
        })?;

    info!("Fetching the full catalog from {}", host.base_url);
    let items = Paginator::new(fetcher, config).paginate(&host.base_url).await;
    info!("Fetched {} catalog items", items.len());

    let opts = RenderOptions::from(config);
    info!("Building playlist ({})", opts.link_policy.display_name());
    let playlist = Playlist::build(&items, &opts);
    if playlist.is_empty() {
        return Err(HarvestError::NoUsableLinks { items: items.len() });
    }

    Ok(Harvest {
        host,
        items_fetched: items.len(),
        playlist,
    })
}

/// Full run. Nothing is written unless a playable playlist was built.
pub async fn run<F: PageFetcher>(
    fetcher: &F,
    config: &HarvestConfig,
) -> Result<HarvestReport, HarvestError> {
    config.validate()?;

    let harvest = harvest(fetcher, config).await?;
    let opts = RenderOptions::from(config);
    let output_path = PathBuf::from(&config.output_filename);

    info!("Writing {} entries", harvest.playlist.entry_count());
    write_playlist(&output_path, &harvest.playlist.render(&opts))?;

    Ok(HarvestReport {
        host: harvest.host,
        items_fetched: harvest.items_fetched,
        entries_written: harvest.playlist.entry_count(),
        categories: harvest
            .playlist
            .categories()
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect(),
        output_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CatalogItem, Genre, StreamSource};
    use crate::client::PageResult;
    use crate::scripted::ScriptedFetcher;

    fn config(output: PathBuf) -> HarvestConfig {
        HarvestConfig {
            range_start: 1,
            range_end: 2,
            host_template: "https://m{n}.test".into(),
            api_path_template: "/api/{page}".into(),
            output_filename: output.to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    fn movie(genre: &str, url: &str) -> CatalogItem {
        CatalogItem {
            title: Some("Film".into()),
            genres: vec![Genre {
                title: Some(genre.into()),
            }],
            sources: vec![StreamSource {
                url: Some(url.into()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_writes_playlist_from_single_host() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.m3u");
        let page0 = vec![movie("Drama", "https://cdn/1.m3u8")];
        let fetcher = ScriptedFetcher::new()
            .respond("https://m1.test/api/0", PageResult::HttpError(502))
            .respond("https://m2.test/api/0", PageResult::Items(page0.clone()))
            .respond("https://m2.test/api/0", PageResult::Items(page0))
            .respond(
                "https://m2.test/api/1",
                PageResult::Items(vec![movie("Action", "https://cdn/2.m3u8")]),
            )
            .respond("https://m2.test/api/2", PageResult::Empty);

        let report = run(&fetcher, &config(output.clone())).await.unwrap();

        assert_eq!(report.host.index, 2);
        assert_eq!(report.items_fetched, 2);
        assert_eq!(report.entries_written, 2);
        assert_eq!(
            report.categories,
            vec![("Action".to_string(), 1), ("Drama".to_string(), 1)]
        );
        assert!(fetcher.calls().iter().skip(1).all(|u| u.starts_with("https://m2.test")));

        let text = std::fs::read_to_string(output).unwrap();
        assert!(text.starts_with("#EXTM3U\n"));
        assert_eq!(text.lines().count(), 1 + 2 * 4);
    }

    #[tokio::test]
    async fn test_no_server_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.m3u");
        let fetcher = ScriptedFetcher::new();

        let err = run(&fetcher, &config(output.clone())).await.unwrap_err();

        assert!(matches!(err, HarvestError::NoUsableServer { start: 1, end: 2 }));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_no_links_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.m3u");
        let mut cfg = config(output.clone());
        cfg.probe_policy = crate::config::ProbePolicy::FirstReachable;
        let fetcher = ScriptedFetcher::new()
            .respond(
                "https://m1.test/api/0",
                PageResult::Items(vec![movie("Drama", "https://cdn/1.mp4")]),
            )
            .respond(
                "https://m1.test/api/0",
                PageResult::Items(vec![movie("Drama", "https://cdn/1.mp4")]),
            )
            .respond("https://m1.test/api/1", PageResult::Empty);

        let err = run(&fetcher, &cfg).await.unwrap_err();

        assert!(matches!(err, HarvestError::NoUsableLinks { items: 1 }));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_network() {
        let mut cfg = config(PathBuf::from("unused.m3u"));
        cfg.range_start = 5;
        let fetcher = ScriptedFetcher::new();

        assert!(matches!(
            run(&fetcher, &cfg).await,
            Err(HarvestError::Config(_))
        ));
        assert!(fetcher.calls().is_empty());
    }
}
