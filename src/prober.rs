//! Domain Prober: walks the numbered mirror pool in ascending order and
//! returns the first candidate that passes the acceptance policy.

use crate::client::{PageFetcher, PageResult};
use crate::config::{HarvestConfig, ProbePolicy};
use tracing::{info, warn};

/// The winning mirror of a probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredHost {
    pub index: u32,
    pub base_url: String,
}

pub struct Prober<'a, F: PageFetcher> {
    fetcher: &'a F,
    config: &'a HarvestConfig,
}

impl<'a, F: PageFetcher> Prober<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a HarvestConfig) -> Self {
        Self { fetcher, config }
    }

    /// Probe `range_start..=range_end`. Failed candidates are logged and
    /// skipped; the scan only stops on acceptance or exhaustion.
    pub async fn probe(&self) -> Option<DiscoveredHost> {
        let policy = self.config.probe_policy;
        info!(
            "Scanning servers {}-{} ({})",
            self.config.range_start,
            self.config.range_end,
            policy.display_name()
        );

        for index in self.config.range_start..=self.config.range_end {
            let base_url = self.config.host_for(index);
            info!("Trying {}", base_url);

            let result = self.fetcher.fetch(&self.config.page_url(&base_url, 0)).await;
            if accepts(policy, &result) {
                if let PageResult::Items(items) = &result {
                    let usable = items.iter().filter(|i| i.has_usable_link()).count();
                    info!("Server {} accepted: {} usable items on page 0", base_url, usable);
                } else {
                    info!("Server {} accepted (reachable)", base_url);
                }
                return Some(DiscoveredHost { index, base_url });
            }

            match result {
                PageResult::Items(_) => warn!("  Server is up but page 0 has no usable .m3u8 link"),
                PageResult::Empty => warn!("  Server is up but the catalog is empty"),
                PageResult::HttpError(status) => warn!("  Server answered HTTP {}", status),
                PageResult::TransportError(kind) => {
                    warn!("  Could not reach server or response broken ({})", kind)
                }
            }
        }

        None
    }
}

/// Acceptance predicate for a candidate's page 0
pub fn accepts(policy: ProbePolicy, result: &PageResult) -> bool {
    match policy {
        ProbePolicy::FirstUsableLink => match result {
            PageResult::Items(items) => items.iter().any(|i| i.has_usable_link()),
            _ => false,
        },
        ProbePolicy::FirstReachable => result.is_reachable(),
    }
}
