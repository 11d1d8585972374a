//! Drives discovery and hands every registered source to the loader.

use anyhow::Result;

use crate::{
    campaign::{Campaign, CrawledPlatform},
    catalog::{CatalogSource, Namespaces},
    mission::CampaignWindow,
    platform::{register_platform, PlatformSource},
    select::SkipPatternSet,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Coarse sampling for a quick look.
    Test,
    Production,
}

impl RunMode {
    pub fn stride(self, test_stride: u32) -> Option<u32> {
        match self {
            RunMode::Test => Some(test_stride),
            RunMode::Production => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Fixed,
    Crawled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformState {
    Unregistered,
    Discovering,
    Registered,
    DiscoveryFailed,
    Loaded,
}

/// One request to the loader.
#[derive(Debug)]
pub struct LoadRequest<'a> {
    pub source: &'a PlatformSource,
    pub stride: Option<u32>,
}

/// The external load step.
pub trait Loader {
    fn load(&mut self, request: &LoadRequest<'_>) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub kind: SourceKind,
    pub state: PlatformState,
    pub source: PlatformSource,
}

/// Sources of a run keyed by name, in registration order.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: Vec<RegistryEntry>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the campaign's fixed sources and adds its crawled
    /// platforms, undiscovered.
    pub fn from_campaign(campaign: &Campaign, window: &CampaignWindow) -> Self {
        let mut registry = SourceRegistry::new();
        for fixed in &campaign.fixed_sources {
            registry.add_fixed(PlatformSource::fixed(fixed, window));
        }
        for platform in &campaign.platforms {
            registry.add_crawled(PlatformSource::crawled(platform, window));
        }
        registry
    }

    pub fn add_fixed(&mut self, source: PlatformSource) {
        self.entries.push(RegistryEntry {
            kind: SourceKind::Fixed,
            state: PlatformState::Registered,
            source,
        });
    }

    pub fn add_crawled(&mut self, source: PlatformSource) {
        self.entries.push(RegistryEntry {
            kind: SourceKind::Crawled,
            state: PlatformState::Unregistered,
            source,
        });
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.source.name == name)
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Runs discovery for `platform`. Returns the new state; a platform
    /// that isn't in the registry is added first.
    pub async fn discover<S: CatalogSource>(
        &mut self,
        catalogs: &S,
        platform: &CrawledPlatform,
        window: &CampaignWindow,
        skips: &SkipPatternSet,
        namespaces: &Namespaces,
    ) -> PlatformState {
        let index = match self.entries.iter().position(|e| e.source.name == platform.name) {
            Some(index) => index,
            None => {
                self.add_crawled(PlatformSource::crawled(platform, window));
                self.entries.len() - 1
            }
        };
        self.entries[index].state = PlatformState::Discovering;

        let state = match register_platform(catalogs, platform, window, skips, namespaces).await {
            Ok(source) => {
                self.entries[index].source = source;
                PlatformState::Registered
            }
            Err(e) => {
                tracing::warn!(platform = %platform.name, "{}", e);
                PlatformState::DiscoveryFailed
            }
        };
        self.entries[index].state = state;

        state
    }

    fn in_load_order(&self) -> Vec<usize> {
        let fixed = (0..self.entries.len()).filter(|&i| self.entries[i].kind == SourceKind::Fixed);
        let crawled =
            (0..self.entries.len()).filter(|&i| self.entries[i].kind == SourceKind::Crawled);

        fixed.chain(crawled).collect()
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub loaded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy)]
pub struct Orchestrator {
    pub mode: RunMode,
    pub test_stride: u32,
}

impl Orchestrator {
    pub fn new(mode: RunMode, test_stride: u32) -> Self {
        Orchestrator { mode, test_stride }
    }

    /// Loads fixed sources, then crawled platforms. Platforms whose
    /// discovery failed are skipped; a failing load is recorded and the run
    /// moves on.
    pub fn run<L: Loader>(&self, registry: &mut SourceRegistry, loader: &mut L) -> RunSummary {
        let stride = self.mode.stride(self.test_stride);
        let mut summary = RunSummary::default();

        for index in registry.in_load_order() {
            let entry = &mut registry.entries[index];
            let name = entry.source.name.clone();

            if entry.state != PlatformState::Registered {
                tracing::info!(source = %name, state = ?entry.state, "Not loading");
                summary.skipped.push(name);
                continue;
            }

            let request = LoadRequest {
                source: &entry.source,
                stride,
            };
            tracing::info!(
                source = %name,
                files = entry.source.files.len(),
                stride = ?stride,
                "Loading"
            );

            match loader.load(&request) {
                Ok(()) => {
                    entry.state = PlatformState::Loaded;
                    summary.loaded.push(name);
                }
                Err(e) => {
                    tracing::error!(source = %name, "Load failed: {:#}", e);
                    summary.failed.push((name, format!("{:#}", e)));
                }
            }
        }

        summary
    }
}

// -- Tests -------------------------------------------------------------------
