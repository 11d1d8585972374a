//! Load plan manifest: a JSON record of every load request of a run, for the
//! ingester to pick up.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::orchestrator::{LoadRequest, Loader};

#[derive(Debug, Serialize, PartialEq)]
pub struct ManifestEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browse_base: Option<String>,
    pub access_base: String,
    pub files: Vec<String>,
    pub urls: Vec<String>,
    pub parameters: Vec<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub stride: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LoadManifest {
    pub campaign: String,
    pub description: String,
    pub sources: Vec<ManifestEntry>,
}

impl LoadManifest {
    pub fn new(campaign: &str, description: &str) -> Self {
        LoadManifest {
            campaign: campaign.to_string(),
            description: description.to_string(),
            sources: Vec::new(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        writer.flush()?;

        Ok(())
    }
}

impl Loader for LoadManifest {
    fn load(&mut self, request: &LoadRequest<'_>) -> Result<()> {
        let source = request.source;
        self.sources.push(ManifestEntry {
            name: source.name.clone(),
            browse_base: source.browse_base.clone(),
            access_base: source.access_base.clone(),
            files: source.files.clone(),
            urls: source.file_urls(),
            parameters: source.parameters.clone(),
            start: source.start,
            end: source.end,
            stride: request.stride,
        });

        Ok(())
    }
}

// -- Tests -------------------------------------------------------------------
