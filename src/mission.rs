//! Mission directories and the campaign window they are filtered against.
//!
//! Mission directories are named `<startYYYYMMDD>_<endYYYYMMDD>[...]`; the two
//! leading date tokens are the only thing used to decide whether a mission
//! belongs to the campaign.

use anyhow::{ensure, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use url::Url;

use crate::{
    catalog::{CatalogNode, CatalogRef},
    error::CrawlError,
};

const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl CampaignWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        ensure!(
            start <= end,
            "Campaign window starts ({}) after it ends ({})",
            start,
            end
        );

        Ok(CampaignWindow { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_datetime(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    pub fn end_datetime(&self) -> NaiveDateTime {
        self.end.and_time(NaiveTime::MIN)
    }

    /// True if the mission lies wholly inside the window, boundaries included.
    /// Missions straddling either boundary are not contained.
    pub fn contains(&self, mission: &MissionDirectory) -> bool {
        mission.start >= self.start && mission.end <= self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissionDirectory {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub catalog: Url,
}

impl MissionDirectory {
    pub fn from_reference(
        parent: &CatalogNode,
        reference: &CatalogRef,
    ) -> Result<Self, CrawlError> {
        let (start, end) = parse_mission_dates(&reference.title)?;
        let catalog = parent.reference_url(reference)?;

        Ok(MissionDirectory {
            name: reference.title.clone(),
            start,
            end,
            catalog,
        })
    }
}

/// Reads the start and end dates from a mission directory name.
pub fn parse_mission_dates(name: &str) -> Result<(NaiveDate, NaiveDate), CrawlError> {
    let mut tokens = name.split('_');
    let start = parse_date_token(name, tokens.next())?;
    let end = parse_date_token(name, tokens.next())?;

    if start > end {
        return Err(CrawlError::unparseable(
            name,
            format!("start {} is after end {}", start, end),
        ));
    }

    Ok((start, end))
}

fn parse_date_token(name: &str, token: Option<&str>) -> Result<NaiveDate, CrawlError> {
    let token = token.ok_or_else(|| CrawlError::unparseable(name, "expected two date tokens"))?;

    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CrawlError::unparseable(
            name,
            format!("`{}` is not a YYYYMMDD date", token),
        ));
    }

    NaiveDate::parse_from_str(token, DATE_FORMAT)
        .map_err(|e| CrawlError::unparseable(name, format!("`{}`: {}", token, e)))
}

/// Mission directories referenced by `catalog` that fall inside `window`, in
/// document order. Entries that don't follow the naming convention are logged
/// and skipped.
pub fn missions_in_window<'a>(
    catalog: &'a CatalogNode,
    window: &'a CampaignWindow,
) -> impl Iterator<Item = MissionDirectory> + 'a {
    catalog
        .references
        .iter()
        .filter_map(move |reference| match MissionDirectory::from_reference(catalog, reference) {
            Ok(mission) => Some(mission),
            Err(e) => {
                tracing::warn!(
                    catalog = %catalog.url,
                    "Error reading mission directory name: {}",
                    e
                );
                None
            }
        })
        .filter(move |mission| {
            let inside = window.contains(mission);
            if inside {
                tracing::info!(
                    mission = %mission.name,
                    start = %mission.start,
                    end = %mission.end,
                    "Found mission directory"
                );
            } else {
                tracing::debug!(mission = %mission.name, "Mission outside campaign window");
            }
            inside
        })
}

// -- Tests -------------------------------------------------------------------
