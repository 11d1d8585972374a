//! Campaign configuration: the window, the sources to load and how to find
//! their files.
//!
//! A campaign can be read from a YAML file; [`Campaign::os2017`] is the
//! built-in default.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{mission::CampaignWindow, select::SkipPatternSet};

#[derive(Debug, Clone, Deserialize)]
pub struct Campaign {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Row stride used by test loads.
    #[serde(default = "default_test_stride")]
    pub test_stride: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Skip patterns added to the default exclusions.
    #[serde(default)]
    pub skips: Vec<String>,
    #[serde(default)]
    pub fixed_sources: Vec<FixedSource>,
    #[serde(default)]
    pub platforms: Vec<CrawledPlatform>,
}

fn default_test_stride() -> u32 {
    100
}

fn default_request_timeout() -> u64 {
    30
}

/// A source with a known file list, e.g. a mooring.
#[derive(Debug, Clone, Deserialize)]
pub struct FixedSource {
    pub name: String,
    pub access_base: String,
    pub files: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

/// A platform whose files are discovered by crawling its catalog.
///
/// `browse_root` and `access_root` may contain `{platform}` and `{year}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawledPlatform {
    pub name: String,
    pub browse_root: String,
    pub access_root: String,
    pub year: String,
    /// Inclusion pattern for dataset file names.
    pub select: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl CrawledPlatform {
    pub fn browse_url(&self) -> String {
        self.expand(&self.browse_root)
    }

    pub fn access_url(&self) -> String {
        self.expand(&self.access_root)
    }

    fn expand(&self, template: &str) -> String {
        template
            .replace("{platform}", &self.name)
            .replace("{year}", &self.year)
    }
}

impl Campaign {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read campaign file {}", path.display()))?;
        let campaign: Campaign = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse campaign file {}", path.display()))?;
        campaign.window()?;

        tracing::debug!(campaign = %campaign.name, path = %path.display(), "Loaded campaign");
        Ok(campaign)
    }

    /// Replaces the window bounds that are given.
    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let Some(start) = start {
            self.start = start;
        }
        if let Some(end) = end {
            self.end = end;
        }
        self.window()?;

        Ok(self)
    }

    pub fn window(&self) -> Result<CampaignWindow> {
        CampaignWindow::new(self.start, self.end)
            .with_context(|| format!("Invalid window for campaign {}", self.name))
    }

    pub fn skip_set(&self) -> Result<SkipPatternSet> {
        SkipPatternSet::with_defaults(&self.skips)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn platform(&self, name: &str) -> Option<&CrawledPlatform> {
        self.platforms.iter().find(|p| p.name == name)
    }

    /// CANON off season 2017 in Monterey Bay.
    pub fn os2017() -> Self {
        Campaign {
            name: "stoqs_os2017".to_string(),
            description: "CANON Off Season 2017 Experiment in Monterey Bay".to_string(),
            start: date(2017, 1, 1),
            end: date(2017, 12, 31),
            test_stride: default_test_stride(),
            request_timeout_secs: default_request_timeout(),
            // The third entry is a single pattern, kept as published.
            skips: strings(&[".*Courier*", ".*Express*", ".*Normal*, '.*Priority*", ".*.cfg$"]),
            fixed_sources: vec![FixedSource {
                name: "m1".to_string(),
                access_base: "http://dods.mbari.org/opendap/data/ssdsdata/deployments/m1/201608/"
                    .to_string(),
                files: strings(&["OS_M1_20160829hourly_CMSTV.nc"]),
                parameters: strings(&[
                    "eastward_sea_water_velocity_HR",
                    "northward_sea_water_velocity_HR",
                    "SEA_WATER_SALINITY_HR",
                    "SEA_WATER_TEMPERATURE_HR",
                    "SW_FLUX_HR",
                    "AIR_TEMPERATURE_HR",
                    "EASTWARD_WIND_HR",
                    "NORTHWARD_WIND_HR",
                    "WIND_SPEED_HR",
                ]),
                start: None,
                end: None,
            }],
            platforms: vec![CrawledPlatform {
                name: "tethys".to_string(),
                browse_root: concat!(
                    "http://dodstemp.shore.mbari.org:8080/thredds/catalog/",
                    "LRAUV/{platform}/missionlogs/{year}/"
                )
                .to_string(),
                access_root: "http://dods.mbari.org/opendap/data/lrauv/{platform}/missionlogs/{year}/"
                    .to_string(),
                year: "2016".to_string(),
                select: ".*10S_sci.nc$".to_string(),
                parameters: lrauv_parameters(),
                start: None,
                end: None,
            }],
        }
    }
}

// "PARyaw" is two names run together; it is what the campaign declared.
fn lrauv_parameters() -> Vec<String> {
    strings(&[
        "temperature",
        "salinity",
        "chlorophyll",
        "nitrate",
        "oxygen",
        "bbp470",
        "bbp650",
        "PARyaw",
        "pitch",
        "roll",
        "control_inputs_rudder_angle",
        "control_inputs_mass_position",
        "control_inputs_buoyancy_position",
        "control_inputs_propeller_rotation_rate",
        "health_platform_battery_charge",
        "health_platform_average_voltage",
        "health_platform_average_current",
        "fix_latitude",
        "fix_longitude",
        "fix_residual_percent_distance_traveled_DeadReckonUsingSpeedCalculator",
        "pose_longitude_DeadReckonUsingSpeedCalculator",
        "pose_latitude_DeadReckonUsingSpeedCalculator",
        "pose_depth_DeadReckonUsingSpeedCalculator",
        "fix_residual_percent_distance_traveled_DeadReckonUsingMultipleVelocitySources",
        "pose_longitude_DeadReckonUsingMultipleVelocitySources",
        "pose_latitude_DeadReckonUsingMultipleVelocitySources",
        "pose_depth_DeadReckonUsingMultipleVelocitySources",
    ])
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const YAML: &str = r#"
name: test_campaign
start: 2017-01-01
end: 2017-12-31
skips:
  - ".*.cfg$"
fixed_sources:
  - name: m1
    access_base: http://example.org/opendap/m1/
    files: [OS_M1.nc]
platforms:
  - name: daphne
    browse_root: http://example.org/thredds/catalog/LRAUV/{platform}/missionlogs/{year}/
    access_root: http://example.org/opendap/lrauv/{platform}/missionlogs/{year}/
    year: "2017"
    select: "glob:*10S_sci.nc"
    parameters: [temperature]
    end: 2017-06-30
"#;

    #[test]
    fn should_parse_yaml_with_defaults() {
        let c: Campaign = serde_yaml::from_str(YAML).unwrap();

        assert_eq!(c.name, "test_campaign");
        assert_eq!(c.test_stride, 100);
        assert_eq!(c.request_timeout(), Duration::from_secs(30));
        assert_eq!(c.fixed_sources[0].files, vec!["OS_M1.nc"]);
        assert!(c.fixed_sources[0].parameters.is_empty());
        assert_eq!(c.platforms[0].end, NaiveDate::from_ymd_opt(2017, 6, 30));
    }

    #[test]
    fn should_expand_platform_templates() {
        let c: Campaign = serde_yaml::from_str(YAML).unwrap();
        let p = c.platform("daphne").unwrap();

        assert_eq!(
            p.browse_url(),
            "http://example.org/thredds/catalog/LRAUV/daphne/missionlogs/2017/"
        );
        assert_eq!(p.access_url(), "http://example.org/opendap/lrauv/daphne/missionlogs/2017/");
        assert!(c.platform("tethys").is_none());
    }

    #[test]
    fn should_load_campaign_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let c = Campaign::load(file.path()).unwrap();

        assert_eq!(c.platforms.len(), 1);
    }

    #[test]
    fn should_reject_inverted_window_in_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.replace("end: 2017-12-31", "end: 2016-12-31").as_bytes())
            .unwrap();

        assert!(Campaign::load(file.path()).is_err());
    }

    #[test]
    fn should_override_window() {
        let c = Campaign::os2017()
            .with_window(NaiveDate::from_ymd_opt(2017, 3, 1), None)
            .unwrap();
        let w = c.window().unwrap();

        assert_eq!(w.start(), NaiveDate::from_ymd_opt(2017, 3, 1).unwrap());
        assert_eq!(w.end(), NaiveDate::from_ymd_opt(2017, 12, 31).unwrap());
        assert!(Campaign::os2017()
            .with_window(NaiveDate::from_ymd_opt(2018, 1, 1), None)
            .is_err());
    }

    #[test]
    fn should_describe_os2017() {
        let c = Campaign::os2017();
        let tethys = c.platform("tethys").unwrap();

        assert_eq!(
            tethys.browse_url(),
            "http://dodstemp.shore.mbari.org:8080/thredds/catalog/LRAUV/tethys/missionlogs/2016/"
        );
        assert!(tethys.parameters.contains(&"PARyaw".to_string()));
        assert_eq!(c.fixed_sources[0].files.len(), 1);
        assert!(c.skip_set().unwrap().is_match("deploy.cfg"));
    }
}
