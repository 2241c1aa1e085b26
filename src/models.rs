use crate::error::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub const WORLDWIDE: &str = "worldwide";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    #[default]
    Cases,
    Recovered,
    Deaths,
}

impl MetricKind {
    pub fn all() -> &'static [MetricKind] {
        &[MetricKind::Cases, MetricKind::Recovered, MetricKind::Deaths]
    }

    pub fn key(&self) -> &'static str {
        match self {
            MetricKind::Cases => "cases",
            MetricKind::Recovered => "recovered",
            MetricKind::Deaths => "deaths",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MetricKind::Cases => "Coronavirus Cases",
            MetricKind::Recovered => "Recovered",
            MetricKind::Deaths => "Deaths",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            MetricKind::Cases => "#CC1034",
            MetricKind::Recovered => "#7DD71D",
            MetricKind::Deaths => "#FB4443",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which scope the dashboard is showing. Region codes are ISO2, upper case.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum Selection {
    #[default]
    Worldwide,
    Region(String),
}

impl Selection {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case(WORLDWIDE) {
            return Ok(Selection::Worldwide);
        }
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::UnknownRegion(trimmed.to_string()));
        }
        Ok(Selection::Region(trimmed.to_ascii_uppercase()))
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Selection::Worldwide => None,
            Selection::Region(code) => Some(code),
        }
    }

    /// Value used by the dropdown.
    pub fn value(&self) -> &str {
        self.code().unwrap_or(WORLDWIDE)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize, Default)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

pub const WORLD_CENTER: Coordinate = Coordinate::new(34.80746, -40.4796);
pub const WORLD_ZOOM: u8 = 3;
pub const REGION_ZOOM: u8 = 4;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: u8,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::worldwide()
    }
}

impl Viewport {
    pub fn worldwide() -> Self {
        Self {
            center: WORLD_CENTER,
            zoom: WORLD_ZOOM,
        }
    }

    pub fn region(center: Coordinate) -> Self {
        Self {
            center,
            zoom: REGION_ZOOM,
        }
    }

    /// Viewport for a selection, centred on the resolved snapshot's own
    /// coordinate. Falls back to the world view when the response carries
    /// no location.
    pub fn for_selection(selection: &Selection, snapshot: &GlobalSnapshot) -> Self {
        match (selection, snapshot.region.as_ref()) {
            (Selection::Region(_), Some(info)) => Self::region(info.coordinate()),
            _ => Self::worldwide(),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, Default)]
pub struct RegionInfo {
    #[serde(default)]
    pub iso2: Option<String>,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub long: f64,
}

impl RegionInfo {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.long)
    }
}

/// Cumulative counters and today's deltas. Every field may be absent.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    #[serde(default)]
    pub cases: Option<i64>,
    #[serde(default)]
    pub today_cases: Option<i64>,
    #[serde(default)]
    pub deaths: Option<i64>,
    #[serde(default)]
    pub today_deaths: Option<i64>,
    #[serde(default)]
    pub recovered: Option<i64>,
    #[serde(default)]
    pub today_recovered: Option<i64>,
}

impl Counters {
    pub fn total(&self, metric: MetricKind) -> Option<i64> {
        match metric {
            MetricKind::Cases => self.cases,
            MetricKind::Recovered => self.recovered,
            MetricKind::Deaths => self.deaths,
        }
    }

    pub fn today(&self, metric: MetricKind) -> Option<i64> {
        match metric {
            MetricKind::Cases => self.today_cases,
            MetricKind::Recovered => self.today_recovered,
            MetricKind::Deaths => self.today_deaths,
        }
    }
}

/// Aggregate counters for one scope, as returned by `/all` and
/// `/countries/{code}`. The region endpoint also embeds `countryInfo`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, Default)]
pub struct GlobalSnapshot {
    #[serde(flatten)]
    pub counters: Counters,
    #[serde(rename = "countryInfo", default, skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionInfo>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RegionRecord {
    pub country: String,
    #[serde(rename = "countryInfo", default)]
    pub region: RegionInfo,
    #[serde(flatten)]
    pub counters: Counters,
}

impl RegionRecord {
    pub fn code(&self) -> Option<&str> {
        self.region.iso2.as_deref().filter(|c| !c.is_empty())
    }

    pub fn coordinate(&self) -> Coordinate {
        self.region.coordinate()
    }

    pub fn total(&self, metric: MetricKind) -> Option<i64> {
        self.counters.total(metric)
    }

    pub fn matches(&self, code: &str) -> bool {
        self.code().is_some_and(|c| c.eq_ignore_ascii_case(code))
    }
}

/// Dropdown entry.
#[derive(Clone, PartialEq, Debug)]
pub struct RegionOption {
    pub name: String,
    pub value: String,
}

/// Raw `/historical/all` payload: one `"m/d/yy" -> cumulative` map per metric.
#[derive(Clone, PartialEq, Debug, Deserialize, Default)]
pub struct RawTimeline {
    #[serde(default)]
    pub cases: HashMap<String, i64>,
    #[serde(default)]
    pub deaths: HashMap<String, i64>,
    #[serde(default)]
    pub recovered: HashMap<String, i64>,
}

const TIMELINE_DATE_FORMAT: &str = "%m/%d/%y";

#[derive(Clone, PartialEq, Debug, Default)]
pub struct HistoricalTimeline {
    pub cases: BTreeMap<NaiveDate, i64>,
    pub deaths: BTreeMap<NaiveDate, i64>,
    pub recovered: BTreeMap<NaiveDate, i64>,
}

impl HistoricalTimeline {
    pub fn series(&self, metric: MetricKind) -> &BTreeMap<NaiveDate, i64> {
        match metric {
            MetricKind::Cases => &self.cases,
            MetricKind::Recovered => &self.recovered,
            MetricKind::Deaths => &self.deaths,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty() && self.deaths.is_empty() && self.recovered.is_empty()
    }
}

impl TryFrom<RawTimeline> for HistoricalTimeline {
    type Error = AppError;

    fn try_from(raw: RawTimeline) -> Result<Self, Self::Error> {
        fn dated(raw: HashMap<String, i64>) -> Result<BTreeMap<NaiveDate, i64>, AppError> {
            raw.into_iter()
                .map(|(day, value)| {
                    NaiveDate::parse_from_str(&day, TIMELINE_DATE_FORMAT)
                        .map(|date| (date, value))
                        .map_err(|e| {
                            AppError::MalformedResponse(serde::de::Error::custom(format!(
                                "bad timeline date {:?}: {}",
                                day, e
                            )))
                        })
                })
                .collect()
        }

        Ok(Self {
            cases: dated(raw.cases)?,
            deaths: dated(raw.deaths)?,
            recovered: dated(raw.recovered)?,
        })
    }
}
