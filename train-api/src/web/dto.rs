//! Data transfer objects for API responses.

use serde::{Deserialize, Serialize, Serializer};

use crate::domain::{Journey, Location, Point, RailTime, TimeTable, TrainOperatingCompany};
use crate::refresh::RefreshStatus;

/// Status codes carried in every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApiStatus {
    Success = 0,
    InvalidAuthorizationHeader = 1,
    BadAuthorization = 2,
    TimeTableNotReady = 3,
    OmitEmptyQueryParameters = 4,
    InvalidQueryParameterValue = 5,
    MissingQueryParameter = 6,
    NotFound = 7,
}

impl Serialize for ApiStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Body of every response: `{ "status": <code>, "data": {...} }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: ApiStatus,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: ApiStatus::Success,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorData {
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionInfo {
    /// Version of this build.
    pub fn current() -> Self {
        Self {
            major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            patch: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        }
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Serialize)]
pub struct HelloData {
    pub version: VersionInfo,
}

#[derive(Debug, Serialize)]
pub struct StatusData {
    /// Whether a timetable is being served
    pub ready: bool,
    pub refresh: RefreshStatus,
}

/// Query for `/locations`.
#[derive(Debug, Deserialize)]
pub struct LocationsQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Query for `/journeys`. Values are TIPLOCs, or CRS codes of stations.
#[derive(Debug, Deserialize)]
pub struct JourneysQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LocationResult {
    pub tiploc: String,
    pub crs: Option<String>,
    pub name: Option<String>,
    pub operator: Option<String>,
    pub is_station: bool,
}

impl LocationResult {
    pub fn from_location(location: &Location) -> Self {
        Self {
            tiploc: location.tiploc.as_str().to_string(),
            crs: location.crs.map(|crs| crs.as_str().to_string()),
            name: location.name.clone(),
            operator: location
                .operator
                .as_ref()
                .map(|op| op.code.as_str().to_string()),
            is_station: location.is_station(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LocationsData {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub locations: Vec<LocationResult>,
}

#[derive(Debug, Serialize)]
pub struct OperatorResult {
    pub code: String,
    pub name: String,
    pub url: Option<String>,
}

impl OperatorResult {
    pub fn from_operator(operator: &TrainOperatingCompany) -> Self {
        Self {
            code: operator.code.as_str().to_string(),
            name: operator.name.clone(),
            url: operator.url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OperatorsData {
    pub operators: Vec<OperatorResult>,
}

/// A scheduled event within a journey.
#[derive(Debug, Serialize)]
pub struct PointResult {
    pub tiploc: String,
    pub name: Option<String>,
    pub crs: Option<String>,
    /// `origin`, `passing`, `calling` or `destination`
    pub kind: &'static str,
    pub activity: Option<String>,
    pub platform: Option<String>,
    pub working_arrival: Option<RailTime>,
    pub working_departure: Option<RailTime>,
    pub public_arrival: Option<RailTime>,
    pub public_departure: Option<RailTime>,
    pub is_cancelled: bool,
}

impl PointResult {
    pub fn from_point(point: &Point) -> Self {
        Self {
            tiploc: point.tiploc().as_str().to_string(),
            name: point.location.name.clone(),
            crs: point.location.crs.map(|crs| crs.as_str().to_string()),
            kind: point.kind.name(),
            activity: point.activity.clone(),
            platform: point.platform.clone(),
            working_arrival: point.working_arrival(),
            working_departure: point.working_departure(),
            public_arrival: point.public_arrival,
            public_departure: point.public_departure,
            is_cancelled: point.is_cancelled,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JourneyResult {
    pub rid: String,
    pub uid: String,
    pub train_id: String,
    pub headcode: Option<String>,
    pub scheduled_start: String,
    pub operator: String,
    pub operator_name: Option<String>,
    pub category: Option<String>,
    pub is_passenger: bool,
    pub is_cancelled: bool,
    /// Cancellation reason text, or the bare code if the reference has no text
    pub cancel_reason: Option<String>,
    pub departure: Option<RailTime>,
    pub arrival: Option<RailTime>,
    pub points: Vec<PointResult>,
}

impl JourneyResult {
    pub fn from_journey(journey: &Journey, timetable: &TimeTable) -> Self {
        let info = &journey.info;
        let cancel_reason = info.cancel_reason.as_deref().map(|code| {
            timetable
                .cancellation_reason(code)
                .map_or_else(|| code.to_string(), |reason| reason.text.clone())
        });

        Self {
            rid: info.rid.as_str().to_string(),
            uid: info.uid.as_str().to_string(),
            train_id: info.train_id.as_str().to_string(),
            headcode: info.train_id.headcode().map(|h| h.as_str().to_string()),
            scheduled_start: info.scheduled_start.format("%Y-%m-%d").to_string(),
            operator: info.operator.as_str().to_string(),
            operator_name: timetable
                .operator(info.operator.as_str())
                .map(|op| op.name.clone()),
            category: info.category.clone(),
            is_passenger: info.is_passenger,
            is_cancelled: info.is_cancelled,
            cancel_reason,
            departure: journey.departure(),
            arrival: journey.arrival(),
            points: journey.points().map(PointResult::from_point).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JourneysData {
    pub from: String,
    pub to: String,
    pub journeys: Vec<JourneyResult>,
}
