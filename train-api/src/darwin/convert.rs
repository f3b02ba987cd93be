//! Conversion from raw timetable records to domain types.
//!
//! Reference data is built first (operators, then locations that refer to
//! them), then every journey is resolved against it. Conversion is
//! all-or-nothing: the first error aborts the whole snapshot.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::{
    AtocCode, Crs, DayClock, Flag, Journey, JourneyInfo, Location, Point, PointKind, RailTime,
    Reason, ReferenceData, Rid, Tiploc, TimeTable, TrainId, TrainOperatingCompany, TrainUid,
    parse_time_of_day,
};

use super::types::{RawJourney, RawPoint, RawPointKind, RawReason, RawReference, RawTimetable};
use super::xml::{parse_reference, parse_timetable};
use super::{JourneyError, MappingError};

impl TimeTable {
    /// Build a timetable from a timetable document and its reference
    /// document.
    ///
    /// # Examples
    ///
    /// ```
    /// use train_api::domain::TimeTable;
    ///
    /// let reference = r#"<PportTimetableRef timetableId="R">
    ///   <TocRef toc="GW" tocname="Great Western Railway" url="https://www.gwr.com"/>
    ///   <LocationRef tpl="PADTLL" crs="PAD" toc="GW" locname="London Paddington"/>
    ///   <LocationRef tpl="RDNGSTN" crs="RDG" toc="GW" locname="Reading"/>
    /// </PportTimetableRef>"#;
    ///
    /// let timetable = r#"<PportTimetable timetableID="T">
    ///   <Journey rid="1" uid="C1" trainId="1A00" ssd="2024-03-15" toc="GW">
    ///     <OR tpl="PADTLL" wtd="10:00"/>
    ///     <DT tpl="RDNGSTN" wta="10:25"/>
    ///   </Journey>
    /// </PportTimetable>"#;
    ///
    /// let tt = TimeTable::parse(timetable, reference).unwrap();
    /// assert_eq!(tt.journeys_between("PADTLL", "RDNGSTN").len(), 1);
    /// ```
    pub fn parse(timetable_xml: &str, reference_xml: &str) -> Result<Self, MappingError> {
        let reference = build_reference(parse_reference(reference_xml)?)?;
        build_timetable(parse_timetable(timetable_xml)?, reference)
    }
}

/// Build reference data: operators first, then locations.
pub fn build_reference(raw: RawReference) -> Result<ReferenceData, MappingError> {
    let mut reference = ReferenceData::new(raw.reference_id.unwrap_or_default());

    for op in raw.operators {
        let code = op.toc.ok_or(MappingError::MissingAttribute {
            element: "TocRef",
            attribute: "toc",
        })?;
        let atoc = AtocCode::parse(&code).map_err(|source| MappingError::InvalidOperatorCode {
            code: code.clone(),
            source,
        })?;
        let operator = TrainOperatingCompany {
            code: atoc,
            name: op.tocname.unwrap_or_else(|| code.clone()),
            url: op.url,
        };
        if !reference.insert_operator(operator) {
            warn!(code = %code, "duplicate operator in reference data, keeping first");
        }
    }

    for loc in raw.locations {
        let tpl = loc.tpl.ok_or(MappingError::MissingAttribute {
            element: "LocationRef",
            attribute: "tpl",
        })?;
        let tiploc = Tiploc::parse(&tpl).map_err(|source| MappingError::InvalidTiploc {
            tiploc: tpl.clone(),
            source,
        })?;
        let crs = loc
            .crs
            .map(|crs| {
                Crs::parse(&crs).map_err(|source| MappingError::InvalidCrs {
                    tiploc: tpl.clone(),
                    crs,
                    source,
                })
            })
            .transpose()?;
        let operator = loc
            .toc
            .map(|code| {
                reference
                    .operator(&code)
                    .cloned()
                    .ok_or_else(|| MappingError::UnknownOperator {
                        tiploc: tpl.clone(),
                        code,
                    })
            })
            .transpose()?;

        if !reference.insert_location(Location::new(tiploc, crs, loc.locname, operator)) {
            warn!(tiploc = %tpl, "duplicate location in reference data, keeping first");
        }
    }

    for reason in raw.late_running_reasons.into_iter().filter_map(reason) {
        reference.insert_late_running_reason(reason);
    }
    for reason in raw.cancellation_reasons.into_iter().filter_map(reason) {
        reference.insert_cancellation_reason(reason);
    }

    debug!(
        reference_id = %reference.reference_id,
        operators = reference.operators().len(),
        locations = reference.locations().len(),
        "built reference data"
    );
    Ok(reference)
}

fn reason(raw: RawReason) -> Option<Reason> {
    match (raw.code, raw.text) {
        (Some(code), Some(text)) => Some(Reason { code, text }),
        (code, _) => {
            debug!(?code, "skipping incomplete reason");
            None
        }
    }
}

/// Build the timetable aggregate from raw journeys and reference data.
pub fn build_timetable(
    raw: RawTimetable,
    reference: ReferenceData,
) -> Result<TimeTable, MappingError> {
    let timetable_id = raw.timetable_id.unwrap_or_default();

    let journeys = raw
        .journeys
        .into_iter()
        .map(|journey| {
            let rid = journey.rid.clone().unwrap_or_default();
            build_journey(journey, &reference)
                .map_err(|source| MappingError::Journey { rid, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        timetable_id = %timetable_id,
        reference_id = %reference.reference_id,
        journeys = journeys.len(),
        "built timetable"
    );
    Ok(TimeTable::new(timetable_id, reference, journeys))
}

/// Build one journey, resolving its points against the reference data.
pub fn build_journey(raw: RawJourney, reference: &ReferenceData) -> Result<Journey, JourneyError> {
    let rid = Rid::new(&required(raw.rid, "rid")?)?;
    let uid = TrainUid::new(&required(raw.uid, "uid")?)?;
    let train_id = TrainId::new(&required(raw.train_id, "trainId")?);

    let ssd = required(raw.ssd, "ssd")?;
    let scheduled_start = NaiveDate::parse_from_str(&ssd, "%Y-%m-%d")
        .map_err(|_| JourneyError::InvalidDate(ssd.clone()))?;

    let toc = required(raw.toc, "toc")?;
    let operator = AtocCode::parse(&toc)
        .map_err(|source| JourneyError::InvalidOperatorCode { code: toc, source })?;

    let info = JourneyInfo {
        rid,
        uid,
        train_id,
        scheduled_start,
        operator,
        status: raw.status,
        category: raw.train_cat,
        is_passenger: Flag::from_attr(raw.is_passenger_svc.as_deref()).resolve(true),
        is_q_train: Flag::from_attr(raw.qtrain.as_deref()).resolve(false),
        is_cancelled: Flag::from_attr(raw.can.as_deref()).resolve(false),
        cancel_reason: raw.cancel_reason,
    };

    // The first OR wins, else the first OPOR; likewise DT over OPDT. Other
    // origin and destination records are dropped unbuilt.
    let first = |kind: RawPointKind| raw.points.iter().position(|p| p.kind == kind);
    let origin_at = first(RawPointKind::Or)
        .or_else(|| first(RawPointKind::Opor))
        .ok_or(JourneyError::MissingOrigin)?;
    let destination_at = first(RawPointKind::Dt)
        .or_else(|| first(RawPointKind::Opdt))
        .ok_or(JourneyError::MissingDestination)?;

    // Kept points are placed in document order so overnight rollover is
    // detected across the whole journey.
    let mut clock = DayClock::new(scheduled_start);
    let mut origin = None;
    let mut destination = None;
    let mut intermediate = Vec::new();

    for (index, raw_point) in raw.points.into_iter().enumerate() {
        if raw_point.kind.is_intermediate() {
            intermediate.push(build_point(raw_point, &mut clock, reference)?);
        } else if index == origin_at {
            origin = Some(build_point(raw_point, &mut clock, reference)?);
        } else if index == destination_at {
            destination = Some(build_point(raw_point, &mut clock, reference)?);
        }
    }

    let origin = origin.ok_or(JourneyError::MissingOrigin)?;
    let destination = destination.ok_or(JourneyError::MissingDestination)?;

    Ok(Journey::new(info, origin, destination, intermediate)?)
}

fn required(value: Option<String>, attribute: &'static str) -> Result<String, JourneyError> {
    value.ok_or(JourneyError::MissingAttribute(attribute))
}

/// Working and public times of a point, placed on dates.
#[derive(Default)]
struct PlacedTimes {
    wta: Option<RailTime>,
    wtp: Option<RailTime>,
    wtd: Option<RailTime>,
    pta: Option<RailTime>,
    ptd: Option<RailTime>,
}

fn place_times(
    raw: &RawPoint,
    tiploc: &str,
    clock: &mut DayClock,
) -> Result<PlacedTimes, JourneyError> {
    let invalid = |value: &str, source| JourneyError::InvalidTime {
        tiploc: tiploc.to_string(),
        value: value.to_string(),
        source,
    };

    let mut working = |value: &Option<String>| -> Result<Option<RailTime>, JourneyError> {
        value
            .as_deref()
            .map(|v| clock.place_str(v).map_err(|e| invalid(v, e)))
            .transpose()
    };

    let wta = working(&raw.wta)?;
    let wtp = working(&raw.wtp)?;
    let wtd = working(&raw.wtd)?;

    // Public times sit next to a working time of the same point and take
    // whichever date puts them closest to it.
    let fallback_date = clock.date();
    let public = |value: &Option<String>,
                  anchor: Option<RailTime>|
     -> Result<Option<RailTime>, JourneyError> {
        let Some(v) = value.as_deref() else {
            return Ok(None);
        };
        let time = parse_time_of_day(v).map_err(|e| invalid(v, e))?;
        Ok(Some(match anchor {
            Some(anchor) => anchor.nearest(time),
            None => RailTime::new(fallback_date, time),
        }))
    };

    let pta = public(&raw.pta, wta.or(wtp).or(wtd))?;
    let ptd = public(&raw.ptd, wtd.or(wtp).or(wta))?;

    Ok(PlacedTimes {
        wta,
        wtp,
        wtd,
        pta,
        ptd,
    })
}

fn build_point(
    raw: RawPoint,
    clock: &mut DayClock,
    reference: &ReferenceData,
) -> Result<Point, JourneyError> {
    let element = raw.kind.tag();
    let tpl = raw
        .tpl
        .clone()
        .ok_or(JourneyError::MissingTiploc { element })?;
    let location = reference
        .location(&tpl)
        .cloned()
        .ok_or_else(|| JourneyError::UnknownLocation(tpl.clone()))?;

    let times = place_times(&raw, &tpl, clock)?;
    let missing = |field| JourneyError::MissingTime {
        element,
        tiploc: tpl.clone(),
        field,
    };

    let kind = match raw.kind {
        RawPointKind::Or | RawPointKind::Opor => PointKind::Origin {
            departure: times.wtd.ok_or_else(|| missing("wtd"))?,
            arrival: times.wta,
        },
        RawPointKind::Dt | RawPointKind::Opdt => PointKind::Destination {
            arrival: times.wta.ok_or_else(|| missing("wta"))?,
            departure: times.wtd,
        },
        RawPointKind::Pp => PointKind::Passing {
            passing: times.wtp.ok_or_else(|| missing("wtp"))?,
        },
        RawPointKind::Ip | RawPointKind::Opip => match times.wtp {
            Some(passing) if times.wta.is_none() && times.wtd.is_none() => {
                PointKind::Passing { passing }
            }
            _ => PointKind::Calling {
                arrival: times.wta.ok_or_else(|| missing("wta"))?,
                departure: times.wtd.ok_or_else(|| missing("wtd"))?,
            },
        },
    };

    let route_delay = raw
        .rdelay
        .map(|value| {
            value
                .trim()
                .parse::<i32>()
                .map_err(|_| JourneyError::InvalidDelay {
                    tiploc: tpl.clone(),
                    value,
                })
        })
        .transpose()?;

    let false_destination = raw
        .fd
        .map(|fd| {
            Tiploc::parse(&fd).map_err(|source| JourneyError::InvalidTiploc { tiploc: fd, source })
        })
        .transpose()?;

    Ok(Point {
        location,
        kind,
        activity: raw.act,
        planned_activity: raw.plan_act,
        platform: raw.plat,
        public_arrival: times.pta,
        public_departure: times.ptd,
        route_delay,
        false_destination,
        is_cancelled: Flag::from_attr(raw.can.as_deref()).resolve(false),
        is_operational: raw.kind.is_operational(),
    })
}
