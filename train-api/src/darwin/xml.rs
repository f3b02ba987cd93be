//! Streaming reader for Push Port timetable XML.
//!
//! Element and attribute names are matched on their local part,
//! lowercased, so namespace prefixes and the casing differences between
//! feed versions make no difference. Elements we do not model
//! (associations, vias, CIS sources) are skipped.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;

use super::MappingError;
use super::types::{
    RawJourney, RawLocation, RawOperator, RawPoint, RawPointKind, RawReason, RawReference,
    RawTimetable,
};

const TIMETABLE_ROOT: &str = "pporttimetable";
const REFERENCE_ROOT: &str = "pporttimetableref";

/// Attributes of one element, keyed by lowercased local name.
type Attributes = HashMap<String, String>;

/// Read a timetable document.
///
/// # Examples
///
/// ```
/// use train_api::darwin::parse_timetable;
///
/// let xml = r#"<PportTimetable timetableID="20240315020000">
///   <Journey rid="1" uid="C1" trainId="1A00" ssd="2024-03-15" toc="GW">
///     <OR tpl="PADTLL" wtd="10:00" />
///     <DT tpl="RDNGSTN" wta="10:25" />
///   </Journey>
/// </PportTimetable>"#;
///
/// let timetable = parse_timetable(xml).unwrap();
/// assert_eq!(timetable.timetable_id.as_deref(), Some("20240315020000"));
/// assert_eq!(timetable.journeys[0].points.len(), 2);
/// ```
pub fn parse_timetable(xml: &str) -> Result<RawTimetable, MappingError> {
    let mut reader = reader(xml);
    let mut state = TimetableState::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => state.open(&e, false)?,
            Event::Empty(e) => state.open(&e, true)?,
            Event::Text(text) if state.in_cancel_reason => {
                let code = text.unescape()?;
                if let Some(journey) = state.journey.as_mut() {
                    let code = code.trim();
                    if !code.is_empty() {
                        journey.cancel_reason = Some(code.to_string());
                    }
                }
            }
            Event::End(e) => state.close(&local_name(e.name())),
            Event::Eof => break,
            _ => {}
        }
    }

    if !state.root_seen {
        return Err(MappingError::UnexpectedRoot {
            expected: TIMETABLE_ROOT,
            found: String::new(),
        });
    }
    Ok(state.timetable)
}

#[derive(Default)]
struct TimetableState {
    timetable: RawTimetable,
    root_seen: bool,
    journey: Option<RawJourney>,
    in_cancel_reason: bool,
}

impl TimetableState {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<(), MappingError> {
        let tag = local_name(e.name());

        if !self.root_seen {
            check_root(&tag, TIMETABLE_ROOT)?;
            self.root_seen = true;
            self.timetable.timetable_id = attributes(e)?.remove("timetableid");
            return Ok(());
        }

        match self.journey.as_mut() {
            None if tag == "journey" => {
                let journey = read_journey(e)?;
                if empty {
                    self.timetable.journeys.push(journey);
                } else {
                    self.journey = Some(journey);
                }
            }
            Some(journey) => {
                if let Some(kind) = RawPointKind::from_tag(&tag) {
                    journey.points.push(read_point(kind, e)?);
                } else if tag == "cancelreason" && !empty {
                    self.in_cancel_reason = true;
                }
            }
            None => {}
        }
        Ok(())
    }

    fn close(&mut self, tag: &str) {
        match tag {
            "cancelreason" => self.in_cancel_reason = false,
            "journey" => {
                if let Some(journey) = self.journey.take() {
                    self.timetable.journeys.push(journey);
                }
            }
            _ => {}
        }
    }
}

/// Read a reference document.
pub fn parse_reference(xml: &str) -> Result<RawReference, MappingError> {
    let mut reader = reader(xml);
    let mut state = ReferenceState::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => state.open(&e)?,
            Event::Empty(e) => state.open(&e)?,
            Event::End(e) => {
                let tag = local_name(e.name());
                if tag == "laterunningreasons" || tag == "cancellationreasons" {
                    state.section = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !state.root_seen {
        return Err(MappingError::UnexpectedRoot {
            expected: REFERENCE_ROOT,
            found: String::new(),
        });
    }
    Ok(state.reference)
}

#[derive(Clone, Copy)]
enum ReasonList {
    LateRunning,
    Cancellation,
}

#[derive(Default)]
struct ReferenceState {
    reference: RawReference,
    root_seen: bool,
    section: Option<ReasonList>,
}

impl ReferenceState {
    fn open(&mut self, e: &BytesStart<'_>) -> Result<(), MappingError> {
        let tag = local_name(e.name());

        if !self.root_seen {
            check_root(&tag, REFERENCE_ROOT)?;
            self.root_seen = true;
            self.reference.reference_id = attributes(e)?.remove("timetableid");
            return Ok(());
        }

        match tag.as_str() {
            "tocref" => {
                let mut attrs = attributes(e)?;
                self.reference.operators.push(RawOperator {
                    toc: attrs.remove("toc"),
                    tocname: attrs.remove("tocname"),
                    url: attrs.remove("url"),
                });
            }
            "locationref" => {
                let mut attrs = attributes(e)?;
                self.reference.locations.push(RawLocation {
                    tpl: attrs.remove("tpl"),
                    crs: attrs.remove("crs"),
                    locname: attrs.remove("locname"),
                    toc: attrs.remove("toc"),
                });
            }
            "laterunningreasons" => self.section = Some(ReasonList::LateRunning),
            "cancellationreasons" => self.section = Some(ReasonList::Cancellation),
            "reason" => {
                let mut attrs = attributes(e)?;
                let reason = RawReason {
                    code: attrs.remove("code"),
                    text: attrs.remove("reasontext"),
                };
                match self.section {
                    Some(ReasonList::LateRunning) => {
                        self.reference.late_running_reasons.push(reason)
                    }
                    Some(ReasonList::Cancellation) => {
                        self.reference.cancellation_reasons.push(reason)
                    }
                    None => {}
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader
}

fn local_name(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.local_name().as_ref()).to_ascii_lowercase()
}

fn check_root(tag: &str, expected: &'static str) -> Result<(), MappingError> {
    if tag == expected {
        Ok(())
    } else {
        Err(MappingError::UnexpectedRoot {
            expected,
            found: tag.to_string(),
        })
    }
}

fn attributes(e: &BytesStart<'_>) -> Result<Attributes, MappingError> {
    let mut attrs = Attributes::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = local_name(attr.key);
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn read_journey(e: &BytesStart<'_>) -> Result<RawJourney, MappingError> {
    let mut attrs = attributes(e)?;
    Ok(RawJourney {
        rid: attrs.remove("rid"),
        uid: attrs.remove("uid"),
        train_id: attrs.remove("trainid"),
        ssd: attrs.remove("ssd"),
        toc: attrs.remove("toc"),
        status: attrs.remove("status"),
        train_cat: attrs.remove("traincat"),
        is_passenger_svc: attrs.remove("ispassengersvc"),
        qtrain: attrs.remove("qtrain"),
        can: attrs.remove("can"),
        cancel_reason: attrs.remove("cancelreason"),
        points: Vec::new(),
    })
}

fn read_point(kind: RawPointKind, e: &BytesStart<'_>) -> Result<RawPoint, MappingError> {
    let mut attrs = attributes(e)?;
    Ok(RawPoint {
        kind,
        tpl: attrs.remove("tpl"),
        act: attrs.remove("act"),
        plan_act: attrs.remove("planact"),
        can: attrs.remove("can"),
        plat: attrs.remove("plat"),
        wta: attrs.remove("wta"),
        wtd: attrs.remove("wtd"),
        wtp: attrs.remove("wtp"),
        pta: attrs.remove("pta"),
        ptd: attrs.remove("ptd"),
        rdelay: attrs.remove("rdelay"),
        fd: attrs.remove("fd"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;

    #[test]
    fn reads_fixture_timetable() {
        let timetable = parse_timetable(test_fixtures::TIMETABLE_XML).unwrap();
        assert_eq!(timetable.timetable_id.as_deref(), Some("20240315020000"));
        assert_eq!(timetable.journeys.len(), 3);

        let down = &timetable.journeys[0];
        assert_eq!(down.rid.as_deref(), Some("202403157800001"));
        assert_eq!(down.train_id.as_deref(), Some("1C84"));
        assert_eq!(down.points.first().unwrap().kind, RawPointKind::Or);
        assert_eq!(down.points.last().unwrap().kind, RawPointKind::Dt);
    }

    #[test]
    fn namespaces_and_case_are_ignored() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<tt:PportTimetable xmlns:tt="http://www.thalesgroup.com/rtti/XmlTimetable/v8" timetableID="X">
  <tt:JOURNEY RID="1" uid="C1" TRAINID="1A00" ssd="2024-03-15" toc="GW">
    <tt:or tpl="PADTLL" wtd="10:00"/>
    <tt:Dt tpl="RDNGSTN" wta="10:25"/>
  </tt:JOURNEY>
</tt:PportTimetable>"#;
        let timetable = parse_timetable(xml).unwrap();
        let journey = &timetable.journeys[0];
        assert_eq!(journey.rid.as_deref(), Some("1"));
        assert_eq!(journey.train_id.as_deref(), Some("1A00"));
        assert_eq!(journey.points.len(), 2);
    }

    #[test]
    fn cancel_reason_as_child_element() {
        let xml = r#"<PportTimetable timetableID="X">
  <Journey rid="1" uid="C1" trainId="1A00" ssd="2024-03-15" toc="GW" can="true">
    <OR tpl="PADTLL" wtd="10:00"/>
    <DT tpl="RDNGSTN" wta="10:25"/>
    <cancelReason>100</cancelReason>
  </Journey>
</PportTimetable>"#;
        let timetable = parse_timetable(xml).unwrap();
        assert_eq!(timetable.journeys[0].cancel_reason.as_deref(), Some("100"));
    }

    #[test]
    fn associations_are_ignored() {
        let xml = r#"<PportTimetable timetableID="X">
  <Association tiploc="RDNGSTN" category="JJ">
    <main rid="1" wta="10:25"/>
    <assoc rid="2" wtd="10:30"/>
  </Association>
</PportTimetable>"#;
        let timetable = parse_timetable(xml).unwrap();
        assert!(timetable.journeys.is_empty());
    }

    #[test]
    fn wrong_root_is_rejected() {
        let err = parse_timetable(test_fixtures::REFERENCE_XML).unwrap_err();
        assert!(matches!(
            err,
            MappingError::UnexpectedRoot { found, .. } if found == "pporttimetableref"
        ));

        assert!(matches!(
            parse_reference("").unwrap_err(),
            MappingError::UnexpectedRoot { .. }
        ));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let err = parse_timetable("<PportTimetable><Journey></PportTimetable>").unwrap_err();
        assert!(matches!(err, MappingError::Xml(_)));
    }

    #[test]
    fn reads_fixture_reference() {
        let reference = parse_reference(test_fixtures::REFERENCE_XML).unwrap();
        assert_eq!(reference.reference_id.as_deref(), Some("20240315020500"));
        assert_eq!(reference.operators.len(), 2);
        assert!(
            reference
                .operators
                .iter()
                .any(|o| o.toc.as_deref() == Some("XC")
                    && o.tocname.as_deref() == Some("CrossCountry"))
        );
        assert_eq!(reference.late_running_reasons.len(), 1);
        assert_eq!(reference.cancellation_reasons.len(), 1);
        assert_eq!(
            reference.cancellation_reasons[0].code.as_deref(),
            Some("100")
        );
    }

    #[test]
    fn entities_are_unescaped() {
        let xml = r#"<PportTimetableRef timetableId="R">
  <TocRef toc="GW" tocname="Great Western &amp; Co" url="http://example.com"/>
</PportTimetableRef>"#;
        let reference = parse_reference(xml).unwrap();
        assert_eq!(
            reference.operators[0].tocname.as_deref(),
            Some("Great Western & Co")
        );
    }
}
