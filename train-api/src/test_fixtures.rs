//! Shared snapshot documents for tests.
//!
//! A small slice of the Great Western main line: a down service from
//! Paddington to Plymouth, an earlier up service back, and a cancelled
//! CrossCountry short working.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

pub const TIMETABLE_NAME: &str = "20240315020000_v8";
pub const REFERENCE_NAME: &str = "20240315020500_ref_v4";

pub const REFERENCE_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<PportTimetableRef xmlns="http://www.thalesgroup.com/rtti/XmlRefData/v4" timetableId="20240315020500">
  <LocationRef tpl="PADTLL" crs="PAD" toc="GW" locname="London Paddington"/>
  <LocationRef tpl="ROYAOJN" locname="ROYAOJN"/>
  <LocationRef tpl="RDNGSTN" crs="RDG" toc="GW" locname="Reading"/>
  <LocationRef tpl="EXETRSD" crs="EXD" toc="XC" locname="Exeter St Davids"/>
  <LocationRef tpl="PLYMTH" crs="PLY" toc="GW" locname="Plymouth"/>
  <TocRef toc="GW" tocname="Great Western Railway" url="https://www.gwr.com"/>
  <TocRef toc="XC" tocname="CrossCountry" url="https://www.crosscountrytrains.co.uk"/>
  <LateRunningReasons>
    <Reason code="101" reasontext="This train has been delayed by a delay on a previous journey"/>
  </LateRunningReasons>
  <CancellationReasons>
    <Reason code="100" reasontext="This train has been cancelled because of a broken down train"/>
  </CancellationReasons>
  <Via at="EXD" dest="PADTLL" loc1="RDNGSTN" viatext="via Reading"/>
  <CISSource code="AM01" name="Southern Metropolitan"/>
</PportTimetableRef>"#;

pub const TIMETABLE_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<PportTimetable xmlns="http://www.thalesgroup.com/rtti/XmlTimetable/v8" timetableID="20240315020000">
  <Journey rid="202403157800001" uid="C10001" trainId="1C84" ssd="2024-03-15" toc="GW" status="P" trainCat="XX">
    <OR tpl="PADTLL" act="TB" plat="1" wtd="10:00" ptd="10:00"/>
    <PP tpl="ROYAOJN" wtp="10:03:30"/>
    <IP tpl="RDNGSTN" act="T " plat="9" wta="10:25" wtd="10:27" pta="10:25" ptd="10:27"/>
    <IP tpl="EXETRSD" act="T " plat="5" wta="12:05" wtd="12:08" pta="12:05" ptd="12:08"/>
    <DT tpl="PLYMTH" act="TF" plat="6" wta="13:10" pta="13:10"/>
  </Journey>
  <Journey rid="202403157800002" uid="C10002" trainId="1A79" ssd="2024-03-15" toc="GW" status="P" trainCat="XX">
    <OR tpl="PLYMTH" act="TB" wtd="06:00" ptd="06:00" plat="4"/>
    <IP tpl="EXETRSD" act="T " wta="07:00" wtd="07:03" pta="07:00" ptd="07:03"/>
    <PP tpl="ROYAOJN" wtp="09:40"/>
    <DT tpl="PADTLL" act="TF" wta="09:45" pta="09:45"/>
  </Journey>
  <Journey rid="202403157800003" uid="C10003" trainId="1V50" ssd="2024-03-15" toc="XC" can="true">
    <OR tpl="EXETRSD" act="TB" wtd="14:00" ptd="14:00"/>
    <DT tpl="PLYMTH" act="TF" wta="15:00" pta="15:00"/>
    <cancelReason>100</cancelReason>
  </Journey>
  <Association tiploc="RDNGSTN" category="NP">
    <main rid="202403157800001" wta="10:25" wtd="10:27"/>
    <assoc rid="202403157800002" wtd="10:40"/>
  </Association>
</PportTimetable>"#;

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// The fixture documents built into a timetable.
pub fn timetable() -> crate::domain::TimeTable {
    crate::domain::TimeTable::parse(TIMETABLE_XML, REFERENCE_XML).unwrap()
}
