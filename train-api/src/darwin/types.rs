//! Raw Push Port timetable records.
//!
//! These types hold the XML attributes exactly as read, before any
//! validation. They use `Option` liberally because the feed omits
//! attributes rather than sending empty values.

/// A `PportTimetable` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTimetable {
    pub timetable_id: Option<String>,
    pub journeys: Vec<RawJourney>,
}

/// A `Journey` element and its schedule points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawJourney {
    pub rid: Option<String>,
    pub uid: Option<String>,
    pub train_id: Option<String>,
    /// Scheduled start date, `YYYY-MM-DD`.
    pub ssd: Option<String>,
    pub toc: Option<String>,
    pub status: Option<String>,
    pub train_cat: Option<String>,
    pub is_passenger_svc: Option<String>,
    pub qtrain: Option<String>,
    pub can: Option<String>,
    pub cancel_reason: Option<String>,
    /// Points in document order.
    pub points: Vec<RawPoint>,
}

/// The element a schedule point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawPointKind {
    /// `OR`: passenger origin
    Or,
    /// `OPOR`: operational origin
    Opor,
    /// `PP`: passing point
    Pp,
    /// `IP`: passenger intermediate
    Ip,
    /// `OPIP`: operational intermediate
    Opip,
    /// `DT`: passenger destination
    Dt,
    /// `OPDT`: operational destination
    Opdt,
}

impl RawPointKind {
    /// Match a lowercased element name.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "or" => Some(Self::Or),
            "opor" => Some(Self::Opor),
            "pp" => Some(Self::Pp),
            "ip" => Some(Self::Ip),
            "opip" => Some(Self::Opip),
            "dt" => Some(Self::Dt),
            "opdt" => Some(Self::Opdt),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::Opor => "OPOR",
            Self::Pp => "PP",
            Self::Ip => "IP",
            Self::Opip => "OPIP",
            Self::Dt => "DT",
            Self::Opdt => "OPDT",
        }
    }

    pub fn is_operational(self) -> bool {
        matches!(self, Self::Opor | Self::Opip | Self::Opdt)
    }

    pub fn is_intermediate(self) -> bool {
        matches!(self, Self::Pp | Self::Ip | Self::Opip)
    }
}

/// A schedule point element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPoint {
    pub kind: RawPointKind,
    pub tpl: Option<String>,
    pub act: Option<String>,
    pub plan_act: Option<String>,
    pub can: Option<String>,
    pub plat: Option<String>,
    pub wta: Option<String>,
    pub wtd: Option<String>,
    pub wtp: Option<String>,
    pub pta: Option<String>,
    pub ptd: Option<String>,
    pub rdelay: Option<String>,
    pub fd: Option<String>,
}

impl RawPoint {
    pub fn new(kind: RawPointKind) -> Self {
        Self {
            kind,
            tpl: None,
            act: None,
            plan_act: None,
            can: None,
            plat: None,
            wta: None,
            wtd: None,
            wtp: None,
            pta: None,
            ptd: None,
            rdelay: None,
            fd: None,
        }
    }
}

/// A `PportTimetableRef` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReference {
    pub reference_id: Option<String>,
    pub operators: Vec<RawOperator>,
    pub locations: Vec<RawLocation>,
    pub late_running_reasons: Vec<RawReason>,
    pub cancellation_reasons: Vec<RawReason>,
}

/// A `TocRef` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOperator {
    pub toc: Option<String>,
    pub tocname: Option<String>,
    pub url: Option<String>,
}

/// A `LocationRef` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLocation {
    pub tpl: Option<String>,
    pub crs: Option<String>,
    pub locname: Option<String>,
    pub toc: Option<String>,
}

/// A `Reason` element within a reason list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReason {
    pub code: Option<String>,
    pub text: Option<String>,
}
