// 🚦 Status Resolver - Registry record → lifecycle state
// Pure classification: (record, now) in, ResolvedStatus out. No I/O.
//
// Precedence, first match wins:
// 1. DataSubentro reached    → migrated     (green)
// 2. DataPresubentro reached → pre-cutover  (yellow)
// 3. otherwise               → inactive     (red)

use crate::badge::{BadgeColor, StatusIcon};
use crate::error::BadgeError;
use crate::registry::RawRegistryRecord;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const MIGRATED_LABEL: &str = "subentrato il";
const PRE_CUTOVER_LABEL: &str = "in presubentro dal";
const INACTIVE_LABEL: &str = "inattivo :(";

// ============================================================================
// REGISTRY ENTRY (typed projection)
// ============================================================================

/// The part of a registry entry the classification reads.
///
/// `Name` is required. Milestones are lenient: anything that is not a
/// string is read as absent.
#[derive(Debug, Clone, Deserialize)]
struct RegistryEntry {
    #[serde(rename = "Name")]
    name: String,

    #[serde(rename = "DataSubentro", default, deserialize_with = "lenient_text")]
    cutover: Option<String>,

    #[serde(rename = "DataPresubentro", default, deserialize_with = "lenient_text")]
    pre_cutover: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

// ============================================================================
// MILESTONE
// ============================================================================

/// A milestone timestamp, in the offset the registry supplied
#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub instant: DateTime<FixedOffset>,
}

impl Milestone {
    /// `None` when the value is not a recognizable instant
    pub fn parse(raw: &str) -> Option<Self> {
        parse_instant(raw).map(|instant| Milestone { instant })
    }

    /// Reached iff at or before `now`
    pub fn is_reached(&self, now: DateTime<Utc>) -> bool {
        self.instant <= now
    }

    /// Calendar day in the offset the registry used
    pub fn day(&self) -> NaiveDate {
        self.instant.date_naive()
    }
}

/// RFC 3339 first, then ISO 8601 offsets without a colon (`+0200`), then
/// naive date-time or bare date read as UTC
pub fn parse_instant(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant);
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(instant) = DateTime::parse_from_str(raw, format) {
            return Some(instant);
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Reached milestone for an optional field value
fn reached(raw: Option<&str>, now: DateTime<Utc>) -> Option<Milestone> {
    raw.and_then(Milestone::parse)
        .filter(|milestone| milestone.is_reached(now))
}

// ============================================================================
// LIFECYCLE STATE
// ============================================================================

/// Migration lifecycle of one municipality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Migrated { since: NaiveDate },
    PreCutover { since: NaiveDate },
    Inactive,
}

impl LifecycleState {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Migrated { .. } => "migrated",
            LifecycleState::PreCutover { .. } => "pre_cutover",
            LifecycleState::Inactive => "inactive",
        }
    }

    /// The three label templates, in one place
    pub fn label(&self) -> String {
        match self {
            LifecycleState::Migrated { since } => format!("{} {}", MIGRATED_LABEL, since),
            LifecycleState::PreCutover { since } => format!("{} {}", PRE_CUTOVER_LABEL, since),
            LifecycleState::Inactive => INACTIVE_LABEL.to_string(),
        }
    }

    pub fn color(&self) -> BadgeColor {
        match self {
            LifecycleState::Migrated { .. } => BadgeColor::Green,
            LifecycleState::PreCutover { .. } => BadgeColor::Yellow,
            LifecycleState::Inactive => BadgeColor::Red,
        }
    }

    pub fn icon(&self) -> StatusIcon {
        match self {
            LifecycleState::Migrated { .. } => StatusIcon::Cutover,
            LifecycleState::PreCutover { .. } => StatusIcon::PreCutover,
            LifecycleState::Inactive => StatusIcon::Inactive,
        }
    }
}

// ============================================================================
// RESOLVED STATUS
// ============================================================================

/// Classification output; everything the badge shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStatus {
    pub display_name: String,
    pub state: LifecycleState,
    pub label: String,
    pub color: BadgeColor,
    pub icon: StatusIcon,
}

impl ResolvedStatus {
    fn from_state(display_name: String, state: LifecycleState) -> Self {
        ResolvedStatus {
            display_name,
            label: state.label(),
            color: state.color(),
            icon: state.icon(),
            state,
        }
    }
}

/// Classify a registry record at evaluation instant `now`.
///
/// The registry returns at most one municipality per code, so only the
/// first entry is read; later entries are ignored, not merged.
///
/// # Errors
/// [`BadgeError::MalformedRecord`] when there is no entry, or the first
/// entry has no usable `Name`.
pub fn resolve(record: &RawRegistryRecord, now: DateTime<Utc>) -> Result<ResolvedStatus, BadgeError> {
    let first = record
        .entries()
        .first()
        .ok_or_else(|| malformed("registry returned no entries".to_string()))?;

    let entry = RegistryEntry::deserialize(first)
        .map_err(|e| malformed(format!("first entry: {}", e)))?;

    let display_name = entry.name.trim().to_string();
    if display_name.is_empty() {
        return Err(malformed("first entry has an empty Name".to_string()));
    }

    let state = if let Some(milestone) = reached(entry.cutover.as_deref(), now) {
        LifecycleState::Migrated {
            since: milestone.day(),
        }
    } else if let Some(milestone) = reached(entry.pre_cutover.as_deref(), now) {
        LifecycleState::PreCutover {
            since: milestone.day(),
        }
    } else {
        LifecycleState::Inactive
    };

    Ok(ResolvedStatus::from_state(display_name, state))
}

fn malformed(reason: String) -> BadgeError {
    BadgeError::MalformedRecord { reason }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn record(value: Value) -> RawRegistryRecord {
        RawRegistryRecord::from_json(value).unwrap()
    }

    fn entry(cutover: Value, pre_cutover: Value) -> RawRegistryRecord {
        record(json!({
            "data": [{
                "CodiceIstat": "016024",
                "Name": "BERGAMO",
                "DataSubentro": cutover,
                "DataPresubentro": pre_cutover,
            }]
        }))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap()
    }

    fn bergamo() -> RawRegistryRecord {
        record(json!({
            "result": "ok",
            "error": "",
            "data": [{
                "CodiceIstat": "016024",
                "Name": "BERGAMO",
                "DataSubentro": "2018-05-17T00:00:00Z",
                "DataAbilitazione": "2017-11-08T00:00:00Z",
                "DataPresubentro": "2018-05-08T00:00:00Z",
                "PianificazioneIntervalloSubentro": {
                    "From": "2018-05-17T00:00:00Z",
                    "To": "2018-05-17T00:00:00Z",
                    "PreferredDate": "2018-05-17T00:00:00Z",
                    "IP": null
                }
            }]
        }))
    }

    #[test]
    fn test_migrated_municipality_is_green() {
        let status = resolve(&bergamo(), now()).unwrap();

        assert_eq!(status.display_name, "BERGAMO");
        assert_eq!(status.color, BadgeColor::Green);
        assert_eq!(status.icon, StatusIcon::Cutover);
        assert_eq!(status.label, "subentrato il 2018-05-17");
        assert_eq!(
            status.state,
            LifecycleState::Migrated {
                since: NaiveDate::from_ymd_opt(2018, 5, 17).unwrap()
            }
        );
    }

    #[test]
    fn test_pre_cutover_only_is_yellow() {
        let status = resolve(&entry(Value::Null, json!("2018-05-08T00:00:00Z")), now()).unwrap();

        assert_eq!(status.color, BadgeColor::Yellow);
        assert_eq!(status.icon, StatusIcon::PreCutover);
        assert_eq!(status.label, "in presubentro dal 2018-05-08");
    }

    #[test]
    fn test_future_cutover_falls_back_to_pre_cutover() {
        let status = resolve(
            &entry(json!("2030-01-01T00:00:00Z"), json!("2019-06-01T00:00:00Z")),
            now(),
        )
        .unwrap();

        assert_eq!(status.color, BadgeColor::Yellow);
    }

    #[test]
    fn test_nothing_reached_is_red() {
        let cases = vec![
            entry(Value::Null, Value::Null),
            entry(json!("2030-01-01T00:00:00Z"), json!("2029-01-01T00:00:00Z")),
            entry(json!(""), json!("not a date")),
            entry(json!(12345), json!({ "From": "2018-01-01" })),
            record(json!({ "data": [{ "Name": "SEZZE" }] })),
        ];

        for case in cases {
            let status = resolve(&case, now()).unwrap();
            assert_eq!(status.color, BadgeColor::Red, "{:?}", case);
            assert_eq!(status.state, LifecycleState::Inactive);
            assert_eq!(status.label, "inattivo :(");
            assert_eq!(status.icon, StatusIcon::Inactive);
        }
    }

    #[test]
    fn test_milestone_at_exactly_now_is_reached() {
        let status = resolve(&entry(json!("2020-01-01T12:00:00Z"), Value::Null), now()).unwrap();
        assert_eq!(status.color, BadgeColor::Green);
    }

    #[test]
    fn test_milestone_evaluation_is_monotonic() {
        let record = entry(json!("2020-01-01T12:00:00Z"), Value::Null);
        let reached_at = now();

        assert_eq!(
            resolve(&record, reached_at - Duration::seconds(1)).unwrap().color,
            BadgeColor::Red
        );
        for later in [0, 1, 60, 86_400, 86_400 * 365 * 10] {
            let status = resolve(&record, reached_at + Duration::seconds(later)).unwrap();
            assert_eq!(status.color, BadgeColor::Green);
        }
    }

    #[test]
    fn test_resolve_is_pure() {
        let record = bergamo();
        let a = resolve(&record, now()).unwrap();
        let b = resolve(&record, now()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_day_keeps_source_offset() {
        // 2018-05-16T23:30Z in UTC; the label shows the registry's own day
        let status = resolve(&entry(json!("2018-05-17T01:30:00+02:00"), Value::Null), now()).unwrap();
        assert_eq!(status.label, "subentrato il 2018-05-17");
    }

    #[test]
    fn test_offset_without_colon_is_reached() {
        let status = resolve(&entry(json!("2018-05-17T00:00:00+0200"), Value::Null), now()).unwrap();

        assert_eq!(status.color, BadgeColor::Green);
        assert_eq!(status.label, "subentrato il 2018-05-17");
    }

    #[test]
    fn test_naive_and_bare_date_forms() {
        let naive = resolve(&entry(json!("2018-05-17T00:00:00"), Value::Null), now()).unwrap();
        let bare = resolve(&entry(json!("2018-05-17"), Value::Null), now()).unwrap();

        assert_eq!(naive.label, "subentrato il 2018-05-17");
        assert_eq!(bare.label, "subentrato il 2018-05-17");
    }

    #[test]
    fn test_only_first_entry_is_read() {
        let record = record(json!({
            "data": [
                { "Name": "LATINA", "DataSubentro": null },
                { "Name": "BERGAMO", "DataSubentro": "2018-05-17T00:00:00Z" },
                "garbage"
            ]
        }));
        let status = resolve(&record, now()).unwrap();

        assert_eq!(status.display_name, "LATINA");
        assert_eq!(status.color, BadgeColor::Red);
    }

    #[test]
    fn test_malformed_records() {
        let cases = vec![
            record(json!({ "data": [] })),
            record(json!({ "data": null })),
            record(json!({})),
            record(json!({ "data": ["BERGAMO"] })),
            record(json!({ "data": [{ "DataSubentro": "2018-05-17T00:00:00Z" }] })),
            record(json!({ "data": [{ "Name": 16024 }] })),
            record(json!({ "data": [{ "Name": "   " }] })),
        ];

        for case in cases {
            let err = resolve(&case, now()).unwrap_err();
            assert!(
                matches!(err, BadgeError::MalformedRecord { .. }),
                "{:?} gave {:?}",
                case,
                err
            );
        }
    }

    #[test]
    fn test_parse_instant() {
        assert!(parse_instant("2018-05-17T00:00:00Z").is_some());
        assert!(parse_instant("2018-05-17T00:00:00.123+01:00").is_some());
        assert!(parse_instant("2018-05-17 10:00:00").is_some());
        assert!(parse_instant("2018-05-17 10:00:00+0100").is_some());
        assert_eq!(
            parse_instant("2018-05-17T00:00:00+0200"),
            parse_instant("2018-05-17T00:00:00+02:00")
        );
        assert!(parse_instant(" 2018-05-17 ").is_some());
        assert!(parse_instant("").is_none());
        assert!(parse_instant("17/05/2018").is_none());
        assert!(parse_instant("2018-13-40").is_none());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(LifecycleState::Inactive.name(), "inactive");
        let since = NaiveDate::from_ymd_opt(2018, 5, 8).unwrap();
        assert_eq!(LifecycleState::PreCutover { since }.name(), "pre_cutover");
        assert_eq!(LifecycleState::Migrated { since }.name(), "migrated");
    }
}
