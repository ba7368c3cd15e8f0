use std::collections::BTreeMap;

use passnet_core::{PassEvent, TeamId, TeamRef};
use serde_json::Value;
use thiserror::Error;

/// Type tag that marks an event as a pass action.
pub const PASS_EVENT_TYPE: &str = "Pass";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("match events payload must be a JSON array")]
    NotAnArray,
}

/// Result of scanning one raw event log: pass records in input order plus
/// the deduplicated team registry (ordered by team id).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedMatch {
    pub teams: Vec<TeamRef>,
    pub passes: Vec<PassEvent>,
}

/// Extracts pass records and team references from a raw event array.
///
/// Events arrive semi-structured; every field is read defensively and a
/// missing or oddly-shaped field never aborts the scan. Non-pass events are
/// skipped, as is any pass without a resolvable source and recipient player
/// id. The only hard failure is a payload that is not an array.
pub fn parse_match_events(events: &Value) -> Result<ParsedMatch, ParseError> {
    let Some(entries) = events.as_array() else {
        return Err(ParseError::NotAnArray);
    };

    let mut teams: BTreeMap<TeamId, String> = BTreeMap::new();
    let mut passes = Vec::new();

    for entry in entries {
        // Register every (team id, team name) sighting, pass event or not.
        // Last write wins; in practice collisions carry identical names.
        if let (Some(team_id), Some(team_name)) = (
            field_i64(entry, &["team", "id"]),
            field_str(entry, &["team", "name"]),
        ) {
            teams.insert(team_id, team_name.to_owned());
        }

        if field_str(entry, &["type", "name"]) != Some(PASS_EVENT_TYPE) {
            continue;
        }

        let Some(from_id) = field_i64(entry, &["player", "id"]) else {
            continue;
        };
        let Some(to_id) = field_i64(entry, &["pass", "recipient", "id"]) else {
            continue;
        };

        let (start_x, start_y) = coordinate_pair(entry.get("location"));
        let (end_x, end_y) = coordinate_pair(field(entry, &["pass", "end_location"]));

        passes.push(PassEvent {
            event_id: field_str(entry, &["id"]).map(str::to_owned),
            team_id: field_i64(entry, &["team", "id"]),
            from_id,
            from_name: field_str(entry, &["player", "name"])
                .unwrap_or_default()
                .to_owned(),
            to_id,
            to_name: field_str(entry, &["pass", "recipient", "name"])
                .unwrap_or_default()
                .to_owned(),
            minute: field_i64(entry, &["minute"]),
            second: field_i64(entry, &["second"]),
            timestamp: field_str(entry, &["timestamp"]).map(str::to_owned),
            start_x,
            start_y,
            end_x,
            end_y,
            length: field_f64(entry, &["pass", "length"]),
            under_pressure: truthy(entry.get("under_pressure")),
            // A pass counts as successful exactly when the source recorded
            // no outcome; any outcome value means it failed.
            successful: field(entry, &["pass", "outcome"]).is_none_or(Value::is_null),
        });
    }

    Ok(ParsedMatch {
        teams: teams
            .into_iter()
            .map(|(id, name)| TeamRef { id, name })
            .collect(),
        passes,
    })
}

/// Derives a match identifier from an uploaded file name by stripping a
/// trailing `.json` (case-insensitive).
pub fn match_id_from_file_name(file_name: &str) -> String {
    let trimmed = file_name.trim();
    let bytes = trimmed.as_bytes();

    if bytes.len() >= 5 && bytes[bytes.len() - 5..].eq_ignore_ascii_case(b".json") {
        trimmed[..trimmed.len() - 5].to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn field<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

fn field_i64(value: &Value, path: &[&str]) -> Option<i64> {
    field(value, path).and_then(Value::as_i64)
}

fn field_f64(value: &Value, path: &[&str]) -> Option<f64> {
    field(value, path).and_then(Value::as_f64)
}

fn field_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    field(value, path).and_then(Value::as_str)
}

/// Reads a 2-element numeric pair; either component degrades to `None`
/// independently when the pair is absent, short, or non-numeric.
fn coordinate_pair(value: Option<&Value>) -> (Option<f64>, Option<f64>) {
    let Some(pair) = value.and_then(Value::as_array) else {
        return (None, None);
    };

    (
        pair.first().and_then(Value::as_f64),
        pair.get(1).and_then(Value::as_f64),
    )
}

/// Boolean coercion with JSON truthiness: absent and null are false, numbers
/// are false only at zero, strings only when empty.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|value| value != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pass_event() -> Value {
        json!({
            "id": "e-1",
            "type": {"name": "Pass"},
            "team": {"id": 1, "name": "A"},
            "player": {"id": 10, "name": "X"},
            "pass": {
                "recipient": {"id": 11, "name": "Y"},
                "end_location": [60.0, 42.0],
                "length": 18.5
            },
            "location": [40.0, 38.0],
            "minute": 5,
            "second": 12,
            "timestamp": "00:05:12.345"
        })
    }

    #[test]
    fn rejects_payload_that_is_not_an_array() {
        let error = parse_match_events(&json!({"events": []})).unwrap_err();
        assert!(matches!(error, ParseError::NotAnArray));
    }

    #[test]
    fn extracts_pass_with_all_attributes() {
        let parsed = parse_match_events(&json!([pass_event()])).expect("parse");

        assert_eq!(parsed.teams, vec![TeamRef { id: 1, name: "A".to_owned() }]);
        assert_eq!(parsed.passes.len(), 1);

        let pass = &parsed.passes[0];
        assert_eq!(pass.event_id.as_deref(), Some("e-1"));
        assert_eq!(pass.team_id, Some(1));
        assert_eq!((pass.from_id, pass.from_name.as_str()), (10, "X"));
        assert_eq!((pass.to_id, pass.to_name.as_str()), (11, "Y"));
        assert_eq!(pass.minute, Some(5));
        assert_eq!(pass.second, Some(12));
        assert_eq!(pass.timestamp.as_deref(), Some("00:05:12.345"));
        assert_eq!((pass.start_x, pass.start_y), (Some(40.0), Some(38.0)));
        assert_eq!((pass.end_x, pass.end_y), (Some(60.0), Some(42.0)));
        assert_eq!(pass.length, Some(18.5));
        assert!(!pass.under_pressure);
        assert!(pass.successful);
    }

    #[test]
    fn skips_non_pass_events_but_still_registers_their_teams() {
        let events = json!([
            {"type": {"name": "Shot"}, "team": {"id": 2, "name": "B"}},
            pass_event(),
        ]);

        let parsed = parse_match_events(&events).expect("parse");
        assert_eq!(parsed.passes.len(), 1);
        assert_eq!(
            parsed.teams,
            vec![
                TeamRef { id: 1, name: "A".to_owned() },
                TeamRef { id: 2, name: "B".to_owned() },
            ]
        );
    }

    #[test]
    fn discards_passes_without_resolvable_endpoints() {
        let mut no_recipient = pass_event();
        no_recipient["pass"]
            .as_object_mut()
            .expect("pass object")
            .remove("recipient");

        let mut no_player = pass_event();
        no_player
            .as_object_mut()
            .expect("event object")
            .remove("player");

        let parsed = parse_match_events(&json!([no_recipient, no_player])).expect("parse");
        assert!(parsed.passes.is_empty());
        // Team registration still happened for both events.
        assert_eq!(parsed.teams.len(), 1);
    }

    #[test]
    fn outcome_presence_marks_the_pass_failed() {
        let mut intercepted = pass_event();
        intercepted["pass"]["outcome"] = json!({"id": 9, "name": "Incomplete"});

        let parsed = parse_match_events(&json!([pass_event(), intercepted])).expect("parse");
        assert!(parsed.passes[0].successful);
        assert!(!parsed.passes[1].successful);
    }

    #[test]
    fn team_registry_deduplicates_by_id_with_last_write_winning() {
        let mut renamed = pass_event();
        renamed["team"] = json!({"id": 1, "name": "A (renamed)"});

        let parsed = parse_match_events(&json!([pass_event(), renamed])).expect("parse");
        assert_eq!(
            parsed.teams,
            vec![TeamRef { id: 1, name: "A (renamed)".to_owned() }]
        );
    }

    #[test]
    fn under_pressure_coerces_loosely_typed_values() {
        let mut flagged = pass_event();
        flagged["under_pressure"] = json!(true);
        let mut numeric = pass_event();
        numeric["under_pressure"] = json!(1);
        let mut zero = pass_event();
        zero["under_pressure"] = json!(0);
        let mut nulled = pass_event();
        nulled["under_pressure"] = Value::Null;

        let parsed =
            parse_match_events(&json!([flagged, numeric, zero, nulled, pass_event()]))
                .expect("parse");
        let pressured: Vec<bool> = parsed
            .passes
            .iter()
            .map(|pass| pass.under_pressure)
            .collect();
        assert_eq!(pressured, vec![true, true, false, false, false]);
    }

    #[test]
    fn malformed_coordinates_degrade_to_null_components() {
        let mut short = pass_event();
        short["location"] = json!([12.0]);
        short["pass"]["end_location"] = json!("not a pair");

        let parsed = parse_match_events(&json!([short])).expect("parse");
        let pass = &parsed.passes[0];
        assert_eq!((pass.start_x, pass.start_y), (Some(12.0), None));
        assert_eq!((pass.end_x, pass.end_y), (None, None));
    }

    #[test]
    fn match_id_strips_json_extension_case_insensitively() {
        assert_eq!(match_id_from_file_name("final_2024.json"), "final_2024");
        assert_eq!(match_id_from_file_name("FINAL.JSON"), "FINAL");
        assert_eq!(match_id_from_file_name("  semifinal.json "), "semifinal");
        assert_eq!(match_id_from_file_name("notes.txt"), "notes.txt");
        assert_eq!(match_id_from_file_name(".json"), "");
    }
}
