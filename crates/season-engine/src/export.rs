//! JSON fixture I/O.
//!
//! Fixtures are written as a JSON array of objects tagged by `status`.
//! Placed games additionally carry a `game_code` (`G001`, `G002`, ...)
//! numbered in schedule order. Readers ignore the code, so an exported file
//! can be fed straight back into [`fixtures_from_json`].

use serde_json::Value;

use crate::model::Fixture;

/// Serialize `fixtures` as pretty JSON, numbering placed games with `prefix`.
pub fn fixtures_to_json(fixtures: &[Fixture], prefix: &str) -> serde_json::Result<String> {
    let mut records = Vec::with_capacity(fixtures.len());
    let mut next_code = 1;
    for fixture in fixtures {
        let mut record = serde_json::to_value(fixture)?;
        if let (Fixture::Placed(_), Value::Object(map)) = (fixture, &mut record) {
            map.insert(
                "game_code".to_string(),
                Value::String(format!("{}{:03}", prefix, next_code)),
            );
            next_code += 1;
        }
        records.push(record);
    }
    serde_json::to_string_pretty(&records)
}

/// Parse a JSON fixture list as written by [`fixtures_to_json`].
pub fn fixtures_from_json(json: &str) -> serde_json::Result<Vec<Fixture>> {
    serde_json::from_str(json)
}
