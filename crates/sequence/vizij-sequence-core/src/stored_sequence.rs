use crate::data::SequenceData;
use crate::error::SequenceError;

/// Public API: parse StoredSequence JSON into a validated [`SequenceData`].
///
/// Notes:
/// - Times and durations are seconds.
/// - Binding ids are UUID strings and must be unique across spawnables and possessables.
/// - Keys without `interp` default to linear.
pub fn parse_stored_sequence_json(s: &str) -> Result<SequenceData, SequenceError> {
    let data: SequenceData = serde_json::from_str(s).map_err(|e| SequenceError::Parse {
        reason: e.to_string(),
    })?;
    data.validate_basic()
        .map_err(|reason| SequenceError::InvalidSequence { reason })?;
    Ok(data)
}
