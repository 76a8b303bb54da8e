use crate::error::{EngineResult, FanjoinError};

/// Parse a whole string as a base-10 integer
///
/// Leading whitespace and a sign are accepted; anything left over after the digits, or
/// no digits at all, is rejected with a message naming `label`. Range checks (such as
/// non-negative bounds) are left to the partitioner.
pub fn parse_bound(text: &str, label: &str) -> EngineResult<i64> {
    let trimmed = text.trim_start();
    trimmed.parse::<i64>().map_err(|e| {
        use std::num::IntErrorKind;
        let detail = match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => " (out of range)",
            _ => "",
        };
        FanjoinError::Input(format!("Invalid {label}: {text}{detail}"))
    })
}

/// Parse a worker count: a bound that must also fit `usize`
pub fn parse_count(text: &str, label: &str) -> EngineResult<usize> {
    let value = parse_bound(text, label)?;
    usize::try_from(value)
        .map_err(|_| FanjoinError::invalid(format!("{label} must be at least 1, got {value}")))
}
