use chrono::{DateTime, Duration, Utc};

use crate::EngineError;

/// Decides whether a timeout has elapsed for a pending instance
///
/// The expression grammar is the trigger's concern; the engine only
/// needs the boolean decision. Evaluation errors surface to the sweep,
/// which isolates them per descriptor.
pub trait TimeoutTrigger: Send + Sync {
    /// Whether the timeout described by `expression` has elapsed since
    /// the instance entered its current state
    fn fire(&self, entered_at: DateTime<Utc>, expression: &str) -> Result<bool, EngineError>;
}

/// Default trigger for simple elapsed-duration expressions
///
/// Accepts an unsigned integer with an optional unit suffix: `s`, `m`,
/// `h`, or `d`. A bare integer is seconds. Examples: `"90s"`, `"30m"`,
/// `"24h"`, `"7d"`, `"3600"`.
#[derive(Debug, Default)]
pub struct SimpleTimeoutTrigger;

impl TimeoutTrigger for SimpleTimeoutTrigger {
    fn fire(&self, entered_at: DateTime<Utc>, expression: &str) -> Result<bool, EngineError> {
        let timeout = parse_timeout_expression(expression)?;
        Ok(Utc::now() - entered_at >= timeout)
    }
}

/// Parse an elapsed-duration expression into a duration
pub fn parse_timeout_expression(expression: &str) -> Result<Duration, EngineError> {
    let expression = expression.trim();

    let (digits, unit) = match expression.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => expression.split_at(split),
        None => (expression, ""),
    };

    let value: i64 = digits
        .parse()
        .map_err(|_| malformed(expression))?;

    // The checked constructors reject values outside chrono's duration
    // range instead of panicking
    let duration = match unit {
        "" | "s" => Duration::try_seconds(value),
        "m" => Duration::try_minutes(value),
        "h" => Duration::try_hours(value),
        "d" => Duration::try_days(value),
        _ => None,
    };

    duration.ok_or_else(|| malformed(expression))
}

fn malformed(expression: &str) -> EngineError {
    EngineError::TimeoutExpression(format!("malformed duration `{}`", expression))
}
