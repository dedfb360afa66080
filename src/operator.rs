//! Operator console commands
//!
//! Line-oriented input read from stdin by the binary while a session runs:
//!
//! ```text
//! gas 80      set gas power (0-100)
//! air 40      set airflow (0-100)
//! fc          mark first crack
//! drop        drop the batch
//! status      print the latest snapshot
//! help        list commands
//! ```

use thiserror::Error;

use crate::types::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Gas(u8),
    Airflow(u8),
    FirstCrack,
    Drop,
    Status,
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'{0}' needs a percentage 0-100")]
    MissingValue(&'static str),
    #[error("'{value}' is not a percentage 0-100")]
    InvalidValue { value: String },
}

pub const HELP: &str = "commands: gas <0-100> | air <0-100> | fc | drop | status | help";

impl std::str::FromStr for OperatorCommand {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Err(ParseCommandError::Empty);
        };

        match word.to_ascii_lowercase().as_str() {
            "gas" | "g" => parse_percent(parts.next(), "gas").map(OperatorCommand::Gas),
            "air" | "airflow" | "a" => {
                parse_percent(parts.next(), "air").map(OperatorCommand::Airflow)
            }
            "fc" | "crack" => Ok(OperatorCommand::FirstCrack),
            "drop" | "d" => Ok(OperatorCommand::Drop),
            "status" | "s" => Ok(OperatorCommand::Status),
            "help" | "?" => Ok(OperatorCommand::Help),
            other => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_percent(token: Option<&str>, command: &'static str) -> Result<u8, ParseCommandError> {
    let token = token.ok_or(ParseCommandError::MissingValue(command))?;
    match token.trim_end_matches('%').parse::<u8>() {
        Ok(v) if v <= 100 => Ok(v),
        _ => Err(ParseCommandError::InvalidValue {
            value: token.to_string(),
        }),
    }
}

/// One-line status for the console.
pub fn format_status(snapshot: &SessionSnapshot) -> String {
    let ror = snapshot
        .ror
        .map_or_else(|| "--".to_string(), |r| format!("{r:+.1}"));
    let mut line = format!(
        "[{}] tick {:>3} | {:.1} C | RoR {} C/min | {} | DTR {:.1}%",
        snapshot.status,
        snapshot.tick,
        snapshot.bean_temp,
        ror,
        snapshot.actuators,
        snapshot.development_ratio
    );
    if let Some(rec) = &snapshot.recommendation {
        let advice = format!(" | {} ({}) {}", rec.action, rec.intensity, rec.message);
        line.push_str(&advice);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionCode, Actuators, Recommendation, SessionStatus};

    fn parse(line: &str) -> Result<OperatorCommand, ParseCommandError> {
        line.parse()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("gas 80"), Ok(OperatorCommand::Gas(80)));
        assert_eq!(parse("AIR 40%"), Ok(OperatorCommand::Airflow(40)));
        assert_eq!(parse("  fc "), Ok(OperatorCommand::FirstCrack));
        assert_eq!(parse("drop"), Ok(OperatorCommand::Drop));
        assert_eq!(parse("s"), Ok(OperatorCommand::Status));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(""), Err(ParseCommandError::Empty));
        assert_eq!(parse("gas"), Err(ParseCommandError::MissingValue("gas")));
        let err = parse("gas 101").unwrap_err();
        assert!(matches!(err, ParseCommandError::InvalidValue { .. }));
        assert!(matches!(parse("vent"), Err(ParseCommandError::Unknown(_))));
    }

    #[test]
    fn test_status_line() {
        let snapshot = SessionSnapshot {
            status: SessionStatus::Running,
            tick: 42,
            bean_temp: 101.25,
            ror: Some(12.0),
            actuators: Actuators::new(75, 50),
            recommendation: Some(Recommendation {
                tick: 42,
                temp_delta: 3.0,
                action: ActionCode::DecreaseGas,
                intensity: 80,
                message: "Running hot".to_string(),
                is_synchronized: false,
            }),
            ..SessionSnapshot::default()
        };
        let line = format_status(&snapshot);
        assert!(line.contains("tick  42"));
        assert!(line.contains("RoR +12.0"));
        assert!(line.contains("DECREASE GAS (80)"));
    }
}
