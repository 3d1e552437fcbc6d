use serde::{Deserialize, Deserializer};

/// Result of the most recent check of a Host or Service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CheckResult {
    /// Plugin output text.
    #[serde(default, deserialize_with = "string_or_null")]
    pub output: String,
    /// Command line that produced the result. Icinga2 reports it either as
    /// a single string or as an argv list; lists are joined with spaces.
    #[serde(default, deserialize_with = "command_line")]
    pub command: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CommandLine {
    Line(String),
    Argv(Vec<String>),
}

fn command_line<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<CommandLine>::deserialize(d)?.map(|cmd| match cmd {
        CommandLine::Line(line) => line,
        CommandLine::Argv(argv) => argv.join(" "),
    }))
}

pub(crate) fn string_or_null<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn argv_command_is_joined() {
        let cr: CheckResult = serde_json::from_value(json!({
            "output": "PING OK - Packet loss = 0%",
            "command": ["/usr/lib/nagios/plugins/check_ping", "-H", "192.0.2.1"],
            "exit_status": 0.0
        }))
        .unwrap();
        assert_eq!(cr.output, "PING OK - Packet loss = 0%");
        assert_eq!(
            cr.command.as_deref(),
            Some("/usr/lib/nagios/plugins/check_ping -H 192.0.2.1")
        );
    }

    #[test]
    fn string_command_is_kept() {
        let cr: CheckResult =
            serde_json::from_value(json!({"output": "ok", "command": "check_dummy 0"})).unwrap();
        assert_eq!(cr.command.as_deref(), Some("check_dummy 0"));
    }

    #[test]
    fn missing_command_is_none() {
        let cr: CheckResult = serde_json::from_value(json!({"output": "ok"})).unwrap();
        assert!(cr.command.is_none());
        let cr: CheckResult =
            serde_json::from_value(json!({"output": null, "command": null})).unwrap();
        assert_eq!(cr, CheckResult::default());
    }
}
