// src/synthesis_output.rs
//! Reads the synthesizer's wire format into a tagged outcome.
//!
//! The model answers with one of three shapes:
//!
//! ```text
//! ~~~R1~~~                               <INSUFFICIENT_DATA: R2 address>
//! interface Gi0/0
//! ip address 10.0.0.1 255.255.255.252    <No Configuration Requirements>
//! ~~~R2~~~
//! show ip ospf neighbor
//! ```
//!
//! Sentinels are matched against the whole (trimmed) reply. Everything else is
//! read as device blocks: a line that is exactly `~~~name~~~` opens a block and
//! the following non-blank lines are its commands. Text before the first
//! separator does not belong to any device and is dropped. A reply that is
//! neither a sentinel nor contains a single separator is `Unrecognized`.

use regex::Regex;
use serde::Serialize;

/// Exact reply meaning "this requirement implies no configuration".
pub const NOT_APPLICABLE_SENTINEL: &str = "<No Configuration Requirements>";

const INSUFFICIENT_PREFIX: &str = "<INSUFFICIENT_DATA:";

lazy_static::lazy_static! {
    static ref SEPARATOR: Regex = Regex::new(r"^~~~(.+?)~~~$")
        .expect("Failed to compile device separator regex - this is a bug in the code");
}

/// A named device and the commands emitted for it, in model order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceConfigBlock {
    pub device_name: String,
    pub commands: Vec<String>,
}

/// What a synthesis reply means, decided once, right after it arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SynthesisOutcome {
    /// The model declined to guess values it was not given.
    Insufficient { reason: String },
    /// The requirement has no configuration implication.
    NotApplicable,
    /// One or more device blocks.
    Blocks { blocks: Vec<DeviceConfigBlock> },
    /// No sentinel and no device separator: the reply broke the output format.
    Unrecognized,
}

impl SynthesisOutcome {
    pub fn blocks(&self) -> &[DeviceConfigBlock] {
        match self {
            Self::Blocks { blocks } => blocks,
            _ => &[],
        }
    }

    pub fn command_count(&self) -> usize {
        self.blocks().iter().map(|b| b.commands.len()).sum()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Insufficient { .. } => "insufficient_data",
            Self::NotApplicable => "not_applicable",
            Self::Blocks { .. } => "configuration",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Parses a raw synthesis reply. Never fails: any text maps to some outcome.
pub fn parse_synthesis_output(raw: &str) -> SynthesisOutcome {
    let trimmed = raw.trim();

    if trimmed == NOT_APPLICABLE_SENTINEL {
        return SynthesisOutcome::NotApplicable;
    }

    if let Some(reason) = insufficient_reason(trimmed) {
        return SynthesisOutcome::Insufficient { reason };
    }

    let blocks = parse_device_blocks(trimmed);
    if blocks.is_empty() {
        log::warn!("Synthesis reply has no sentinel and no device separator");
        return SynthesisOutcome::Unrecognized;
    }
    SynthesisOutcome::Blocks { blocks }
}

/// `<INSUFFICIENT_DATA: what is missing>` → `what is missing`.
fn insufficient_reason(reply: &str) -> Option<String> {
    reply
        .strip_prefix(INSUFFICIENT_PREFIX)
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|reason| reason.trim().to_string())
}

/// Splits separator-delimited text into device blocks.
pub fn parse_device_blocks(text: &str) -> Vec<DeviceConfigBlock> {
    let mut blocks: Vec<DeviceConfigBlock> = Vec::new();
    let mut stray_lines = 0usize;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        if let Some(captures) = SEPARATOR.captures(line.trim()) {
            let device_name = captures[1].trim().to_string();
            if device_name.is_empty() {
                log::warn!("Ignoring device separator without a name: '{}'", line.trim());
                continue;
            }
            if blocks.iter().any(|b| b.device_name == device_name) {
                log::warn!("Device '{}' appears under more than one separator", device_name);
            }
            blocks.push(DeviceConfigBlock {
                device_name,
                commands: Vec::new(),
            });
            continue;
        }

        match blocks.last_mut() {
            Some(block) => block.commands.push(line.to_string()),
            None => stray_lines += 1,
        }
    }

    if stray_lines > 0 {
        log::warn!(
            "Dropped {} line(s) before the first device separator",
            stray_lines
        );
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block(name: &str, commands: &[&str]) -> DeviceConfigBlock {
        DeviceConfigBlock {
            device_name: name.to_string(),
            commands: commands.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn two_devices_in_order() {
        let raw = "~~~R1~~~\nint gi0/0\nip addr 1.1.1.1 255.255.255.0\n~~~R2~~~\nshow ip ospf neighbor";

        assert_eq!(
            parse_synthesis_output(raw),
            SynthesisOutcome::Blocks {
                blocks: vec![
                    block("R1", &["int gi0/0", "ip addr 1.1.1.1 255.255.255.0"]),
                    block("R2", &["show ip ospf neighbor"]),
                ]
            }
        );
    }

    #[test]
    fn not_applicable_sentinel_has_no_blocks() {
        let outcome = parse_synthesis_output("<No Configuration Requirements>");
        assert_eq!(outcome, SynthesisOutcome::NotApplicable);
        assert!(outcome.blocks().is_empty());

        assert_eq!(
            parse_synthesis_output("\n  <No Configuration Requirements>\n"),
            SynthesisOutcome::NotApplicable
        );
    }

    #[test]
    fn insufficient_data_carries_reason() {
        assert_eq!(
            parse_synthesis_output("<INSUFFICIENT_DATA: IP address of Router2 interface>\n"),
            SynthesisOutcome::Insufficient {
                reason: "IP address of Router2 interface".to_string()
            }
        );
    }

    #[test]
    fn sentinel_must_be_the_whole_reply() {
        let raw = "~~~R1~~~\nrouter ospf 10\n<No Configuration Requirements>";
        let outcome = parse_synthesis_output(raw);
        assert_eq!(
            outcome,
            SynthesisOutcome::Blocks {
                blocks: vec![block("R1", &["router ospf 10", "<No Configuration Requirements>"])]
            }
        );
    }

    #[test]
    fn text_before_first_separator_is_dropped() {
        let raw = "Here is your configuration:\n\n~~~Router1~~~\nrouter ospf 10\n network 192.168.1.0 0.0.0.3 area 0\n";
        assert_eq!(
            parse_device_blocks(raw),
            vec![block(
                "Router1",
                &["router ospf 10", " network 192.168.1.0 0.0.0.3 area 0"]
            )]
        );
    }

    #[test]
    fn blank_lines_and_trailing_spaces_are_ignored() {
        let raw = "~~~SW1~~~  \n\nvlan 10   \n\n   \nname USERS\n";
        assert_eq!(parse_device_blocks(raw), vec![block("SW1", &["vlan 10", "name USERS"])]);
    }

    #[test]
    fn repeated_device_keeps_separate_blocks() {
        let raw = "~~~R1~~~\nshow ip route\n~~~R1~~~\nshow ip ospf";
        let blocks = parse_device_blocks(raw);
        assert_eq!(
            blocks,
            vec![block("R1", &["show ip route"]), block("R1", &["show ip ospf"])]
        );
    }

    #[test]
    fn separator_without_commands_yields_empty_block() {
        assert_eq!(
            parse_device_blocks("~~~R1~~~\n~~~R2~~~\nshow version"),
            vec![block("R1", &[]), block("R2", &["show version"])]
        );
    }

    #[test]
    fn bare_commands_are_unrecognized() {
        let outcome = parse_synthesis_output("router ospf 1\nnetwork 10.0.0.0 0.255.255.255 area 0");
        assert_eq!(outcome, SynthesisOutcome::Unrecognized);
        assert_eq!(outcome.label(), "unrecognized");
        assert_eq!(outcome.command_count(), 0);
    }

    #[test]
    fn malformed_sentinels_are_unrecognized() {
        assert_eq!(
            parse_synthesis_output("<INSUFFICIENT_DATA: R2 IP>\nPlease provide the address."),
            SynthesisOutcome::Unrecognized
        );
        assert_eq!(
            parse_synthesis_output("<INSUFFICIENT_DATA>"),
            SynthesisOutcome::Unrecognized
        );
        assert_eq!(
            parse_synthesis_output("<No Configuration Requirements>\nThis is a question about theory."),
            SynthesisOutcome::Unrecognized
        );
    }

    #[test]
    fn unnamed_separator_does_not_open_a_block() {
        assert_eq!(
            parse_device_blocks("~~~ ~~~\nshow version\n~~~R1~~~\nshow ip route"),
            vec![block("R1", &["show ip route"])]
        );
        assert_eq!(
            parse_synthesis_output("~~~ ~~~\nshow version"),
            SynthesisOutcome::Unrecognized
        );
    }

    #[test]
    fn command_count_sums_all_devices() {
        let outcome = parse_synthesis_output("~~~A~~~\none\ntwo\n~~~B~~~\nthree");
        assert_eq!(outcome.command_count(), 3);
        assert_eq!(outcome.label(), "configuration");
    }
}
