//! Subcommand handlers and the helpers they share.

pub mod config_cmd;
pub mod cover;
pub mod decode;
pub mod devices;
pub mod simulate;

use std::path::PathBuf;

use neoblue_api::StatusPayload;
use neoblue_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file selected by `--config` / `NEOBLUE_CONFIG`, else the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(neoblue_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(neoblue_config::load_config_from(&config_file(global))?)
}

/// Parse hex manufacturer data, tolerating `:`, `-`, and whitespace separators
/// and an optional `0x` prefix.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, CliError> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ':' | '-') && !c.is_whitespace())
        .collect();
    hex::decode(&digits).map_err(|e| CliError::InvalidHex {
        input: input.to_owned(),
        reason: e.to_string(),
    })
}

/// Parse and decode a status payload.
pub fn parse_payload(input: &str) -> Result<StatusPayload, CliError> {
    let bytes = parse_hex(input)?;
    Ok(StatusPayload::decode(&bytes)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hex_separators_are_ignored() {
        assert_eq!(parse_hex("55:32:0a:4b:21").unwrap(), [0x55, 0x32, 0x0A, 0x4B, 0x21]);
        assert_eq!(parse_hex("0x55 32 0A").unwrap(), [0x55, 0x32, 0x0A]);
        assert_eq!(parse_hex("55-32").unwrap(), [0x55, 0x32]);
    }

    #[test]
    fn odd_length_hex_is_rejected() {
        assert!(matches!(parse_hex("553"), Err(CliError::InvalidHex { .. })));
    }

    #[test]
    fn short_payload_is_malformed() {
        assert!(matches!(
            parse_payload("55320A"),
            Err(CliError::MalformedPayload(_))
        ));
    }
}
