use clap::ArgMatches;
use solana_clap_utils::input_validators::normalize_to_url_if_moniker;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    signature::{read_keypair_file, Keypair},
    signer::Signer,
};
use std::{env, error, sync::Arc};

use crate::cli::{command::parse_command, CliError};

use super::CliConfig;

/// The environment variable holding the trader's secret key as a JSON byte array.
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

pub async fn parse_args(matches: &ArgMatches<'_>) -> Result<CliConfig, Box<dyn error::Error>> {
    let json_rpc_url = matches.value_of("json_rpc_url").unwrap_or("mainnet-beta");
    let keypair_path = matches.value_of("keypair");

    let normalized_url = normalize_to_url_if_moniker(json_rpc_url);
    println!("Using JSON RPC API URL: {}", normalized_url);

    let keypair = match keypair_path {
        Some(path) => {
            println!("Loading keypair from: {}", path);
            read_keypair_file(path).map_err(|e| CliError::KeypairError(e.to_string()))?
        }
        None => {
            println!("Loading keypair from the {} variable.", PRIVATE_KEY_ENV);
            let bytes = env::var(PRIVATE_KEY_ENV).map_err(|_| {
                CliError::KeypairError(format!(
                    "No keypair path provided and {} is not set.",
                    PRIVATE_KEY_ENV
                ))
            })?;
            keypair_from_json_bytes(&bytes)?
        }
    };

    println!("Loaded keypair with address: {}", keypair.pubkey());
    let command = parse_command(matches)?;

    Ok(CliConfig {
        command,
        json_rpc_url: normalized_url.clone(),
        rpc_client: Arc::new(RpcClient::new_with_commitment(
            normalized_url,
            CommitmentConfig::confirmed(),
        )),
        keypair: Arc::new(keypair),
    })
}

/// Parses a keypair from a JSON array of secret key bytes, e.g. `[12, 250, ...]`.
pub fn keypair_from_json_bytes(value: &str) -> Result<Keypair, CliError> {
    let bytes: Vec<u8> = serde_json::from_str(value.trim())
        .map_err(|e| CliError::KeypairError(format!("Invalid keypair bytes: {}", e)))?;
    Keypair::from_bytes(&bytes).map_err(|e| CliError::KeypairError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_byte_array() {
        let keypair = Keypair::new();
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();

        let parsed = keypair_from_json_bytes(&json).unwrap();

        assert_eq!(parsed.pubkey(), keypair.pubkey());
    }

    #[test]
    fn rejects_malformed_bytes() {
        assert!(matches!(
            keypair_from_json_bytes("not json"),
            Err(CliError::KeypairError(_))
        ));
        assert!(matches!(
            keypair_from_json_bytes("[1, 2, 3]"),
            Err(CliError::KeypairError(_))
        ));
    }
}
