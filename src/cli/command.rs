use clap::ArgMatches;
use std::error;

use crate::cli::CliError;

use super::{
    market_maker::{parse_market_maker_command, process_market_maker_command, MarketMakerSubCommand},
    CliConfig, CliResult,
};

#[derive(Debug)]
pub enum CliCommand {
    MarketMaker(MarketMakerSubCommand),
}

pub fn parse_command(matches: &ArgMatches) -> Result<CliCommand, Box<dyn error::Error>> {
    let response = match matches.subcommand() {
        ("market-maker", Some(matches)) => parse_market_maker_command(matches),
        ("", None) => {
            eprintln!("{}", matches.usage());
            return Err(Box::new(CliError::CommandNotRecognized(
                "No subcommand given.".to_string(),
            )));
        }
        (other, _) => {
            return Err(Box::new(CliError::CommandNotRecognized(other.to_string())));
        }
    }?;
    Ok(response)
}

pub async fn process_command(config: &CliConfig) -> Result<CliResult, Box<dyn std::error::Error>> {
    match &config.command {
        CliCommand::MarketMaker(market_maker_command) => {
            process_market_maker_command(config, market_maker_command).await
        }
    }
}
