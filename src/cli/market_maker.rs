use clap::{App, Arg, ArgMatches, SubCommand};
use log::{info, warn};
use std::{error, sync::Arc};

use crate::{
    cli::CliError,
    exchange::{market::MarketMetadata, setup::PhoenixMakerSetup, submitter::PhoenixActionSubmitter},
    market_maker::{
        config::load_config,
        runner::{Runner, RunnerOptions},
        Error as MarketMakerError,
    },
    oracle::coinbase::CoinbaseOracleProvider,
    utils::logging::init_logger,
};

use super::{command::CliCommand, CliConfig, CliResult};

#[derive(Debug)]
pub enum MarketMakerSubCommand {
    Run { config_path: String },
    Setup { config_path: String },
}

pub trait MarketMakerSubCommands {
    fn market_maker_subcommands(self) -> Self;
}

impl MarketMakerSubCommands for App<'_, '_> {
    fn market_maker_subcommands(self) -> Self {
        self.subcommand(
            SubCommand::with_name("market-maker")
                .about("Runs a market making bot.")
                .subcommand(
                    SubCommand::with_name("run")
                        .about("Sets up the maker if needed, quotes for the configured number of iterations and withdraws all funds.")
                        .arg(config_arg()),
                )
                .subcommand(
                    SubCommand::with_name("setup")
                        .about("Creates the token accounts and seat needed to make markets, without quoting.")
                        .arg(config_arg()),
                ),
        )
    }
}

fn config_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("config")
        .short("c")
        .long("config")
        .value_name("FILE")
        .takes_value(true)
        .help("Path to a config file. This config should follow the format displayed in `/cfg/market-maker/default.json`.")
}

fn config_path(matches: &ArgMatches) -> Result<String, Box<dyn error::Error>> {
    match matches.value_of("config") {
        Some(s) => Ok(s.to_string()),
        None => Err(Box::new(CliError::BadParameters(
            "Path to config path not provided.".to_string(),
        ))),
    }
}

pub fn parse_market_maker_command(
    matches: &ArgMatches,
) -> Result<CliCommand, Box<dyn error::Error>> {
    match matches.subcommand() {
        ("run", Some(matches)) => Ok(CliCommand::MarketMaker(MarketMakerSubCommand::Run {
            config_path: config_path(matches)?,
        })),
        ("setup", Some(matches)) => Ok(CliCommand::MarketMaker(MarketMakerSubCommand::Setup {
            config_path: config_path(matches)?,
        })),
        ("", None) => {
            eprintln!("{}", matches.usage());
            Err(Box::new(CliError::CommandNotRecognized(
                "No market maker subcommand given.".to_string(),
            )))
        }
        (other, _) => Err(Box::new(CliError::CommandNotRecognized(other.to_string()))),
    }
}

pub async fn process_market_maker_command(
    config: &CliConfig,
    command: &MarketMakerSubCommand,
) -> Result<CliResult, Box<dyn error::Error>> {
    _ = init_logger();

    match command {
        MarketMakerSubCommand::Run { config_path } => {
            let runner = build_runner(config, config_path).await?;
            runner.prepare().await.map_err(CliError::MarketMaker)?;

            info!("Let's dance! 🔥💃");

            let summary = runner.run().await;
            if summary.withdrawal.is_none() {
                warn!("Exiting without a confirmed withdrawal.");
            }
        }
        MarketMakerSubCommand::Setup { config_path } => {
            let runner = build_runner(config, config_path).await?;
            runner.prepare().await.map_err(CliError::MarketMaker)?;
        }
    }

    Ok(CliResult {})
}

async fn build_runner(config: &CliConfig, config_path: &str) -> Result<Runner, CliError> {
    info!("Setting up components from config..");

    let mm_config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            warn!("There was an error loading config: {}", e.to_string());
            return Err(CliError::MarketMaker(MarketMakerError::InvalidConfig(e)));
        }
    };
    let market = mm_config.market_pubkey().map_err(MarketMakerError::from)?;

    info!("Loading market {} from {}..", market, config.json_rpc_url);
    let metadata = MarketMetadata::load(&config.rpc_client, &market)
        .await
        .map_err(MarketMakerError::from)?;
    info!(
        "Market {} - Base mint: {} - Quote mint: {} - Base lot: {} - Quote lot: {} - Price decimals: {}",
        market,
        metadata.base_mint,
        metadata.quote_mint,
        metadata.base_lot_size,
        metadata.quote_lot_size,
        metadata.price_decimal_places()
    );

    let oracle = CoinbaseOracleProvider::new(&mm_config.price_api_url, &mm_config.price_symbol)
        .map_err(MarketMakerError::from)?;

    Ok(Runner::new(RunnerOptions {
        price_decimals: metadata.price_decimal_places(),
        setup: Arc::new(PhoenixMakerSetup::new(
            Arc::clone(&config.rpc_client),
            Arc::clone(&config.keypair),
            metadata.clone(),
        )),
        submitter: Arc::new(PhoenixActionSubmitter::new(
            Arc::clone(&config.rpc_client),
            Arc::clone(&config.keypair),
            metadata,
        )),
        oracle: Arc::new(oracle),
        config: Arc::new(mm_config),
    }))
}
