use chrono::Utc;
use log::{info, warn};
use solana_sdk::signature::Signature;
use std::sync::Arc;
use thiserror::Error;

use crate::{
    common::{
        oracle::{validate_price, OracleInfo, OracleProvider, OracleProviderError},
        orders::{Action, ActionSubmitter, SubmitterError},
        setup::{MakerSetup, SetupOutcome},
    },
    utils::transactions::tx_link,
};

use super::{
    config::{Config, TeardownPolicy},
    quotes::{Quote, QuoteGenerator},
    Error,
};

/// The state threaded through every cycle of the [`Runner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleState {
    /// The number of completed cycles.
    pub iteration: u64,
    next_client_order_id: u128,
}

impl Default for CycleState {
    fn default() -> Self {
        Self {
            iteration: 0,
            next_client_order_id: 1,
        }
    }
}

impl CycleState {
    /// Hands out a fresh pair of client order ids, one for the bid and one for the ask.
    fn next_client_order_ids(&mut self) -> (u128, u128) {
        let bid = self.next_client_order_id;
        let ask = bid + 1;
        self.next_client_order_id = ask + 1;
        (bid, ask)
    }
}

/// Why a cycle was abandoned before completing.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("Failed to cancel open orders: {0}")]
    CancelFailed(SubmitterError),
    #[error("Reference price unavailable: {0}")]
    PriceUnavailable(OracleProviderError),
    #[error("Failed to submit batch: {0}")]
    SubmitFailed(SubmitterError),
}

/// Represents the result of a single cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Completed {
        /// The signature of the cancel all transaction.
        cancel_signature: Signature,
        /// The signature of the placement or withdrawal transaction.
        signature: Signature,
        /// The quote that was placed, `None` for the terminal withdrawal cycle.
        quote: Option<Quote>,
    },
    Skipped(SkipReason),
}

/// Represents the result of running the [`Runner`] to completion.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// The number of completed cycles, including the withdrawal cycle if it went through.
    pub iterations: u64,
    /// The number of cycles that were abandoned and retried.
    pub skipped_cycles: u64,
    /// The signature of the confirmed withdrawal, if any.
    pub withdrawal: Option<Signature>,
}

pub struct RunnerOptions {
    pub config: Arc<Config>,
    pub setup: Arc<dyn MakerSetup>,
    pub oracle: Arc<dyn OracleProvider>,
    pub submitter: Arc<dyn ActionSubmitter>,
    /// Number of decimals used when logging prices.
    pub price_decimals: usize,
}

pub struct Runner {
    config: Arc<Config>,
    setup: Arc<dyn MakerSetup>,
    oracle: Arc<dyn OracleProvider>,
    submitter: Arc<dyn ActionSubmitter>,
    generator: QuoteGenerator,
    price_decimals: usize,
}

impl Runner {
    pub fn new(
        RunnerOptions {
            config,
            setup,
            oracle,
            submitter,
            price_decimals,
        }: RunnerOptions,
    ) -> Self {
        Self {
            generator: QuoteGenerator::from_config(&config),
            config,
            setup,
            oracle,
            submitter,
            price_decimals,
        }
    }

    /// Makes sure the trader can place orders on the market.
    ///
    /// A failure here is fatal, quoting must not start without confirmed setup.
    pub async fn prepare(&self) -> Result<SetupOutcome, Error> {
        info!("[RUNNER] Checking maker setup for {}..", self.config.market);

        match self.setup.setup_if_needed().await {
            Ok(SetupOutcome::NotRequired) => {
                info!("[RUNNER] No setup required. Continuing...");
                Ok(SetupOutcome::NotRequired)
            }
            Ok(SetupOutcome::Submitted {
                signature,
                num_instructions,
            }) => {
                info!(
                    "[RUNNER] Submitted {} setup instructions. Setup tx link: {}",
                    num_instructions,
                    tx_link(&signature)
                );
                Ok(SetupOutcome::Submitted {
                    signature,
                    num_instructions,
                })
            }
            Err(e) => {
                warn!("[RUNNER] There was an error setting up the maker: {:?}", e);
                Err(Error::Setup(e))
            }
        }
    }

    /// Runs cycles until the iteration bound is reached and the terminal withdrawal cycle has been attempted.
    pub async fn run(&self) -> RunSummary {
        let max_iterations = self.config.max_iterations;
        let mut state = CycleState::default();
        let mut summary = RunSummary::default();

        info!(
            "[RUNNER] Starting runner for {} iterations quoting around {}..",
            max_iterations,
            self.oracle.symbol()
        );

        while state.iteration <= max_iterations {
            let terminal = state.iteration == max_iterations;

            match self.run_cycle(&mut state).await {
                CycleOutcome::Completed { signature, .. } => {
                    if terminal {
                        summary.withdrawal = Some(signature);
                        break;
                    }
                    tokio::time::sleep(self.config.refresh_frequency()).await;
                }
                CycleOutcome::Skipped(reason) => {
                    summary.skipped_cycles += 1;
                    warn!(
                        "[RUNNER] Skipping cycle at iteration {}: {}",
                        state.iteration, reason
                    );
                    if terminal && self.config.teardown == TeardownPolicy::BestEffort {
                        warn!("[RUNNER] Withdrawal was not confirmed, stopping anyway.");
                        break;
                    }
                }
            }
        }

        summary.iterations = state.iteration;
        info!("[RUNNER] Finished: {:?}", summary);

        summary
    }

    /// Performs a single cycle: cancel all, fetch price, build quotes, submit.
    ///
    /// The iteration counter only advances when both submissions of the cycle went through.
    pub async fn run_cycle(&self, state: &mut CycleState) -> CycleOutcome {
        let terminal = state.iteration >= self.config.max_iterations;

        // the cancel is sent on its own since fetching the price can take a non-deterministic amount of time
        let cancel_signature = match self.submitter.submit(&[Action::CancelAll]).await {
            Ok(s) => {
                info!("[RUNNER] Cancel tx link: {}", tx_link(&s));
                s
            }
            Err(e) => return CycleOutcome::Skipped(SkipReason::CancelFailed(e)),
        };

        // the withdrawal places nothing, so it does not need a price
        let (actions, quote) = if terminal {
            info!("[RUNNER] Reached {} iterations, withdrawing all funds.", state.iteration);
            (vec![Action::WithdrawAll], None)
        } else {
            let oracle_info = match self.fetch_price().await {
                Ok(info) => info,
                Err(e) => return CycleOutcome::Skipped(SkipReason::PriceUnavailable(e)),
            };
            let quote = self.generator.quote(oracle_info.price);

            info!(
                "[RUNNER] {} price: {} - Source: {:?} - Timestamp: {}",
                oracle_info.symbol, oracle_info.price, oracle_info.source, oracle_info.timestamp
            );
            info!("[RUNNER] Placing bid (buy) order at: {}", quote.bid);
            info!("[RUNNER] Placing ask (sell) order at: {}", quote.ask);

            let (bid_id, ask_id) = state.next_client_order_ids();
            let [bid, ask] = self
                .generator
                .build_orders(&quote, now_unix_secs(), bid_id, ask_id);

            (vec![Action::PlaceOrder(bid), Action::PlaceOrder(ask)], Some(quote))
        };

        let signature = match self.submitter.submit(&actions).await {
            Ok(s) => s,
            Err(e) => return CycleOutcome::Skipped(SkipReason::SubmitFailed(e)),
        };

        match &quote {
            Some(q) => info!(
                "[RUNNER] Place quotes {:.prec$} @ {:.prec$}",
                q.bid,
                q.ask,
                prec = self.price_decimals
            ),
            None => info!("[RUNNER] Withdrew all funds."),
        }
        info!("[RUNNER] Tx link: {}", tx_link(&signature));

        state.iteration += 1;

        CycleOutcome::Completed {
            cancel_signature,
            signature,
            quote,
        }
    }

    /// Fetches a fresh price, rejecting it before it can reach the quote generator if it is not usable.
    async fn fetch_price(&self) -> Result<OracleInfo, OracleProviderError> {
        let oracle_info = self.oracle.fetch_price().await?;
        validate_price(oracle_info.price)?;
        Ok(oracle_info)
    }
}

fn now_unix_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{
        oracle::OracleInfoSource,
        orders::{CandidatePlacement, Side},
        setup::SetupError,
    };
    use async_trait::async_trait;
    use solana_client::client_error::{ClientError, ClientErrorKind};
    use solana_sdk::pubkey::Pubkey;
    use std::{collections::VecDeque, sync::Mutex, time::Duration};

    /// Records every batch it receives and fails the calls whose index is listed.
    #[derive(Default)]
    struct FakeSubmitter {
        batches: Mutex<Vec<Vec<Action>>>,
        signatures: Mutex<Vec<Signature>>,
        failing_calls: Vec<usize>,
    }

    impl FakeSubmitter {
        fn failing(failing_calls: Vec<usize>) -> Self {
            Self {
                failing_calls,
                ..Default::default()
            }
        }

        fn batches(&self) -> Vec<Vec<Action>> {
            self.batches.lock().unwrap().clone()
        }

        /// Signatures of the successful calls, in order.
        fn signatures(&self) -> Vec<Signature> {
            self.signatures.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionSubmitter for FakeSubmitter {
        async fn submit(&self, actions: &[Action]) -> Result<Signature, SubmitterError> {
            let mut batches = self.batches.lock().unwrap();
            let call = batches.len();
            batches.push(actions.to_vec());
            if self.failing_calls.contains(&call) {
                Err(SubmitterError::ClientError(ClientError::from(
                    ClientErrorKind::Custom("transaction was not confirmed".to_string()),
                )))
            } else {
                let signature = Signature::new_unique();
                self.signatures.lock().unwrap().push(signature);
                Ok(signature)
            }
        }
    }

    /// Serves scripted prices, then 100.0 forever. `None` entries fail the fetch.
    struct FakeOracle {
        script: Mutex<VecDeque<Option<f64>>>,
        calls: Mutex<usize>,
    }

    impl FakeOracle {
        fn new(script: Vec<Option<f64>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl OracleProvider for FakeOracle {
        async fn fetch_price(&self) -> Result<OracleInfo, OracleProviderError> {
            *self.calls.lock().unwrap() += 1;
            match self.script.lock().unwrap().pop_front().unwrap_or(Some(100.0)) {
                Some(price) => Ok(OracleInfo {
                    symbol: "SOL-USD".to_string(),
                    source: OracleInfoSource::default(),
                    price,
                    timestamp: 0,
                }),
                None => Err(OracleProviderError::Unparseable {
                    value: "<html>".to_string(),
                }),
            }
        }

        fn symbol(&self) -> &str {
            "SOL-USD"
        }
    }

    struct FakeSetup {
        fail: bool,
    }

    #[async_trait]
    impl MakerSetup for FakeSetup {
        async fn setup_if_needed(&self) -> Result<SetupOutcome, SetupError> {
            if self.fail {
                Err(SetupError::ClientError(ClientError::from(
                    ClientErrorKind::Custom("blockhash not found".to_string()),
                )))
            } else {
                Ok(SetupOutcome::NotRequired)
            }
        }
    }

    fn test_config(teardown: TeardownPolicy) -> Config {
        let mut config = Config::new(&Pubkey::new_unique());
        config.refresh_frequency_ms = 0;
        config.teardown = teardown;
        config
    }

    fn runner_with(
        config: Config,
        submitter: Arc<FakeSubmitter>,
        oracle: Arc<FakeOracle>,
        setup_fails: bool,
    ) -> Runner {
        Runner::new(RunnerOptions {
            config: Arc::new(config),
            setup: Arc::new(FakeSetup { fail: setup_fails }),
            oracle,
            submitter,
            price_decimals: 3,
        })
    }

    fn placements(batch: &[Action]) -> Vec<&CandidatePlacement> {
        batch
            .iter()
            .filter_map(|a| match a {
                Action::PlaceOrder(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn assert_quote_batch(batch: &[Action], bid: f64, ask: f64) {
        let orders = placements(batch);
        assert_eq!(batch.len(), 2);
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].side, Side::Bid);
        assert_eq!(orders[0].price, bid);
        assert_eq!(orders[1].side, Side::Ask);
        assert_eq!(orders[1].price, ask);
    }

    #[tokio::test]
    async fn three_quoting_rounds_then_withdrawal() {
        let submitter = Arc::new(FakeSubmitter::default());
        let oracle = Arc::new(FakeOracle::new(vec![]));
        let runner = runner_with(
            test_config(TeardownPolicy::BestEffort),
            submitter.clone(),
            oracle.clone(),
            false,
        );

        let summary = runner.run().await;

        assert_eq!(summary.iterations, 4);
        assert_eq!(summary.skipped_cycles, 0);
        assert!(summary.withdrawal.is_some());
        assert_eq!(oracle.calls(), 3);

        let batches = submitter.batches();
        assert_eq!(batches.len(), 8);
        for round in 0..3 {
            assert_eq!(batches[round * 2], vec![Action::CancelAll]);
            assert_quote_batch(&batches[round * 2 + 1], 99.5, 100.5);
        }
        assert_eq!(batches[6], vec![Action::CancelAll]);
        assert_eq!(batches[7], vec![Action::WithdrawAll]);
    }

    #[tokio::test]
    async fn completed_cycle_reports_both_signatures() {
        let submitter = Arc::new(FakeSubmitter::default());
        let oracle = Arc::new(FakeOracle::new(vec![]));
        let runner = runner_with(
            test_config(TeardownPolicy::BestEffort),
            submitter.clone(),
            oracle,
            false,
        );

        let mut state = CycleState::default();
        match runner.run_cycle(&mut state).await {
            CycleOutcome::Completed {
                cancel_signature,
                signature,
                quote,
            } => {
                assert_eq!(submitter.signatures(), vec![cancel_signature, signature]);
                assert_ne!(cancel_signature, signature);
                assert_eq!(quote, Some(Quote::around(100.0, 0.5)));
            }
            CycleOutcome::Skipped(reason) => panic!("cycle was skipped: {}", reason),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn delay_follows_only_completed_quoting_cycles() {
        // call 3 is the second round's placement
        let submitter = Arc::new(FakeSubmitter::failing(vec![3]));
        let oracle = Arc::new(FakeOracle::new(vec![]));
        let mut config = test_config(TeardownPolicy::BestEffort);
        config.refresh_frequency_ms = 2_000;
        let runner = runner_with(config, submitter.clone(), oracle, false);

        let start = tokio::time::Instant::now();
        let summary = runner.run().await;

        assert_eq!(summary.iterations, 4);
        assert_eq!(summary.skipped_cycles, 1);
        assert!(summary.withdrawal.is_some());
        assert_eq!(submitter.batches().len(), 10);
        assert_eq!(start.elapsed(), Duration::from_millis(3 * 2_000));
    }

    #[tokio::test]
    async fn placements_are_never_bundled_with_withdrawal() {
        let submitter = Arc::new(FakeSubmitter::failing(vec![3, 7]));
        let oracle = Arc::new(FakeOracle::new(vec![Some(21.0), None, Some(22.0)]));
        let runner = runner_with(
            test_config(TeardownPolicy::UntilConfirmed),
            submitter.clone(),
            oracle,
            false,
        );

        runner.run().await;

        for batch in submitter.batches() {
            let withdraws = batch.iter().any(|a| *a == Action::WithdrawAll);
            let places = batch.iter().any(|a| matches!(a, Action::PlaceOrder(_)));
            assert!(!(withdraws && places), "mixed batch: {:?}", batch);
        }
    }

    #[tokio::test]
    async fn failed_price_fetch_retries_the_same_iteration() {
        let submitter = Arc::new(FakeSubmitter::default());
        let oracle = Arc::new(FakeOracle::new(vec![Some(100.0), None]));
        let runner = runner_with(
            test_config(TeardownPolicy::BestEffort),
            submitter.clone(),
            oracle.clone(),
            false,
        );

        let mut state = CycleState::default();
        assert!(matches!(
            runner.run_cycle(&mut state).await,
            CycleOutcome::Completed { quote: Some(_), .. }
        ));
        assert_eq!(state.iteration, 1);

        assert!(matches!(
            runner.run_cycle(&mut state).await,
            CycleOutcome::Skipped(SkipReason::PriceUnavailable(_))
        ));
        assert_eq!(state.iteration, 1);
        // only the cancel went out for the failed attempt
        assert_eq!(submitter.batches().len(), 3);
        assert_eq!(submitter.batches()[2], vec![Action::CancelAll]);

        assert!(matches!(
            runner.run_cycle(&mut state).await,
            CycleOutcome::Completed { quote: Some(_), .. }
        ));
        assert_eq!(state.iteration, 2);
        assert_eq!(oracle.calls(), 3);
    }

    #[tokio::test]
    async fn failed_price_fetch_does_not_count_towards_bound() {
        let submitter = Arc::new(FakeSubmitter::default());
        let oracle = Arc::new(FakeOracle::new(vec![Some(100.0), None]));
        let runner = runner_with(
            test_config(TeardownPolicy::BestEffort),
            submitter.clone(),
            oracle.clone(),
            false,
        );

        let summary = runner.run().await;

        assert_eq!(summary.iterations, 4);
        assert_eq!(summary.skipped_cycles, 1);
        assert_eq!(oracle.calls(), 4);

        let batches = submitter.batches();
        let quote_batches = batches.iter().filter(|b| !placements(b).is_empty()).count();
        assert_eq!(quote_batches, 3);
        assert_eq!(batches.last(), Some(&vec![Action::WithdrawAll]));
    }

    #[tokio::test]
    async fn failed_cancel_skips_the_rest_of_the_cycle() {
        let submitter = Arc::new(FakeSubmitter::failing(vec![0]));
        let oracle = Arc::new(FakeOracle::new(vec![]));
        let runner = runner_with(
            test_config(TeardownPolicy::BestEffort),
            submitter.clone(),
            oracle.clone(),
            false,
        );

        let mut state = CycleState::default();
        assert!(matches!(
            runner.run_cycle(&mut state).await,
            CycleOutcome::Skipped(SkipReason::CancelFailed(_))
        ));
        assert_eq!(state.iteration, 0);
        assert_eq!(oracle.calls(), 0);
        assert_eq!(submitter.batches(), vec![vec![Action::CancelAll]]);
    }

    #[tokio::test]
    async fn failed_placement_does_not_advance_counter() {
        let submitter = Arc::new(FakeSubmitter::failing(vec![1]));
        let oracle = Arc::new(FakeOracle::new(vec![]));
        let runner = runner_with(
            test_config(TeardownPolicy::BestEffort),
            submitter.clone(),
            oracle,
            false,
        );

        let mut state = CycleState::default();
        assert!(matches!(
            runner.run_cycle(&mut state).await,
            CycleOutcome::Skipped(SkipReason::SubmitFailed(_))
        ));
        assert_eq!(state.iteration, 0);

        let summary = runner.run().await;
        assert_eq!(summary.iterations, 4);
    }

    #[tokio::test]
    async fn client_order_ids_are_unique() {
        let submitter = Arc::new(FakeSubmitter::failing(vec![3]));
        let oracle = Arc::new(FakeOracle::new(vec![]));
        let runner = runner_with(
            test_config(TeardownPolicy::BestEffort),
            submitter.clone(),
            oracle,
            false,
        );

        runner.run().await;

        let mut ids: Vec<u128> = submitter
            .batches()
            .iter()
            .flat_map(|b| placements(b).into_iter().map(|p| p.client_order_id))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(total, 8);
        assert_eq!(ids.len(), total);
    }

    #[tokio::test]
    async fn invalid_price_is_rejected_before_quoting() {
        let submitter = Arc::new(FakeSubmitter::default());
        let oracle = Arc::new(FakeOracle::new(vec![Some(f64::NAN)]));
        let runner = runner_with(
            test_config(TeardownPolicy::BestEffort),
            submitter.clone(),
            oracle,
            false,
        );

        let mut state = CycleState::default();
        assert!(matches!(
            runner.run_cycle(&mut state).await,
            CycleOutcome::Skipped(SkipReason::PriceUnavailable(
                OracleProviderError::InvalidPrice(_)
            ))
        ));
        assert_eq!(submitter.batches(), vec![vec![Action::CancelAll]]);
    }

    #[tokio::test]
    async fn best_effort_teardown_stops_after_failed_withdrawal() {
        // calls 0..=5 are the three quoting rounds, 7 is the withdrawal
        let submitter = Arc::new(FakeSubmitter::failing(vec![7]));
        let oracle = Arc::new(FakeOracle::new(vec![]));
        let runner = runner_with(
            test_config(TeardownPolicy::BestEffort),
            submitter.clone(),
            oracle,
            false,
        );

        let summary = runner.run().await;

        assert_eq!(summary.iterations, 3);
        assert_eq!(summary.skipped_cycles, 1);
        assert_eq!(summary.withdrawal, None);
        assert_eq!(submitter.batches().len(), 8);
    }

    #[tokio::test]
    async fn until_confirmed_teardown_retries_withdrawal() {
        let submitter = Arc::new(FakeSubmitter::failing(vec![7, 9]));
        let oracle = Arc::new(FakeOracle::new(vec![]));
        let runner = runner_with(
            test_config(TeardownPolicy::UntilConfirmed),
            submitter.clone(),
            oracle.clone(),
            false,
        );

        let summary = runner.run().await;

        assert_eq!(summary.iterations, 4);
        assert_eq!(summary.skipped_cycles, 2);
        assert!(summary.withdrawal.is_some());
        assert_eq!(oracle.calls(), 3);

        let withdrawals = submitter
            .batches()
            .iter()
            .filter(|b| b.contains(&Action::WithdrawAll))
            .count();
        assert_eq!(withdrawals, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn until_confirmed_retries_withdrawal_without_pausing() {
        let submitter = Arc::new(FakeSubmitter::failing(vec![7, 9, 11]));
        let oracle = Arc::new(FakeOracle::new(vec![]));
        let mut config = test_config(TeardownPolicy::UntilConfirmed);
        config.refresh_frequency_ms = 2_000;
        let runner = runner_with(config, submitter.clone(), oracle, false);

        let start = tokio::time::Instant::now();
        let summary = runner.run().await;

        assert_eq!(summary.skipped_cycles, 3);
        assert!(summary.withdrawal.is_some());
        assert_eq!(submitter.batches().len(), 14);
        // only the three quoting rounds wait
        assert_eq!(start.elapsed(), Duration::from_millis(3 * 2_000));
    }

    #[tokio::test]
    async fn prepare_reports_setup_outcome() {
        let runner = runner_with(
            test_config(TeardownPolicy::BestEffort),
            Arc::new(FakeSubmitter::default()),
            Arc::new(FakeOracle::new(vec![])),
            false,
        );
        assert_eq!(runner.prepare().await.unwrap(), SetupOutcome::NotRequired);
    }

    #[tokio::test]
    async fn prepare_failure_is_fatal() {
        let submitter = Arc::new(FakeSubmitter::default());
        let runner = runner_with(
            test_config(TeardownPolicy::BestEffort),
            submitter.clone(),
            Arc::new(FakeOracle::new(vec![])),
            true,
        );
        assert!(matches!(runner.prepare().await, Err(Error::Setup(_))));
        assert!(submitter.batches().is_empty());
    }
}
