//! Tracked token operations: each drives an [`OperationTracker`] through one
//! gateway call and returns the outcome to the caller as well.
//!
//! Read refreshes with a missing parameter reset the tracker to `Idle` and
//! return `Ok(None)` without touching the network.

use alloy::primitives::{Address, U256};
use tokenkit_core::{AppError, OperationError, OperationTracker, Stage};

use crate::{
    calls::TokenCall,
    factory::{CreatedToken, FactoryRegistry, RegistrationStatus},
    token::{AllowanceSnapshot, BalanceSnapshot, TokenReader, TokenSnapshot, TokenWriter},
    tx::TxOutcome,
};

fn confirming(hash: alloy::primitives::TxHash) -> Stage {
    Stage::Confirming {
        tx_hash: format!("{hash:#x}"),
    }
}

/// Re-read name, symbol, decimals, supply, owner and paused flag.
pub async fn refresh_token_info<R>(
    tracker: &OperationTracker<TokenSnapshot>,
    reader: &R,
    token: Option<Address>,
) -> Result<Option<TokenSnapshot>, OperationError>
where
    R: TokenReader + ?Sized,
{
    let Some(token) = token else {
        tracker.reset();
        return Ok(None);
    };
    tracker
        .track(Some(Stage::Reading), reader.token_snapshot(token))
        .await
        .map(Some)
}

/// Re-read `account`'s balance of `token`.
pub async fn refresh_balance<R>(
    tracker: &OperationTracker<BalanceSnapshot>,
    reader: &R,
    token: Option<Address>,
    account: Option<Address>,
) -> Result<Option<BalanceSnapshot>, OperationError>
where
    R: TokenReader + ?Sized,
{
    let (Some(token), Some(account)) = (token, account) else {
        tracker.reset();
        return Ok(None);
    };
    tracker
        .track(Some(Stage::Reading), reader.balance_of(token, account))
        .await
        .map(Some)
}

/// Re-read how much `spender` may move on `owner`'s behalf.
pub async fn refresh_allowance<R>(
    tracker: &OperationTracker<AllowanceSnapshot>,
    reader: &R,
    token: Option<Address>,
    owner: Option<Address>,
    spender: Option<Address>,
) -> Result<Option<AllowanceSnapshot>, OperationError>
where
    R: TokenReader + ?Sized,
{
    let (Some(token), Some(owner), Some(spender)) = (token, owner, spender) else {
        tracker.reset();
        return Ok(None);
    };
    tracker
        .track(Some(Stage::Reading), reader.allowance(token, owner, spender))
        .await
        .map(Some)
}

/// Simulate, submit and confirm `call`, moving the tracker to
/// `confirming{tx_hash}` once the transaction is in the mempool.
///
/// Dependent reads are not refreshed here; callers re-run them on success.
pub async fn submit_call<W>(
    tracker: &OperationTracker<TxOutcome>,
    writer: &W,
    token: Address,
    call: TokenCall,
) -> Result<TxOutcome, OperationError>
where
    W: TokenWriter + ?Sized,
{
    let ticket = tracker.start(Some(Stage::Submitting));
    let on_submitted = |hash| tracker.advance_for(&ticket, confirming(hash));

    let outcome = writer.execute(token, &call, &on_submitted).await;
    if let Err(e) = &outcome {
        tracing::warn!(%token, function = call.function_name(), error = %e, "Token call failed");
    }
    tracker.settle(&ticket, outcome)
}

/// Register `token` with the factory unless it already is.
///
/// An undeterminable registration status fails the operation instead of
/// being treated as "not registered".
pub async fn register_token<F>(
    tracker: &OperationTracker<Option<TxOutcome>>,
    factory: &F,
    token: Address,
    name: &str,
    symbol: &str,
) -> Result<Option<TxOutcome>, OperationError>
where
    F: FactoryRegistry + ?Sized,
{
    let ticket = tracker.start(Some(Stage::Reading));

    let outcome = match factory.registration_status(token).await {
        RegistrationStatus::Registered => {
            tracing::info!(%token, "Token already registered");
            Ok(None)
        }
        RegistrationStatus::NotRegistered => {
            tracker.advance_for(&ticket, Stage::Registering);
            let on_submitted = |hash| tracker.advance_for(&ticket, confirming(hash));
            factory
                .register_token(token, name, symbol, &on_submitted)
                .await
                .map(Some)
        }
        RegistrationStatus::Unknown(reason) => Err(AppError::Rpc(format!(
            "could not determine whether {token} is registered: {reason}"
        ))),
    };
    tracker.settle(&ticket, outcome)
}

/// Create a token through the factory. The tracker settles with the new
/// token's address and the creation transaction.
pub async fn create_token<F>(
    tracker: &OperationTracker<CreatedToken>,
    factory: &F,
    name: &str,
    symbol: &str,
    initial_supply: U256,
) -> Result<CreatedToken, OperationError>
where
    F: FactoryRegistry + ?Sized,
{
    let ticket = tracker.start(Some(Stage::Submitting));
    let on_submitted = |hash| tracker.advance_for(&ticket, confirming(hash));

    let created = factory
        .create_token(name, symbol, initial_supply, &on_submitted)
        .await;
    if let Err(e) = &created {
        tracing::warn!(%symbol, error = %e, "Token creation failed");
    }
    tracker.settle(&ticket, created)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use alloy::primitives::{TxHash, address};
    use async_trait::async_trait;
    use tokenkit_core::{OperationState, units::format_amount};

    use super::*;
    use crate::{decoder::TokenCreatedEvent, token::TokenViews};

    const TOKEN: Address = address!("00000000000000000000000000000000000070c3");
    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0000000000000000000000000000000000000b0b");

    #[derive(Default)]
    struct MockChain {
        reads: AtomicUsize,
        fail_reads: bool,
        revert_writes: bool,
        registration: Option<RegistrationStatus>,
        registrations_sent: AtomicUsize,
    }

    fn outcome(hash: TxHash) -> TxOutcome {
        TxOutcome {
            tx_hash: hash,
            block_number: Some(7),
            gas_used: 21_000,
            events: Vec::new(),
        }
    }

    #[async_trait]
    impl TokenReader for MockChain {
        async fn decimals(&self, _token: Address) -> Result<u8, AppError> {
            Ok(18)
        }

        async fn token_snapshot(&self, token: Address) -> Result<TokenSnapshot, AppError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(AppError::Rpc("connection refused".into()));
            }
            Ok(TokenSnapshot::from_views(
                token,
                TokenViews {
                    name: "Stylus Token".into(),
                    symbol: "STY".into(),
                    decimals: 18,
                    total_supply: "1000000000000000000000".parse().unwrap(),
                    owner: ALICE,
                    paused: false,
                },
            ))
        }

        async fn balance_of(
            &self,
            token: Address,
            account: Address,
        ) -> Result<BalanceSnapshot, AppError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let raw = U256::from(2_500_000_000_000_000_000u128);
            Ok(BalanceSnapshot {
                token,
                account,
                formatted: format_amount(raw, 18),
                raw,
            })
        }

        async fn allowance(
            &self,
            token: Address,
            owner: Address,
            spender: Address,
        ) -> Result<AllowanceSnapshot, AppError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(AllowanceSnapshot {
                token,
                owner,
                spender,
                raw: U256::ZERO,
                formatted: "0.0".into(),
            })
        }
    }

    #[async_trait]
    impl TokenWriter for MockChain {
        async fn execute(
            &self,
            _token: Address,
            _call: &TokenCall,
            on_submitted: &(dyn Fn(TxHash) + Send + Sync),
        ) -> Result<TxOutcome, AppError> {
            let hash = TxHash::with_last_byte(0xaa);
            on_submitted(hash);
            if self.revert_writes {
                return Err(AppError::TransactionReverted {
                    tx_hash: format!("{hash:#x}"),
                });
            }
            Ok(outcome(hash))
        }
    }

    #[async_trait]
    impl FactoryRegistry for MockChain {
        async fn registration_status(&self, _token: Address) -> RegistrationStatus {
            self.registration
                .clone()
                .unwrap_or(RegistrationStatus::NotRegistered)
        }

        async fn register_token(
            &self,
            _token: Address,
            _name: &str,
            _symbol: &str,
            on_submitted: &(dyn Fn(TxHash) + Send + Sync),
        ) -> Result<TxOutcome, AppError> {
            self.registrations_sent.fetch_add(1, Ordering::SeqCst);
            let hash = TxHash::with_last_byte(0xbb);
            on_submitted(hash);
            Ok(outcome(hash))
        }

        async fn create_token(
            &self,
            name: &str,
            symbol: &str,
            initial_supply: U256,
            on_submitted: &(dyn Fn(TxHash) + Send + Sync),
        ) -> Result<CreatedToken, AppError> {
            let hash = TxHash::with_last_byte(0xcc);
            on_submitted(hash);
            if self.revert_writes {
                return Err(AppError::TransactionReverted {
                    tx_hash: format!("{hash:#x}"),
                });
            }
            Ok(CreatedToken {
                outcome: outcome(hash),
                token: TokenCreatedEvent {
                    token_address: TOKEN,
                    creator: ALICE,
                    name: name.to_string(),
                    symbol: symbol.to_string(),
                    initial_supply,
                },
            })
        }
    }

    #[tokio::test]
    async fn token_info_refresh_formats_supply() {
        let chain = MockChain::default();
        let tracker = OperationTracker::new();

        let snapshot = refresh_token_info(&tracker, &chain, Some(TOKEN))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.total_supply_formatted, "1000.0");
        assert_eq!(tracker.snapshot().result(), Some(&snapshot));
    }

    #[tokio::test]
    async fn refresh_rereads_every_time() {
        let chain = MockChain::default();
        let tracker = OperationTracker::new();
        for _ in 0..3 {
            refresh_token_info(&tracker, &chain, Some(TOKEN)).await.unwrap();
        }
        assert_eq!(chain.reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn balance_without_account_is_idle_and_offline() {
        let chain = MockChain::default();
        let tracker = OperationTracker::new();
        tracker.succeed(BalanceSnapshot {
            token: TOKEN,
            account: ALICE,
            raw: U256::ZERO,
            formatted: "0.0".into(),
        });

        let result = refresh_balance(&tracker, &chain, Some(TOKEN), None).await;

        assert!(matches!(result, Ok(None)));
        assert!(tracker.snapshot().is_idle());
        assert_eq!(chain.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn balance_refresh_records_snapshot() {
        let chain = MockChain::default();
        let tracker = OperationTracker::new();
        let balance = refresh_balance(&tracker, &chain, Some(TOKEN), Some(BOB))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(balance.formatted, "2.5");
        assert_eq!(balance.account, BOB);
    }

    #[tokio::test]
    async fn allowance_without_spender_is_idle() {
        let chain = MockChain::default();
        let tracker = OperationTracker::new();
        let result = refresh_allowance(&tracker, &chain, Some(TOKEN), Some(ALICE), None).await;
        assert!(matches!(result, Ok(None)));
        assert_eq!(tracker.snapshot(), OperationState::Idle);
        assert_eq!(chain.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_read_is_recorded_and_reraised() {
        let chain = MockChain {
            fail_reads: true,
            ..Default::default()
        };
        let tracker = OperationTracker::new();

        let err = refresh_token_info(&tracker, &chain, Some(TOKEN))
            .await
            .unwrap_err();

        assert_eq!(err.message(), "RPC error: connection refused");
        assert_eq!(tracker.snapshot().error(), Some(&err));
        assert!(!tracker.is_busy());
    }

    /// Records the tracker's stage as seen from inside the gateway call.
    struct StageRecorder<'a> {
        tracker: &'a OperationTracker<TxOutcome>,
        seen: Mutex<Vec<Option<Stage>>>,
    }

    #[async_trait]
    impl TokenWriter for StageRecorder<'_> {
        async fn execute(
            &self,
            _token: Address,
            _call: &TokenCall,
            on_submitted: &(dyn Fn(TxHash) + Send + Sync),
        ) -> Result<TxOutcome, AppError> {
            let hash = TxHash::with_last_byte(0xaa);
            self.seen.lock().unwrap().push(self.tracker.snapshot().stage().cloned());
            on_submitted(hash);
            self.seen.lock().unwrap().push(self.tracker.snapshot().stage().cloned());
            Ok(outcome(hash))
        }
    }

    #[tokio::test]
    async fn write_passes_through_confirming_stage() {
        let tracker = OperationTracker::new();
        let recorder = StageRecorder {
            tracker: &tracker,
            seen: Mutex::new(Vec::new()),
        };

        let amount = tokenkit_core::units::parse_amount("5.5", 18).unwrap();
        let call = TokenCall::Transfer { to: BOB, amount };
        let outcome = submit_call(&tracker, &recorder, TOKEN, call).await.unwrap();

        assert_eq!(outcome.tx_hash, TxHash::with_last_byte(0xaa));
        assert_eq!(tracker.snapshot().result(), Some(&outcome));
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![
                Some(Stage::Submitting),
                Some(Stage::Confirming {
                    tx_hash: format!("{:#x}", TxHash::with_last_byte(0xaa)),
                }),
            ]
        );
    }

    #[tokio::test]
    async fn reverted_write_fails_operation() {
        let chain = MockChain {
            revert_writes: true,
            ..Default::default()
        };
        let tracker = OperationTracker::new();

        let err = submit_call(&tracker, &chain, TOKEN, TokenCall::Pause)
            .await
            .unwrap_err();

        assert!(matches!(err.cause(), Some(AppError::TransactionReverted { .. })));
        assert!(matches!(tracker.snapshot(), OperationState::Failed { .. }));
    }

    #[tokio::test]
    async fn registers_only_unregistered_tokens() {
        let chain = MockChain::default();
        let tracker = OperationTracker::new();
        let sent = register_token(&tracker, &chain, TOKEN, "Stylus Token", "STY")
            .await
            .unwrap();
        assert!(sent.is_some());
        assert_eq!(chain.registrations_sent.load(Ordering::SeqCst), 1);

        let chain = MockChain {
            registration: Some(RegistrationStatus::Registered),
            ..Default::default()
        };
        let skipped = register_token(&tracker, &chain, TOKEN, "Stylus Token", "STY")
            .await
            .unwrap();
        assert!(skipped.is_none());
        assert_eq!(chain.registrations_sent.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.snapshot().result(), Some(&None));
    }

    #[tokio::test]
    async fn unknown_registration_status_fails_distinctly() {
        let chain = MockChain {
            registration: Some(RegistrationStatus::Unknown("rpc timeout".into())),
            ..Default::default()
        };
        let tracker = OperationTracker::new();

        let err = register_token(&tracker, &chain, TOKEN, "Stylus Token", "STY")
            .await
            .unwrap_err();

        assert!(err.message().contains("rpc timeout"));
        assert_eq!(chain.registrations_sent.load(Ordering::SeqCst), 0);
        assert!(tracker.snapshot().error().is_some());
    }

    #[tokio::test]
    async fn created_token_is_recorded() {
        let chain = MockChain::default();
        let tracker = OperationTracker::new();
        let supply = tokenkit_core::units::parse_amount("1000", 18).unwrap();

        let created = create_token(&tracker, &chain, "Stylus Token", "STY", supply)
            .await
            .unwrap();

        assert_eq!(created.token.token_address, TOKEN);
        assert_eq!(created.token.initial_supply, supply);
        assert_eq!(tracker.snapshot().result(), Some(&created));
    }

    #[tokio::test]
    async fn reverted_creation_fails_operation() {
        let chain = MockChain {
            revert_writes: true,
            ..Default::default()
        };
        let tracker = OperationTracker::new();

        let err = create_token(&tracker, &chain, "Stylus Token", "STY", U256::from(1u64))
            .await
            .unwrap_err();

        assert!(matches!(err.cause(), Some(AppError::TransactionReverted { .. })));
        assert!(!tracker.is_busy());
    }
}
