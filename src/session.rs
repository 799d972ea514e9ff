// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Vyre Labs

//! # Session-Key Transaction Dispatch
//!
//! Sends a casino transaction with a cached low-privilege session key when
//! possible, falling back to an interactive passkey signature.
//!
//! ## Stages
//!
//! | Stage | Action |
//! |-------|--------|
//! | `UseCachedKey` | Sign and submit with the cached session key |
//! | `Reauthorize` | Silently reconnect the wallet session, retry with the same key |
//! | `RecreateKey` | Drop every cached key, create a new one (one prompt), retry |
//! | `InteractiveFallback` | Submit with the passkey |
//!
//! A stage runs only when the previous one failed with an
//! authorization-class error. Any other error aborts immediately. The chain
//! is linear: no stage is ever re-entered.

use std::future::Future;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use tracing::{debug, warn};

/// A stage of the dispatch chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    UseCachedKey,
    Reauthorize,
    RecreateKey,
    InteractiveFallback,
}

impl DispatchStage {
    /// The stage to try after an authorization failure, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            DispatchStage::UseCachedKey => Some(DispatchStage::Reauthorize),
            DispatchStage::Reauthorize => Some(DispatchStage::RecreateKey),
            DispatchStage::RecreateKey => Some(DispatchStage::InteractiveFallback),
            DispatchStage::InteractiveFallback => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DispatchStage::UseCachedKey => "use-cached-key",
            DispatchStage::Reauthorize => "reauthorize",
            DispatchStage::RecreateKey => "recreate-key",
            DispatchStage::InteractiveFallback => "interactive-fallback",
        }
    }
}

impl std::fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletErrorKind {
    /// Session expired, key revoked, signature rejected by the account.
    Authorization,
    /// Anything else: RPC failure, revert, user cancellation.
    Other,
}

/// Error reported by a wallet operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct WalletError {
    pub kind: WalletErrorKind,
    pub message: String,
}

impl WalletError {
    pub fn authorization(message: impl Into<String>) -> Self {
        Self {
            kind: WalletErrorKind::Authorization,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: WalletErrorKind::Other,
            message: message.into(),
        }
    }

    pub fn is_authorization(&self) -> bool {
        self.kind == WalletErrorKind::Authorization
    }
}

/// A contract call to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// Wallet operations the dispatcher drives.
pub trait SessionWallet {
    fn send_with_session_key(
        &self,
        tx: &TransactionRequest,
    ) -> impl Future<Output = Result<TxHash, WalletError>> + Send;

    /// Silently re-establish the wallet session.
    fn reconnect(&self) -> impl Future<Output = Result<(), WalletError>> + Send;

    fn clear_session_keys(&self) -> impl Future<Output = Result<(), WalletError>> + Send;

    /// Create and authorize a fresh session key. Prompts the user once.
    fn create_session_key(&self) -> impl Future<Output = Result<(), WalletError>> + Send;

    fn send_with_passkey(
        &self,
        tx: &TransactionRequest,
    ) -> impl Future<Output = Result<TxHash, WalletError>> + Send;
}

/// One executed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageAttempt {
    pub stage: DispatchStage,
    pub error: Option<WalletError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub tx_hash: TxHash,
    /// Stage that submitted the transaction.
    pub stage: DispatchStage,
    pub attempts: Vec<StageAttempt>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatch aborted at {stage}: {source}")]
    Aborted {
        stage: DispatchStage,
        source: WalletError,
        attempts: Vec<StageAttempt>,
    },

    #[error("every dispatch stage was rejected as unauthorized")]
    Exhausted { attempts: Vec<StageAttempt> },
}

impl DispatchError {
    pub fn attempts(&self) -> &[StageAttempt] {
        match self {
            DispatchError::Aborted { attempts, .. } | DispatchError::Exhausted { attempts } => {
                attempts
            }
        }
    }
}

/// Runs the dispatch chain against a wallet.
pub struct SessionKeyDispatcher<W> {
    wallet: W,
}

impl<W: SessionWallet> SessionKeyDispatcher<W> {
    pub fn new(wallet: W) -> Self {
        Self { wallet }
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub async fn dispatch(&self, tx: &TransactionRequest) -> Result<DispatchOutcome, DispatchError> {
        let mut stage = DispatchStage::UseCachedKey;
        let mut attempts = Vec::with_capacity(4);

        loop {
            debug!(stage = %stage, to = %tx.to, "Dispatching transaction");

            match self.run_stage(stage, tx).await {
                Ok(tx_hash) => {
                    attempts.push(StageAttempt { stage, error: None });
                    return Ok(DispatchOutcome {
                        tx_hash,
                        stage,
                        attempts,
                    });
                }
                Err(error) if error.is_authorization() => {
                    warn!(stage = %stage, error = %error, "Dispatch stage unauthorized");
                    attempts.push(StageAttempt {
                        stage,
                        error: Some(error),
                    });
                    match stage.next() {
                        Some(next) => stage = next,
                        None => return Err(DispatchError::Exhausted { attempts }),
                    }
                }
                Err(error) => {
                    warn!(stage = %stage, error = %error, "Dispatch aborted");
                    attempts.push(StageAttempt {
                        stage,
                        error: Some(error.clone()),
                    });
                    return Err(DispatchError::Aborted {
                        stage,
                        source: error,
                        attempts,
                    });
                }
            }
        }
    }

    async fn run_stage(
        &self,
        stage: DispatchStage,
        tx: &TransactionRequest,
    ) -> Result<TxHash, WalletError> {
        match stage {
            DispatchStage::UseCachedKey => self.wallet.send_with_session_key(tx).await,
            DispatchStage::Reauthorize => {
                self.wallet.reconnect().await?;
                self.wallet.send_with_session_key(tx).await
            }
            DispatchStage::RecreateKey => {
                self.wallet.clear_session_keys().await?;
                self.wallet.create_session_key().await?;
                self.wallet.send_with_session_key(tx).await
            }
            DispatchStage::InteractiveFallback => self.wallet.send_with_passkey(tx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Wallet whose responses are scripted per operation.
    #[derive(Default)]
    struct ScriptedWallet {
        session_sends: Mutex<VecDeque<Result<TxHash, WalletError>>>,
        reconnects: Mutex<VecDeque<Result<(), WalletError>>>,
        creates: Mutex<VecDeque<Result<(), WalletError>>>,
        passkey_sends: Mutex<VecDeque<Result<TxHash, WalletError>>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl ScriptedWallet {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn next<T>(queue: &Mutex<VecDeque<Result<T, WalletError>>>, default: Result<T, WalletError>) -> Result<T, WalletError> {
            queue.lock().unwrap().pop_front().unwrap_or(default)
        }
    }

    impl SessionWallet for ScriptedWallet {
        async fn send_with_session_key(&self, _tx: &TransactionRequest) -> Result<TxHash, WalletError> {
            self.record("send_session");
            Self::next(&self.session_sends, Err(WalletError::authorization("no script")))
        }

        async fn reconnect(&self) -> Result<(), WalletError> {
            self.record("reconnect");
            Self::next(&self.reconnects, Ok(()))
        }

        async fn clear_session_keys(&self) -> Result<(), WalletError> {
            self.record("clear");
            Ok(())
        }

        async fn create_session_key(&self) -> Result<(), WalletError> {
            self.record("create");
            Self::next(&self.creates, Ok(()))
        }

        async fn send_with_passkey(&self, _tx: &TransactionRequest) -> Result<TxHash, WalletError> {
            self.record("send_passkey");
            Self::next(&self.passkey_sends, Err(WalletError::authorization("no script")))
        }
    }

    fn tx() -> TransactionRequest {
        TransactionRequest {
            to: Address::repeat_byte(0x11),
            value: U256::from(1_000u64),
            data: Bytes::from_static(&[0xde, 0xad]),
        }
    }

    fn hash(byte: u8) -> TxHash {
        TxHash::repeat_byte(byte)
    }

    fn auth_err() -> WalletError {
        WalletError::authorization("session expired")
    }

    #[tokio::test]
    async fn cached_key_success_uses_single_stage() {
        let wallet = ScriptedWallet::default();
        wallet.session_sends.lock().unwrap().push_back(Ok(hash(1)));

        let dispatcher = SessionKeyDispatcher::new(wallet);
        let outcome = dispatcher.dispatch(&tx()).await.unwrap();

        assert_eq!(outcome.tx_hash, hash(1));
        assert_eq!(outcome.stage, DispatchStage::UseCachedKey);
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(dispatcher.wallet().calls(), vec!["send_session"]);
    }

    #[tokio::test]
    async fn reauthorizes_after_auth_failure() {
        let wallet = ScriptedWallet::default();
        wallet.session_sends.lock().unwrap().extend([Err(auth_err()), Ok(hash(2))]);

        let dispatcher = SessionKeyDispatcher::new(wallet);
        let outcome = dispatcher.dispatch(&tx()).await.unwrap();

        assert_eq!(outcome.stage, DispatchStage::Reauthorize);
        assert_eq!(
            dispatcher.wallet().calls(),
            vec!["send_session", "reconnect", "send_session"]
        );
    }

    #[tokio::test]
    async fn recreates_key_after_repeated_auth_failure() {
        let wallet = ScriptedWallet::default();
        wallet
            .session_sends
            .lock()
            .unwrap()
            .extend([Err(auth_err()), Err(auth_err()), Ok(hash(3))]);

        let dispatcher = SessionKeyDispatcher::new(wallet);
        let outcome = dispatcher.dispatch(&tx()).await.unwrap();

        assert_eq!(outcome.stage, DispatchStage::RecreateKey);
        assert_eq!(
            dispatcher.wallet().calls(),
            vec!["send_session", "reconnect", "send_session", "clear", "create", "send_session"]
        );
    }

    #[tokio::test]
    async fn falls_back_to_passkey() {
        let wallet = ScriptedWallet::default();
        wallet.passkey_sends.lock().unwrap().push_back(Ok(hash(4)));

        let dispatcher = SessionKeyDispatcher::new(wallet);
        let outcome = dispatcher.dispatch(&tx()).await.unwrap();

        assert_eq!(outcome.stage, DispatchStage::InteractiveFallback);
        let stages: Vec<_> = outcome.attempts.iter().map(|a| a.stage).collect();
        assert_eq!(
            stages,
            vec![
                DispatchStage::UseCachedKey,
                DispatchStage::Reauthorize,
                DispatchStage::RecreateKey,
                DispatchStage::InteractiveFallback,
            ]
        );
        assert!(outcome.attempts[..3].iter().all(|a| a.error.is_some()));
    }

    #[tokio::test]
    async fn exhausts_after_every_stage_is_unauthorized() {
        let dispatcher = SessionKeyDispatcher::new(ScriptedWallet::default());
        let err = dispatcher.dispatch(&tx()).await.unwrap_err();

        assert!(matches!(err, DispatchError::Exhausted { .. }));
        assert_eq!(err.attempts().len(), 4);
    }

    #[tokio::test]
    async fn non_auth_error_aborts_without_retry() {
        let wallet = ScriptedWallet::default();
        wallet
            .session_sends
            .lock()
            .unwrap()
            .push_back(Err(WalletError::other("execution reverted")));

        let dispatcher = SessionKeyDispatcher::new(wallet);
        let err = dispatcher.dispatch(&tx()).await.unwrap_err();

        match &err {
            DispatchError::Aborted { stage, source, .. } => {
                assert_eq!(*stage, DispatchStage::UseCachedKey);
                assert_eq!(source.message, "execution reverted");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(dispatcher.wallet().calls(), vec!["send_session"]);
    }

    #[tokio::test]
    async fn failing_reconnect_moves_on_or_aborts_by_kind() {
        // Unauthorized reconnect skips straight to key recreation.
        let wallet = ScriptedWallet::default();
        wallet
            .session_sends
            .lock()
            .unwrap()
            .extend([Err(auth_err()), Ok(hash(5))]);
        wallet.reconnects.lock().unwrap().push_back(Err(auth_err()));

        let dispatcher = SessionKeyDispatcher::new(wallet);
        let outcome = dispatcher.dispatch(&tx()).await.unwrap();
        assert_eq!(outcome.stage, DispatchStage::RecreateKey);
        assert_eq!(
            dispatcher.wallet().calls(),
            vec!["send_session", "reconnect", "clear", "create", "send_session"]
        );

        // A network failure during reconnect aborts.
        let wallet = ScriptedWallet::default();
        wallet.reconnects.lock().unwrap().push_back(Err(WalletError::other("rpc down")));
        let dispatcher = SessionKeyDispatcher::new(wallet);
        let err = dispatcher.dispatch(&tx()).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Aborted { stage: DispatchStage::Reauthorize, .. }
        ));
    }

    #[test]
    fn stage_order_is_linear() {
        let mut stage = DispatchStage::UseCachedKey;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(seen.last(), Some(&DispatchStage::InteractiveFallback));
    }
}
