//! PlasmaAccount - deposit, transfer and exit for a single account.
//!
//! ```text
//! uninitialized ──initialize──► initializing ──ok──► ready
//!       ▲                            │
//!       └───────────error────────────┘
//! ```
//!
//! Every operation other than `initialize` requires `ready`. UTXOs are
//! fetched from the watcher at the start of each operation that spends them.

mod state;

pub use state::{AccountState, Phase};

use alloy_primitives::{Address, U256};
use futures::future::join_all;
use std::sync::Arc;

use crate::builder::build_transaction;
use crate::client::{ChainReader, ChildChain, EthRpc, RootChain, RootChainContract, TypedDataSigner, WatcherClient};
use crate::config::PlasmaConfig;
use crate::confirm::ConfirmationPoller;
use crate::encoding::encode_deposit;
use crate::error::{ExitFailure, ExitReport, PlasmaError, PlasmaResult};
use crate::runtime::Shutdown;
use crate::selector::UtxoSelector;
use crate::typed_data::typed_data;
use crate::types::{Amount, Currency, SignedTransaction, TransactionSummary, Utxo, ETH_CURRENCY};
use state::StateCell;

pub struct PlasmaAccount {
    config: PlasmaConfig,
    child: Arc<dyn ChildChain>,
    root: Arc<dyn RootChain>,
    signer: Arc<dyn TypedDataSigner>,
    poller: ConfirmationPoller,
    selector: UtxoSelector,
    state: StateCell,
}

impl PlasmaAccount {
    pub fn new(
        config: PlasmaConfig,
        child: Arc<dyn ChildChain>,
        root: Arc<dyn RootChain>,
        reader: Arc<dyn ChainReader>,
        signer: Arc<dyn TypedDataSigner>,
    ) -> Self {
        let poller = ConfirmationPoller::new(reader, config.poll_interval(), config.confirmation_depth);
        let selector = UtxoSelector::new(config.max_selected_utxos);
        Self { config, child, root, signer, poller, selector, state: StateCell::new() }
    }

    /// Builds the HTTP clients described by `config`.
    pub fn connect(config: PlasmaConfig) -> PlasmaResult<Self> {
        let config = config.validate()?;
        let rpc = Arc::new(EthRpc::new(&config.root_chain_url)?);
        let child = Arc::new(WatcherClient::new(&config.watcher_url)?);
        let root = Arc::new(RootChainContract::new(rpc.clone(), config.plasma_contract_address, config.poll_interval()));
        Ok(Self::new(config, child, root, rpc.clone(), rpc))
    }

    /// Cancels confirmation waits when `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.poller = self.poller.with_shutdown(shutdown);
        self
    }

    pub fn config(&self) -> &PlasmaConfig { &self.config }

    pub fn root(&self) -> &Arc<dyn RootChain> { &self.root }

    pub fn state(&self) -> PlasmaResult<AccountState> { self.state.snapshot() }

    pub fn is_ready(&self) -> bool {
        self.state.snapshot().map(|s| s.phase == Phase::Ready).unwrap_or(false)
    }

    pub fn address(&self) -> Option<Address> {
        self.state.snapshot().ok().and_then(|s| s.address)
    }

    /// Resolves the account and loads balances. Not reentrant; re-running from
    /// `ready` discards the previous state.
    pub async fn initialize(&self) -> PlasmaResult<String> {
        let guard = self.state.begin_init().inspect_err(|e| tracing::error!("{}", e))?;
        tracing::info!("initializing the Plasma chain");

        let result = async {
            let address = self.resolve_address().await?;

            let root_balance = match self.root.balance(address).await {
                Ok(balance) => balance,
                Err(e) => {
                    tracing::error!(%address, error = %e, "Error getting balance for account");
                    U256::ZERO
                }
            };
            if root_balance.is_zero() {
                tracing::warn!(%address, "The configured account does not have enough funds on the root chain");
            }

            let child_balances = self
                .child
                .get_balance(address)
                .await
                .map_err(|e| PlasmaError::submission("getting child chain balance", e))?;

            Ok::<_, PlasmaError>((address, root_balance, child_balances))
        }
        .await;

        let (address, root_balance, child_balances) = result.inspect_err(|e| {
            tracing::error!("Error initializing Plasma chain: {}", e);
        })?;
        guard.complete(address, root_balance, child_balances)?;

        let message = format!("Plasma chain initialized for account {}.", address.to_checksum(None));
        tracing::info!("{}", message);
        Ok(message)
    }

    async fn resolve_address(&self) -> PlasmaResult<Address> {
        if let Some(address) = self.config.address {
            return Ok(address);
        }
        let accounts = self.root.accounts().await?;
        accounts.first().copied().ok_or(PlasmaError::AccountNotConfigured)
    }

    /// Deposits `amount` of `currency` from the root chain. For tokens,
    /// `approve` first approves the plasma contract and waits for that
    /// approval to confirm.
    pub async fn deposit(&self, amount: Amount, currency: Currency, approve: bool) -> PlasmaResult<String> {
        self.deposit_inner(amount, currency, approve)
            .await
            .inspect_err(|e| tracing::error!("{}", e))
    }

    async fn deposit_inner(&self, amount: Amount, currency: Currency, approve: bool) -> PlasmaResult<String> {
        let address = self.state.ready_address()?;
        if amount.is_zero() {
            return Err(PlasmaError::InvalidAmount { operation: "Deposit" });
        }

        if currency == ETH_CURRENCY {
            self.ensure_root_funds(address, amount).await?;
        }

        let deposit_tx = encode_deposit(address, amount, currency);

        let receipt = if currency == ETH_CURRENCY {
            tracing::info!("Depositing {} wei...", amount);
            self.root
                .deposit_eth(deposit_tx, amount, address)
                .await
                .map_err(|e| PlasmaError::submission(format!("depositing {} wei", amount), e))?
        } else {
            tracing::info!(token = %currency, "Depositing {} of token...", amount);
            if approve {
                let approval = self
                    .root
                    .approve_token(currency, self.config.plasma_contract_address, amount, address)
                    .await
                    .map_err(|e| PlasmaError::submission(format!("approving {} of token {}", amount, currency), e))?;
                tracing::debug!(hash = %approval.transaction_hash, "approval sent");
                self.poller.confirm(approval.transaction_hash).await?;
            }
            self.root
                .deposit_token(deposit_tx, address)
                .await
                .map_err(|e| PlasmaError::submission(format!("depositing {} of token {}", amount, currency), e))?
        };

        let unit = if currency == ETH_CURRENCY { "wei".to_string() } else { format!("of token {}", currency.to_checksum(None)) };
        let message = format!(
            "Successfully deposited {} {} in to the Plasma chain.\nView the transaction: {}",
            amount,
            unit,
            self.config.root_tx_link(receipt.transaction_hash)
        );
        tracing::info!("{}", message);
        Ok(message)
    }

    /// Re-reads the root balance when the cached one is below `amount`.
    async fn ensure_root_funds(&self, address: Address, amount: Amount) -> PlasmaResult<()> {
        let cached = self.state.lock()?.root_balance;
        if amount <= cached {
            return Ok(());
        }
        let available = self.root.balance(address).await?;
        self.state.lock()?.root_balance = available;
        if amount > available {
            return Err(PlasmaError::InsufficientFunds { address, requested: amount, available });
        }
        Ok(())
    }

    /// Sends `amount` of `currency` to `to` on the child chain.
    pub async fn transfer(&self, to: Address, amount: Amount, currency: Currency) -> PlasmaResult<String> {
        self.transfer_inner(to, amount, currency)
            .await
            .inspect_err(|e| tracing::error!("{}", e))
    }

    async fn transfer_inner(&self, to: Address, amount: Amount, currency: Currency) -> PlasmaResult<String> {
        let address = self.state.ready_address()?;
        if amount.is_zero() {
            return Err(PlasmaError::InvalidAmount { operation: "Transaction" });
        }

        let utxos = self
            .child
            .get_utxos(address)
            .await
            .map_err(|e| PlasmaError::submission("fetching utxos", e))?;

        let selected = self.selector.select(&utxos, amount, currency, currency != ETH_CURRENCY)?;
        let body = build_transaction(selected, address, to, amount, currency)?;
        tracing::debug!(inputs = body.inputs.len(), outputs = body.outputs.len(), "transaction built");

        let payload = typed_data(&body, self.config.plasma_contract_address);
        let signature = self
            .signer
            .sign_typed_data(address, &payload)
            .await
            .map_err(|e| PlasmaError::submission("signing transaction", e))?;
        // all inputs belong to one key, so one signature covers them all
        let signatures = vec![signature; body.inputs.len()];
        let signed = SignedTransaction { body, typed_data: payload, signatures };

        let result = self
            .child
            .submit_transaction(&signed)
            .await
            .map_err(|e| PlasmaError::submission("submitting transaction", e))?;

        let message = format!(
            "Successfully submitted tx on the child chain: {}\nView the transaction: {}",
            serde_json::to_string(&result).unwrap_or_default(),
            self.config.child_tx_link(result.txhash)
        );
        tracing::info!("{}", message);
        Ok(message)
    }

    /// Starts a standard exit for every UTXO the account holds.
    ///
    /// All exits run concurrently and are joined; if any fails the error
    /// carries the full report.
    pub async fn exit(&self) -> PlasmaResult<Vec<String>> {
        self.exit_inner().await.inspect_err(|e| tracing::error!("{}", e))
    }

    async fn exit_inner(&self) -> PlasmaResult<Vec<String>> {
        let address = self.state.ready_address()?;
        let utxos = self
            .child
            .get_utxos(address)
            .await
            .map_err(|e| PlasmaError::submission("fetching utxos", e))?;

        if utxos.is_empty() {
            tracing::info!(%address, "no utxos to exit");
            return Ok(Vec::new());
        }
        tracing::info!(count = utxos.len(), "starting exits");

        let outcomes = join_all(utxos.iter().map(|utxo| self.exit_one(address, utxo))).await;

        let mut report = ExitReport::default();
        for (utxo, outcome) in utxos.iter().zip(outcomes) {
            match outcome {
                Ok(message) => report.succeeded.push((utxo.utxo_pos, message)),
                Err(reason) => {
                    tracing::warn!(utxo_pos = %utxo.utxo_pos, %reason, "exit failed");
                    report.failed.push(ExitFailure { utxo_pos: utxo.utxo_pos, reason });
                }
            }
        }

        if report.is_success() {
            Ok(report.messages())
        } else {
            Err(PlasmaError::ExitFailure(report))
        }
    }

    async fn exit_one(&self, address: Address, utxo: &Utxo) -> Result<String, String> {
        let exit_data = self
            .child
            .get_exit_data(utxo)
            .await
            .map_err(|e| format!("getting exit data: {}", e))?;
        let receipt = self
            .root
            .start_standard_exit(exit_data.utxo_pos, exit_data.txbytes, exit_data.proof, address)
            .await
            .map_err(|e| format!("starting exit: {}", e))?;

        let message = format!(
            "Started exit for UTXO {} ({} of {}).\nView the transaction: {}",
            utxo.utxo_pos,
            utxo.amount,
            utxo.currency.to_checksum(None),
            self.config.root_tx_link(receipt.transaction_hash)
        );
        tracing::info!("{}", message);
        Ok(message)
    }

    /// Re-reads root and child balances into the cached state.
    pub async fn refresh_balances(&self) -> PlasmaResult<AccountState> {
        let address = self.state.ready_address()?;
        let root_balance = self.root.balance(address).await?;
        let child_balances = self.child.get_balance(address).await?;
        let mut state = self.state.lock()?;
        // a concurrent re-initialization owns the state now
        if state.address == Some(address) {
            state.root_balance = root_balance;
            state.child_balances = child_balances;
        }
        Ok(state.clone())
    }

    pub async fn utxos(&self) -> PlasmaResult<Vec<Utxo>> {
        let address = self.state.ready_address()?;
        Ok(self.child.get_utxos(address).await?)
    }

    pub async fn transactions(&self, limit: usize) -> PlasmaResult<Vec<TransactionSummary>> {
        let address = self.state.ready_address()?;
        Ok(self.child.get_transactions(address, limit).await?)
    }
}
