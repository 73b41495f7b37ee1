//! ConfirmationPoller - waits for root-chain transactions to reach a block depth.
//!
//! ```text
//! pending ──(receipt)──► depth-checking ──(head - block >= depth)──► confirmed
//!    ▲                        │                    │
//!    └────────(retry)─────────┘                    └──(not at block)──► uncled
//! ```
//!
//! A missing receipt is retried every `interval` without limit. Errors while
//! checking depth are retried as well; errors fetching the receipt are not.
//! Depth 0 resolves on the first receipt.

use alloy_primitives::B256;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::client::ChainReader;
use crate::error::{PlasmaError, PlasmaResult};
use crate::runtime::Shutdown;
use crate::types::Receipt;

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Confirmed(Receipt),
    Uncled,
}

#[derive(Clone)]
pub struct ConfirmationPoller {
    reader: Arc<dyn ChainReader>,
    interval: Duration,
    depth: u64,
    shutdown: Option<Shutdown>,
}

impl ConfirmationPoller {
    pub fn new(reader: Arc<dyn ChainReader>, interval: Duration, depth: u64) -> Self {
        Self { reader, interval, depth, shutdown: None }
    }

    /// Stops polling with `Cancelled` once `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn depth(&self) -> u64 { self.depth }

    pub async fn check_once(&self, hash: B256) -> PlasmaResult<PollState> {
        let Some(receipt) = self.reader.transaction_receipt(hash).await? else {
            return Ok(PollState::Pending);
        };
        if self.depth == 0 {
            return Ok(PollState::Confirmed(receipt));
        }

        let head = match self.reader.block_number().await {
            Ok(head) => head,
            Err(e) => {
                tracing::debug!(%hash, error = %e, "block number lookup failed, retrying");
                return Ok(PollState::Pending);
            }
        };
        if head.saturating_sub(receipt.block_number) < self.depth {
            return Ok(PollState::Pending);
        }

        match self.reader.transaction_block(hash).await {
            Ok(Some(block)) if block == receipt.block_number => Ok(PollState::Confirmed(receipt)),
            Ok(_) => Ok(PollState::Uncled),
            Err(e) => {
                tracing::debug!(%hash, error = %e, "transaction lookup failed, retrying");
                Ok(PollState::Pending)
            }
        }
    }

    pub async fn confirm(&self, hash: B256) -> PlasmaResult<Receipt> {
        let mut stop = self.shutdown.as_ref().map(|s| s.subscribe());
        tracing::debug!(%hash, depth = self.depth, "waiting for confirmation");

        loop {
            if let Some(shutdown) = &self.shutdown {
                if shutdown.is_triggered().await {
                    return Err(PlasmaError::Cancelled { hash });
                }
            }

            match self.check_once(hash).await? {
                PollState::Confirmed(receipt) => {
                    tracing::info!(%hash, block = receipt.block_number, "transaction confirmed");
                    return Ok(receipt);
                }
                PollState::Uncled => {
                    let err = PlasmaError::UncledTransaction { hash };
                    tracing::error!("{}", err);
                    return Err(err);
                }
                PollState::Pending => {}
            }

            match stop.as_mut() {
                Some(rx) => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.interval) => {}
                        _ = rx.recv() => {
                            tracing::debug!(%hash, "confirmation cancelled");
                            return Err(PlasmaError::Cancelled { hash });
                        }
                    }
                }
                None => tokio::time::sleep(self.interval).await,
            }
        }
    }

    /// Confirms every hash concurrently; the first failure fails the batch.
    pub async fn confirm_all(&self, hashes: &[B256]) -> PlasmaResult<Vec<Receipt>> {
        try_join_all(hashes.iter().map(|hash| self.confirm(*hash))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, ClientResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Fixed {
        receipt: Option<Receipt>,
        head: ClientResult<u64>,
        tx_block: Option<u64>,
    }

    #[async_trait]
    impl ChainReader for Fixed {
        async fn transaction_receipt(&self, _hash: B256) -> ClientResult<Option<Receipt>> { Ok(self.receipt) }
        async fn block_number(&self) -> ClientResult<u64> {
            match &self.head {
                Ok(h) => Ok(*h),
                Err(_) => Err(ClientError::Other("head unavailable".into())),
            }
        }
        async fn transaction_block(&self, _hash: B256) -> ClientResult<Option<u64>> { Ok(self.tx_block) }
    }

    fn receipt(block: u64) -> Receipt {
        Receipt { transaction_hash: B256::repeat_byte(1), block_number: block, status: true }
    }

    fn poller(reader: Fixed, depth: u64) -> ConfirmationPoller {
        ConfirmationPoller::new(Arc::new(reader), Duration::from_millis(1), depth)
    }

    #[tokio::test]
    async fn no_receipt_is_pending() {
        let p = poller(Fixed { receipt: None, head: Ok(10), tx_block: None }, 1);
        assert_eq!(p.check_once(B256::ZERO).await.unwrap(), PollState::Pending);
    }

    #[tokio::test]
    async fn depth_zero_ignores_head() {
        let p = poller(Fixed { receipt: Some(receipt(10)), head: Ok(0), tx_block: None }, 0);
        assert_eq!(p.check_once(B256::ZERO).await.unwrap(), PollState::Confirmed(receipt(10)));
    }

    #[tokio::test]
    async fn shallow_receipt_is_pending() {
        let p = poller(Fixed { receipt: Some(receipt(10)), head: Ok(11), tx_block: Some(10) }, 2);
        assert_eq!(p.check_once(B256::ZERO).await.unwrap(), PollState::Pending);
        let p = poller(Fixed { receipt: Some(receipt(10)), head: Ok(12), tx_block: Some(10) }, 2);
        assert_eq!(p.check_once(B256::ZERO).await.unwrap(), PollState::Confirmed(receipt(10)));
    }

    #[tokio::test]
    async fn moved_transaction_is_uncled() {
        let p = poller(Fixed { receipt: Some(receipt(10)), head: Ok(20), tx_block: None }, 1);
        assert_eq!(p.check_once(B256::ZERO).await.unwrap(), PollState::Uncled);
        let p = poller(Fixed { receipt: Some(receipt(10)), head: Ok(20), tx_block: Some(11) }, 1);
        assert_eq!(p.check_once(B256::ZERO).await.unwrap(), PollState::Uncled);
    }

    #[tokio::test]
    async fn head_errors_are_retried() {
        let p = poller(Fixed { receipt: Some(receipt(10)), head: Err(ClientError::Other(String::new())), tx_block: Some(10) }, 1);
        assert_eq!(p.check_once(B256::ZERO).await.unwrap(), PollState::Pending);
    }

    #[tokio::test]
    async fn shutdown_cancels_waiting() {
        let shutdown = Shutdown::new();
        let p = poller(Fixed { receipt: None, head: Ok(0), tx_block: None }, 1).with_shutdown(shutdown.clone());
        let waiter = tokio::spawn(async move { p.confirm(B256::repeat_byte(9)).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        shutdown.trigger().await;
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(PlasmaError::Cancelled { .. })));
    }

    struct Failing(Mutex<u32>);

    #[async_trait]
    impl ChainReader for Failing {
        async fn transaction_receipt(&self, _hash: B256) -> ClientResult<Option<Receipt>> {
            *self.0.lock().unwrap() += 1;
            Err(ClientError::Other("boom".into()))
        }
        async fn block_number(&self) -> ClientResult<u64> { Ok(0) }
        async fn transaction_block(&self, _hash: B256) -> ClientResult<Option<u64>> { Ok(None) }
    }

    #[tokio::test]
    async fn receipt_errors_fail_immediately() {
        let reader = Arc::new(Failing(Mutex::new(0)));
        let p = ConfirmationPoller::new(reader.clone(), Duration::from_millis(1), 1);
        assert!(matches!(p.confirm(B256::ZERO).await, Err(PlasmaError::Client(_))));
        assert_eq!(*reader.0.lock().unwrap(), 1);
    }
}
