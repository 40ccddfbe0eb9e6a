//! Mock chain client for integration testing.
//!
//! A deterministic `ChainClient` implementation: balances, account
//! data, and confirmations are all in-memory and fully controllable
//! from test code. Every submitted transaction is recorded along with
//! the (tokio) instant it arrived, so tests can assert both wire
//! content and loop timing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

use courier::chain::pubkey::Pubkey;
use courier::chain::tx::{Blockhash, Transaction};
use courier::chain::ChainClient;
use courier::types::AgentError;

pub struct RecordingChain {
    balance: u64,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    sent: Mutex<Vec<(Instant, Transaction)>>,
    confirmed: Mutex<Vec<String>>,
    fail_sends: AtomicBool,
}

impl RecordingChain {
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            accounts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            confirmed: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Register account data returned by `get_account_data`.
    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(address, data);
    }

    /// Make all subsequent sends fail as rejected.
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    /// All transactions submitted so far, with arrival instants.
    pub fn sent(&self) -> Vec<(Instant, Transaction)> {
        self.sent.lock().unwrap().clone()
    }

    /// Signatures that were confirmed.
    pub fn confirmed(&self) -> Vec<String> {
        self.confirmed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for RecordingChain {
    async fn get_balance(&self, _address: &Pubkey) -> Result<u64, AgentError> {
        Ok(self.balance)
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Vec<u8>, AgentError> {
        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| AgentError::Network(format!("account not found: {address}")))
    }

    async fn get_latest_blockhash(&self) -> Result<Blockhash, AgentError> {
        Ok([7u8; 32])
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<String, AgentError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(AgentError::TransactionRejected(
                "forced rejection".to_string(),
            ));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((Instant::now(), tx.clone()));
        Ok(format!("mock-sig-{}", sent.len()))
    }

    async fn confirm_transaction(&self, signature: &str) -> Result<(), AgentError> {
        self.confirmed.lock().unwrap().push(signature.to_string());
        Ok(())
    }
}
