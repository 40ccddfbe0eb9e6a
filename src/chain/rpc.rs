//! JSON-RPC client for a Solana node.
//!
//! Covers the five calls the agent needs: `getBalance`,
//! `getAccountInfo`, `getLatestBlockhash`, `sendTransaction`, and
//! confirmation via `getSignatureStatuses` polling.
//!
//! Transport and node-side failures map to `AgentError::Network`;
//! rejection of a submitted transaction maps to
//! `AgentError::TransactionRejected`.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::ChainClient;
use crate::chain::pubkey::Pubkey;
use crate::chain::tx::{Blockhash, Transaction};
use crate::types::AgentError;

/// How often to re-check signature status while confirming.
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// RPC response types (node JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Wrapper used by commitment-aware endpoints.
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashInfo {
    blockhash: String,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    /// `[data_base64, "base64"]`
    data: (String, String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    confirmation_status: Option<String>,
    err: Option<Value>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP JSON-RPC client. One instance is created at startup and shared
/// for the process lifetime.
pub struct RpcClient {
    http: Client,
    url: String,
    commitment: String,
    confirm_timeout: Duration,
}

impl RpcClient {
    pub fn new(url: &str, commitment: &str, confirm_timeout: Duration) -> Result<Self, AgentError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AgentError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: url.to_string(),
            commitment: commitment.to_string(),
            confirm_timeout,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, AgentError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        debug!(method, "RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Network(format!("{method}: {e}")))?;

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| AgentError::Network(format!("{method}: malformed response: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(AgentError::Network(format!(
                "{method}: RPC error {}: {}",
                err.code, err.message
            )));
        }

        parsed
            .result
            .ok_or_else(|| AgentError::Network(format!("{method}: empty result")))
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, AgentError> {
        let result: WithContext<u64> = self
            .call(
                "getBalance",
                json!([address.to_base58(), {"commitment": self.commitment}]),
            )
            .await?;
        Ok(result.value)
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Vec<u8>, AgentError> {
        let result: WithContext<Option<AccountInfo>> = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_base58(),
                    {"encoding": "base64", "commitment": self.commitment}
                ]),
            )
            .await?;

        let account = result.value.ok_or_else(|| {
            AgentError::Network(format!("account not found: {}", address.to_base58()))
        })?;

        base64::engine::general_purpose::STANDARD
            .decode(&account.data.0)
            .map_err(|e| AgentError::Network(format!("account data is not valid base64: {e}")))
    }

    async fn get_latest_blockhash(&self) -> Result<Blockhash, AgentError> {
        let result: WithContext<BlockhashInfo> = self
            .call(
                "getLatestBlockhash",
                json!([{"commitment": self.commitment}]),
            )
            .await?;

        let decoded = bs58::decode(&result.value.blockhash)
            .into_vec()
            .map_err(|e| AgentError::Network(format!("blockhash is not valid base58: {e}")))?;

        decoded
            .try_into()
            .map_err(|_| AgentError::Network("blockhash is not 32 bytes".to_string()))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<String, AgentError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(tx.serialize());

        // A node-side error on submit means the transaction itself was
        // refused, not that the network path failed.
        self.call::<String>(
            "sendTransaction",
            json!([
                encoded,
                {"encoding": "base64", "preflightCommitment": self.commitment}
            ]),
        )
        .await
        .map_err(|e| match e {
            AgentError::Network(msg) if msg.contains("RPC error") => {
                AgentError::TransactionRejected(msg)
            }
            other => other,
        })
    }

    async fn confirm_transaction(&self, signature: &str) -> Result<(), AgentError> {
        let deadline = tokio::time::Instant::now() + self.confirm_timeout;

        loop {
            let result: WithContext<Vec<Option<SignatureStatus>>> = self
                .call("getSignatureStatuses", json!([[signature]]))
                .await?;

            if let Some(Some(status)) = result.value.first() {
                if let Some(err) = &status.err {
                    return Err(AgentError::TransactionRejected(format!(
                        "{signature}: {err}"
                    )));
                }
                match status.confirmation_status.as_deref() {
                    Some("confirmed") | Some("finalized") => return Ok(()),
                    other => debug!(signature, status = ?other, "Awaiting confirmation"),
                }
            }

            if tokio::time::Instant::now() >= deadline {
                warn!(signature, "Confirmation timed out");
                return Err(AgentError::Network(format!(
                    "confirmation timed out for {signature}"
                )));
            }

            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}
