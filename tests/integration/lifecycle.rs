//! End-to-end lifecycle tests: seeded tasks through the executor and
//! poll loop against a recording mock chain.

use std::sync::Arc;
use std::time::Duration;
use serde_json::json;

use courier::chain::pubkey::{create_program_address, Pubkey};
use courier::chain::tx::Transaction;
use courier::chain::ChainClient;
use courier::dex::raydium::RaydiumClient;
use courier::engine::executor::{TaskExecutor, TradeConfig};
use courier::engine::runner::Agent;
use courier::storage::TaskStore;
use courier::types::{TaskKind, TaskStatus};
use courier::wallet::Wallet;

use crate::mock_chain::RecordingChain;

fn key(seed: u8) -> Pubkey {
    Pubkey::new([seed; 32])
}

fn trade_config() -> TradeConfig {
    TradeConfig {
        pool_id: key(90).to_base58(),
        base_mint: key(91).to_base58(),
        quote_mint: key(92).to_base58(),
    }
}

fn executor_over(chain: Arc<RecordingChain>) -> TaskExecutor {
    let dex = Arc::new(RaydiumClient::new(chain.clone() as Arc<dyn ChainClient>));
    TaskExecutor::new(chain, dex, Wallet::generate(), trade_config())
}

/// Lamports carried by the system-transfer instruction of a recorded
/// transaction, and the recipient it pays.
fn decode_transfer(tx: &Transaction) -> (Pubkey, u64) {
    let ix = &tx.message.instructions[0];
    let to = tx.message.account_keys[ix.account_indices[1] as usize];
    let lamports = u64::from_le_bytes(ix.data[4..12].try_into().unwrap());
    (to, lamports)
}

#[tokio::test]
async fn seeded_transfer_completes_with_exact_lamports() {
    let store = TaskStore::open_in_memory().await.unwrap();
    let recipient = Wallet::generate().pubkey();
    let id = store
        .insert(
            &TaskKind::Transfer,
            &json!({"to": recipient.to_base58(), "amount": 0.01}),
        )
        .await
        .unwrap();

    let chain = Arc::new(RecordingChain::new(1_000_000_000));
    let executor = executor_over(chain.clone());
    let report = executor.process_pending(&store).await;

    assert_eq!(report.processed, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(
        store.get(id).await.unwrap().unwrap().status,
        TaskStatus::Completed
    );

    let sent = chain.sent();
    assert_eq!(sent.len(), 1);
    let (to, lamports) = decode_transfer(&sent[0].1);
    assert_eq!(to, recipient);
    assert_eq!(lamports, 10_000_000);
    assert_eq!(chain.confirmed(), vec!["mock-sig-1".to_string()]);
}

#[tokio::test]
async fn mixed_batch_reaches_terminal_states() {
    let store = TaskStore::open_in_memory().await.unwrap();
    let good = Wallet::generate().pubkey().to_base58();
    let ok_id = store
        .insert(&TaskKind::Transfer, &json!({"to": good, "amount": 0.5}))
        .await
        .unwrap();
    let bad_id = store
        .insert(
            &TaskKind::Transfer,
            &json!({"to": "definitely not an address", "amount": 0.5}),
        )
        .await
        .unwrap();
    let odd_id = store
        .insert(&TaskKind::Other("stake".into()), &json!({}))
        .await
        .unwrap();

    let chain = Arc::new(RecordingChain::new(0));
    let executor = executor_over(chain.clone());
    executor.process_pending(&store).await;

    assert_eq!(
        store.get(ok_id).await.unwrap().unwrap().status,
        TaskStatus::Completed
    );
    assert_eq!(
        store.get(bad_id).await.unwrap().unwrap().status,
        TaskStatus::Failed
    );
    // Unknown kinds fall through with no handler and are completed.
    assert_eq!(
        store.get(odd_id).await.unwrap().unwrap().status,
        TaskStatus::Completed
    );

    // Only the valid transfer reached the network.
    assert_eq!(chain.sent().len(), 1);
    assert!(store.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_send_marks_task_failed() {
    let store = TaskStore::open_in_memory().await.unwrap();
    let good = Wallet::generate().pubkey().to_base58();
    let id = store
        .insert(&TaskKind::Transfer, &json!({"to": good, "amount": 0.01}))
        .await
        .unwrap();

    let chain = Arc::new(RecordingChain::new(0));
    chain.fail_sends();
    let executor = executor_over(chain.clone());
    let report = executor.process_pending(&store).await;

    assert_eq!(report.failed, 1);
    assert_eq!(
        store.get(id).await.unwrap().unwrap().status,
        TaskStatus::Failed
    );
    assert!(chain.confirmed().is_empty());
}

// ---------------------------------------------------------------------------
// DEX trade
// ---------------------------------------------------------------------------

// AMM v4 / Serum market layout offsets, pinned independently of the
// implementation so a regression there fails here.
const AMM_STATE_LEN: usize = 752;
const AMM_BASE_DECIMAL: usize = 32;
const AMM_FIELDS: [(usize, u8); 8] = [
    (336, 1),  // base vault
    (368, 2),  // quote vault
    (400, 91), // base mint (matches trade_config)
    (432, 92), // quote mint
    (496, 5),  // open orders
    (528, 6),  // market id
    (560, 7),  // market program
    (592, 8),  // target orders
];

const MARKET_STATE_LEN: usize = 388;
const MARKET_VAULT_SIGNER_NONCE: usize = 45;
const MARKET_FIELDS: [(usize, u8); 5] = [
    (117, 11), // base vault
    (165, 12), // quote vault
    (253, 13), // event queue
    (285, 14), // bids
    (317, 15), // asks
];

fn synthetic_pool_account() -> Vec<u8> {
    let mut data = vec![0u8; AMM_STATE_LEN];
    data[AMM_BASE_DECIMAL..AMM_BASE_DECIMAL + 8].copy_from_slice(&9u64.to_le_bytes());
    for (offset, seed) in AMM_FIELDS {
        data[offset..offset + 32].copy_from_slice(key(seed).as_bytes());
    }
    data
}

fn synthetic_market_account() -> Vec<u8> {
    // Pick the first nonce whose derived vault signer is off-curve for
    // this market/program pair, as the market initializer would.
    let nonce = (0u64..256)
        .find(|n| {
            create_program_address(&[key(6).as_bytes(), &n.to_le_bytes()], &key(7)).is_ok()
        })
        .unwrap();

    let mut data = vec![0u8; MARKET_STATE_LEN];
    data[MARKET_VAULT_SIGNER_NONCE..MARKET_VAULT_SIGNER_NONCE + 8]
        .copy_from_slice(&nonce.to_le_bytes());
    for (offset, seed) in MARKET_FIELDS {
        data[offset..offset + 32].copy_from_slice(key(seed).as_bytes());
    }
    data
}

#[tokio::test]
async fn dex_trade_end_to_end_completes() {
    let store = TaskStore::open_in_memory().await.unwrap();
    let id = store.insert(&TaskKind::DexTrade, &json!({})).await.unwrap();

    let chain = Arc::new(RecordingChain::new(0));
    chain.set_account(key(90), synthetic_pool_account());
    chain.set_account(key(6), synthetic_market_account());

    let executor = executor_over(chain.clone());
    let report = executor.process_pending(&store).await;

    assert_eq!(report.completed, 1);
    assert_eq!(
        store.get(id).await.unwrap().unwrap().status,
        TaskStatus::Completed
    );

    let sent = chain.sent();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0].1;
    // Signed swap-base-in of 0.001 at 9 decimals.
    assert_ne!(tx.signatures[0], [0u8; 64]);
    let ix = &tx.message.instructions[0];
    assert_eq!(ix.data[0], 9);
    assert_eq!(&ix.data[1..9], &1_000_000u64.to_le_bytes());
}

/// A failed trade persists as failed; no later status write turns it
/// back into completed.
#[tokio::test]
async fn dex_trade_failure_is_terminal() {
    let store = TaskStore::open_in_memory().await.unwrap();
    let id = store.insert(&TaskKind::DexTrade, &json!({})).await.unwrap();

    // No pool account registered: the metadata lookup fails.
    let chain = Arc::new(RecordingChain::new(0));
    let executor = executor_over(chain.clone());
    executor.process_pending(&store).await;

    assert_eq!(
        store.get(id).await.unwrap().unwrap().status,
        TaskStatus::Failed
    );
    assert!(chain.sent().is_empty());
}

// ---------------------------------------------------------------------------
// Poll loop timing
// ---------------------------------------------------------------------------

// start_paused is incompatible with sqlx here: the pool acquire timeout runs
// on the paused tokio clock while the sqlite open happens on a real blocking
// thread, so acquisition fails instantly with PoolTimedOut. Real time keeps
// every assertion intact at the cost of ~10s wall time.
#[tokio::test]
async fn loop_period_respects_sleep_interval() {
    let store = TaskStore::open_in_memory().await.unwrap();
    let good = Wallet::generate().pubkey().to_base58();
    store
        .insert(&TaskKind::Transfer, &json!({"to": good.clone(), "amount": 0.01}))
        .await
        .unwrap();

    let chain = Arc::new(RecordingChain::new(0));
    let executor = executor_over(chain.clone());
    let agent = Agent::new(store.clone(), executor, Duration::from_secs(10));

    let handle = tokio::spawn(async move { agent.run().await });

    // Wait for the first pass, then queue a second task mid-sleep.
    while chain.sent().len() < 1 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    store
        .insert(&TaskKind::Transfer, &json!({"to": good, "amount": 0.02}))
        .await
        .unwrap();
    while chain.sent().len() < 2 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    handle.abort();

    let sent = chain.sent();
    let gap = sent[1].0.duration_since(sent[0].0);
    // The fixed sleep happens after each pass, so consecutive passes
    // are at least the interval apart.
    assert!(gap >= Duration::from_secs(10), "gap was {gap:?}");

    let (_, lamports_a) = decode_transfer(&sent[0].1);
    let (_, lamports_b) = decode_transfer(&sent[1].1);
    assert_eq!(lamports_a, 10_000_000);
    assert_eq!(lamports_b, 20_000_000);
}
