//! End-to-end payment flow against a mocked Esplora endpoint.

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use btc_hd_wallet::blockchain::bitcoin::{BitcoinKeypair, SignedTransaction, FLAT_FEE};
use btc_hd_wallet::core::{BitcoinNetwork, WalletConfig, WalletError, WalletManager};
use httpmock::{Method, MockServer};
use pretty_assertions::assert_eq;
use serde_json::json;

const ABANDON: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

struct Sender {
    keypair: BitcoinKeypair,
    private_key: String,
}

fn sender() -> Sender {
    let manager = WalletManager::new(&WalletConfig::default()).unwrap();
    let wallet = manager.generate_wallet(Some(ABANDON), 0).unwrap();
    let keypair = BitcoinKeypair::from_private_key_hex(&wallet.private_key, BitcoinNetwork::Testnet).unwrap();
    assert_eq!(keypair.address(), wallet.address);
    Sender {
        keypair,
        private_key: wallet.private_key,
    }
}

fn recipient() -> String {
    let manager = WalletManager::new(&WalletConfig::default()).unwrap();
    manager.generate_wallet(Some(ABANDON), 1).unwrap().address
}

fn funding_tx(script: &ScriptBuf, value: u64, salt: u64) -> Transaction {
    Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(Txid::from_raw_hash(sha256d::Hash::hash(&salt.to_le_bytes())), 0),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(value),
            script_pubkey: script.clone(),
        }],
    }
}

/// Registers UTXO and raw-transaction endpoints for one output per value.
async fn fund(server: &MockServer, sender: &Sender, values: &[u64]) -> Vec<String> {
    let address = sender.keypair.address();
    let mut utxos = Vec::new();
    let mut txids = Vec::new();
    for (i, value) in values.iter().enumerate() {
        let tx = funding_tx(&sender.keypair.p2pkh_script(), *value, i as u64);
        let txid = tx.txid().to_string();
        let raw = serialize_hex(&tx);
        server
            .mock_async(|when, then| {
                when.method(Method::GET).path(format!("/tx/{}/hex", txid));
                then.status(200).body(raw);
            })
            .await;
        utxos.push(json!({
            "txid": txid,
            "vout": 0,
            "value": value,
            "status": {"confirmed": true, "block_height": 2_500_000, "block_time": 1_700_000_000u64}
        }));
        txids.push(txid);
    }
    server
        .mock_async(|when, then| {
            when.method(Method::GET).path(format!("/address/{}/utxo", address));
            then.status(200).json_body(json!(utxos));
        })
        .await;
    txids
}

fn manager_for(server: &MockServer) -> WalletManager {
    let mut config = WalletConfig::default();
    config.api_base_url = server.base_url();
    WalletManager::new(&config).unwrap()
}

fn output_values(hex: &str) -> Vec<u64> {
    SignedTransaction::from_hex(hex)
        .unwrap()
        .transaction()
        .output
        .iter()
        .map(|o| o.value.to_sat())
        .collect()
}

#[tokio::test]
async fn payment_with_change_output() {
    let server = MockServer::start_async().await;
    let sender = sender();
    fund(&server, &sender, &[100_000]).await;
    let manager = manager_for(&server);

    let hex = manager
        .create_transaction(&sender.keypair.address(), &recipient(), 50_000, &sender.private_key)
        .await
        .unwrap();

    assert_eq!(output_values(&hex), vec![50_000, 49_000]);
    let tx = SignedTransaction::from_hex(&hex).unwrap();
    assert_eq!(tx.transaction().output[1].script_pubkey, sender.keypair.p2pkh_script());
}

#[tokio::test]
async fn small_remainder_is_folded_into_fee() {
    let server = MockServer::start_async().await;
    let sender = sender();
    fund(&server, &sender, &[52_400]).await;
    let manager = manager_for(&server);

    let unsigned = manager
        .build_transaction(&sender.keypair.address(), &recipient(), 51_200)
        .await
        .unwrap();
    assert_eq!(unsigned.transaction().output.len(), 1);
    assert_eq!(unsigned.change(), None);
    assert_eq!(unsigned.fee(), 1_200);
}

#[tokio::test]
async fn inputs_follow_provider_order() {
    let server = MockServer::start_async().await;
    let sender = sender();
    let txids = fund(&server, &sender, &[20_000, 5_000, 30_000, 40_000]).await;
    let manager = manager_for(&server);

    let unsigned = manager
        .build_transaction(&sender.keypair.address(), &recipient(), 50_000)
        .await
        .unwrap();
    let spent: Vec<String> = unsigned
        .transaction()
        .input
        .iter()
        .map(|i| i.previous_output.txid.to_string())
        .collect();
    assert_eq!(spent, txids[..3].to_vec());
    assert_eq!(unsigned.fee(), FLAT_FEE);
    assert_eq!(unsigned.change(), Some(4_000));
}

#[tokio::test]
async fn insufficient_funds_reports_totals() {
    let server = MockServer::start_async().await;
    let sender = sender();
    fund(&server, &sender, &[1_000]).await;
    let manager = manager_for(&server);

    let err = manager
        .create_transaction(&sender.keypair.address(), &recipient(), 900, &sender.private_key)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        WalletError::InsufficientFunds {
            available: 1_000,
            required: 1_446
        }
    );
}

#[tokio::test]
async fn dust_amount_is_rejected_before_selection() {
    let server = MockServer::start_async().await;
    let sender = sender();
    fund(&server, &sender, &[100_000]).await;
    let manager = manager_for(&server);

    let err = manager
        .create_transaction(&sender.keypair.address(), &recipient(), 545, &sender.private_key)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::AmountBelowDust { amount: 545, threshold: 546 }));
}

#[tokio::test]
async fn send_broadcasts_signed_hex() {
    let server = MockServer::start_async().await;
    let sender = sender();
    fund(&server, &sender, &[80_000]).await;
    let manager = manager_for(&server);

    let expected = manager
        .create_transaction(&sender.keypair.address(), &recipient(), 30_000, &sender.private_key)
        .await
        .unwrap();
    let txid = SignedTransaction::from_hex(&expected).unwrap().txid();

    let broadcast = server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/tx").body(expected.clone());
            then.status(200).body(txid.clone());
        })
        .await;

    let returned = manager
        .send(&sender.keypair.address(), &recipient(), 30_000, &sender.private_key)
        .await
        .unwrap();
    broadcast.assert_async().await;
    assert_eq!(returned, txid);
}

#[tokio::test]
async fn rejected_broadcast_carries_status() {
    let server = MockServer::start_async().await;
    let sender = sender();
    fund(&server, &sender, &[80_000]).await;
    server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/tx");
            then.status(400).body("sendrawtransaction RPC error: {\"code\":-26}");
        })
        .await;
    let manager = manager_for(&server);

    let hex = manager
        .create_transaction(&sender.keypair.address(), &recipient(), 30_000, &sender.private_key)
        .await
        .unwrap();
    let err = manager.broadcast_transaction(&hex).await.unwrap_err();
    assert!(matches!(err, WalletError::BroadcastFailure { status: 400, .. }));
}

#[tokio::test]
async fn missing_previous_transaction_aborts() {
    let server = MockServer::start_async().await;
    let sender = sender();
    server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path(format!("/address/{}/utxo", sender.keypair.address()));
            then.status(200).json_body(json!([{ "txid": format!("{:064x}", 7), "vout": 0, "value": 90_000 }]));
        })
        .await;
    let manager = manager_for(&server);

    let err = manager
        .build_transaction(&sender.keypair.address(), &recipient(), 10_000)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::NetworkFetch(_)));
}
