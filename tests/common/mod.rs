//! Common utilities for integration tests.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use alloy::{
    primitives::{address, Address, Bytes, TxHash, U256},
    sol_types::{SolCall, SolValue},
};
use async_trait::async_trait;
use otoshidama::{
    error::{AppError, Result},
    ethereum::{contracts::IERC20, NetworkChangeHub, NetworkChanges, WalletProvider},
    services::{ChainRegistry, NotificationCenter, SessionCoordinator, TransferService},
    types::{SessionPhase, SessionView, TransferReceipt},
    Config, OtoshidamaServer,
};
use tokio::sync::{watch, Notify};

/// Account the fake wallet hands out.
pub const ACCOUNT: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// A second account used as transfer destination.
pub const RECIPIENT: Address = address!("76D378627AC7a5F42418355418F28af08D6051B0");

/// Hardhat's first development key.
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// 5 tokens at 18 decimals.
pub fn five_tokens() -> U256 {
    U256::from(5_000_000_000_000_000_000u64)
}

/// A wallet interaction recorded by [`FakeWallet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RequestAccounts,
    ChainId,
    Account,
    LookupAddress { address: Address, chain_id: u64 },
    ResolveName(String),
    Decimals(Address),
    BalanceOf { token: Address, owner: Address },
    Transfer { token: Address, to: Address, amount: U256 },
    WaitForReceipt(TxHash),
}

#[derive(Debug)]
struct Script {
    chain_id: u64,
    chain_id_fails: bool,
    rejects_connection: bool,
    account: Address,
    names: HashMap<Address, String>,
    decimals: u8,
    decimals_fails: bool,
    balances: HashMap<Address, U256>,
    rejects_signature: bool,
    reverts: bool,
    switch_on_resolve: Option<u64>,
    next_tx: u8,
}

/// Scripted wallet provider.
///
/// Holds a single token ledger shared by every chain, answers contract reads
/// by selector and records every call in order.
pub struct FakeWallet {
    available: bool,
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
    network_changes: NetworkChangeHub,
    hold_accounts: AtomicBool,
    gate: Notify,
}

impl FakeWallet {
    /// Available wallet on Ethereum holding 5 tokens.
    pub fn new() -> Self {
        let mut balances = HashMap::new();
        balances.insert(ACCOUNT, five_tokens());
        Self {
            available: true,
            script: Mutex::new(Script {
                chain_id: 1,
                chain_id_fails: false,
                rejects_connection: false,
                account: ACCOUNT,
                names: HashMap::new(),
                decimals: 18,
                decimals_fails: false,
                balances,
                rejects_signature: false,
                reverts: false,
                switch_on_resolve: None,
                next_tx: 0,
            }),
            calls: Mutex::new(Vec::new()),
            network_changes: NetworkChangeHub::new(),
            hold_accounts: AtomicBool::new(false),
            gate: Notify::new(),
        }
    }

    /// A wallet that is not installed.
    pub fn unavailable() -> Self {
        Self { available: false, ..Self::new() }
    }

    pub fn on_chain(self, chain_id: u64) -> Self {
        self.script.lock().unwrap().chain_id = chain_id;
        self
    }

    pub fn with_decimals(self, decimals: u8) -> Self {
        self.script.lock().unwrap().decimals = decimals;
        self
    }

    pub fn with_balance(self, raw: U256) -> Self {
        self.set_balance(ACCOUNT, raw);
        self
    }

    pub fn with_name(self, address: Address, name: &str) -> Self {
        self.script.lock().unwrap().names.insert(address, name.to_string());
        self
    }

    pub fn rejecting_connection(self) -> Self {
        self.script.lock().unwrap().rejects_connection = true;
        self
    }

    pub fn failing_chain_id(self) -> Self {
        self.script.lock().unwrap().chain_id_fails = true;
        self
    }

    pub fn failing_decimals(self) -> Self {
        self.script.lock().unwrap().decimals_fails = true;
        self
    }

    pub fn rejecting_signature(self) -> Self {
        self.script.lock().unwrap().rejects_signature = true;
        self
    }

    pub fn reverting(self) -> Self {
        self.script.lock().unwrap().reverts = true;
        self
    }

    /// Switch to `chain_id` the next time a name is resolved.
    pub fn switching_on_resolve(self, chain_id: u64) -> Self {
        self.script.lock().unwrap().switch_on_resolve = Some(chain_id);
        self
    }

    /// Hold the next `request_accounts` until [`FakeWallet::release`].
    pub fn holding_accounts(self) -> Self {
        self.hold_accounts.store(true, Ordering::SeqCst);
        self
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn set_balance(&self, owner: Address, raw: U256) {
        self.script.lock().unwrap().balances.insert(owner, raw);
    }

    pub fn balance(&self, owner: Address) -> U256 {
        self.script.lock().unwrap().balances.get(&owner).copied().unwrap_or_default()
    }

    /// Switch network as the user would, announcing it to the subscriber.
    pub fn switch_network(&self, chain_id: u64) -> bool {
        self.script.lock().unwrap().chain_id = chain_id;
        self.network_changes.emit(chain_id)
    }

    pub fn has_subscriber(&self) -> bool {
        self.network_changes.has_subscriber()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    /// Position of the first call matching `matches`.
    pub fn position(&self, matches: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.lock().unwrap().iter().position(matches)
    }

    pub fn transfers(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| matches!(c, Call::Transfer { .. })).collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for FakeWallet {
    fn default() -> Self {
        Self::new()
    }
}

fn selector(calldata: &[u8]) -> [u8; 4] {
    let mut selector = [0u8; 4];
    if calldata.len() >= 4 {
        selector.copy_from_slice(&calldata[..4]);
    }
    selector
}

#[async_trait]
impl WalletProvider for FakeWallet {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn request_accounts(&self) -> Result<Address> {
        self.record(Call::RequestAccounts);
        if self.hold_accounts.swap(false, Ordering::SeqCst) {
            self.gate.notified().await;
        }
        let script = self.script.lock().unwrap();
        if script.rejects_connection {
            return Err(AppError::ConnectionRejected("User rejected the request.".into()));
        }
        Ok(script.account)
    }

    async fn chain_id(&self) -> Result<u64> {
        self.record(Call::ChainId);
        let script = self.script.lock().unwrap();
        if script.chain_id_fails {
            return Err(AppError::NetworkUnavailable("eth_chainId failed".into()));
        }
        Ok(script.chain_id)
    }

    async fn account(&self) -> Result<Address> {
        self.record(Call::Account);
        Ok(self.script.lock().unwrap().account)
    }

    async fn lookup_address(&self, address: Address, chain_id: u64) -> Result<Option<String>> {
        self.record(Call::LookupAddress { address, chain_id });
        if chain_id != 1 {
            return Ok(None);
        }
        Ok(self.script.lock().unwrap().names.get(&address).cloned())
    }

    async fn resolve_name(&self, name: &str, chain_id: u64) -> Result<Option<Address>> {
        self.record(Call::ResolveName(name.to_string()));
        if chain_id != 1 {
            return Ok(None);
        }
        let (resolved, switch_to) = {
            let mut script = self.script.lock().unwrap();
            let resolved =
                script.names.iter().find(|(_, n)| n.as_str() == name).map(|(address, _)| *address);
            (resolved, script.switch_on_resolve.take())
        };
        if let Some(chain_id) = switch_to {
            self.switch_network(chain_id);
        }
        Ok(resolved)
    }

    fn subscribe_network_changes(&self) -> NetworkChanges {
        self.network_changes.subscribe()
    }

    fn unsubscribe_network_changes(&self) {
        self.network_changes.unsubscribe();
    }

    async fn read_contract(&self, to: Address, calldata: Bytes) -> Result<Bytes> {
        let selector = selector(&calldata);

        if selector == IERC20::decimalsCall::SELECTOR {
            self.record(Call::Decimals(to));
            let script = self.script.lock().unwrap();
            if script.decimals_fails {
                return Err(AppError::Rpc("execution reverted".into()));
            }
            return Ok(U256::from(script.decimals).abi_encode().into());
        }

        if selector == IERC20::balanceOfCall::SELECTOR {
            let call = IERC20::balanceOfCall::abi_decode(&calldata)?;
            self.record(Call::BalanceOf { token: to, owner: call.owner });
            return Ok(self.balance(call.owner).abi_encode().into());
        }

        Err(AppError::Rpc(format!("unexpected call to {}", to)))
    }

    async fn write_contract(&self, chain_id: u64, to: Address, calldata: Bytes) -> Result<TxHash> {
        let call = IERC20::transferCall::abi_decode(&calldata)?;
        self.record(Call::Transfer { token: to, to: call.to, amount: call.amount });

        let mut script = self.script.lock().unwrap();
        if script.chain_id != chain_id {
            return Err(AppError::TransferFailed(format!(
                "wallet is on chain {}, not {}",
                script.chain_id, chain_id
            )));
        }
        if script.rejects_signature {
            return Err(AppError::TransferRejected("User denied transaction signature.".into()));
        }

        let from = script.account;
        let available = script.balances.get(&from).copied().unwrap_or_default();
        if !script.reverts {
            script.balances.insert(from, available.saturating_sub(call.amount));
            let received = script.balances.get(&call.to).copied().unwrap_or_default();
            script.balances.insert(call.to, received.saturating_add(call.amount));
        }

        script.next_tx += 1;
        Ok(TxHash::repeat_byte(script.next_tx))
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransferReceipt> {
        self.record(Call::WaitForReceipt(tx_hash));
        if self.script.lock().unwrap().reverts {
            return Err(AppError::TransferFailed(format!("Transaction {} reverted", tx_hash)));
        }
        Ok(TransferReceipt { tx_hash, block_number: Some(19_000_000), gas_used: 51_000 })
    }
}

/// Coordinator over `wallet` with the three-network registry.
pub fn coordinator(wallet: &Arc<FakeWallet>) -> SessionCoordinator {
    let provider: Arc<dyn WalletProvider> = wallet.clone();
    SessionCoordinator::new(
        provider,
        Arc::new(ChainRegistry::full()),
        NotificationCenter::new(Duration::from_secs(60)),
    )
}

/// Connected session and transfer service over `wallet`.
pub async fn connected(wallet: &Arc<FakeWallet>) -> (SessionCoordinator, TransferService) {
    let session = coordinator(wallet);
    let view = session.connect().await;
    assert_eq!(view.phase, SessionPhase::Ready);
    let transfers = TransferService::new(session.clone());
    (session, transfers)
}

/// Wait until the published view satisfies `done`.
pub async fn wait_for_view(
    rx: &mut watch::Receiver<SessionView>,
    done: impl FnMut(&SessionView) -> bool,
) -> SessionView {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(done))
        .await
        .expect("session did not settle in time")
        .expect("session dropped")
        .clone()
}

/// Server over a local wallet whose endpoint is unreachable.
pub fn create_offline_server() -> OtoshidamaServer {
    let mut config = Config {
        private_key: Some(TEST_PRIVATE_KEY.to_string()),
        log_level: "warn".to_string(),
        ..Config::default()
    };
    config.rpc_urls.insert(1, "http://127.0.0.1:1".to_string());
    OtoshidamaServer::new(config).expect("offline server")
}

/// Helper to create a test server from environment variables.
pub fn create_test_server() -> Option<OtoshidamaServer> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env().ok()?;
    if config.private_key.is_none() || config.rpc_urls.is_empty() {
        return None;
    }

    OtoshidamaServer::new(config).ok()
}

/// Skip test if server cannot be created (missing env vars).
#[macro_export]
macro_rules! skip_if_no_server {
    () => {
        match common::create_test_server() {
            Some(server) => server,
            None => {
                eprintln!("Skipping test: WALLET_PRIVATE_KEY or *_RPC_URL not set");
                return;
            }
        }
    };
}
