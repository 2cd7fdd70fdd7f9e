//! Wallet session state machine.
//!
//! Drives `Idle -> Connecting -> Resolving -> Ready`, re-enters `Resolving`
//! whenever the wallet announces a network change, and publishes a
//! [`SessionView`] after every committed transition.
//!
//! Every connect, network resolution and disconnect takes a new generation
//! number. Work started under an older generation may finish, but its
//! results and notifications are dropped.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError, RwLock,
};

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    error::{AppError, Result},
    ethereum::{constants::EXPECTED_TOKEN_DECIMALS, TokenContract, WalletProvider},
    services::{ChainRegistry, NotificationCenter},
    types::{NetworkStatus, NoticeKind, SessionPhase, SessionState, SessionView, TokenBalance},
};

/// Coordinates the wallet session.
///
/// Cheap to clone; all clones share the same session.
#[derive(Clone)]
pub struct SessionCoordinator {
    provider: Arc<dyn WalletProvider>,
    registry: Arc<ChainRegistry>,
    notifications: NotificationCenter,
    state: Arc<RwLock<SessionState>>,
    generation: Arc<AtomicU64>,
    sending: Arc<AtomicBool>,
    listener: Arc<Mutex<Option<JoinHandle<()>>>>,
    view_tx: Arc<watch::Sender<SessionView>>,
}

impl SessionCoordinator {
    /// Create a coordinator in the `Idle` phase.
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        registry: Arc<ChainRegistry>,
        notifications: NotificationCenter,
    ) -> Self {
        let state = SessionState::new(provider.is_available());
        let (view_tx, _) = watch::channel(state.view(false));

        Self {
            provider,
            registry,
            notifications,
            state: Arc::new(RwLock::new(state)),
            generation: Arc::new(AtomicU64::new(0)),
            sending: Arc::new(AtomicBool::new(false)),
            listener: Arc::new(Mutex::new(None)),
            view_tx: Arc::new(view_tx),
        }
    }

    /// Receive a fresh [`SessionView`] after every change.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_tx.subscribe()
    }

    /// Copy of the current session state.
    pub fn state(&self) -> SessionState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Current render snapshot.
    pub fn view(&self) -> SessionView {
        self.state.read().unwrap_or_else(PoisonError::into_inner).view(self.is_sending())
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn provider(&self) -> Arc<dyn WalletProvider> {
        Arc::clone(&self.provider)
    }

    /// Number of the latest connect, network resolution or disconnect.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::SeqCst)
    }

    /// Connect to the wallet and resolve network, identity and balance.
    ///
    /// A connect started while another is running supersedes it.
    pub async fn connect(&self) -> SessionView {
        let generation = self.begin_sequence();
        tracing::info!(generation, "Connecting wallet");

        if !self.provider.is_available() {
            self.commit(generation, SessionState::new(false));
            self.report(
                generation,
                &AppError::ConnectionRejected("No compatible wallet found".into()),
            );
            return self.view();
        }

        let mut draft = SessionState::new(true);
        draft.phase = SessionPhase::Connecting;
        draft.is_connecting = true;
        if !self.commit(generation, draft.clone()) {
            return self.view();
        }

        let address = match self.provider.request_accounts().await {
            Ok(address) => address,
            Err(e) => {
                let err = match e {
                    AppError::ConnectionRejected(_) => e,
                    other => AppError::ConnectionRejected(other.to_string()),
                };
                if self.commit(generation, SessionState::new(true)) {
                    self.notifications.notify_error(&err);
                }
                return self.view();
            }
        };
        tracing::debug!(address = %address, "Account access granted");

        draft.phase = SessionPhase::Resolving;
        if !self.commit(generation, draft.clone()) {
            return self.view();
        }

        if let Some(mut resolved) = self.resolve(generation, draft, true).await {
            resolved.phase = SessionPhase::Ready;
            resolved.is_connecting = false;
            if self.commit(generation, resolved) {
                let view = self.view();
                tracing::info!(
                    chain_id = ?view.chain_id,
                    network = ?view.network_label,
                    balance = ?view.balance,
                    "Wallet session ready"
                );
            }
        }

        self.view()
    }

    /// Re-resolve the session after the wallet switched network.
    ///
    /// Ignored until account access has been granted.
    pub async fn handle_network_change(&self, announced_chain_id: u64) {
        let current = self.state();
        if matches!(current.phase, SessionPhase::Idle | SessionPhase::Connecting) {
            tracing::debug!(chain_id = announced_chain_id, "Ignoring network change outside a session");
            return;
        }

        let generation = self.begin_sequence();
        tracing::info!(chain_id = announced_chain_id, generation, "Wallet network changed");

        let mut draft = current;
        draft.clear_chain();
        draft.phase = SessionPhase::Resolving;
        if !self.commit(generation, draft.clone()) {
            return;
        }

        if let Some(mut resolved) = self.resolve(generation, draft, false).await {
            resolved.phase = SessionPhase::Ready;
            resolved.is_connecting = false;
            self.commit(generation, resolved);
        }
    }

    /// Drop the session and stop listening for network changes.
    pub fn disconnect(&self) -> SessionView {
        let generation = self.begin_sequence();
        if let Some(listener) = self.listener_slot().take() {
            listener.abort();
        }
        self.provider.unsubscribe_network_changes();
        self.commit(generation, SessionState::new(self.provider.is_available()));
        tracing::info!(generation, "Wallet disconnected");
        self.view()
    }

    /// Fetch the balance again for the current chain and account.
    ///
    /// Dropped if the session moved on while the balance was in flight.
    pub async fn refresh_balance(&self) -> Result<()> {
        let generation = self.generation.load(Ordering::SeqCst);
        let snapshot = self.state();
        let (Some(token), Some(owner)) = (snapshot.token, snapshot.account_address) else {
            return Ok(());
        };

        let raw = TokenContract::new(self.provider(), token.contract_address)
            .balance_of(owner)
            .await?;

        let mut draft = self.state();
        if draft.chain_id != snapshot.chain_id || draft.token != snapshot.token {
            return Ok(());
        }
        draft.token_balance = Some(TokenBalance::new(raw, token.decimals));
        self.commit(generation, draft);
        Ok(())
    }

    /// Mark a transfer as in flight.
    ///
    /// Returns `None` while another transfer holds the flag. Dropping the
    /// guard clears it.
    pub fn begin_sending(&self) -> Option<SendGuard> {
        self.sending.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).ok()?;
        self.publish();
        Some(SendGuard { session: self.clone() })
    }

    /// Steps shared by connect and network resolution: chain id, listener,
    /// account and name, registry, decimals, balance.
    ///
    /// Returns `None` once the sequence is stale.
    async fn resolve(
        &self,
        generation: u64,
        mut draft: SessionState,
        register_listener: bool,
    ) -> Option<SessionState> {
        match self.provider.chain_id().await {
            Ok(chain_id) => draft.chain_id = Some(chain_id),
            Err(e) => {
                draft.chain_id = None;
                self.report(generation, &e);
            }
        }
        if !self.is_current(generation) {
            return None;
        }

        if register_listener {
            self.register_listener();
        }

        self.fetch_identity(generation, &mut draft).await;
        if !self.is_current(generation) {
            return None;
        }

        let Some(chain_id) = draft.chain_id else {
            return Some(draft);
        };

        let Some(entry) = self.registry.lookup(chain_id).cloned() else {
            tracing::info!(chain_id, "Network has no token contract");
            draft.network = NetworkStatus::Unsupported(chain_id);
            draft.token = None;
            draft.token_balance = None;
            return Some(draft);
        };
        draft.network = NetworkStatus::Supported(entry.clone());

        let token = TokenContract::new(self.provider(), entry.token_address);
        let metadata = match draft.token.filter(|t| t.contract_address == entry.token_address) {
            Some(cached) => cached,
            None => match token.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    self.report(generation, &e);
                    return self.is_current(generation).then_some(draft);
                }
            },
        };
        if !self.is_current(generation) {
            return None;
        }
        if metadata.decimals != EXPECTED_TOKEN_DECIMALS {
            tracing::warn!(
                chain_id,
                decimals = metadata.decimals,
                "Token reports non-standard decimals"
            );
            self.notifications
                .push(NoticeKind::NonStandardDecimals, Some(format!("Code: {}", metadata.decimals)));
        }
        draft.token = Some(metadata);

        if let Some(owner) = draft.account_address {
            match token.balance_of(owner).await {
                Ok(raw) => draft.token_balance = Some(TokenBalance::new(raw, metadata.decimals)),
                Err(e) => {
                    self.report(generation, &AppError::MetadataFetch(format!("balance: {}", e)))
                }
            }
        }

        self.is_current(generation).then_some(draft)
    }

    /// Fetch the account and, on the primary network, its registered name.
    async fn fetch_identity(&self, generation: u64, draft: &mut SessionState) {
        let address = match self.provider.account().await {
            Ok(address) => address,
            Err(e) => {
                self.report(generation, &e);
                return;
            }
        };
        draft.set_account(address);

        let Some(chain_id) = draft.chain_id.filter(|id| self.registry.is_primary(*id)) else {
            return;
        };
        match self.provider.lookup_address(address, chain_id).await {
            Ok(Some(name)) => {
                tracing::debug!(address = %address, name = %name, "Resolved account name");
                draft.set_resolved_name(name);
            }
            Ok(None) => {}
            Err(e) => tracing::debug!(address = %address, error = %e, "Name lookup failed"),
        }
    }

    /// Replace the network change listener with a fresh one.
    fn register_listener(&self) {
        let mut changes = self.provider.subscribe_network_changes();
        let session = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(chain_id) = changes.recv().await {
                session.handle_network_change(chain_id).await;
            }
            tracing::debug!("Network change subscription closed");
        });

        if let Some(previous) = self.listener_slot().replace(handle) {
            previous.abort();
        }
    }

    fn begin_sequence(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Swap in `draft` if `generation` is still current.
    fn commit(&self, generation: u64, draft: SessionState) -> bool {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if !self.is_current(generation) {
                tracing::debug!(generation, "Dropping stale session update");
                return false;
            }
            *state = draft;
        }
        self.publish();
        true
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }

    /// Notify `err` unless the sequence is stale.
    fn report(&self, generation: u64, err: &AppError) {
        if self.is_current(generation) {
            self.notifications.notify_error(err);
        } else {
            tracing::debug!(generation, error = %err, "Suppressing stale failure");
        }
    }

    fn listener_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("state", &self.state())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("sending", &self.is_sending())
            .finish()
    }
}

/// Holds the in-flight transfer flag.
pub struct SendGuard {
    session: SessionCoordinator,
}

impl Drop for SendGuard {
    fn drop(&mut self) {
        self.session.sending.store(false, Ordering::SeqCst);
        self.session.publish();
    }
}
