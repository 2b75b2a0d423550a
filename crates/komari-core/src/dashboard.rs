// ── Dashboard refresh coordinator ──
//
// Owns the data source and the reactive store for one Komari dashboard.
// Loads the inventory then live status, polls live status on a fixed
// interval, and guarantees at most one in-flight fetch per resource:
// starting a fetch cancels the previous one, and a cancelled fetch never
// writes to the store.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use strum::Display;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use komari_api::{KomariClient, MeData, RecordWindow};

use crate::config::{DashboardConfig, PollMode};
use crate::convert::{nodes_from_map, statuses_from_map};
use crate::error::CoreError;
use crate::model::{LiveStatus, Node, PingHistory, Record};
use crate::store::DataStore;

// ── Data source ──────────────────────────────────────────────────

/// Where dashboard data comes from.
///
/// Implemented by [`KomariClient`]; tests substitute a fake with
/// controllable completion order.
pub trait DashboardSource: Send + Sync + 'static {
    fn login(
        &self,
        username: &str,
        password: &SecretString,
        two_factor_code: Option<&str>,
    ) -> impl Future<Output = Result<(), komari_api::Error>> + Send;

    fn nodes(&self) -> impl Future<Output = Result<Vec<Node>, komari_api::Error>> + Send;

    fn live_status(
        &self,
    ) -> impl Future<Output = Result<HashMap<String, LiveStatus>, komari_api::Error>> + Send;

    fn load_records(
        &self,
        uuid: &str,
        window: RecordWindow,
    ) -> impl Future<Output = Result<Vec<Record>, komari_api::Error>> + Send;

    fn ping_records(
        &self,
        uuid: &str,
        window: RecordWindow,
    ) -> impl Future<Output = Result<PingHistory, komari_api::Error>> + Send;
}

impl DashboardSource for KomariClient {
    async fn login(
        &self,
        username: &str,
        password: &SecretString,
        two_factor_code: Option<&str>,
    ) -> Result<(), komari_api::Error> {
        KomariClient::login(self, username, password, two_factor_code).await
    }

    async fn nodes(&self) -> Result<Vec<Node>, komari_api::Error> {
        Ok(nodes_from_map(self.get_nodes().await?))
    }

    async fn live_status(&self) -> Result<HashMap<String, LiveStatus>, komari_api::Error> {
        Ok(statuses_from_map(self.get_nodes_latest_status().await?))
    }

    async fn load_records(
        &self,
        uuid: &str,
        window: RecordWindow,
    ) -> Result<Vec<Record>, komari_api::Error> {
        let records = KomariClient::load_records(self, uuid, window).await?;
        Ok(records.into_iter().map(Record::from).collect())
    }

    async fn ping_records(
        &self,
        uuid: &str,
        window: RecordWindow,
    ) -> Result<PingHistory, komari_api::Error> {
        Ok(KomariClient::ping_records(self, uuid, window).await?.into())
    }
}

// ── Observable state ─────────────────────────────────────────────

/// Overall dashboard state observable by consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// No host configured. A terminal prompt-to-configure state, not an error.
    NotConfigured,
    Error(String),
}

/// Per-resource fetch phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum FetchPhase {
    #[default]
    Idle,
    Fetching,
    Succeeded,
    Failed,
}

/// Resources with a coordinated fetch slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Resource {
    Inventory,
    LiveStatus,
}

/// Outcome of a coordinated fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// The result was written to the store.
    Applied,
    /// A newer fetch of the same resource started first; nothing was written.
    Superseded,
}

/// Point-in-time copy of the store, returned by one-shot refreshes.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub nodes: Arc<Vec<Arc<Node>>>,
    pub statuses: Arc<Vec<Arc<LiveStatus>>>,
    pub online: Arc<HashSet<String>>,
    pub fetched_at: DateTime<Utc>,
}

// ── Fetch slot ───────────────────────────────────────────────────

/// Cancel-then-restart bookkeeping for one resource.
///
/// The token swap in [`begin`](Self::begin) and the cancelled check in
/// [`commit`](Self::commit) share one lock, so a fetch cancelled before
/// it commits can never write.
struct FetchSlot {
    current: Mutex<CancellationToken>,
    phase: watch::Sender<FetchPhase>,
}

impl FetchSlot {
    fn new() -> Self {
        let (phase, _) = watch::channel(FetchPhase::Idle);
        Self {
            current: Mutex::new(CancellationToken::new()),
            phase,
        }
    }

    fn begin(&self, parent: &CancellationToken) -> CancellationToken {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        let token = parent.child_token();
        *current = token.clone();
        self.phase.send_replace(FetchPhase::Fetching);
        token
    }

    fn commit(&self, token: &CancellationToken, apply: impl FnOnce()) -> Refresh {
        let _current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            return Refresh::Superseded;
        }
        apply();
        self.phase.send_replace(FetchPhase::Succeeded);
        Refresh::Applied
    }

    fn fail(&self, token: &CancellationToken) -> Refresh {
        let _current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            return Refresh::Superseded;
        }
        self.phase.send_replace(FetchPhase::Failed);
        Refresh::Applied
    }
}

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

// ── Dashboard ────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`.
pub struct Dashboard<S = KomariClient> {
    inner: Arc<DashboardInner<S>>,
}

impl<S> Clone for Dashboard<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct DashboardInner<S> {
    config: DashboardConfig,
    /// `None` when no host is configured.
    source: Option<S>,
    store: Arc<DataStore>,
    load_state: watch::Sender<LoadState>,
    inventory: FetchSlot,
    live_status: FetchSlot,
    cancel: CancellationToken,
    poll: tokio::sync::Mutex<Option<PollTask>>,
}

impl Dashboard<KomariClient> {
    /// Create a dashboard from configuration. Does NOT fetch anything --
    /// call [`load_dashboard()`](Self::load_dashboard) to log in and load.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let client = if config.is_configured() {
            Some(config.build_client()?)
        } else {
            None
        };
        Ok(Self::with_source(config, client))
    }

    fn client(&self) -> Result<&KomariClient, CoreError> {
        self.inner.source.as_ref().ok_or(CoreError::NotConfigured)
    }

    // ── Identity ─────────────────────────────────────────────────

    /// The identity behind the current session or API key.
    pub async fn whoami(&self) -> Result<MeData, CoreError> {
        Ok(self.client()?.me().await?)
    }

    /// End the session. A no-op for API key access.
    pub async fn logout(&self) -> Result<(), CoreError> {
        let client = self.client()?;
        if self.inner.config.credentials().is_none() {
            debug!("no session credentials, skipping logout");
            return Ok(());
        }
        Ok(client.logout().await?)
    }

    // ── Admin operations ─────────────────────────────────────────

    /// Apply a partial edit to a node and reload the inventory.
    pub async fn edit_node(&self, uuid: &str, changes: &serde_json::Value) -> Result<(), CoreError> {
        self.client()?.edit_client(uuid, changes).await?;
        info!(uuid, "node edited");
        self.load_nodes().await.map(drop)
    }

    /// Delete a node and reload the inventory.
    pub async fn remove_node(&self, uuid: &str) -> Result<(), CoreError> {
        self.client()?.remove_client(uuid).await?;
        info!(uuid, "node removed");
        self.load_nodes().await.map(drop)
    }

    /// Submit a new display order and reload the inventory.
    pub async fn reorder_nodes(&self, uuids: &[String]) -> Result<(), CoreError> {
        self.client()?.reorder_clients(uuids).await?;
        info!(count = uuids.len(), "nodes reordered");
        self.load_nodes().await.map(drop)
    }
}

impl<S: DashboardSource> Dashboard<S> {
    /// Create a dashboard over an explicit source. `None` means not configured.
    pub fn with_source(config: DashboardConfig, source: Option<S>) -> Self {
        let (load_state, _) = watch::channel(LoadState::Idle);
        Self {
            inner: Arc::new(DashboardInner {
                config,
                source,
                store: Arc::new(DataStore::new()),
                load_state,
                inventory: FetchSlot::new(),
                live_status: FetchSlot::new(),
                cancel: CancellationToken::new(),
                poll: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn is_configured(&self) -> bool {
        self.inner.source.is_some()
    }

    fn source(&self) -> Result<&S, CoreError> {
        self.inner.source.as_ref().ok_or(CoreError::NotConfigured)
    }

    fn slot(&self, resource: Resource) -> &FetchSlot {
        match resource {
            Resource::Inventory => &self.inner.inventory,
            Resource::LiveStatus => &self.inner.live_status,
        }
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to overall load state changes.
    pub fn load_state(&self) -> watch::Receiver<LoadState> {
        self.inner.load_state.subscribe()
    }

    pub fn current_load_state(&self) -> LoadState {
        self.inner.load_state.borrow().clone()
    }

    pub fn phase(&self, resource: Resource) -> FetchPhase {
        *self.slot(resource).phase.borrow()
    }

    // ── Coordinated fetches ──────────────────────────────────────

    /// Fetch the inventory, cancelling any inventory fetch still in flight.
    pub async fn load_nodes(&self) -> Result<Refresh, CoreError> {
        let source = self.source()?;
        let store = &self.inner.store;
        self.coordinated(Resource::Inventory, source.nodes(), |nodes| {
            debug!(count = nodes.len(), "inventory applied");
            store.apply_nodes(nodes);
        })
        .await
    }

    /// Fetch live status, cancelling any live-status fetch still in flight.
    pub async fn load_live_status(&self) -> Result<Refresh, CoreError> {
        let source = self.source()?;
        let store = &self.inner.store;
        self.coordinated(Resource::LiveStatus, source.live_status(), |statuses| {
            debug!(count = statuses.len(), "live status applied");
            store.apply_live_status(statuses);
        })
        .await
    }

    async fn coordinated<T, F>(
        &self,
        resource: Resource,
        fetch: F,
        apply: impl FnOnce(T),
    ) -> Result<Refresh, CoreError>
    where
        F: Future<Output = Result<T, komari_api::Error>>,
    {
        self.ensure_running()?;
        let slot = self.slot(resource);
        let token = slot.begin(&self.inner.cancel);

        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!(%resource, "fetch superseded");
                return Ok(Refresh::Superseded);
            }
            result = fetch => result,
        };

        match outcome {
            Ok(value) => Ok(slot.commit(&token, || apply(value))),
            Err(e) => match slot.fail(&token) {
                Refresh::Superseded => Ok(Refresh::Superseded),
                Refresh::Applied => Err(e.into()),
            },
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Log in (when credentials are configured), then load the inventory
    /// and live status in that order, then start polling.
    ///
    /// The first failure aborts the sequence and becomes
    /// [`LoadState::Error`].
    pub async fn load_dashboard(&self) -> Result<Refresh, CoreError> {
        self.ensure_running()?;
        if !self.is_configured() {
            self.inner.load_state.send_replace(LoadState::NotConfigured);
            return Err(CoreError::NotConfigured);
        }
        self.inner.load_state.send_replace(LoadState::Loading);

        match self.load_sequence().await {
            Ok(refresh) => {
                self.inner.load_state.send_replace(LoadState::Loaded);
                info!(nodes = self.inner.store.node_count(), "dashboard loaded");
                self.start_polling().await;
                Ok(refresh)
            }
            Err(e) => {
                warn!(error = %e, "dashboard load failed");
                self.inner
                    .load_state
                    .send_replace(LoadState::Error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn load_sequence(&self) -> Result<Refresh, CoreError> {
        if self.inner.config.credentials().is_some() {
            self.login().await?;
        }
        let inventory = self.load_nodes().await?;
        let status = self.load_live_status().await?;
        Ok(if inventory == Refresh::Applied && status == Refresh::Applied {
            Refresh::Applied
        } else {
            Refresh::Superseded
        })
    }

    /// Log in with the configured username and password.
    pub async fn login(&self) -> Result<(), CoreError> {
        self.ensure_running()?;
        let source = self.source()?;
        let config = &self.inner.config;
        let (username, password) =
            config
                .credentials()
                .ok_or_else(|| CoreError::AuthenticationFailed {
                    message: "username and password are required".into(),
                })?;
        source
            .login(username, password, config.two_factor_code.as_deref())
            .await?;
        debug!(username, "logged in");
        Ok(())
    }

    /// Make sure requests will be authorized: an API key needs nothing,
    /// otherwise log in with the configured credentials.
    pub async fn ensure_auth(&self) -> Result<(), CoreError> {
        self.ensure_running()?;
        if !self.is_configured() {
            return Err(CoreError::NotConfigured);
        }
        if self.inner.config.has_api_key() {
            debug!("using API key, skipping login");
            return Ok(());
        }
        self.login().await
    }

    /// Reload the inventory then live status, swallowing failures.
    pub async fn refresh_all(&self) {
        if let Err(e) = self.load_nodes().await {
            debug!(error = %e, "inventory refresh failed");
        }
        if let Err(e) = self.load_live_status().await {
            debug!(error = %e, "live status refresh failed");
        }
    }

    /// One refresh cycle for scheduled, non-interactive callers.
    ///
    /// An API key skips login; otherwise credentials are required.
    pub async fn refresh_once(&self) -> Result<DashboardSnapshot, CoreError> {
        self.ensure_auth().await?;
        self.load_nodes().await?;
        self.load_live_status().await?;

        let store = &self.inner.store;
        Ok(DashboardSnapshot {
            nodes: store.nodes_snapshot(),
            statuses: store.statuses_snapshot(),
            online: store.online_ids(),
            fetched_at: Utc::now(),
        })
    }

    // ── Polling ──────────────────────────────────────────────────

    /// (Re)start the live-status poll task. A zero interval disables polling.
    pub async fn start_polling(&self) {
        let interval = self.inner.config.poll_interval;
        let mut poll = self.inner.poll.lock().await;
        if let Some(previous) = poll.take() {
            previous.cancel.cancel();
        }
        if interval.is_zero() {
            return;
        }

        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(poll_task(self.clone(), interval, cancel.clone()));
        *poll = Some(PollTask { cancel, handle });
        debug!(?interval, "polling started");
    }

    /// Stop the poll task and wait for it to exit.
    pub async fn stop_polling(&self) {
        let task = self.inner.poll.lock().await.take();
        if let Some(task) = task {
            task.cancel.cancel();
            let _ = task.handle.await;
            debug!("polling stopped");
        }
    }

    pub async fn is_polling(&self) -> bool {
        self.inner.poll.lock().await.is_some()
    }

    /// Cancel every in-flight fetch and the poll task.
    ///
    /// Terminal: afterwards every load, login and refresh fails with
    /// [`CoreError::ShutDown`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.stop_polling().await;
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    fn ensure_running(&self) -> Result<(), CoreError> {
        if self.is_shut_down() {
            return Err(CoreError::ShutDown);
        }
        Ok(())
    }

    // ── History ──────────────────────────────────────────────────

    /// Load-metric records for one node. Not coordinated: each chart
    /// fetches independently.
    pub async fn load_history(
        &self,
        node_id: &str,
        window: RecordWindow,
    ) -> Result<Vec<Record>, CoreError> {
        Ok(self.source()?.load_records(node_id, window).await?)
    }

    /// Latency samples and probe tasks for one node.
    pub async fn ping_history(
        &self,
        node_id: &str,
        window: RecordWindow,
    ) -> Result<PingHistory, CoreError> {
        Ok(self.source()?.ping_records(node_id, window).await?)
    }

    /// A strict-mode poll that succeeds again clears the error it raised.
    fn on_poll_success(&self) {
        if self.inner.config.poll_mode != PollMode::Strict {
            return;
        }
        let recovered = self.inner.load_state.send_if_modified(|state| {
            if matches!(state, LoadState::Error(_)) {
                *state = LoadState::Loaded;
                true
            } else {
                false
            }
        });
        if recovered {
            info!("live status poll recovered");
        }
    }

    fn on_poll_failure(&self, error: &CoreError) {
        match self.inner.config.poll_mode {
            PollMode::BestEffort => debug!(error = %error, "live status poll failed"),
            PollMode::Strict => {
                warn!(error = %error, "live status poll failed");
                self.inner
                    .load_state
                    .send_replace(LoadState::Error(error.to_string()));
            }
        }
    }
}

/// Periodically refresh live status.
async fn poll_task<S: DashboardSource>(
    dashboard: Dashboard<S>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match dashboard.load_live_status().await {
                    Ok(Refresh::Applied) => dashboard.on_poll_success(),
                    Ok(Refresh::Superseded) => {}
                    Err(e) => dashboard.on_poll_failure(&e),
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;

    use pretty_assertions::assert_eq;
    use tokio::sync::oneshot;

    use super::*;
    use crate::test_support::{node, status};

    type Reply<T> = oneshot::Receiver<Result<T, komari_api::Error>>;

    fn ready<T>(value: Result<T, komari_api::Error>) -> Reply<T> {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(value);
        rx
    }

    /// Replies are queued per method and handed out in call order.
    #[derive(Default)]
    struct FakeSource {
        calls: Arc<Mutex<Vec<&'static str>>>,
        login_error: Option<String>,
        nodes: tokio::sync::Mutex<VecDeque<Reply<Vec<Node>>>>,
        statuses: tokio::sync::Mutex<VecDeque<Reply<HashMap<String, LiveStatus>>>>,
    }

    impl FakeSource {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        async fn next<T>(queue: &tokio::sync::Mutex<VecDeque<Reply<T>>>) -> Result<T, komari_api::Error> {
            let reply = queue.lock().await.pop_front();
            match reply {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(komari_api::Error::MalformedResponse("dropped".into()))),
                None => Err(komari_api::Error::MalformedResponse("no reply queued".into())),
            }
        }
    }

    impl DashboardSource for FakeSource {
        async fn login(
            &self,
            _username: &str,
            _password: &SecretString,
            _two_factor_code: Option<&str>,
        ) -> Result<(), komari_api::Error> {
            self.record("login");
            match &self.login_error {
                Some(message) => Err(komari_api::Error::Authentication {
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }

        async fn nodes(&self) -> Result<Vec<Node>, komari_api::Error> {
            self.record("nodes");
            Self::next(&self.nodes).await
        }

        async fn live_status(&self) -> Result<HashMap<String, LiveStatus>, komari_api::Error> {
            self.record("status");
            Self::next(&self.statuses).await
        }

        async fn load_records(
            &self,
            _uuid: &str,
            _window: RecordWindow,
        ) -> Result<Vec<Record>, komari_api::Error> {
            self.record("records");
            Ok(Vec::new())
        }

        async fn ping_records(
            &self,
            _uuid: &str,
            _window: RecordWindow,
        ) -> Result<PingHistory, komari_api::Error> {
            self.record("ping");
            Ok(PingHistory::default())
        }
    }

    fn configured() -> DashboardConfig {
        DashboardConfig {
            host: "dash.example.com".into(),
            poll_interval: Duration::ZERO,
            ..DashboardConfig::default()
        }
    }

    fn with_credentials() -> DashboardConfig {
        DashboardConfig {
            username: Some("admin".into()),
            password: Some(SecretString::from("hunter2".to_owned())),
            ..configured()
        }
    }

    fn status_map(entries: &[(&str, bool)]) -> HashMap<String, LiveStatus> {
        entries
            .iter()
            .map(|(id, online)| ((*id).to_owned(), status(id, *online)))
            .collect()
    }

    fn source_with(
        nodes: Vec<Reply<Vec<Node>>>,
        statuses: Vec<Reply<HashMap<String, LiveStatus>>>,
    ) -> (FakeSource, Arc<Mutex<Vec<&'static str>>>) {
        let source = FakeSource {
            nodes: tokio::sync::Mutex::new(nodes.into()),
            statuses: tokio::sync::Mutex::new(statuses.into()),
            ..FakeSource::default()
        };
        let calls = Arc::clone(&source.calls);
        (source, calls)
    }

    async fn wait_for_calls(calls: &Mutex<Vec<&'static str>>, count: usize) {
        while calls.lock().unwrap().len() < count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn unconfigured_dashboard_reports_not_configured() {
        let dash = Dashboard::with_source(DashboardConfig::default(), None::<FakeSource>);

        let err = dash.load_dashboard().await.unwrap_err();
        assert!(matches!(err, CoreError::NotConfigured));
        assert_eq!(dash.current_load_state(), LoadState::NotConfigured);
        assert!(matches!(
            dash.refresh_once().await,
            Err(CoreError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn load_dashboard_runs_login_inventory_status_in_order() {
        let (source, calls) = source_with(
            vec![ready(Ok(vec![node("a", 1, None), node("b", 2, None)]))],
            vec![ready(Ok(status_map(&[("a", true), ("b", false)])))],
        );
        let dash = Dashboard::with_source(with_credentials(), Some(source));

        assert_eq!(dash.load_dashboard().await.unwrap(), Refresh::Applied);
        assert_eq!(*calls.lock().unwrap(), vec!["login", "nodes", "status"]);
        assert_eq!(dash.current_load_state(), LoadState::Loaded);
        assert_eq!(*dash.store().online_ids(), HashSet::from(["a".to_owned()]));
        assert_eq!(dash.store().nodes_snapshot()[0].id, "b");
        assert_eq!(dash.phase(Resource::LiveStatus), FetchPhase::Succeeded);
        assert!(!dash.is_polling().await);
    }

    #[tokio::test]
    async fn login_failure_aborts_load() {
        let (mut source, calls) = source_with(Vec::new(), Vec::new());
        source.login_error = Some("bad creds".into());
        let dash = Dashboard::with_source(with_credentials(), Some(source));

        let err = dash.load_dashboard().await.unwrap_err();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert_eq!(*calls.lock().unwrap(), vec!["login"]);
        assert!(
            matches!(dash.current_load_state(), LoadState::Error(ref m) if m.contains("bad creds"))
        );
    }

    #[tokio::test]
    async fn inventory_failure_skips_live_status() {
        let (source, calls) = source_with(
            vec![ready(Err(komari_api::Error::Http { status: 502 }))],
            Vec::new(),
        );
        let dash = Dashboard::with_source(configured(), Some(source));

        assert!(dash.load_dashboard().await.is_err());
        assert_eq!(*calls.lock().unwrap(), vec!["nodes"]);
        assert_eq!(dash.phase(Resource::Inventory), FetchPhase::Failed);
        assert!(matches!(dash.current_load_state(), LoadState::Error(_)));
    }

    #[tokio::test]
    async fn superseded_inventory_fetch_never_writes() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let (source, calls) = source_with(vec![first_rx, second_rx], Vec::new());
        let dash = Dashboard::with_source(configured(), Some(source));

        let first = tokio::spawn({
            let dash = dash.clone();
            async move { dash.load_nodes().await }
        });
        wait_for_calls(&calls, 1).await;

        let second = tokio::spawn({
            let dash = dash.clone();
            async move { dash.load_nodes().await }
        });
        wait_for_calls(&calls, 2).await;

        // The stale response arrives after it was superseded.
        let _ = first_tx.send(Ok(vec![node("stale", 1, None)]));
        assert_eq!(first.await.unwrap().unwrap(), Refresh::Superseded);
        assert_eq!(dash.store().node_count(), 0);

        let _ = second_tx.send(Ok(vec![node("fresh", 1, None)]));
        assert_eq!(second.await.unwrap().unwrap(), Refresh::Applied);

        let ids: Vec<String> = dash
            .store()
            .nodes_snapshot()
            .iter()
            .map(|n| n.id.clone())
            .collect();
        assert_eq!(ids, vec!["fresh"]);
    }

    #[tokio::test]
    async fn refresh_once_requires_credentials_without_api_key() {
        let (source, calls) = source_with(Vec::new(), Vec::new());
        let dash = Dashboard::with_source(configured(), Some(source));

        let err = dash.refresh_once().await.unwrap_err();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn refresh_once_with_api_key_skips_login() {
        let (source, calls) = source_with(
            vec![ready(Ok(vec![node("a", 1, None)]))],
            vec![ready(Ok(status_map(&[("a", true)])))],
        );
        let config = DashboardConfig {
            api_key: Some(SecretString::from("key".to_owned())),
            ..with_credentials()
        };
        let dash = Dashboard::with_source(config, Some(source));

        let snapshot = dash.refresh_once().await.unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["nodes", "status"]);
        assert_eq!(snapshot.nodes.len(), 1);
        assert!(snapshot.online.contains("a"));
    }

    async fn poll_after_failure(mode: PollMode) -> (LoadState, bool) {
        let (source, _calls) = source_with(
            vec![ready(Ok(vec![node("a", 1, None)]))],
            vec![
                ready(Ok(status_map(&[("a", true)]))),
                ready(Err(komari_api::Error::Http { status: 500 })),
            ],
        );
        let config = DashboardConfig {
            poll_interval: Duration::from_secs(5),
            poll_mode: mode,
            ..configured()
        };
        let dash = Dashboard::with_source(config, Some(source));
        dash.load_dashboard().await.unwrap();
        assert!(dash.is_polling().await);

        tokio::time::sleep(Duration::from_secs(6)).await;
        let state = dash.current_load_state();
        let still_online = dash.store().is_online("a");
        dash.shutdown().await;
        (state, still_online)
    }

    #[tokio::test(start_paused = true)]
    async fn best_effort_poll_keeps_last_snapshot() {
        let (state, still_online) = poll_after_failure(PollMode::BestEffort).await;
        assert_eq!(state, LoadState::Loaded);
        assert!(still_online);
    }

    #[tokio::test(start_paused = true)]
    async fn strict_poll_surfaces_failure() {
        let (state, still_online) = poll_after_failure(PollMode::Strict).await;
        assert!(matches!(state, LoadState::Error(_)));
        assert!(still_online);
    }

    #[tokio::test(start_paused = true)]
    async fn strict_poll_recovers_after_success() {
        let (source, _calls) = source_with(
            vec![ready(Ok(vec![node("a", 1, None)]))],
            vec![
                ready(Ok(status_map(&[("a", true)]))),
                ready(Err(komari_api::Error::Http { status: 500 })),
                ready(Ok(status_map(&[("a", false)]))),
            ],
        );
        let config = DashboardConfig {
            poll_interval: Duration::from_secs(5),
            poll_mode: PollMode::Strict,
            ..configured()
        };
        let dash = Dashboard::with_source(config, Some(source));
        dash.load_dashboard().await.unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(matches!(dash.current_load_state(), LoadState::Error(_)));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(dash.current_load_state(), LoadState::Loaded);
        assert!(!dash.store().is_online("a"));
        dash.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_is_terminal() {
        let (source, calls) = source_with(
            vec![ready(Ok(vec![node("a", 1, None)]))],
            vec![ready(Ok(status_map(&[("a", true)])))],
        );
        let dash = Dashboard::with_source(with_credentials(), Some(source));
        dash.shutdown().await;
        assert!(dash.is_shut_down());

        assert!(matches!(dash.load_dashboard().await, Err(CoreError::ShutDown)));
        assert_eq!(dash.current_load_state(), LoadState::Idle);
        assert!(matches!(dash.refresh_once().await, Err(CoreError::ShutDown)));
        assert!(matches!(dash.load_nodes().await, Err(CoreError::ShutDown)));
        assert!(!dash.is_polling().await);
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(dash.store().node_count(), 0);
    }

    #[tokio::test]
    async fn refresh_all_swallows_inventory_failure() {
        let (source, calls) = source_with(
            vec![ready(Err(komari_api::Error::Http { status: 503 }))],
            vec![ready(Ok(status_map(&[("a", true)])))],
        );
        let dash = Dashboard::with_source(configured(), Some(source));

        dash.refresh_all().await;
        assert_eq!(*calls.lock().unwrap(), vec!["nodes", "status"]);
        assert_eq!(dash.phase(Resource::Inventory), FetchPhase::Failed);
        assert!(dash.store().is_online("a"));
    }

    #[tokio::test]
    async fn history_reads_through_source() {
        let (source, calls) = source_with(Vec::new(), Vec::new());
        let dash = Dashboard::with_source(configured(), Some(source));

        assert!(dash.load_history("a", RecordWindow::Hours4).await.unwrap().is_empty());
        assert_eq!(dash.ping_history("a", RecordWindow::Hour1).await.unwrap().count, 0);
        assert_eq!(*calls.lock().unwrap(), vec!["records", "ping"]);
    }
}
