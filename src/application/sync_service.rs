//! SyncService - the session-scoped entry point of the sync layer.
//!
//! Owns one [`StateStore`], one [`ConnectionManager`] and one
//! [`SubscriptionManager`], and runs a supervisor task that keeps the
//! connection in step with the session:
//!
//! - session authenticated → `connect()` (and an initial snapshot load)
//! - session signed out → `disconnect()`
//! - connection (re)opened → replay remembered subscriptions
//!
//! The rendering layer only sees the read model (`connected()`,
//! `snapshot()`, the watch receivers) and the three subscription
//! operations. No error from below is surfaced through it.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::{AppConfig, ValidationError};
use crate::domain::connection::ConnectionState;
use crate::domain::frames::SendOutcome;
use crate::domain::monitoring::Snapshot;
use crate::ports::{LoaderError, SessionProvider, SnapshotLoader, Transport};

use super::{ConnectError, ConnectionManager, ConnectionSettings, StateStore, SubscriptionManager};

/// Session-scoped sync service.
pub struct SyncService {
    session: Arc<dyn SessionProvider>,
    store: Arc<StateStore>,
    connection: Arc<ConnectionManager>,
    subscriptions: Arc<SubscriptionManager>,
    loader: Option<Arc<dyn SnapshotLoader>>,
    resubscribe_on_reconnect: bool,
    shutdown: watch::Sender<bool>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl SyncService {
    /// Builds the service from configuration.
    ///
    /// Nothing connects until [`SyncService::start`] is called.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the streaming endpoint cannot be
    /// derived from `server.base_url` and `server.ws_path`.
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionProvider>,
        config: &AppConfig,
    ) -> Result<Self, ValidationError> {
        let endpoint = config.server.stream_endpoint()?;
        let store = Arc::new(StateStore::new(config.store.event_log_capacity));
        let connection = Arc::new(ConnectionManager::new(
            transport,
            Arc::clone(&session),
            Arc::clone(&store),
            endpoint,
            ConnectionSettings::from(&config.connection),
        ));
        let subscriptions = Arc::new(SubscriptionManager::new(connection.clone()));
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            session,
            store,
            connection,
            subscriptions,
            loader: None,
            resubscribe_on_reconnect: config.connection.resubscribe_on_reconnect,
            shutdown,
            supervisor: Mutex::new(None),
        })
    }

    /// Adds a loader used to seed the snapshot whenever the session signs in.
    pub fn with_loader(mut self, loader: Arc<dyn SnapshotLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Starts the supervisor. Calling it again has no effect.
    pub async fn start(&self) {
        let mut supervisor = self.supervisor.lock().await;
        if supervisor.is_some() {
            return;
        }

        let task = Supervisor {
            session: Arc::clone(&self.session),
            store: Arc::clone(&self.store),
            connection: Arc::clone(&self.connection),
            subscriptions: Arc::clone(&self.subscriptions),
            loader: self.loader.clone(),
            resubscribe_on_reconnect: self.resubscribe_on_reconnect,
            initial_load: None,
        };
        *supervisor = Some(tokio::spawn(task.run(self.shutdown.subscribe())));
        tracing::debug!("Sync supervisor started");
    }

    /// Stops the supervisor and closes the connection. A pending retry or
    /// in-flight snapshot load is cancelled.
    ///
    /// Leaves the connection `Idle`. Safe to call more than once.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.supervisor.lock().await.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Sync supervisor ended abnormally");
            }
        }
        self.connection.disconnect().await;
        tracing::debug!("Sync service shut down");
    }

    // === Read model ===

    pub fn connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.store.subscribe()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.watch_state()
    }

    /// Retries fired by the reconnect timer so far.
    pub fn reconnect_attempts(&self) -> u64 {
        self.connection.reconnect_attempts()
    }

    /// Nodes the client has asked to follow.
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.intents()
    }

    // === Subscription operations ===

    pub async fn subscribe(&self, node: &str) -> SendOutcome {
        self.subscriptions.subscribe(node).await
    }

    pub async fn unsubscribe(&self, node: &str) -> SendOutcome {
        self.subscriptions.unsubscribe(node).await
    }

    pub async fn request_update(&self, node: &str) -> SendOutcome {
        self.subscriptions.request_update(node).await
    }

    /// Loads the node list and alert counts into the snapshot.
    ///
    /// Each half is applied independently; the first failure is returned.
    /// Does nothing without a loader.
    pub async fn load_initial(&self) -> Result<(), LoaderError> {
        match &self.loader {
            Some(loader) => load_snapshot(loader.as_ref(), self.session.as_ref(), &self.store).await,
            None => Ok(()),
        }
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let connection = Arc::clone(&self.connection);
            runtime.spawn(async move { connection.disconnect().await });
        }
    }
}

struct Supervisor {
    session: Arc<dyn SessionProvider>,
    store: Arc<StateStore>,
    connection: Arc<ConnectionManager>,
    subscriptions: Arc<SubscriptionManager>,
    loader: Option<Arc<dyn SnapshotLoader>>,
    resubscribe_on_reconnect: bool,
    /// Snapshot load started by the latest sign-in, if still running.
    initial_load: Option<JoinHandle<()>>,
}

impl Supervisor {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut sessions = self.session.changes();
        let mut states = self.connection.watch_state();

        let initial = sessions.borrow_and_update().authenticated;
        states.borrow_and_update();
        self.on_session(initial, false).await;
        let mut authenticated = initial;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                changed = sessions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let now = sessions.borrow_and_update().authenticated;
                    self.on_session(now, authenticated).await;
                    authenticated = now;
                }
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *states.borrow_and_update();
                    if state.is_open() && self.resubscribe_on_reconnect {
                        self.subscriptions.resubscribe_all().await;
                    }
                }
            }
        }
        self.cancel_initial_load();
        tracing::debug!("Sync supervisor stopped");
    }

    async fn on_session(&mut self, authenticated: bool, was_authenticated: bool) {
        if !authenticated {
            self.cancel_initial_load();
            self.connection.disconnect().await;
            return;
        }

        match self.connection.connect().await {
            Ok(id) => tracing::debug!(connection_id = %id, "Session authenticated; connecting"),
            Err(ConnectError::AlreadyActive) => {}
            Err(e) => tracing::warn!(error = %e, "Cannot connect"),
        }

        if !was_authenticated {
            if let Some(loader) = self.loader.clone() {
                self.cancel_initial_load();
                let session = Arc::clone(&self.session);
                let store = Arc::clone(&self.store);
                self.initial_load = Some(tokio::spawn(async move {
                    if let Err(e) = load_snapshot(loader.as_ref(), session.as_ref(), &store).await {
                        tracing::warn!(error = %e, "Initial snapshot load failed");
                    }
                }));
            }
        }
    }

    /// Stops an in-flight snapshot load so it cannot seed a stale session.
    fn cancel_initial_load(&mut self) {
        if let Some(load) = self.initial_load.take() {
            if !load.is_finished() {
                load.abort();
                tracing::debug!("Initial snapshot load cancelled");
            }
        }
    }
}

async fn load_snapshot(
    loader: &dyn SnapshotLoader,
    session: &dyn SessionProvider,
    store: &StateStore,
) -> Result<(), LoaderError> {
    let state = session.current();
    let token = state.usable_token().ok_or(LoaderError::Unauthorized)?;

    let (nodes, alerts) = tokio::join!(loader.load_nodes(token), loader.load_alert_counts(token));

    let mut first_error = None;
    match nodes {
        Ok(nodes) => store.seed_entities(nodes),
        Err(e) => first_error = Some(e),
    }
    match alerts {
        Ok(alerts) => store.set_alerts(alerts),
        Err(e) => {
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;

    use crate::adapters::session::InMemorySession;
    use crate::adapters::websocket::MockTransport;
    use crate::domain::monitoring::{AlertCounts, Node};

    struct StaticLoader {
        nodes: Result<Vec<Node>, LoaderError>,
        alerts: Result<AlertCounts, LoaderError>,
    }

    #[async_trait]
    impl SnapshotLoader for StaticLoader {
        async fn load_nodes(&self, _token: &SecretString) -> Result<Vec<Node>, LoaderError> {
            self.nodes.clone()
        }

        async fn load_alert_counts(&self, _token: &SecretString) -> Result<AlertCounts, LoaderError> {
            self.alerts.clone()
        }
    }

    /// Answers after `delay`, like a slow REST backend.
    struct SlowLoader {
        delay: Duration,
    }

    #[async_trait]
    impl SnapshotLoader for SlowLoader {
        async fn load_nodes(&self, _token: &SecretString) -> Result<Vec<Node>, LoaderError> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![Node::named("late")])
        }

        async fn load_alert_counts(&self, _token: &SecretString) -> Result<AlertCounts, LoaderError> {
            tokio::time::sleep(self.delay).await;
            Ok(AlertCounts {
                total: 9,
                ..Default::default()
            })
        }
    }

    fn token() -> SecretString {
        SecretString::new("secret".to_string())
    }

    fn service(transport: &MockTransport, session: &Arc<InMemorySession>) -> SyncService {
        SyncService::new(
            Arc::new(transport.clone()),
            session.clone(),
            &AppConfig::default(),
        )
        .unwrap()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn signed_out_session_stays_idle() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::new());
        let sync = service(&transport, &session);

        sync.start().await;
        settle().await;

        assert_eq!(sync.connection_state(), ConnectionState::Idle);
        assert!(!sync.connected());
        assert_eq!(transport.attempt_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn follows_the_session_signal() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::new());
        let sync = service(&transport, &session);
        sync.start().await;

        session.login(token());
        settle().await;
        assert!(sync.connected());

        session.logout();
        settle().await;
        assert_eq!(sync.connection_state(), ConnectionState::Idle);
        assert!(transport.last_peer().unwrap().is_closed_by_client());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.attempt_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn replays_subscriptions_after_reconnect() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::authenticated(token()));
        let sync = service(&transport, &session);

        assert_eq!(sync.subscribe("web-1").await, SendOutcome::NotOpen);
        sync.start().await;
        settle().await;

        let first = transport.peer(0).unwrap();
        assert_eq!(
            first.received(),
            vec![r#"{"Type":"subscribe_node","Data":"web-1"}"#.to_string()]
        );

        first.close().await;
        tokio::time::sleep(Duration::from_millis(3001)).await;

        let second = transport.peer(1).unwrap();
        assert_eq!(
            second.received(),
            vec![r#"{"Type":"subscribe_node","Data":"web-1"}"#.to_string()]
        );
        assert_eq!(sync.reconnect_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_replay_when_disabled() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::authenticated(token()));
        let mut config = AppConfig::default();
        config.connection.resubscribe_on_reconnect = false;
        let sync = SyncService::new(Arc::new(transport.clone()), session.clone(), &config).unwrap();

        sync.subscribe("web-1").await;
        sync.start().await;
        settle().await;

        assert!(transport.peer(0).unwrap().received().is_empty());
        assert_eq!(sync.subscriptions(), vec!["web-1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_leaves_idle_and_cancels_retry() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::authenticated(token()));
        let sync = service(&transport, &session);
        sync.start().await;
        settle().await;

        transport.last_peer().unwrap().close().await;
        settle().await;
        assert_eq!(sync.connection_state(), ConnectionState::Closed);

        sync.shutdown().await;
        assert_eq!(sync.connection_state(), ConnectionState::Idle);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.attempt_count(), 1);

        sync.shutdown().await;
        assert_eq!(sync.connection_state(), ConnectionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn frames_flow_into_the_read_model() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::authenticated(token()));
        let sync = service(&transport, &session);
        let mut snapshots = sync.watch_snapshot();
        sync.start().await;
        settle().await;

        transport
            .last_peer()
            .unwrap()
            .push(json!({"Type": "system_stats", "Data": {"running_processes": 12}}).to_string())
            .await;
        snapshots.changed().await.unwrap();

        assert_eq!(sync.snapshot().stats().unwrap().running_processes, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn sign_in_seeds_snapshot_from_loader() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::new());
        let loader = StaticLoader {
            nodes: Ok(vec![Node::named("web-1")]),
            alerts: Ok(AlertCounts {
                total: 2,
                ..Default::default()
            }),
        };
        let sync = service(&transport, &session).with_loader(Arc::new(loader));
        sync.start().await;

        session.login(token());
        settle().await;

        let snapshot = sync.snapshot();
        assert_eq!(snapshot.entities()[0].name(), Some("web-1"));
        assert_eq!(snapshot.alerts().unwrap().total, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sign_out_cancels_pending_snapshot_load() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::new());
        let loader = SlowLoader {
            delay: Duration::from_secs(5),
        };
        let sync = service(&transport, &session).with_loader(Arc::new(loader));
        sync.start().await;

        session.login(token());
        settle().await;
        session.logout();
        settle().await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = sync.snapshot();
        assert!(snapshot.entities().is_empty());
        assert!(snapshot.alerts().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_snapshot_load() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::authenticated(token()));
        let loader = SlowLoader {
            delay: Duration::from_secs(5),
        };
        let sync = service(&transport, &session).with_loader(Arc::new(loader));
        sync.start().await;
        settle().await;

        sync.shutdown().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        let snapshot = sync.snapshot();
        assert!(snapshot.entities().is_empty());
        assert!(snapshot.alerts().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_load_still_seeds_a_live_session() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::authenticated(token()));
        let loader = SlowLoader {
            delay: Duration::from_secs(5),
        };
        let sync = service(&transport, &session).with_loader(Arc::new(loader));
        sync.start().await;

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(sync.snapshot().entities()[0].name(), Some("late"));
        assert_eq!(sync.snapshot().alerts().unwrap().total, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn load_initial_applies_what_succeeded() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::authenticated(token()));
        let loader = StaticLoader {
            nodes: Err(LoaderError::Status(500)),
            alerts: Ok(AlertCounts {
                total: 5,
                ..Default::default()
            }),
        };
        let sync = service(&transport, &session).with_loader(Arc::new(loader));

        assert_eq!(sync.load_initial().await, Err(LoaderError::Status(500)));
        assert!(sync.snapshot().entities().is_empty());
        assert_eq!(sync.snapshot().alerts().unwrap().total, 5);
    }

    #[tokio::test]
    async fn load_initial_requires_a_token() {
        let transport = MockTransport::new();
        let session = Arc::new(InMemorySession::new());
        let loader = StaticLoader {
            nodes: Ok(vec![]),
            alerts: Ok(AlertCounts::default()),
        };
        let sync = service(&transport, &session).with_loader(Arc::new(loader));

        assert_eq!(sync.load_initial().await, Err(LoaderError::Unauthorized));
    }

    #[test]
    fn invalid_base_url_is_rejected_at_construction() {
        let mut config = AppConfig::default();
        config.server.base_url = "not a url".to_string();
        let result = SyncService::new(
            Arc::new(MockTransport::new()),
            Arc::new(InMemorySession::new()),
            &config,
        );
        assert!(result.is_err());
    }
}
