//! StateStore - applies decoded frames to the shared snapshot.
//!
//! The snapshot lives behind a `watch` channel as an `Arc<Snapshot>`.
//! Each frame's effect is applied in one `send_modify` call with
//! copy-on-write (`Arc::make_mut`), so a reader holding an `Arc` from
//! before the frame never sees a partial update.

use std::sync::Arc;

use tokio::sync::watch;

use crate::adapters::websocket::FrameCodec;
use crate::domain::foundation::Timestamp;
use crate::domain::frames::InboundFrame;
use crate::domain::monitoring::{AlertCounts, NewEvent, Node, Snapshot};

/// Owner of the reconciled snapshot.
#[derive(Debug)]
pub struct StateStore {
    snapshot: watch::Sender<Arc<Snapshot>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::from_snapshot(Snapshot::default())
    }
}

impl StateStore {
    /// Creates an empty store whose event log holds `event_log_capacity` entries.
    pub fn new(event_log_capacity: usize) -> Self {
        Self::from_snapshot(Snapshot::with_capacity(event_log_capacity))
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        let (tx, _) = watch::channel(Arc::new(snapshot));
        Self { snapshot: tx }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.subscribe()
    }

    /// Decodes one raw inbound frame and applies it.
    ///
    /// Malformed frames are logged and dropped. Returns whether the
    /// snapshot changed.
    pub fn apply_text(&self, raw: &str) -> bool {
        match FrameCodec::decode(raw) {
            Ok(frame) => self.apply(frame),
            Err(e) => {
                tracing::warn!(error = %e, len = raw.len(), "Dropping undecodable frame");
                false
            }
        }
    }

    /// Applies one decoded frame. Returns whether the snapshot changed.
    pub fn apply(&self, frame: InboundFrame) -> bool {
        let kind = frame.kind().to_string();
        match frame {
            InboundFrame::NodesUpdate(nodes) => {
                tracing::trace!(kind = %kind, count = nodes.len(), "Applying frame");
                self.mutate(|s| s.replace_entities(nodes));
            }
            InboundFrame::ProcessUpdate(update) => {
                tracing::trace!(kind = %kind, node = %update.node_name, "Applying frame");
                self.mutate(|s| s.upsert_detail(update));
            }
            InboundFrame::ProcessStatusChange(change) => {
                let event = NewEvent::from_status_change(change, Timestamp::now());
                self.mutate(|s| {
                    let id = s.append_event(event);
                    tracing::trace!(kind = %kind, event_id = %id, "Applying frame");
                });
            }
            InboundFrame::SystemStats(stats) => {
                tracing::trace!(kind = %kind, "Applying frame");
                self.mutate(|s| s.replace_stats(stats));
            }
            InboundFrame::ActivityLog(fields) => {
                let event = NewEvent::from_activity(fields, Timestamp::now());
                self.mutate(|s| {
                    let id = s.append_event(event);
                    tracing::trace!(kind = %kind, event_id = %id, "Applying frame");
                });
            }
            InboundFrame::Unknown { kind } => {
                tracing::debug!(kind = %kind, "Ignoring frame of unknown kind");
                return false;
            }
        }
        true
    }

    /// Replaces the entity list from an out-of-band load.
    pub fn seed_entities(&self, nodes: Vec<Node>) {
        self.mutate(|s| s.replace_entities(nodes));
    }

    /// Replaces the alert counts from an out-of-band load.
    pub fn set_alerts(&self, alerts: AlertCounts) {
        self.mutate(|s| s.replace_alerts(alerts));
    }

    fn mutate(&self, f: impl FnOnce(&mut Snapshot)) {
        self.snapshot.send_modify(|current| f(Arc::make_mut(current)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::monitoring::EventKind;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn frame(kind: &str, data: serde_json::Value) -> String {
        json!({ "Type": kind, "Data": data }).to_string()
    }

    #[test]
    fn system_stats_frame_sets_running_processes() {
        let store = StateStore::default();
        assert!(store.apply_text(r#"{"Type":"system_stats","Data":{"running_processes":12}}"#));
        assert_eq!(store.snapshot().stats().unwrap().running_processes, 12);
    }

    #[test]
    fn nodes_update_replaces_entities() {
        let store = StateStore::default();
        store.apply_text(&frame("nodes_update", json!([{"name": "a"}, {"name": "b"}])));
        store.apply_text(&frame("nodes_update", json!([{"name": "c"}])));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.entities().len(), 1);
        assert_eq!(snapshot.entities()[0].name(), Some("c"));
    }

    #[test]
    fn process_update_touches_only_its_node() {
        let store = StateStore::default();
        store.apply_text(&frame(
            "process_update",
            json!({"nodeName": "web-1", "processes": [{"name": "nginx"}]}),
        ));
        let before = store.snapshot().detail("web-1").unwrap().to_vec();

        store.apply_text(&frame(
            "process_update",
            json!({"nodeName": "db-1", "processes": [{"name": "postgres"}]}),
        ));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.detail("web-1").unwrap(), before.as_slice());
        assert_eq!(snapshot.detail("db-1").unwrap()[0].name(), Some("postgres"));
    }

    #[test]
    fn status_change_prepends_event() {
        let store = StateStore::default();
        store.apply_text(&frame(
            "process_status_change",
            json!({"NodeName": "web-1", "ProcessName": "nginx", "Status": "STOPPED"}),
        ));
        store.apply_text(&frame("activity_log", json!({"message": "deploy"})));

        let snapshot = store.snapshot();
        let log = snapshot.event_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, EventKind::ActivityLog);
        assert_eq!(log[1].kind, EventKind::ProcessStatusChange);
        assert_eq!(log[1].status.as_deref(), Some("STOPPED"));
        assert!(log[0].id > log[1].id);
    }

    #[test]
    fn one_hundred_and_one_activity_frames_evict_the_first() {
        let store = StateStore::default();
        for i in 0..101 {
            store.apply_text(&frame("activity_log", json!({ "message": format!("m{}", i) })));
        }

        let snapshot = store.snapshot();
        let log = snapshot.event_log();
        assert_eq!(log.len(), 100);
        assert_eq!(log.front().unwrap().message(), Some("m100"));
        assert_eq!(log.back().unwrap().message(), Some("m1"));
        assert!(log.iter().all(|e| e.message() != Some("m0")));
    }

    #[test]
    fn non_json_leaves_snapshot_unchanged() {
        let store = StateStore::default();
        store.apply_text(&frame("system_stats", json!({"running_processes": 3})));
        let before = store.snapshot();

        assert!(!store.apply_text("this is not json"));

        let after = store.snapshot();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
    }

    #[test]
    fn unknown_kind_leaves_snapshot_unchanged() {
        let store = StateStore::default();
        let before = store.snapshot();
        assert!(!store.apply_text(&frame("heartbeat", json!({}))));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn readers_keep_their_view_across_mutation() {
        let store = StateStore::default();
        let held = store.snapshot();
        store.apply_text(&frame("nodes_update", json!([{"name": "a"}])));

        assert!(held.entities().is_empty());
        assert_eq!(store.snapshot().entities().len(), 1);
    }

    #[tokio::test]
    async fn subscribers_are_notified_per_frame() {
        let store = StateStore::default();
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.apply_text(&frame("system_stats", json!({"total_nodes": 2})));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().stats().unwrap().total_nodes, 2);

        store.apply_text("garbage");
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn seeding_replaces_entities_and_alerts() {
        let store = StateStore::new(10);
        store.seed_entities(vec![Node::named("web-1")]);
        store.set_alerts(AlertCounts {
            total: 3,
            ..Default::default()
        });

        let snapshot = store.snapshot();
        assert_eq!(snapshot.entities()[0].name(), Some("web-1"));
        assert_eq!(snapshot.alerts().unwrap().total, 3);
        assert_eq!(snapshot.event_log_capacity(), 10);
    }

    #[test]
    fn loosely_typed_payloads_are_applied() {
        let store = StateStore::default();
        store.apply_text(&frame("system_stats", json!({"running_processes": 12})));

        let cases = vec![
            ("system_stats", json!({"running_processes": 13, "total_nodes": null})),
            ("system_stats", json!({"RunningProcesses": 1, "running_processes": 14.0})),
            ("process_status_change", json!({"Status": 20, "NodeName": "a", "ProcessName": null})),
            ("process_status_change", json!({"status": "EXITED", "extra": [1, 2]})),
            ("nodes_update", json!([{"name": "a"}, {"name": 7}, {"Name": "b", "port": 1.5}])),
            ("process_update", json!({"NodeName": "a", "Processes": [{"name": 3}, "raw"]})),
            ("process_update", json!({"node_name": 9, "processes": null})),
            ("activity_log", json!({"message": null, "level": 2})),
        ];
        for (kind, data) in cases {
            assert!(store.apply_text(&frame(kind, data.clone())), "{} {}", kind, data);
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.stats().unwrap().running_processes, 14);
        assert_eq!(snapshot.entities().len(), 3);
        assert_eq!(snapshot.detail("a").unwrap().len(), 2);
        assert!(snapshot.detail("9").unwrap().is_empty());
        assert_eq!(snapshot.event_log().len(), 3);
        assert_eq!(snapshot.event_log()[2].status.as_deref(), Some("20"));
    }

    #[test]
    fn wrong_outer_shape_is_still_dropped() {
        let store = StateStore::default();
        let before = store.snapshot();

        assert!(!store.apply_text(&frame("nodes_update", json!({"name": "a"}))));
        assert!(!store.apply_text(&frame("process_update", json!({"processes": []}))));
        assert!(!store.apply_text(&frame("system_stats", json!([1, 2]))));
        assert!(!store.apply_text(&frame("activity_log", json!("text"))));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            // Quarters print and parse back exactly.
            (-4000i32..4000).prop_map(|n| Value::from(f64::from(n) / 4.0)),
            "[a-zA-Z0-9 _-]{0,8}".prop_map(Value::from),
        ]
    }

    fn any_json() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-zA-Z_]{1,8}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn object_with(
        key: &'static str,
        value: impl Strategy<Value = Value>,
    ) -> impl Strategy<Value = Value> {
        (
            value,
            prop::collection::btree_map("[a-z_]{1,8}", any_json(), 0..4),
        )
            .prop_map(move |(value, rest)| {
                // Case variants of `key` are aliases of the same field.
                let mut map: serde_json::Map<String, Value> = rest
                    .into_iter()
                    .filter(|(k, _)| !k.eq_ignore_ascii_case(key))
                    .collect();
                map.insert(key.to_string(), value);
                Value::Object(map)
            })
    }

    proptest! {
        #[test]
        fn any_nodes_array_becomes_the_entity_list(
            data in prop::collection::vec(prop_oneof![object_with("name", leaf()), any_json()], 0..6)
        ) {
            let data = Value::Array(data);
            let store = StateStore::default();

            prop_assert!(store.apply_text(&frame("nodes_update", data.clone())));
            let entities = serde_json::to_value(store.snapshot().entities()).unwrap();
            prop_assert_eq!(entities, data);
        }

        #[test]
        fn any_stats_object_replaces_stats(
            data in prop::collection::btree_map(
                prop_oneof![Just("running_processes".to_string()), Just("total_nodes".to_string()), "[a-z_]{1,8}"],
                leaf(),
                0..6,
            )
        ) {
            let data = Value::Object(data.into_iter().collect());
            let store = StateStore::default();

            prop_assert!(store.apply_text(&frame("system_stats", data)));
            prop_assert!(store.snapshot().stats().is_some());
        }

        #[test]
        fn any_named_process_update_is_upserted(
            name in "[a-z]{1,8}",
            processes in prop::collection::vec(any_json(), 0..5),
            extra in prop::collection::btree_map("[a-z]{1,8}", leaf(), 0..3),
        ) {
            let mut data: serde_json::Map<String, Value> = extra.into_iter().collect();
            data.insert("nodeName".to_string(), json!(name));
            data.insert("processes".to_string(), Value::Array(processes.clone()));
            let store = StateStore::default();

            prop_assert!(store.apply_text(&frame("process_update", Value::Object(data))));
            let snapshot = store.snapshot();
            let detail = serde_json::to_value(snapshot.detail(&name).unwrap()).unwrap();
            prop_assert_eq!(detail, Value::Array(processes));
        }

        #[test]
        fn any_status_change_object_appends_one_event(
            data in object_with("Status", leaf())
        ) {
            let store = StateStore::default();

            prop_assert!(store.apply_text(&frame("process_status_change", data)));
            prop_assert_eq!(store.snapshot().event_log().len(), 1);
        }
    }
}
