//! Set of (type, field) keys a consumer wants analyzed
//!
//! The set holds membership only. Statistics for its keys come from an
//! `AnalysisCache`; listeners use the notifications to refresh their views.

use crate::listeners::Listeners;
use crate::models::{DataKey, DataType};
use crate::observability::AnalysisMetrics;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Receives membership changes from a [`TrackedFieldSet`]
pub trait FieldSetListener: Send + Sync {
    /// Every field of `data_type` was newly added in one call
    fn type_added(&self, _data_type: &DataType) {}

    /// A single field was newly added
    fn field_added(&self, _key: &DataKey) {}

    fn field_removed(&self, _key: &DataKey) {}

    fn cleared(&self) {}
}

/// Ordered set of tracked keys with change notification
#[derive(Default)]
pub struct TrackedFieldSet {
    keys: BTreeSet<DataKey>,
    listeners: Listeners<dyn FieldSetListener>,
    metrics: AnalysisMetrics,
}

impl TrackedFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the listener list
    pub fn listeners(&self) -> Listeners<dyn FieldSetListener> {
        self.listeners.clone()
    }

    pub fn add_listener(&self, listener: Arc<dyn FieldSetListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn FieldSetListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Track every field of `data_type`
    ///
    /// Fires one `type_added` when none of the fields was tracked before,
    /// otherwise one `field_added` per newly tracked field. A type without
    /// fields changes nothing and fires nothing.
    pub fn add_type(&mut self, data_type: &DataType) {
        // Metadata may repeat a field name
        let distinct: BTreeSet<DataKey> = data_type.keys().collect();
        let added: Vec<DataKey> = distinct
            .iter()
            .filter(|key| self.keys.insert((*key).clone()))
            .cloned()
            .collect();

        if added.is_empty() {
            return;
        }

        debug!(
            type_id = %data_type.id,
            added = added.len(),
            total = distinct.len(),
            "Tracking type"
        );
        self.update_gauge();

        if added.len() == distinct.len() {
            self.listeners.notify(|l| l.type_added(data_type));
        } else {
            for key in &added {
                self.listeners.notify(|l| l.field_added(key));
            }
        }
    }

    /// Track one field. Returns whether it was newly added.
    pub fn add_field(&mut self, key: DataKey) -> bool {
        if !self.keys.insert(key.clone()) {
            return false;
        }

        self.update_gauge();
        self.listeners.notify(|l| l.field_added(&key));
        true
    }

    /// Stop tracking one field. Returns whether it was tracked.
    pub fn remove_field(&mut self, key: &DataKey) -> bool {
        if !self.keys.remove(key) {
            return false;
        }

        self.update_gauge();
        self.listeners.notify(|l| l.field_removed(key));
        true
    }

    /// Stop tracking everything; always notifies
    pub fn clear(&mut self) {
        self.keys.clear();
        self.update_gauge();
        self.listeners.notify(|l| l.cleared());
    }

    pub fn contains(&self, key: &DataKey) -> bool {
        self.keys.contains(key)
    }

    /// Tracked keys ordered by type, then field
    pub fn keys(&self) -> impl Iterator<Item = &DataKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn update_gauge(&self) {
        self.metrics.set_tracked_fields(self.keys.len() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        TypeAdded(String),
        FieldAdded(String),
        FieldRemoved(String),
        Cleared,
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl FieldSetListener for Recorder {
        fn type_added(&self, data_type: &DataType) {
            self.events
                .lock()
                .unwrap()
                .push(Event::TypeAdded(data_type.id.clone()));
        }

        fn field_added(&self, key: &DataKey) {
            self.events
                .lock()
                .unwrap()
                .push(Event::FieldAdded(key.to_string()));
        }

        fn field_removed(&self, key: &DataKey) {
            self.events
                .lock()
                .unwrap()
                .push(Event::FieldRemoved(key.to_string()));
        }

        fn cleared(&self) {
            self.events.lock().unwrap().push(Event::Cleared);
        }
    }

    fn cpu_type() -> DataType {
        DataType::new(
            "CPU_ALL",
            "CPU Total",
            vec!["User%".to_string(), "Sys%".to_string(), "Wait%".to_string()],
        )
    }

    fn setup() -> (TrackedFieldSet, Arc<Recorder>) {
        let set = TrackedFieldSet::new();
        let recorder = Arc::new(Recorder::default());
        set.add_listener(recorder.clone());
        (set, recorder)
    }

    #[test]
    fn test_add_type_fires_single_type_event() {
        let (mut set, recorder) = setup();
        set.add_type(&cpu_type());

        assert_eq!(set.len(), 3);
        assert_eq!(recorder.take(), vec![Event::TypeAdded("CPU_ALL".to_string())]);
    }

    #[test]
    fn test_add_type_with_existing_field_fires_field_events() {
        let (mut set, recorder) = setup();
        set.add_field(DataKey::new("CPU_ALL", "Sys%").unwrap());
        recorder.take();

        set.add_type(&cpu_type());

        assert_eq!(set.len(), 3);
        assert_eq!(
            recorder.take(),
            vec![
                Event::FieldAdded("CPU_ALL/User%".to_string()),
                Event::FieldAdded("CPU_ALL/Wait%".to_string()),
            ]
        );
    }

    #[test]
    fn test_add_type_with_repeated_field_fires_type_event() {
        let (mut set, recorder) = setup();
        let data_type = DataType::new(
            "CPU_ALL",
            "CPU Total",
            vec!["User%".to_string(), "User%".to_string()],
        );

        set.add_type(&data_type);

        assert_eq!(set.len(), 1);
        assert_eq!(recorder.take(), vec![Event::TypeAdded("CPU_ALL".to_string())]);
    }

    #[test]
    fn test_add_type_twice_is_silent() {
        let (mut set, recorder) = setup();
        set.add_type(&cpu_type());
        recorder.take();

        set.add_type(&cpu_type());
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_add_field_duplicate() {
        let (mut set, recorder) = setup();
        let key = DataKey::new("MEM", "active").unwrap();

        assert!(set.add_field(key.clone()));
        assert!(!set.add_field(key.clone()));
        assert!(set.contains(&key));
        assert_eq!(recorder.take(), vec![Event::FieldAdded("MEM/active".to_string())]);
    }

    #[test]
    fn test_remove_field_only_fires_when_present() {
        let (mut set, recorder) = setup();
        let key = DataKey::new("MEM", "active").unwrap();
        set.add_field(key.clone());
        recorder.take();

        assert!(set.remove_field(&key));
        assert!(!set.remove_field(&key));
        assert_eq!(
            recorder.take(),
            vec![Event::FieldRemoved("MEM/active".to_string())]
        );
    }

    #[test]
    fn test_clear_always_fires() {
        let (mut set, recorder) = setup();
        set.clear();
        set.add_type(&cpu_type());
        set.clear();

        assert!(set.is_empty());
        assert_eq!(
            recorder.take(),
            vec![
                Event::Cleared,
                Event::TypeAdded("CPU_ALL".to_string()),
                Event::Cleared,
            ]
        );
    }

    #[test]
    fn test_keys_are_ordered() {
        let (mut set, _) = setup();
        set.add_field(DataKey::new("MEM", "active").unwrap());
        set.add_type(&cpu_type());

        let keys: Vec<String> = set.keys().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec!["CPU_ALL/Sys%", "CPU_ALL/User%", "CPU_ALL/Wait%", "MEM/active"]
        );
    }

    #[test]
    fn test_removed_listener_not_notified() {
        let (mut set, recorder) = setup();
        let handle: Arc<dyn FieldSetListener> = recorder.clone();
        assert!(set.remove_listener(&handle));

        set.add_type(&cpu_type());
        assert!(recorder.take().is_empty());
    }
}
