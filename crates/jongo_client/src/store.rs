//! Store: the cached collection and its reconciliation pass.

use crate::config::StoreConfig;
use crate::entity::{Entity, LifecycleState, Schema};
use crate::error::{ClientError, ClientResult};
use crate::proxy::Proxy;
use crate::query::{Direction, DynamicFinder, Sort};
use crate::value::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Counts of remote operations issued by one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Ghosts created.
    pub created: usize,
    /// Dirty entities updated.
    pub updated: usize,
    /// Dead entities deleted.
    pub deleted: usize,
    /// Clean entities left alone.
    pub skipped: usize,
}

impl SyncReport {
    /// Total remote operations issued.
    pub fn dispatched(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// An ordered local collection of entities bound to one [`Proxy`].
///
/// `add`, `update` and `remove` only change lifecycle states; [`Store::sync`]
/// pushes the changes and reloads. The store is single-writer: it is not
/// meant to be shared between threads while mutating.
#[derive(Debug)]
pub struct Store {
    proxy: Arc<Proxy>,
    config: StoreConfig,
    entities: Vec<Entity>,
    total_count: Option<u64>,
}

impl Store {
    /// Creates a store. Loads immediately when `auto_load` is set.
    pub fn new(proxy: Arc<Proxy>, config: StoreConfig) -> ClientResult<Self> {
        let mut store = Self {
            proxy,
            config,
            entities: Vec::new(),
            total_count: None,
        };
        if store.config.auto_load {
            store.load()?;
        }
        Ok(store)
    }

    /// The bound proxy.
    pub fn proxy(&self) -> &Arc<Proxy> {
        &self.proxy
    }

    /// Schema of the cached entities.
    pub fn schema(&self) -> &Schema {
        self.proxy.schema()
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Cached entities in order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of cached entities.
    pub fn count(&self) -> usize {
        self.entities.len()
    }

    /// Row count reported by the server on the last load.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Entity at `index`.
    pub fn get_at(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    /// Entity with the given identity. The last match wins.
    pub fn get_by_id(&self, identity: &Value) -> Option<&Entity> {
        self.entities
            .iter()
            .rev()
            .find(|entity| entity.identity() == Some(identity))
    }

    /// First entity whose `field` equals `value`.
    pub fn find_by(&self, field: &str, value: &Value) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|entity| entity.lookup(field).as_ref() == Some(value))
    }

    /// Every entity whose `field` equals `value`.
    pub fn find_all_by(&self, field: &str, value: &Value) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|entity| entity.lookup(field).as_ref() == Some(value))
            .collect()
    }

    /// Cached entities matching `predicate`. Never contacts the server.
    pub fn filter<P>(&self, mut predicate: P) -> Vec<&Entity>
    where
        P: FnMut(&Entity) -> bool,
    {
        self.entities.iter().filter(|e| predicate(*e)).collect()
    }

    /// Replaces the collection with the current page from the server.
    pub fn load(&mut self) -> ClientResult<()> {
        self.load_with(None)
    }

    /// Replaces the collection with the result of `finder`, or with the
    /// current page when no finder is given.
    pub fn load_with(&mut self, finder: Option<&DynamicFinder>) -> ClientResult<()> {
        let listing = self.proxy.read_all(finder)?;
        let mut entities = listing.entities;
        for entity in &mut entities {
            entity.bind(Arc::clone(&self.proxy));
        }
        debug!(
            table = %self.proxy.endpoint().table,
            loaded = entities.len(),
            "store loaded"
        );
        self.entities = entities;
        self.total_count = listing.count;
        Ok(())
    }

    /// Marks `entity` for creation and appends it.
    pub fn add(&mut self, mut entity: Entity) -> ClientResult<()> {
        entity.mark_for_create();
        entity.bind(Arc::clone(&self.proxy));
        self.entities.push(entity);
        self.after_mutation()
    }

    /// Marks the cached copy of `entity` modified and replaces it with
    /// `entity`.
    pub fn update(&mut self, mut entity: Entity) -> ClientResult<()> {
        let index = self.position(&entity)?;
        entity.mark_modified();
        entity.bind(Arc::clone(&self.proxy));
        self.entities[index] = entity;
        self.after_mutation()
    }

    /// Marks the cached copy of `entity` for deletion. The entity stays in
    /// the collection until the next sync; a pending create or update
    /// outranks the deletion.
    pub fn remove(&mut self, entity: &Entity) -> ClientResult<()> {
        let index = self.position(entity)?;
        self.entities[index].mark_for_delete();
        self.after_mutation()
    }

    fn position(&self, entity: &Entity) -> ClientResult<usize> {
        self.entities
            .iter()
            .position(|cached| cached.key() == entity.key())
            .ok_or(ClientError::EntityNotInCollection)
    }

    fn after_mutation(&mut self) -> ClientResult<()> {
        if self.config.auto_sync {
            self.sync()?;
        }
        Ok(())
    }

    /// Pushes every pending entity to the server, then reloads.
    ///
    /// Entities are dispatched in stored order: ghosts are created, dirty
    /// entities updated, dead entities deleted and clean ones skipped. The
    /// first failure aborts the pass; operations already sent are not
    /// undone and the reload is skipped.
    pub fn sync(&mut self) -> ClientResult<SyncReport> {
        let mut report = SyncReport::default();

        for entity in &self.entities {
            match entity.state() {
                LifecycleState::Ghost => {
                    self.proxy.create(entity)?;
                    report.created += 1;
                }
                LifecycleState::Dirty => {
                    self.proxy.update(entity)?;
                    report.updated += 1;
                }
                LifecycleState::Dead => {
                    self.proxy.delete(entity)?;
                    report.deleted += 1;
                }
                LifecycleState::Clean => report.skipped += 1,
            }
        }

        info!(
            table = %self.proxy.endpoint().table,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            "sync dispatched"
        );

        self.load()?;
        Ok(report)
    }

    /// Current page index.
    pub fn page(&self) -> i64 {
        self.proxy.page().index()
    }

    /// Moves to page `index`, reloading when `auto_load` is set.
    pub fn set_page(&mut self, index: i64) -> ClientResult<i64> {
        self.proxy.set_page(self.proxy.page().at(index));
        if self.config.auto_load {
            self.load()?;
        }
        Ok(self.page())
    }

    /// Moves to the next page.
    pub fn next_page(&mut self) -> ClientResult<i64> {
        let index = self.page().saturating_add(1);
        self.set_page(index)
    }

    /// Moves to the previous page.
    ///
    /// Decrements whenever the index is not negative, so page 0 moves to
    /// page -1.
    pub fn prev_page(&mut self) -> ClientResult<i64> {
        let mut index = self.page();
        if index >= 0 {
            index -= 1;
        }
        self.set_page(index)
    }

    /// Orders subsequent loads by `column`.
    pub fn sort(&mut self, column: impl Into<String>, direction: Direction) -> ClientResult<()> {
        self.proxy.set_sort(Some(Sort::new(column, direction)));
        if self.config.auto_load {
            self.load()?;
        }
        Ok(())
    }

    /// Drops the ordering of subsequent loads.
    pub fn unsort(&mut self) -> ClientResult<()> {
        self.proxy.set_sort(None);
        if self.config.auto_load {
            self.load()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoint;
    use crate::entity::Record;
    use crate::transport::{Method, MockTransport, Response};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn users() -> Vec<Record> {
        vec![
            record(json!({"id": 1, "name": "foo", "age": 30})),
            record(json!({"id": 2, "name": "bar", "age": 33})),
        ]
    }

    fn store(config: StoreConfig) -> (Arc<MockTransport>, Store) {
        let transport = Arc::new(MockTransport::new());
        let proxy = Proxy::new(
            Endpoint::new("localhost:8080", "demo", "user"),
            Schema::new("user").fields(["name", "age"]),
            transport.clone(),
        );
        let store = Store::new(Arc::new(proxy), config).unwrap();
        (transport, store)
    }

    fn loaded_store() -> (Arc<MockTransport>, Store) {
        let (transport, mut store) = store(StoreConfig::default());
        transport.push_response(Response::success(200, users()));
        store.load().unwrap();
        (transport, store)
    }

    #[test]
    fn load_binds_clean_entities() {
        let (_, store) = loaded_store();
        assert_eq!(store.count(), 2);
        assert_eq!(store.total_count(), Some(2));
        for entity in store.entities() {
            assert!(entity.is_clean());
            assert!(entity.identity().is_some());
            assert!(entity.proxy().is_some());
        }
    }

    #[test]
    fn auto_load_on_creation() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(Response::success(200, users()));
        let proxy = Proxy::new(
            Endpoint::new("h", "demo", "user"),
            Schema::new("user").fields(["name", "age"]),
            transport.clone(),
        );
        let store = Store::new(Arc::new(proxy), StoreConfig::new().auto_load(true)).unwrap();
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn add_marks_ghost_without_remote_call() {
        let (transport, mut store) = loaded_store();
        let mut user = store.schema().instance();
        user.set("name", "kkk").unwrap();
        store.add(user).unwrap();

        assert_eq!(store.count(), 3);
        let added = store.get_at(2).unwrap();
        assert!(added.is_ghost());
        assert!(!added.is_dirty());
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn update_requires_membership() {
        let (_, mut store) = loaded_store();
        let stranger = Entity::with_identity("id", 1).with_attribute("name", "foo");
        assert!(matches!(
            store.update(stranger.clone()),
            Err(ClientError::EntityNotInCollection)
        ));
        assert!(matches!(
            store.remove(&stranger),
            Err(ClientError::EntityNotInCollection)
        ));
    }

    #[test]
    fn update_replaces_cached_copy() {
        let (_, mut store) = loaded_store();
        let mut user = store.get_at(1).cloned().unwrap();
        user.set("dirty", false).unwrap();
        assert!(user.is_clean());
        store.update(user).unwrap();
        assert!(store.get_at(1).unwrap().is_dirty());
    }

    #[test]
    fn remove_keeps_entity_until_sync() {
        let (_, mut store) = loaded_store();
        let user = store.get_at(0).cloned().unwrap();
        store.remove(&user).unwrap();
        assert_eq!(store.count(), 2);
        assert!(store.get_at(0).unwrap().is_dead());
    }

    #[test]
    fn edited_then_removed_entity_is_updated() {
        let (transport, mut store) = loaded_store();
        let mut user = store.get_at(0).cloned().unwrap();
        user.set("age", 77).unwrap();
        store.update(user.clone()).unwrap();
        store.remove(&user).unwrap();
        assert!(store.get_at(0).unwrap().is_dirty());

        transport.push_response(Response::success(200, vec![]));
        transport.push_response(Response::success(200, users()));
        let report = store.sync().unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.deleted, 0);

        let methods: Vec<Method> = transport.requests().iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![Method::Get, Method::Put, Method::Get]);
    }

    #[test]
    fn sync_dispatches_by_state_then_reloads() {
        let (transport, mut store) = loaded_store();

        let mut edited = store.get_at(0).cloned().unwrap();
        edited.set("name", "ttt").unwrap();
        store.update(edited).unwrap();
        let doomed = store.get_at(1).cloned().unwrap();
        store.remove(&doomed).unwrap();
        store.add(store.schema().instance()).unwrap();

        transport.push_response(Response::success(200, vec![]));
        transport.push_response(Response::success(200, vec![]));
        transport.push_response(Response::success(201, vec![]));
        transport.push_response(Response::success(200, users()));

        let report = store.sync().unwrap();
        assert_eq!(
            report,
            SyncReport {
                created: 1,
                updated: 1,
                deleted: 1,
                skipped: 0
            }
        );

        let methods: Vec<Method> = transport.requests().iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            vec![Method::Get, Method::Put, Method::Delete, Method::Post, Method::Get]
        );
        assert!(store.entities().iter().all(Entity::is_clean));
    }

    #[test]
    fn sync_aborts_on_first_failure() {
        let (transport, mut store) = loaded_store();
        for index in 0..2 {
            let mut user = store.get_at(index).cloned().unwrap();
            user.set("age", 40).unwrap();
            store.update(user).unwrap();
        }

        transport.push_response(Response::failure(500, "database is down"));

        let err = store.sync().unwrap_err();
        assert_eq!(err.status(), Some(500));
        // initial load + the single failed update; no second update, no reload
        assert_eq!(transport.requests().len(), 2);
        assert!(store.entities().iter().all(Entity::is_dirty));
    }

    #[test]
    fn auto_sync_after_add() {
        let (transport, mut store) = store(StoreConfig::new().auto_sync(true));
        transport.push_response(Response::success(201, vec![]));
        transport.push_response(Response::success(200, users()));

        store.add(store.schema().instance()).unwrap();
        assert_eq!(store.count(), 2);
        assert_eq!(transport.requests()[0].method, Method::Post);
    }

    #[test]
    fn paging_without_auto_load() {
        let (transport, mut store) = store(StoreConfig::default());
        assert_eq!(store.page(), 0);
        assert_eq!(store.set_page(5).unwrap(), 5);
        assert_eq!(store.next_page().unwrap(), 6);
        assert_eq!(store.prev_page().unwrap(), 5);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn next_page_saturates() {
        let (_, mut store) = store(StoreConfig::default());
        store.set_page(i64::MAX).unwrap();
        assert_eq!(store.next_page().unwrap(), i64::MAX);
        assert_eq!(
            store.proxy().list_path(None),
            format!("/demo/user?limit=25&offset={}", i64::MAX)
        );
    }

    #[test]
    fn prev_page_goes_below_zero() {
        let (_, mut store) = store(StoreConfig::default());
        assert_eq!(store.prev_page().unwrap(), -1);
        assert_eq!(store.prev_page().unwrap(), -1);
        assert_eq!(store.proxy().list_path(None), "/demo/user?limit=25&offset=-25");
    }

    #[test]
    fn sort_without_auto_load_stays_local() {
        let (transport, mut store) = store(StoreConfig::default());
        store.sort("age", Direction::Desc).unwrap();
        assert!(transport.requests().is_empty());
        assert_eq!(
            store.proxy().list_path(None),
            "/demo/user?limit=25&offset=0&sort=age&dir=DESC"
        );
    }

    #[test]
    fn sort_with_auto_load_reloads() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(Response::success(200, users()));
        let proxy = Proxy::new(
            Endpoint::new("h", "demo", "user"),
            Schema::new("user").fields(["name", "age"]),
            transport.clone(),
        );
        let mut store = Store::new(Arc::new(proxy), StoreConfig::new().auto_load(true)).unwrap();

        transport.push_response(Response::success(200, users()));
        store.sort("age", Direction::Desc).unwrap();
        assert_eq!(
            transport.last_request().unwrap().path,
            "/demo/user?limit=25&offset=0&sort=age&dir=DESC"
        );

        transport.push_response(Response::success(200, users()));
        store.unsort().unwrap();
        assert_eq!(
            transport.last_request().unwrap().path,
            "/demo/user?limit=25&offset=0"
        );
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn local_lookups() {
        let (transport, store) = loaded_store();
        assert_eq!(
            store.find_by("name", &Value::from("bar")).unwrap().identity(),
            Some(&Value::Int(2))
        );
        assert_eq!(store.find_all_by("age", &Value::Int(30)).len(), 1);
        assert!(store.find_by("name", &Value::from("nobody")).is_none());
        assert!(store.get_by_id(&Value::Int(1)).is_some());
        assert_eq!(
            store.find_by("id", &Value::Int(2)).unwrap().get("name"),
            Some(&Value::from("bar"))
        );

        let adults = store.filter(|e| e.get("age").and_then(Value::as_int).unwrap_or(0) > 31);
        assert_eq!(adults.len(), 1);
        assert_eq!(transport.requests().len(), 1);
    }
}
