//! Entities, their lifecycle and their wire mapping.

use crate::error::{ClientError, ClientResult};
use crate::proxy::Proxy;
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A row as it travels over the wire.
pub type Record = serde_json::Map<String, JsonValue>;

/// Lifecycle of an entity relative to the remote table.
///
/// Transition table (rows: current state, columns: event):
///
/// | state | `mark_for_create` | `mark_modified` | `mark_for_delete` |
/// |-------|-------------------|-----------------|-------------------|
/// | Ghost | Ghost             | Ghost           | Ghost             |
/// | Dirty | Ghost             | Dirty           | Dirty             |
/// | Dead  | Ghost             | Dirty           | Dead              |
/// | Clean | Ghost             | Dirty           | Dead              |
///
/// Pending states rank `Ghost > Dirty > Dead`; a mark only applies when it
/// outranks the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Created locally, never persisted.
    Ghost,
    /// Persisted, with unsynchronized local edits.
    Dirty,
    /// Marked for remote deletion.
    Dead,
    /// Matches the last known remote state.
    Clean,
}

impl LifecycleState {
    /// Returns true if a sync pass must send this entity.
    pub fn is_pending(&self) -> bool {
        !matches!(self, LifecycleState::Clean)
    }

    fn rank(self) -> u8 {
        match self {
            LifecycleState::Ghost => 3,
            LifecycleState::Dirty => 2,
            LifecycleState::Dead => 1,
            LifecycleState::Clean => 0,
        }
    }

    /// State after marking `self` with `mark`: the higher ranked one wins.
    pub fn promote(self, mark: LifecycleState) -> LifecycleState {
        if mark.rank() > self.rank() {
            mark
        } else {
            self
        }
    }
}

/// Field names reserved for entity bookkeeping.
///
/// Assigning one of these through [`Entity::set`] never marks the entity
/// modified, and none of them is ever projected to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookkeepingField {
    /// `proxy`: the bound proxy.
    Proxy,
    /// `id`: the identity.
    Identity,
    /// `idCol`: name of the identity column.
    IdentityField,
    /// `ghost` flag.
    Ghost,
    /// `dirty` flag.
    Dirty,
    /// `dead` flag.
    Dead,
}

impl BookkeepingField {
    /// Every bookkeeping field.
    pub const ALL: [BookkeepingField; 6] = [
        BookkeepingField::Proxy,
        BookkeepingField::Identity,
        BookkeepingField::IdentityField,
        BookkeepingField::Ghost,
        BookkeepingField::Dirty,
        BookkeepingField::Dead,
    ];

    /// Reserved name of the field.
    pub fn name(&self) -> &'static str {
        match self {
            BookkeepingField::Proxy => "proxy",
            BookkeepingField::Identity => "id",
            BookkeepingField::IdentityField => "idCol",
            BookkeepingField::Ghost => "ghost",
            BookkeepingField::Dirty => "dirty",
            BookkeepingField::Dead => "dead",
        }
    }

    /// Resolves a reserved field name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    fn flag_state(&self) -> Option<LifecycleState> {
        match self {
            BookkeepingField::Ghost => Some(LifecycleState::Ghost),
            BookkeepingField::Dirty => Some(LifecycleState::Dirty),
            BookkeepingField::Dead => Some(LifecycleState::Dead),
            _ => None,
        }
    }
}

/// Shape of one entity type: its identity column and declared fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    identity_field: String,
    fields: Vec<String>,
}

impl Schema {
    /// Creates a schema whose identity column is `id`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_field: BookkeepingField::Identity.name().to_string(),
            fields: Vec::new(),
        }
    }

    /// Sets the wire column carrying the identity.
    pub fn with_identity_field(mut self, field: impl Into<String>) -> Self {
        self.identity_field = field.into();
        self
    }

    /// Declares a domain field. Bookkeeping names are ignored.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if BookkeepingField::parse(&name).is_none() && !self.fields.contains(&name) {
            self.fields.push(name);
        }
        self
    }

    /// Declares several domain fields.
    pub fn fields<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |schema, name| schema.field(name))
    }

    /// Entity type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire column carrying the identity.
    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    /// Declared domain fields, in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    /// Creates a blank ghost with every declared field set to null.
    pub fn instance(&self) -> Entity {
        let mut entity = Entity::new(self.identity_field.clone());
        for field in &self.fields {
            entity.attributes.insert(field.clone(), Value::Null);
        }
        entity
    }

    /// Builds a clean entity from a server record.
    ///
    /// A schema without declared fields takes every column of the record
    /// except the identity column.
    pub fn from_record(&self, record: &Record) -> ClientResult<Entity> {
        let mut entity = self.instance();
        if self.fields.is_empty() {
            let columns = record.keys().filter(|column| {
                **column != self.identity_field && BookkeepingField::parse(column).is_none()
            });
            for column in columns {
                entity.attributes.insert(column.clone(), Value::Null);
            }
        }
        entity.absorb(record)?;
        entity.state = LifecycleState::Clean;
        Ok(entity)
    }
}

/// Local handle distinguishing entity instances inside a store.
///
/// Clones share the key; a reload hands out fresh keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey(Uuid);

impl EntityKey {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cached row with its identity and lifecycle state.
#[derive(Debug, Clone)]
pub struct Entity {
    key: EntityKey,
    identity: Option<Value>,
    identity_field: String,
    state: LifecycleState,
    attributes: BTreeMap<String, Value>,
    proxy: Option<Arc<Proxy>>,
}

impl Entity {
    /// Creates an empty ghost whose identity travels in `identity_field`.
    pub fn new(identity_field: impl Into<String>) -> Self {
        Self {
            key: EntityKey::generate(),
            identity: None,
            identity_field: identity_field.into(),
            state: LifecycleState::Ghost,
            attributes: BTreeMap::new(),
            proxy: None,
        }
    }

    /// Creates a clean entity that already exists remotely.
    pub fn with_identity(identity_field: impl Into<String>, identity: impl Into<Value>) -> Self {
        let identity: Value = identity.into();
        let mut entity = Self::new(identity_field);
        entity.identity = Some(identity).filter(|id| !id.is_null());
        if entity.identity.is_some() {
            entity.state = LifecycleState::Clean;
        }
        entity
    }

    /// Sets an attribute without touching the lifecycle state.
    #[must_use]
    pub fn with_attribute(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        if BookkeepingField::parse(&field).is_none() {
            self.attributes.insert(field, value.into());
        }
        self
    }

    /// Local handle of this instance.
    pub fn key(&self) -> EntityKey {
        self.key
    }

    /// Remote identity, if the entity exists remotely.
    pub fn identity(&self) -> Option<&Value> {
        self.identity.as_ref()
    }

    /// Wire column carrying the identity.
    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Returns true if the entity was never persisted.
    pub fn is_ghost(&self) -> bool {
        self.state == LifecycleState::Ghost
    }

    /// Returns true if the entity holds unsynchronized edits.
    pub fn is_dirty(&self) -> bool {
        self.state == LifecycleState::Dirty
    }

    /// Returns true if the entity is marked for deletion.
    pub fn is_dead(&self) -> bool {
        self.state == LifecycleState::Dead
    }

    /// Returns true if the entity matches the remote state.
    pub fn is_clean(&self) -> bool {
        self.state == LifecycleState::Clean
    }

    /// Domain attributes.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Returns a domain attribute.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Returns a field value, resolving `id` to the identity.
    pub fn lookup(&self, field: &str) -> Option<Value> {
        match BookkeepingField::parse(field) {
            Some(BookkeepingField::Identity) => self.identity.clone(),
            Some(BookkeepingField::IdentityField) => Some(Value::from(self.identity_field.as_str())),
            Some(flag) => flag.flag_state().map(|state| Value::Bool(self.state == state)),
            None => self.attributes.get(field).cloned(),
        }
    }

    /// Assigns a field.
    ///
    /// Domain fields mark the entity modified. Bookkeeping fields update the
    /// bookkeeping they name: `id` sets the identity, `idCol` the identity
    /// column, and the `ghost`/`dirty`/`dead` flags set or clear that state.
    /// `proxy` cannot be assigned a value.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> ClientResult<()> {
        let value = value.into();
        let Some(reserved) = BookkeepingField::parse(field) else {
            self.attributes.insert(field.to_string(), value);
            self.mark_modified();
            return Ok(());
        };

        match reserved {
            BookkeepingField::Proxy => Err(ClientError::UnassignableField {
                field: field.to_string(),
            }),
            BookkeepingField::Identity => {
                self.identity = Some(value).filter(|id| !id.is_null());
                Ok(())
            }
            BookkeepingField::IdentityField => match value {
                Value::Text(name) => {
                    self.identity_field = name;
                    Ok(())
                }
                _ => Err(ClientError::UnassignableField {
                    field: field.to_string(),
                }),
            },
            flag => {
                let Some(state) = flag.flag_state() else {
                    return Ok(());
                };
                match value {
                    Value::Bool(true) => self.state = self.state.promote(state),
                    Value::Bool(false) | Value::Null => {
                        if self.state == state {
                            self.state = LifecycleState::Clean;
                        }
                    }
                    _ => {
                        return Err(ClientError::UnassignableField {
                            field: field.to_string(),
                        })
                    }
                }
                Ok(())
            }
        }
    }

    /// Marks the entity for creation.
    pub fn mark_for_create(&mut self) {
        self.state = self.state.promote(LifecycleState::Ghost);
    }

    /// Marks the entity as locally modified. A ghost stays a ghost.
    pub fn mark_modified(&mut self) {
        self.state = self.state.promote(LifecycleState::Dirty);
    }

    /// Marks the entity for deletion. Ghosts and dirty entities keep their
    /// state.
    pub fn mark_for_delete(&mut self) {
        self.state = self.state.promote(LifecycleState::Dead);
    }

    /// Projects the domain attributes to a wire record.
    pub fn to_wire(&self) -> Record {
        self.attributes
            .iter()
            .filter(|(field, _)| BookkeepingField::parse(field).is_none())
            .map(|(field, value)| (field.clone(), value.to_json()))
            .collect()
    }

    /// Merges a wire record into this entity.
    ///
    /// The identity is read from the identity column; then every attribute
    /// already present that also appears in the record is overwritten.
    /// Attributes missing from the record are left untouched.
    pub fn absorb(&mut self, record: &Record) -> ClientResult<()> {
        let identity = record.get(&self.identity_field).ok_or_else(|| {
            ClientError::Codec(format!(
                "record is missing identity field {}",
                self.identity_field
            ))
        })?;
        self.identity = Some(Value::from(identity)).filter(|id| !id.is_null());

        for (field, value) in self.attributes.iter_mut() {
            if let Some(incoming) = record.get(field) {
                *value = Value::from(incoming);
            }
        }
        Ok(())
    }

    /// Binds the entity to a proxy for entity-level operations.
    pub fn bind(&mut self, proxy: Arc<Proxy>) {
        self.proxy = Some(proxy);
    }

    /// Proxy the entity is bound to.
    pub fn proxy(&self) -> Option<&Arc<Proxy>> {
        self.proxy.as_ref()
    }

    fn bound_proxy(&self) -> ClientResult<Arc<Proxy>> {
        self.proxy.clone().ok_or(ClientError::ProxyNotConfigured)
    }

    /// Reads a fresh copy of this entity from the server.
    pub fn fetch(&self) -> ClientResult<Entity> {
        let identity = self.identity.as_ref().ok_or(ClientError::MissingIdentity)?;
        let proxy = self.bound_proxy()?;
        let mut fresh = proxy.read(identity)?;
        fresh.bind(proxy);
        Ok(fresh)
    }

    /// Sends the pending change of this entity to the server.
    ///
    /// Ghosts are created, dirty entities updated and dead entities
    /// deleted; the entity is clean afterwards. A created ghost takes its
    /// identity from the row the server echoes back and stays a ghost when
    /// no row comes back. Committing a clean entity fails with
    /// [`ClientError::InvalidCommitState`].
    pub fn commit(&mut self) -> ClientResult<()> {
        let proxy = self.bound_proxy()?;
        match self.state {
            LifecycleState::Ghost => {
                let Some(stored) = proxy.create(self)? else {
                    return Ok(());
                };
                self.absorb(&stored)?;
                if self.identity.is_none() {
                    return Ok(());
                }
            }
            LifecycleState::Dirty => proxy.update(self)?,
            LifecycleState::Dead => proxy.delete(self)?,
            LifecycleState::Clean => {
                return Err(ClientError::InvalidCommitState { state: self.state })
            }
        }
        self.state = LifecycleState::Clean;
        Ok(())
    }

    /// Marks the entity dead and deletes it remotely.
    pub fn destroy(&mut self) -> ClientResult<()> {
        if self.identity.is_none() {
            return Err(ClientError::MissingIdentity);
        }
        self.bound_proxy()?;
        self.state = LifecycleState::Dead;
        self.commit()
    }
}

/// Two entities are equal when they describe the same row in the same
/// state; local keys and proxy bindings are ignored.
impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.identity_field == other.identity_field
            && self.state == other.state
            && self.attributes == other.attributes
    }
}

/// Serializes as a flat row: the identity column, then the domain
/// attributes.
impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_map(None)?;
        row.serialize_entry(&self.identity_field, &self.identity)?;
        for (field, value) in &self.attributes {
            if *field != self.identity_field {
                row.serialize_entry(field, value)?;
            }
        }
        row.end()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identity = self
            .identity
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "None".into());
        write!(
            f,
            "id:{} idCol:{} state:{:?}",
            identity, self.identity_field, self.state
        )?;
        for (field, value) in &self.attributes {
            write!(f, " {}:{}", field, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn car_schema() -> Schema {
        Schema::new("car")
            .with_identity_field("cid")
            .fields(["model", "maker", "fuel", "transmission", "year"])
    }

    fn record(value: JsonValue) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn fresh_entity_is_ghost() {
        let entity = car_schema().instance();
        assert!(entity.is_ghost());
        assert!(entity.identity().is_none());
        assert_eq!(entity.get("model"), Some(&Value::Null));
    }

    #[test]
    fn schema_ignores_bookkeeping_fields() {
        let schema = Schema::new("user").fields(["id", "name", "dirty", "age", "name"]);
        assert_eq!(schema.field_names(), &["name".to_string(), "age".to_string()]);
    }

    #[test]
    fn from_record_is_clean_with_identity() {
        let entity = car_schema()
            .from_record(&record(json!({"cid": 3, "model": "X5", "maker": "BMW", "year": 2011})))
            .unwrap();
        assert!(entity.is_clean());
        assert_eq!(entity.identity(), Some(&Value::Int(3)));
        assert_eq!(entity.get("model"), Some(&Value::from("X5")));
        assert_eq!(entity.get("fuel"), Some(&Value::Null));
    }

    #[test]
    fn schema_without_fields_takes_record_columns() {
        let schema = Schema::new("car").with_identity_field("cid");
        let entity = schema
            .from_record(&record(json!({"cid": 0, "model": "C2", "dirty": true, "year": 2008})))
            .unwrap();
        assert!(entity.is_clean());
        assert_eq!(entity.identity(), Some(&Value::Int(0)));
        assert_eq!(
            entity.to_wire(),
            record(json!({"model": "C2", "year": 2008}))
        );
    }

    #[test]
    fn absorb_is_sparse() {
        let mut entity = Entity::with_identity("id", 1)
            .with_attribute("name", "foo")
            .with_attribute("age", 30);
        entity
            .absorb(&record(json!({"id": 1, "age": 31, "unknown": true})))
            .unwrap();
        assert_eq!(entity.get("name"), Some(&Value::from("foo")));
        assert_eq!(entity.get("age"), Some(&Value::Int(31)));
        assert!(entity.get("unknown").is_none());
    }

    #[test]
    fn absorb_requires_identity_field() {
        let mut entity = car_schema().instance();
        let result = entity.absorb(&record(json!({"id": 1, "model": "C2"})));
        assert!(matches!(result, Err(ClientError::Codec(_))));
    }

    #[test]
    fn wire_projection_excludes_bookkeeping() {
        let mut entity = Entity::with_identity("id", 7).with_attribute("name", "kkk");
        entity.set("age", 16).unwrap();
        entity.set("dirty", true).unwrap();

        let wire = entity.to_wire();
        assert_eq!(wire.len(), 2);
        assert_eq!(wire["name"], json!("kkk"));
        assert_eq!(wire["age"], json!(16));
        assert!(!wire.contains_key("id"));
        assert!(!wire.contains_key("dirty"));
    }

    #[test]
    fn setting_domain_field_marks_dirty() {
        let mut entity = Entity::with_identity("id", 1).with_attribute("name", "kkk");
        assert!(entity.is_clean());
        entity.set("name", "ttt").unwrap();
        assert!(entity.is_dirty());
    }

    #[test]
    fn setting_bookkeeping_field_keeps_state() {
        let mut entity = Entity::with_identity("id", 1);
        entity.set("id", 2).unwrap();
        entity.set("idCol", "uid").unwrap();
        assert!(entity.is_clean());
        assert_eq!(entity.identity(), Some(&Value::Int(2)));
        assert_eq!(entity.identity_field(), "uid");
        assert!(matches!(
            entity.set("proxy", 1),
            Err(ClientError::UnassignableField { .. })
        ));
    }

    #[test]
    fn lifecycle_flags_through_set() {
        let mut entity = Entity::with_identity("id", 1);
        entity.set("dead", true).unwrap();
        assert!(entity.is_dead());
        entity.set("dead", false).unwrap();
        assert!(entity.is_clean());
        entity.set("ghost", false).unwrap();
        assert!(entity.is_clean());
        assert_eq!(entity.lookup("dirty"), Some(Value::Bool(false)));
    }

    #[test]
    fn ghost_absorbs_edits_and_deletes() {
        let mut entity = Entity::new("id");
        entity.set("name", "x").unwrap();
        assert!(entity.is_ghost());
        entity.mark_for_delete();
        assert!(entity.is_ghost());
    }

    #[test]
    fn transition_table() {
        let mut entity = Entity::with_identity("id", 1);
        entity.mark_for_delete();
        assert!(entity.is_dead());
        entity.mark_modified();
        assert!(entity.is_dirty());
        entity.mark_for_delete();
        assert!(entity.is_dirty());
        entity.mark_for_create();
        assert!(entity.is_ghost());
        assert!(LifecycleState::Ghost.is_pending());
        assert!(!LifecycleState::Clean.is_pending());
    }

    #[test]
    fn promote_follows_rank() {
        use LifecycleState::*;
        let table = [
            (Ghost, [Ghost, Ghost, Ghost]),
            (Dirty, [Ghost, Dirty, Dirty]),
            (Dead, [Ghost, Dirty, Dead]),
            (Clean, [Ghost, Dirty, Dead]),
        ];
        for (state, expected) in table {
            let marks = [Ghost, Dirty, Dead];
            for (mark, after) in marks.into_iter().zip(expected) {
                assert_eq!(state.promote(mark), after, "{:?} marked {:?}", state, mark);
            }
        }
    }

    #[test]
    fn flags_keep_pending_edits() {
        let mut entity = Entity::with_identity("id", 1).with_attribute("age", 30);
        entity.set("age", 31).unwrap();
        entity.set("dead", true).unwrap();
        assert!(entity.is_dirty());
        entity.set("ghost", true).unwrap();
        assert!(entity.is_ghost());
        entity.set("dirty", true).unwrap();
        assert!(entity.is_ghost());
    }

    #[test]
    fn lookup_resolves_identity() {
        let entity = Entity::with_identity("cid", 9).with_attribute("model", "C2");
        assert_eq!(entity.lookup("id"), Some(Value::Int(9)));
        assert_eq!(entity.lookup("idCol"), Some(Value::from("cid")));
        assert_eq!(entity.lookup("model"), Some(Value::from("C2")));
        assert_eq!(entity.lookup("year"), None);
    }

    #[test]
    fn entity_level_operations_need_identity_and_proxy() {
        let ghost = Entity::new("id");
        assert!(matches!(ghost.fetch(), Err(ClientError::MissingIdentity)));

        let clean = Entity::with_identity("id", 1);
        assert!(matches!(clean.fetch(), Err(ClientError::ProxyNotConfigured)));

        let mut unbound = Entity::with_identity("id", 1);
        assert!(matches!(
            unbound.destroy(),
            Err(ClientError::ProxyNotConfigured)
        ));
        assert!(matches!(
            unbound.commit(),
            Err(ClientError::ProxyNotConfigured)
        ));
    }

    #[test]
    fn equality_ignores_local_key() {
        let a = Entity::with_identity("id", 1).with_attribute("name", "a");
        let b = Entity::with_identity("id", 1).with_attribute("name", "a");
        assert_ne!(a.key(), b.key());
        assert_eq!(a, b);
        assert_eq!(a.clone().key(), a.key());
    }

    #[test]
    fn serializes_as_flat_row() {
        let mut entity = Entity::with_identity("cid", 2)
            .with_attribute("model", "X5")
            .with_attribute("fuel", Value::Null);
        entity.set("year", 2011).unwrap();
        assert_eq!(
            serde_json::to_value(&entity).unwrap(),
            json!({"cid": 2, "model": "X5", "fuel": null, "year": 2011})
        );

        let ghost = Entity::new("id").with_attribute("name", "kkk");
        assert_eq!(
            serde_json::to_value(&ghost).unwrap(),
            json!({"id": null, "name": "kkk"})
        );
    }

    #[test]
    fn display_lists_fields() {
        let entity = Entity::with_identity("id", 1).with_attribute("name", "foo");
        assert_eq!(entity.to_string(), "id:1 idCol:id state:Clean name:foo");
    }
}
