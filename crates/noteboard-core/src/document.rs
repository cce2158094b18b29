//! Automerge document handling
//!
//! A board is a single Automerge document whose root map is the flat
//! key-value layout described in [`crate::keys`]. Values are written as
//! native Automerge data: scalars, nested maps for records and lists for
//! sequences, so that peers see ordinary Automerge objects.
//!
//! Replication and conflict resolution are Automerge's: concurrent writes to
//! the same key resolve last-writer-wins, concurrent inserts into the roster
//! list are all kept.

use std::collections::HashMap;

use automerge::{transaction::Transactable, AutoCommit, ObjId, ObjType, ReadDoc, ScalarValue, ROOT};
use serde_json::{Map, Number, Value};
use tracing::{debug, info};

use crate::board_id::BoardId;
use crate::error::{BoardError, BoardResult};
use crate::keys;
use crate::shared_map::{Listener, Listeners, SharedMap, Subscription, ValueChanged};

/// Document metadata keys, hidden from key enumeration
mod meta {
    pub const SCHEMA_VERSION: &str = "schema_version";
    pub const BOARD_ID: &str = "board_id";
}

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: u64 = 1;

/// A board backed by an Automerge document
pub struct BoardDocument {
    /// The board ID
    id: BoardId,
    /// The Automerge document
    doc: AutoCommit,
    /// Change listeners of this replica
    listeners: Listeners,
}

impl BoardDocument {
    /// Create a new empty board with a random ID
    pub fn new() -> Self {
        Self::with_id(BoardId::new())
    }

    /// Create a new empty board with a specific ID
    pub fn with_id(id: BoardId) -> Self {
        let mut doc = AutoCommit::new();

        doc.put(ROOT, meta::SCHEMA_VERSION, CURRENT_SCHEMA_VERSION)
            .expect("Failed to set schema version");
        doc.put(ROOT, meta::BOARD_ID, id.to_bs58check())
            .expect("Failed to set board ID");
        // Created up front so that replicas forked from this document insert
        // into the same list object instead of racing to create it
        doc.put_object(ROOT, keys::USER_IDS, ObjType::List)
            .expect("Failed to create roster list");

        Self {
            id,
            doc,
            listeners: Listeners::new(),
        }
    }

    /// Load a board from Automerge bytes
    pub fn load(bytes: &[u8]) -> BoardResult<Self> {
        let doc = AutoCommit::load(bytes)?;

        let id_str = match doc.get(ROOT, meta::BOARD_ID)? {
            Some((value, _)) => value
                .to_str()
                .map(|s| s.to_string())
                .ok_or_else(|| BoardError::InvalidType(meta::BOARD_ID.to_string()))?,
            None => return Err(BoardError::MissingField(meta::BOARD_ID.to_string())),
        };

        let id = BoardId::from_bs58check(&id_str)
            .map_err(|e| BoardError::InvalidBoardId(e.to_string()))?;

        Ok(Self {
            id,
            doc,
            listeners: Listeners::new(),
        })
    }

    /// Get the board ID
    pub fn id(&self) -> &BoardId {
        &self.id
    }

    /// Get the Automerge URL for this board
    pub fn url(&self) -> String {
        self.id.to_url()
    }

    /// Save the document to bytes
    pub fn save(&mut self) -> Vec<u8> {
        self.doc.save()
    }

    /// Fork the document into an independent replica
    ///
    /// Listeners are not carried over.
    pub fn fork(&mut self) -> Self {
        Self {
            id: self.id,
            doc: self.doc.fork(),
            listeners: Listeners::new(),
        }
    }

    /// Merge another replica into this one
    ///
    /// Every key whose value changed is reported to listeners as a remote
    /// change. Returns the number of changed keys.
    pub fn merge(&mut self, other: &mut BoardDocument) -> BoardResult<usize> {
        if other.id != self.id {
            return Err(BoardError::BoardMismatch {
                expected: self.id.to_bs58check(),
                found: other.id.to_bs58check(),
            });
        }

        let mut before = self.snapshot()?;
        self.doc.merge(&mut other.doc)?;
        let after = self.snapshot()?;

        let mut changes = Vec::new();
        for key in self.data_keys() {
            let previous_value = before.remove(&key);
            if previous_value.as_ref() != after.get(&key) {
                changes.push(ValueChanged {
                    key,
                    previous_value,
                });
            }
        }

        info!(board = %self.id, changed = changes.len(), "Merged replica");
        for change in &changes {
            self.listeners.emit(change, false);
        }
        Ok(changes.len())
    }

    /// Get the underlying Automerge document
    pub fn inner(&self) -> &AutoCommit {
        &self.doc
    }

    /// Get the underlying Automerge document mutably
    pub fn inner_mut(&mut self) -> &mut AutoCommit {
        &mut self.doc
    }

    // ==================== Private helpers ====================

    fn data_keys(&self) -> Vec<String> {
        self.doc
            .keys(ROOT)
            .filter(|k| k != meta::SCHEMA_VERSION && k != meta::BOARD_ID)
            .collect()
    }

    fn snapshot(&self) -> BoardResult<HashMap<String, Value>> {
        let mut snapshot = HashMap::new();
        for key in self.data_keys() {
            if let Some(value) = self.read_key(&key)? {
                snapshot.insert(key, value);
            }
        }
        Ok(snapshot)
    }

    fn read_key(&self, key: &str) -> BoardResult<Option<Value>> {
        match self.doc.get(ROOT, key)? {
            Some((value, obj_id)) => Ok(Some(self.read_value(value, &obj_id)?)),
            None => Ok(None),
        }
    }

    fn read_value(&self, value: automerge::Value<'_>, obj_id: &ObjId) -> BoardResult<Value> {
        match value {
            automerge::Value::Scalar(scalar) => Ok(scalar_to_json(scalar.as_ref())),
            automerge::Value::Object(ObjType::Map) | automerge::Value::Object(ObjType::Table) => {
                let mut fields = Map::new();
                for key in self.doc.keys(obj_id) {
                    if let Some((child, child_id)) = self.doc.get(obj_id, &key)? {
                        let child = self.read_value(child, &child_id)?;
                        fields.insert(key, child);
                    }
                }
                Ok(Value::Object(fields))
            }
            automerge::Value::Object(ObjType::List) => {
                let mut items = Vec::new();
                for i in 0..self.doc.length(obj_id) {
                    if let Some((child, child_id)) = self.doc.get(obj_id, i)? {
                        items.push(self.read_value(child, &child_id)?);
                    }
                }
                Ok(Value::Array(items))
            }
            automerge::Value::Object(ObjType::Text) => Ok(Value::String(self.doc.text(obj_id)?)),
        }
    }

    fn write_field(&mut self, obj_id: &ObjId, key: &str, value: &Value) -> BoardResult<()> {
        match value {
            Value::Array(items) => {
                let list_id = self.doc.put_object(obj_id, key, ObjType::List)?;
                self.write_items(&list_id, items)?;
            }
            Value::Object(fields) => {
                let map_id = self.doc.put_object(obj_id, key, ObjType::Map)?;
                for (field, child) in fields {
                    self.write_field(&map_id, field, child)?;
                }
            }
            scalar => {
                self.doc.put(obj_id, key, json_to_scalar(scalar))?;
            }
        }
        Ok(())
    }

    fn write_items(&mut self, list_id: &ObjId, items: &[Value]) -> BoardResult<()> {
        for (i, item) in items.iter().enumerate() {
            match item {
                Value::Array(nested) => {
                    let nested_id = self.doc.insert_object(list_id, i, ObjType::List)?;
                    self.write_items(&nested_id, nested)?;
                }
                Value::Object(fields) => {
                    let map_id = self.doc.insert_object(list_id, i, ObjType::Map)?;
                    for (field, child) in fields {
                        self.write_field(&map_id, field, child)?;
                    }
                }
                scalar => {
                    self.doc.insert(list_id, i, json_to_scalar(scalar))?;
                }
            }
        }
        Ok(())
    }

    /// Find the list stored at a root key, creating it if needed
    fn list_at(&mut self, key: &str) -> BoardResult<ObjId> {
        match self.doc.get(ROOT, key)? {
            Some((automerge::Value::Object(ObjType::List), list_id)) => Ok(list_id),
            _ => Ok(self.doc.put_object(ROOT, key, ObjType::List)?),
        }
    }

    fn list_strings(&self, list_id: &ObjId) -> BoardResult<Vec<Option<String>>> {
        let mut items = Vec::new();
        for i in 0..self.doc.length(list_id) {
            let item = self
                .doc
                .get(list_id, i)?
                .and_then(|(value, _)| value.to_str().map(|s| s.to_string()));
            items.push(item);
        }
        Ok(items)
    }
}

impl SharedMap for BoardDocument {
    fn get(&self, key: &str) -> BoardResult<Option<Value>> {
        self.read_key(key)
    }

    fn set(&mut self, key: &str, value: Value) -> BoardResult<()> {
        let previous_value = self.read_key(key)?;
        debug!(key, "Setting board key");
        self.write_field(&ROOT, key, &value)?;
        self.listeners.emit(
            &ValueChanged {
                key: key.to_string(),
                previous_value,
            },
            true,
        );
        Ok(())
    }

    fn keys(&self) -> BoardResult<Vec<String>> {
        Ok(self.data_keys())
    }

    fn add_to_set(&mut self, key: &str, member: &str) -> BoardResult<bool> {
        let previous_value = self.read_key(key)?;
        let list_id = self.list_at(key)?;
        let items = self.list_strings(&list_id)?;
        if items.iter().any(|item| item.as_deref() == Some(member)) {
            return Ok(false);
        }

        debug!(key, member, "Adding to set");
        self.doc.insert(&list_id, items.len(), member)?;
        self.listeners.emit(
            &ValueChanged {
                key: key.to_string(),
                previous_value,
            },
            true,
        );
        Ok(true)
    }

    fn remove_from_set(&mut self, key: &str, member: &str) -> BoardResult<bool> {
        let list_id = match self.doc.get(ROOT, key)? {
            Some((automerge::Value::Object(ObjType::List), list_id)) => list_id,
            _ => return Ok(false),
        };

        let previous_value = self.read_key(key)?;
        let items = self.list_strings(&list_id)?;
        let mut removed = false;
        // Back to front so earlier indices stay valid
        for (i, item) in items.iter().enumerate().rev() {
            if item.as_deref() == Some(member) {
                self.doc.delete(&list_id, i)?;
                removed = true;
            }
        }

        if removed {
            debug!(key, member, "Removed from set");
            self.listeners.emit(
                &ValueChanged {
                    key: key.to_string(),
                    previous_value,
                },
                true,
            );
        }
        Ok(removed)
    }

    fn subscribe(&mut self, listener: Listener) -> Subscription {
        self.listeners.add(listener)
    }

    fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.remove(subscription)
    }
}

impl Default for BoardDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BoardDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardDocument")
            .field("id", &self.id)
            .field("listeners", &self.listeners)
            .finish()
    }
}

fn json_to_scalar(value: &Value) -> ScalarValue {
    match value {
        Value::Bool(b) => ScalarValue::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ScalarValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                ScalarValue::Uint(u)
            } else {
                ScalarValue::F64(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => ScalarValue::from(s.as_str()),
        Value::Null | Value::Array(_) | Value::Object(_) => ScalarValue::Null,
    }
}

fn scalar_to_json(scalar: &ScalarValue) -> Value {
    match scalar {
        ScalarValue::Str(s) => Value::String(s.to_string()),
        ScalarValue::Int(i) => Value::from(*i),
        ScalarValue::Uint(u) => Value::from(*u),
        ScalarValue::F64(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        ScalarValue::Boolean(b) => Value::Bool(*b),
        ScalarValue::Timestamp(t) => Value::from(*t),
        ScalarValue::Counter(_) => scalar.to_i64().map(Value::from).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
