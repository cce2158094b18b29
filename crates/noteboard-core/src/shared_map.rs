//! Shared key-value substrate
//!
//! The board never owns its storage. It reads and writes through
//! [`SharedMap`], which is implemented by the replicated Automerge document
//! ([`crate::BoardDocument`]) and by the in-process [`MemoryMap`].
//!
//! Every mutation, local or received from another replica, is reported to
//! subscribers as a [`ValueChanged`] together with a flag telling whether it
//! originated locally.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::BoardResult;

/// Description of a single key change
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChanged {
    /// The key that changed
    pub key: String,
    /// Value before the change, `None` if the key did not exist
    pub previous_value: Option<Value>,
}

/// Callback invoked with a change and whether it originated locally
pub type Listener = Box<dyn FnMut(&ValueChanged, bool)>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// A replicated map from string keys to values
pub trait SharedMap {
    /// Read a key
    fn get(&self, key: &str) -> BoardResult<Option<Value>>;

    /// Overwrite a key
    fn set(&mut self, key: &str, value: Value) -> BoardResult<()>;

    /// All keys, in the substrate's enumeration order
    fn keys(&self) -> BoardResult<Vec<String>>;

    /// Write `new` only if the current value equals `expected`
    ///
    /// `None` matches both a missing key and an explicit null.
    /// Returns whether the write happened.
    fn compare_and_set(
        &mut self,
        key: &str,
        expected: Option<&Value>,
        new: Value,
    ) -> BoardResult<bool> {
        let current = self.get(key)?;
        if !same_value(current.as_ref(), expected) {
            return Ok(false);
        }
        self.set(key, new)?;
        Ok(true)
    }

    /// Add `member` to the string set stored at `key`
    ///
    /// Returns `false` if it was already present.
    fn add_to_set(&mut self, key: &str, member: &str) -> BoardResult<bool>;

    /// Remove every occurrence of `member` from the string set at `key`
    ///
    /// Returns `false` if it was not present.
    fn remove_from_set(&mut self, key: &str, member: &str) -> BoardResult<bool>;

    /// Register a change listener
    fn subscribe(&mut self, listener: Listener) -> Subscription;

    /// Remove a change listener; returns `false` if it was not registered
    fn unsubscribe(&mut self, subscription: Subscription) -> bool;
}

/// Registered listeners of one substrate instance
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(Subscription, Listener)>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Listener) -> Subscription {
        let subscription = Subscription(self.next_id);
        self.next_id += 1;
        self.entries.push((subscription, listener));
        subscription
    }

    pub fn remove(&mut self, subscription: Subscription) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(s, _)| *s != subscription);
        self.entries.len() != before
    }

    /// Deliver a change to every listener, in registration order
    pub fn emit(&mut self, change: &ValueChanged, local: bool) {
        for (_, listener) in self.entries.iter_mut() {
            listener(change, local);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

/// Whether a stored value counts as set
///
/// Null, false, zero and the empty string count as unset, matching how
/// peers test for populated keys.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Compare a stored value with an expected one, treating null as missing
fn same_value(current: Option<&Value>, expected: Option<&Value>) -> bool {
    let normalize = |v: Option<&Value>| v.filter(|v| !v.is_null()).cloned();
    normalize(current) == normalize(expected)
}

/// Read the string set stored at a value, de-duplicated in order
pub fn string_set(value: Option<&Value>) -> Vec<String> {
    let mut members: Vec<String> = Vec::new();
    if let Some(Value::Array(items)) = value {
        for item in items {
            if let Some(s) = item.as_str() {
                if !members.iter().any(|m| m == s) {
                    members.push(s.to_string());
                }
            }
        }
    }
    members
}

/// In-process substrate
///
/// Keys enumerate in insertion order. Mutations made through [`SharedMap`]
/// are reported as local; [`MemoryMap::apply_remote`] simulates a write
/// arriving from another replica.
#[derive(Debug, Default)]
pub struct MemoryMap {
    entries: IndexMap<String, Value>,
    listeners: Listeners,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a write received from another replica
    pub fn apply_remote(&mut self, key: &str, value: Value) {
        self.write(key, value, false);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write(&mut self, key: &str, value: Value, local: bool) {
        let previous_value = self.entries.insert(key.to_string(), value);
        let change = ValueChanged {
            key: key.to_string(),
            previous_value,
        };
        self.listeners.emit(&change, local);
    }
}

impl SharedMap for MemoryMap {
    fn get(&self, key: &str) -> BoardResult<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> BoardResult<()> {
        self.write(key, value, true);
        Ok(())
    }

    fn keys(&self) -> BoardResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn add_to_set(&mut self, key: &str, member: &str) -> BoardResult<bool> {
        let mut members = string_set(self.entries.get(key));
        if members.iter().any(|m| m == member) {
            return Ok(false);
        }
        members.push(member.to_string());
        self.write(key, Value::from(members), true);
        Ok(true)
    }

    fn remove_from_set(&mut self, key: &str, member: &str) -> BoardResult<bool> {
        let mut members = string_set(self.entries.get(key));
        let before = members.len();
        members.retain(|m| m != member);
        if members.len() == before {
            return Ok(false);
        }
        self.write(key, Value::from(members), true);
        Ok(true)
    }

    fn subscribe(&mut self, listener: Listener) -> Subscription {
        self.listeners.add(listener)
    }

    fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.remove(subscription)
    }
}
