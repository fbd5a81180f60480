//! Internal (resolved) values.
//!
//! [`Value`] is what operation bodies see after parameter binding and what
//! they hand back for output conversion. It mirrors the wire value space and
//! adds two variants the wire cannot carry directly:
//!
//! - [`Value::DateTime`] for the `datetime` leaf type
//! - [`Value::Entity`] for application objects produced by a lookup hook

use chrono::NaiveDateTime;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An application object produced by resolving a wire identifier.
///
/// Entities are opaque to the framework. Guards and operation bodies
/// recover the concrete type with [`Value::entity`].
pub trait Entity: Any + Send + Sync + fmt::Debug {
    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// A resolved value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Entity(Arc<dyn Entity>),
}

impl Value {
    /// Builds a struct value from `(key, value)` pairs.
    #[must_use]
    pub fn structure<K, I>(members: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Struct(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short lowercase tag for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::String(_) => "string",
            Self::DateTime(_) => "datetime",
            Self::List(_) => "list",
            Self::Struct(_) => "struct",
            Self::Entity(_) => "entity",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Returns the member `key` of a struct value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_struct().and_then(|m| m.get(key))
    }

    /// Returns the entity as `T` if this is an entity of that type.
    #[must_use]
    pub fn entity<T: Entity>(&self) -> Option<&T> {
        match self {
            Self::Entity(e) => e.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns the shared entity handle.
    #[must_use]
    pub fn entity_arc(&self) -> Option<&Arc<dyn Entity>> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Struct(a), Self::Struct(b)) => a == b,
            // Entities compare by identity.
            (Self::Entity(a), Self::Entity(b)) => {
                std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Host {
        name: String,
    }

    impl Entity for Host {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(7i64).as_i64(), Some(7));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(vec![1i64, 2]).as_list().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn struct_get() {
        let v = Value::structure([("a", Value::from(1i64)), ("b", Value::Null)]);
        assert_eq!(v.get("a"), Some(&Value::Integer(1)));
        assert_eq!(v.get("b"), Some(&Value::Null));
        assert!(v.get("c").is_none());
    }

    #[test]
    fn entity_downcast() {
        let v = Value::Entity(Arc::new(Host {
            name: "web01".into(),
        }));
        let host = v.entity::<Host>().expect("should downcast to Host");
        assert_eq!(host.name, "web01");
        assert_eq!(v.type_name(), "entity");
    }

    #[test]
    fn entity_equality_is_identity() {
        let shared: Arc<dyn Entity> = Arc::new(Host { name: "a".into() });
        let a = Value::Entity(Arc::clone(&shared));
        let b = Value::Entity(shared);
        let c = Value::Entity(Arc::new(Host { name: "a".into() }));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
