//! Documentation view of descriptors.
//!
//! [`TypeDoc`] is a flat, serializable summary of one descriptor that an
//! external generator can render. It is also exposed over the wire by the
//! built-in introspection operations, so [`DocTypes`] provides descriptors
//! for the documentation values themselves.

use crate::descriptor::{TypeDescriptor, TypeKind};
use crate::{SchemaError, StandardTypes};
use rpcc_types::Value;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Base kind as shown in documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseKind {
    String,
    Enum,
    Integer,
    Null,
    Boolean,
    Datetime,
    List,
    Struct,
    Nullable,
}

impl BaseKind {
    pub const ALL: [BaseKind; 9] = [
        Self::String,
        Self::Enum,
        Self::Integer,
        Self::Null,
        Self::Boolean,
        Self::Datetime,
        Self::List,
        Self::Struct,
        Self::Nullable,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Enum => "enum",
            Self::Integer => "integer",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
            Self::List => "list",
            Self::Struct => "struct",
            Self::Nullable => "nullable",
        }
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed slot: a struct member or an operation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocParameter {
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DocParameter {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: None,
            description: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn described(mut self, description: Option<&str>) -> Self {
        self.description = description.map(str::to_string);
        self
    }

    /// Internal value matching [`DocTypes::parameter`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut members = vec![("type_name", Value::from(self.type_name.as_str()))];
        if let Some(name) = &self.name {
            members.push(("name", Value::from(name.as_str())));
        }
        if let Some(description) = &self.description {
            members.push(("description", Value::from(description.as_str())));
        }
        Value::structure(members)
    }
}

/// Flat summary of one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDoc {
    pub name: String,
    pub base: BaseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxlen: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<Vec<DocParameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<Vec<DocParameter>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub masked: bool,
}

impl TypeDoc {
    fn new(name: &str, base: BaseKind, description: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            base,
            description: description.map(str::to_string),
            regexp: None,
            maxlen: None,
            values: None,
            min: None,
            max: None,
            subtype: None,
            mandatory: None,
            optional: None,
            masked: false,
        }
    }

    /// Internal value matching [`DocTypes::typedef`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        let params = |list: &[DocParameter]| {
            Value::List(list.iter().map(DocParameter::to_value).collect())
        };
        let mut members = vec![
            ("name", Value::from(self.name.as_str())),
            ("base", Value::from(self.base.as_str())),
        ];
        let optional = [
            ("description", self.description.as_deref().map(Value::from)),
            ("regexp", self.regexp.as_deref().map(Value::from)),
            ("maxlen", self.maxlen.and_then(|n| i64::try_from(n).ok()).map(Value::Integer)),
            ("values", self.values.clone().map(Value::from)),
            ("min", self.min.map(Value::Integer)),
            ("max", self.max.map(Value::Integer)),
            ("subtype", self.subtype.as_deref().map(Value::from)),
            ("mandatory", self.mandatory.as_deref().map(params)),
            ("optional", self.optional.as_deref().map(params)),
            ("masked", self.masked.then_some(Value::Bool(true))),
        ];
        members.extend(optional.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))));
        Value::structure(members)
    }
}

impl TypeDescriptor {
    /// Documentation summary of this descriptor.
    #[must_use]
    pub fn doc(&self) -> TypeDoc {
        let description = self.description();
        match self.kind() {
            TypeKind::String(rules) => {
                let mut doc = TypeDoc::new(self.name(), BaseKind::String, description);
                doc.regexp = rules.anchored_regexp().map(str::to_string);
                doc.maxlen = rules.max_len();
                doc.masked = rules.is_masked();
                doc
            }
            TypeKind::Integer(range) => {
                let mut doc = TypeDoc::new(self.name(), BaseKind::Integer, description);
                doc.min = range.map(|(min, _)| min);
                doc.max = range.map(|(_, max)| max);
                doc
            }
            TypeKind::Boolean => TypeDoc::new(self.name(), BaseKind::Boolean, description),
            TypeKind::Null => TypeDoc::new(self.name(), BaseKind::Null, description),
            TypeKind::DateTime => TypeDoc::new(self.name(), BaseKind::Datetime, description),
            TypeKind::Enum(values) => {
                let mut doc = TypeDoc::new(self.name(), BaseKind::Enum, description);
                doc.values = Some(values.clone());
                doc
            }
            TypeKind::List(element) => {
                let mut doc = TypeDoc::new(self.name(), BaseKind::List, description);
                doc.subtype = Some(element.name().to_string());
                doc
            }
            TypeKind::Nullable(inner) => {
                let mut doc = TypeDoc::new(self.name(), BaseKind::Nullable, description);
                doc.subtype = Some(inner.name().to_string());
                doc
            }
            TypeKind::Struct(members) => {
                let slots = |map: &std::collections::BTreeMap<String, Arc<TypeDescriptor>>| {
                    map.iter()
                        .map(|(key, ty)| {
                            DocParameter::new(ty.name())
                                .named(key.as_str())
                                .described(ty.description())
                        })
                        .collect::<Vec<_>>()
                };
                let mut doc = TypeDoc::new(self.name(), BaseKind::Struct, description);
                doc.mandatory = Some(slots(&members.mandatory));
                doc.optional = Some(slots(&members.optional));
                doc
            }
        }
    }
}

/// Descriptors for documentation values, shared by the introspection
/// operations.
#[derive(Debug, Clone)]
pub struct DocTypes {
    pub basetype: Arc<TypeDescriptor>,
    pub parameter: Arc<TypeDescriptor>,
    pub typedef: Arc<TypeDescriptor>,
}

impl DocTypes {
    /// Builds the documentation descriptors over the shared scalars.
    ///
    /// # Errors
    ///
    /// Fails only if a descriptor definition below is itself invalid.
    pub fn new(standard: &StandardTypes) -> Result<Self, SchemaError> {
        let string = Arc::clone(&standard.string);
        let integer = Arc::clone(&standard.integer);
        let boolean = Arc::clone(&standard.boolean);

        let basetype = TypeDescriptor::enumeration(
            "doc-basetype",
            BaseKind::ALL.iter().map(|k| k.as_str()),
        )?
        .with_description("Base kind of a documented type.")
        .shared();

        let parameter = TypeDescriptor::structure(
            "doc-parameter",
            [("type_name", Arc::clone(&string))],
            [
                ("name", Arc::clone(&string)),
                ("description", Arc::clone(&string)),
            ],
        )?
        .with_description("A typed parameter or struct member.")
        .shared();
        let parameters = TypeDescriptor::list(Arc::clone(&parameter)).shared();

        let typedef = TypeDescriptor::structure(
            "doc-typedef",
            [("name", Arc::clone(&string)), ("base", Arc::clone(&basetype))],
            [
                ("description", Arc::clone(&string)),
                ("regexp", Arc::clone(&string)),
                ("maxlen", Arc::clone(&integer)),
                ("values", TypeDescriptor::list(Arc::clone(&string)).shared()),
                ("min", Arc::clone(&integer)),
                ("max", integer),
                ("subtype", string),
                ("mandatory", Arc::clone(&parameters)),
                ("optional", parameters),
                ("masked", boolean),
            ],
        )?
        .with_description("Documentation of one type.")
        .shared();

        Ok(Self {
            basetype,
            parameter,
            typedef,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StringRules;
    use rpcc_auth::{CallContext, DecisionEngine};
    use serde_json::json;

    #[test]
    fn string_doc_shows_constraints() {
        let rules = StringRules::new().regexp("[a-z.]+").maxlen(64);
        let fqdn = TypeDescriptor::string_with("fqdn", rules)
            .unwrap()
            .with_description("Host name");
        let doc = fqdn.doc();
        assert_eq!(doc.base, BaseKind::String);
        assert_eq!(doc.regexp.as_deref(), Some("^(?:[a-z.]+)$"));
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "name": "fqdn",
                "base": "string",
                "description": "Host name",
                "regexp": "^(?:[a-z.]+)$",
                "maxlen": 64,
            })
        );
    }

    #[test]
    fn struct_doc_lists_members() {
        let int = TypeDescriptor::integer("integer").shared();
        let pair =
            TypeDescriptor::structure("pair", [("a", Arc::clone(&int))], [("b", int)]).unwrap();
        let doc = pair.doc();
        assert_eq!(doc.mandatory.unwrap()[0], DocParameter::new("integer").named("a"));
        assert_eq!(doc.optional.unwrap()[0].name.as_deref(), Some("b"));
    }

    #[test]
    fn wrapper_doc_names_subtype() {
        let list = TypeDescriptor::list(TypeDescriptor::datetime("datetime").shared());
        let doc = list.doc();
        assert_eq!(doc.base, BaseKind::List);
        assert_eq!(doc.subtype.as_deref(), Some("datetime"));
    }

    #[test]
    fn doc_values_present_through_doc_types() {
        let types = DocTypes::new(&StandardTypes::new()).unwrap();
        let call = CallContext::new(Arc::new(DecisionEngine::new()), 0);
        let color = TypeDescriptor::enumeration("color", ["red", "green"])
            .unwrap()
            .with_description("A color.");

        let doc = color.doc();
        let wire = types.typedef.present(&doc.to_value(), &call).unwrap();
        assert_eq!(wire, serde_json::to_value(&doc).unwrap());

        let typedef_doc = types.typedef.doc();
        let wire = types.typedef.present(&typedef_doc.to_value(), &call).unwrap();
        assert_eq!(wire, serde_json::to_value(&typedef_doc).unwrap());
    }
}
