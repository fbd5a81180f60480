//! Check, resolve and present.
//!
//! ```text
//!   wire ──check──▶ shape ok ──resolve──▶ Value ──(body)──▶ Value ──present──▶ wire
//!          TypeError          ValueError                        InternalError
//!                             LookupError
//! ```
//!
//! `check` looks only at the JSON shape. `resolve` applies constraints in a
//! fixed order and then the descriptor's lookup hook. `present` runs the
//! hook's inverse first and then re-validates, so a body can never leak a
//! value its return type would have rejected on input.

use crate::descriptor::{StringRules, StructMembers, TypeDescriptor, TypeKind};
use chrono::NaiveDateTime;
use rpcc_auth::CallContext;
use rpcc_error::{kinds, ErrorKind, RpcError};
use rpcc_types::{Value, WireValue};
use std::collections::BTreeMap;

/// Wire form of a datetime.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Regexp reported when a datetime string has the wrong shape.
pub const DATETIME_REGEXP: &str = "^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}$";

/// What masked strings present as.
pub const MASK: &str = "********";

impl TypeDescriptor {
    /// Validates the structural shape of `raw`.
    ///
    /// # Errors
    ///
    /// Returns a TypeError kind naming the expected shape; nested failures
    /// carry the struct key or list index in their traceback.
    pub fn check(&self, raw: &WireValue) -> Result<(), RpcError> {
        match self.kind() {
            TypeKind::String(_) | TypeKind::Enum(_) | TypeKind::DateTime => {
                expect_str(raw).map(|_| ())
            }
            TypeKind::Integer(_) => {
                if raw.is_i64() || raw.is_u64() {
                    Ok(())
                } else {
                    Err(expected(&kinds::EXPECTED_INTEGER, raw))
                }
            }
            TypeKind::Boolean => expect_bool(raw).map(|_| ()),
            TypeKind::Null => {
                if raw.is_null() {
                    Ok(())
                } else {
                    Err(expected(&kinds::EXPECTED_NULL, raw))
                }
            }
            TypeKind::List(element) => {
                let items = raw
                    .as_array()
                    .ok_or_else(|| expected(&kinds::EXPECTED_LIST, raw))?;
                for (index, item) in items.iter().enumerate() {
                    element
                        .check(item)
                        .map_err(|err| err.traced(index.to_string()))?;
                }
                Ok(())
            }
            TypeKind::Struct(members) => {
                let object = raw
                    .as_object()
                    .ok_or_else(|| expected(&kinds::EXPECTED_STRUCT, raw))?;
                for (key, item) in object {
                    if let Some(member) = members.get(key) {
                        member.check(item).map_err(|err| err.traced(key.clone()))?;
                    }
                }
                Ok(())
            }
            TypeKind::Nullable(inner) => {
                if raw.is_null() {
                    Ok(())
                } else {
                    inner.check(raw)
                }
            }
        }
    }

    /// Validates constraints and converts `raw` to an internal value.
    ///
    /// Assumes [`check`](Self::check) passed; shape errors are still
    /// reported if it did not.
    ///
    /// # Errors
    ///
    /// Returns ValueError kinds for constraint failures and whatever the
    /// lookup hook reports, typically LookupError kinds.
    pub fn resolve(&self, raw: &WireValue, call: &CallContext) -> Result<Value, RpcError> {
        let value = self.convert(raw, call)?;
        match self.lookup_hook() {
            Some(hook) => hook.lookup(value, call),
            None => Ok(value),
        }
    }

    fn convert(&self, raw: &WireValue, call: &CallContext) -> Result<Value, RpcError> {
        match self.kind() {
            TypeKind::String(rules) => {
                let s = expect_str(raw)?;
                validate_string(rules, s).map_err(|err| err.with_value(raw.clone()))?;
                Ok(Value::String(s.to_string()))
            }
            TypeKind::Enum(values) => {
                let s = expect_str(raw)?;
                if values.iter().any(|v| v == s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(RpcError::string_not_in_enum(values).with_value(raw.clone()))
                }
            }
            TypeKind::DateTime => {
                let s = expect_str(raw)?;
                parse_datetime(s)
                    .map(Value::DateTime)
                    .map_err(|err| err.with_value(raw.clone()))
            }
            TypeKind::Integer(range) => {
                let n = expect_int(raw, *range)?;
                check_range(*range, n).map_err(|err| err.with_value(raw.clone()))?;
                Ok(Value::Integer(n))
            }
            TypeKind::Boolean => expect_bool(raw).map(Value::Bool),
            TypeKind::Null => {
                if raw.is_null() {
                    Ok(Value::Null)
                } else {
                    Err(expected(&kinds::EXPECTED_NULL, raw))
                }
            }
            TypeKind::List(element) => {
                let items = raw
                    .as_array()
                    .ok_or_else(|| expected(&kinds::EXPECTED_LIST, raw))?;
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        element
                            .resolve(item, call)
                            .map_err(|err| err.traced(index.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
            TypeKind::Struct(members) => resolve_struct(members, raw, call),
            TypeKind::Nullable(inner) => {
                if raw.is_null() {
                    Ok(Value::Null)
                } else {
                    inner.resolve(raw, call)
                }
            }
        }
    }

    /// Converts an internal value back to its wire form.
    ///
    /// # Errors
    ///
    /// Any mismatch between `value` and this descriptor is a server defect
    /// and is reported as an InternalError whose detail names the
    /// descriptor chain.
    pub fn present(&self, value: &Value, call: &CallContext) -> Result<WireValue, RpcError> {
        self.output(value, call).map_err(|fault| {
            tracing::error!(
                call_id = %call.id(),
                type_name = %self.name(),
                fault = %fault,
                "output conversion failed"
            );
            RpcError::output(fault)
        })
    }

    fn output(&self, value: &Value, call: &CallContext) -> Result<WireValue, String> {
        let looked_up;
        let value = match self.lookup_hook() {
            Some(hook) => {
                looked_up = hook
                    .output(value, call)
                    .map_err(|err| self.fault(format!("lookup output failed: {err}")))?;
                &looked_up
            }
            None => value,
        };

        match (self.kind(), value) {
            (TypeKind::String(rules), Value::String(s)) => {
                validate_string(rules, s).map_err(|err| self.fault(err.desc()))?;
                if rules.is_masked() {
                    Ok(WireValue::from(MASK))
                } else {
                    Ok(WireValue::from(s.as_str()))
                }
            }
            (TypeKind::Enum(values), Value::String(s)) => {
                if values.iter().any(|v| v == s) {
                    Ok(WireValue::from(s.as_str()))
                } else {
                    Err(self.fault(format!("'{s}' is not an enum value")))
                }
            }
            (TypeKind::DateTime, Value::DateTime(dt)) => {
                Ok(WireValue::from(dt.format(DATETIME_FORMAT).to_string()))
            }
            (TypeKind::Integer(range), Value::Integer(n)) => {
                check_range(*range, *n).map_err(|err| self.fault(err.desc()))?;
                Ok(WireValue::from(*n))
            }
            (TypeKind::Boolean, Value::Bool(b)) => Ok(WireValue::from(*b)),
            (TypeKind::Null, Value::Null) | (TypeKind::Nullable(_), Value::Null) => {
                Ok(WireValue::Null)
            }
            (TypeKind::Nullable(inner), other) => inner
                .output(other, call)
                .map_err(|fault| self.fault(fault)),
            (TypeKind::List(element), Value::List(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    element
                        .output(item, call)
                        .map_err(|fault| self.fault(format!("index {index}: {fault}")))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(WireValue::Array),
            (TypeKind::Struct(members), Value::Struct(map)) => {
                self.output_struct(members, map, call)
            }
            (_, other) => {
                Err(self.fault(format!("cannot present a {} value", other.type_name())))
            }
        }
    }

    fn output_struct(
        &self,
        members: &StructMembers,
        map: &BTreeMap<String, Value>,
        call: &CallContext,
    ) -> Result<WireValue, String> {
        if let Some(key) = members.mandatory.keys().find(|k| !map.contains_key(*k)) {
            return Err(self.fault(format!("mandatory key '{key}' missing")));
        }
        let mut out = serde_json::Map::with_capacity(map.len());
        for (key, item) in map {
            let member = members
                .get(key)
                .ok_or_else(|| self.fault(format!("key '{key}' is not defined")))?;
            let wire = member
                .output(item, call)
                .map_err(|fault| self.fault(format!("key '{key}': {fault}")))?;
            out.insert(key.clone(), wire);
        }
        Ok(WireValue::Object(out))
    }

    fn fault(&self, msg: impl std::fmt::Display) -> String {
        format!("type {}: {msg}", self.name())
    }
}

fn resolve_struct(
    members: &StructMembers,
    raw: &WireValue,
    call: &CallContext,
) -> Result<Value, RpcError> {
    let object = raw
        .as_object()
        .ok_or_else(|| expected(&kinds::EXPECTED_STRUCT, raw))?;

    if let Some(key) = members.mandatory.keys().find(|k| !object.contains_key(*k)) {
        return Err(RpcError::incomplete_struct(key));
    }
    if let Some(key) = object.keys().find(|k| members.get(k).is_none()) {
        return Err(RpcError::unknown_struct_key(key));
    }

    let mut out = BTreeMap::new();
    for (key, item) in object {
        if let Some(member) = members.get(key) {
            let value = member
                .resolve(item, call)
                .map_err(|err| err.traced(key.clone()))?;
            out.insert(key.clone(), value);
        }
    }
    Ok(Value::Struct(out))
}

fn expected(kind: &'static ErrorKind, raw: &WireValue) -> RpcError {
    RpcError::new(kind).with_value(raw.clone())
}

fn expect_str(raw: &WireValue) -> Result<&str, RpcError> {
    raw.as_str()
        .ok_or_else(|| expected(&kinds::EXPECTED_STRING, raw))
}

/// Integers past `i64` are out of range, not mistyped.
fn expect_int(raw: &WireValue, range: Option<(i64, i64)>) -> Result<i64, RpcError> {
    if let Some(n) = raw.as_i64() {
        return Ok(n);
    }
    if raw.is_u64() {
        let (min, max) = range.unwrap_or((i64::MIN, i64::MAX));
        return Err(RpcError::integer_out_of_range(min, max).with_value(raw.clone()));
    }
    Err(expected(&kinds::EXPECTED_INTEGER, raw))
}

fn expect_bool(raw: &WireValue) -> Result<bool, RpcError> {
    match raw {
        WireValue::Bool(b) => Ok(*b),
        WireValue::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(expected(&kinds::EXPECTED_BOOLEAN, raw)),
        },
        _ => Err(expected(&kinds::EXPECTED_BOOLEAN, raw)),
    }
}

/// Length, then regexp, then character set.
fn validate_string(rules: &StringRules, s: &str) -> Result<(), RpcError> {
    if let Some(maxlen) = rules.max_len() {
        if s.chars().count() > maxlen {
            return Err(RpcError::string_too_long(maxlen));
        }
    }
    if let Some(regex) = rules.compiled() {
        if !regex.is_match(s) {
            return Err(RpcError::regexp_mismatch(regex.as_str()));
        }
    }
    if rules.is_latin1_only() && s.chars().any(|c| c > '\u{ff}') {
        return Err(RpcError::unhandled_characters());
    }
    Ok(())
}

fn check_range(range: Option<(i64, i64)>, n: i64) -> Result<(), RpcError> {
    match range {
        Some((min, max)) if n < min || n > max => Err(RpcError::integer_out_of_range(min, max)),
        _ => Ok(()),
    }
}

fn is_datetime_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 19
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            10 => *b == b'T',
            13 | 16 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, RpcError> {
    if !is_datetime_shape(s) {
        return Err(RpcError::regexp_mismatch(DATETIME_REGEXP));
    }
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|_| RpcError::new(&kinds::VALUE_ERROR).with_desc("Not a valid datetime"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lookup, StringRules};
    use rpcc_auth::DecisionEngine;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn call() -> CallContext {
        CallContext::new(Arc::new(DecisionEngine::new()), 0)
    }

    fn no_members() -> Vec<(String, Arc<TypeDescriptor>)> {
        Vec::new()
    }

    fn abc() -> TypeDescriptor {
        let int = TypeDescriptor::integer("integer").shared();
        TypeDescriptor::structure(
            "abc",
            [("a", Arc::clone(&int)), ("b", Arc::clone(&int))],
            [("c", int)],
        )
        .expect("valid struct")
    }

    fn round_trip(ty: &TypeDescriptor, raw: WireValue) {
        let call = call();
        ty.check(&raw).expect("check");
        let value = ty.resolve(&raw, &call).expect("resolve");
        assert_eq!(ty.present(&value, &call).expect("present"), raw);
    }

    #[test]
    fn struct_missing_mandatory_key_names_it() {
        let err = abc().resolve(&json!({"a": 1}), &call()).unwrap_err();
        assert!(err.is_a(&kinds::INCOMPLETE_STRUCT));
        assert!(err.desc().contains('b'));
    }

    #[test]
    fn struct_unknown_key_is_carried_as_value() {
        let err = abc()
            .resolve(&json!({"a": 1, "b": 2, "z": 3}), &call())
            .unwrap_err();
        assert!(err.is_a(&kinds::UNKNOWN_STRUCT_KEY));
        assert_eq!(err.value(), Some(&json!("z")));
    }

    #[test]
    fn struct_with_mandatory_keys_only_resolves() {
        let value = abc().resolve(&json!({"a": 1, "b": 2}), &call()).unwrap();
        assert_eq!(value.get("a"), Some(&Value::Integer(1)));
        assert_eq!(value.get("c"), None);
    }

    #[test]
    fn nested_failures_are_traced_outermost_first() {
        let small = TypeDescriptor::integer_range("small", 0, 9).unwrap().shared();
        let cells = TypeDescriptor::list(small).shared();
        let row = TypeDescriptor::structure("row", [("cells", cells)], no_members()).unwrap();
        let err = row
            .resolve(&json!({"cells": [1, 2, 30]}), &call())
            .unwrap_err();
        assert!(err.is_a(&kinds::INTEGER_OUT_OF_RANGE));
        assert_eq!(err.traceback(), ["cells", "2"]);
        assert_eq!(err.value(), Some(&json!(30)));
    }

    #[test]
    fn check_reports_shape_errors() {
        let int = TypeDescriptor::integer("integer");
        assert!(int.check(&json!("7")).unwrap_err().is_a(&kinds::EXPECTED_INTEGER));
        assert!(int.check(&json!(1.5)).unwrap_err().is_a(&kinds::EXPECTED_INTEGER));
        assert!(int.check(&json!(true)).unwrap_err().is_a(&kinds::EXPECTED_INTEGER));
        assert!(int.check(&json!(u64::MAX)).is_ok());

        let err = abc().check(&json!([1, 2])).unwrap_err();
        assert!(err.is_a(&kinds::EXPECTED_STRUCT));

        let err = abc().check(&json!({"a": "x"})).unwrap_err();
        assert!(err.is_a(&kinds::EXPECTED_INTEGER));
        assert_eq!(err.traceback(), ["a"]);
    }

    #[test]
    fn integers_past_i64_are_out_of_range() {
        let huge = json!(u64::MAX);
        let err = TypeDescriptor::integer("integer").resolve(&huge, &call()).unwrap_err();
        assert!(err.is_a(&kinds::INTEGER_OUT_OF_RANGE));
        assert_eq!(err.value(), Some(&huge));
        assert!(err.desc().ends_with(&format!("{}-{}", i64::MIN, i64::MAX)));

        let digit = TypeDescriptor::integer_range("digit", 0, 9).unwrap();
        let err = digit.resolve(&json!(9_223_372_036_854_775_808_u64), &call()).unwrap_err();
        assert!(err.is_a(&kinds::INTEGER_OUT_OF_RANGE));
        assert!(err.desc().ends_with("0-9"));
    }

    #[test]
    fn boolean_accepts_zero_and_one() {
        let b = TypeDescriptor::boolean("boolean");
        assert_eq!(b.resolve(&json!(1), &call()).unwrap(), Value::Bool(true));
        assert_eq!(b.resolve(&json!(0), &call()).unwrap(), Value::Bool(false));
        assert!(b.check(&json!(2)).unwrap_err().is_a(&kinds::EXPECTED_BOOLEAN));
    }

    #[test]
    fn enum_lists_valid_values() {
        let color = TypeDescriptor::enumeration("color", ["red", "green"]).unwrap();
        let err = color.resolve(&json!("blue"), &call()).unwrap_err();
        assert!(err.is_a(&kinds::STRING_NOT_IN_ENUM));
        assert!(err.desc().contains("red, green"));
    }

    #[test]
    fn nullable_passes_null_and_delegates() {
        let digit = TypeDescriptor::integer_range("digit", 0, 9).unwrap().shared();
        let maybe = TypeDescriptor::nullable(digit);
        assert_eq!(maybe.resolve(&json!(null), &call()).unwrap(), Value::Null);
        assert_eq!(maybe.resolve(&json!(3), &call()).unwrap(), Value::Integer(3));
        assert!(maybe.resolve(&json!(10), &call()).is_err());
    }

    #[test]
    fn datetime_shape_and_calendar() {
        let dt = TypeDescriptor::datetime("datetime");
        let err = dt.resolve(&json!("2024-01-01 10:00:00"), &call()).unwrap_err();
        assert!(err.is_a(&kinds::REGEXP_MISMATCH));

        let err = dt.resolve(&json!("2024-02-30T10:00:00"), &call()).unwrap_err();
        assert!(std::ptr::eq(err.kind(), &kinds::VALUE_ERROR));
        assert_eq!(err.desc(), "Not a valid datetime");
    }

    #[test]
    fn round_trips() {
        round_trip(&TypeDescriptor::datetime("datetime"), json!("2024-03-01T08:30:00"));
        round_trip(&abc(), json!({"a": 1, "b": 2, "c": 3}));
        round_trip(
            &TypeDescriptor::list(
                TypeDescriptor::nullable(TypeDescriptor::string("s").shared()).shared(),
            ),
            json!(["x", null, "y"]),
        );
        round_trip(&TypeDescriptor::boolean("boolean"), json!(true));
    }

    #[test]
    fn masked_strings_are_lossy() {
        let secret = TypeDescriptor::string_with("secret", StringRules::new().masked()).unwrap();
        let call = call();
        let value = secret.resolve(&json!("hunter2"), &call).unwrap();
        assert_eq!(value, Value::from("hunter2"));
        assert_eq!(secret.present(&value, &call).unwrap(), json!(MASK));
        assert!(secret.is_lossy());
    }

    #[test]
    fn present_mismatch_is_internal() {
        let call = call();
        let err = abc()
            .present(&Value::structure([("a", Value::Integer(1))]), &call)
            .unwrap_err();
        assert!(err.is_internal());
        assert_eq!(err.to_struct().namelist, vec!["InternalError".to_string()]);
        assert!(err.detail().unwrap().contains("mandatory key 'b'"));

        let err = TypeDescriptor::integer_range("digit", 0, 9)
            .unwrap()
            .present(&Value::Integer(12), &call)
            .unwrap_err();
        assert!(err.is_internal());

        let err = TypeDescriptor::integer("integer")
            .present(&Value::from("1"), &call)
            .unwrap_err();
        assert!(err.detail().unwrap().contains("type integer"));
    }

    struct Squares {
        resolved: AtomicUsize,
    }

    impl Lookup for Squares {
        fn lookup(&self, value: Value, _call: &CallContext) -> Result<Value, RpcError> {
            self.resolved.fetch_add(1, Ordering::SeqCst);
            let n = value.as_i64().unwrap_or_default();
            Ok(Value::Integer(n * n))
        }

        fn output(&self, value: &Value, _call: &CallContext) -> Result<Value, RpcError> {
            let n = value.as_i64().unwrap_or_default();
            Ok(Value::Integer((n as f64).sqrt() as i64))
        }
    }

    #[test]
    fn lookup_runs_after_constraints() {
        let hook = Arc::new(Squares {
            resolved: AtomicUsize::new(0),
        });
        let sq = TypeDescriptor::integer_range("sq", 0, 5)
            .unwrap()
            .with_lookup(Arc::clone(&hook) as Arc<dyn Lookup>);
        let call = call();

        assert!(sq.resolve(&json!(6), &call).is_err());
        assert_eq!(hook.resolved.load(Ordering::SeqCst), 0);

        let value = sq.resolve(&json!(4), &call).unwrap();
        assert_eq!(value, Value::Integer(16));
        assert_eq!(sq.present(&value, &call).unwrap(), json!(4));
    }

    mod proptest_strings {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn maxlen_counts_characters(s in "\\PC{0,12}", maxlen in 0usize..12) {
                let rules = StringRules::new().maxlen(maxlen);
                let ty = TypeDescriptor::string_with("s", rules).unwrap();
                let result = ty.resolve(&json!(s.clone()), &call());
                if s.chars().count() > maxlen {
                    prop_assert!(result.unwrap_err().is_a(&kinds::STRING_TOO_LONG));
                } else {
                    prop_assert_eq!(result.unwrap(), Value::String(s));
                }
            }

            #[test]
            fn regexp_is_full_match(
                prefix in "[a-z]{0,3}",
                digits in "[0-9]{1,4}",
                suffix in "[a-z]{0,3}",
            ) {
                let rules = StringRules::new().regexp("[0-9]+");
                let ty = TypeDescriptor::string_with("n", rules).unwrap();
                let s = format!("{prefix}{digits}{suffix}");
                let ok = prefix.is_empty() && suffix.is_empty();
                prop_assert_eq!(ty.resolve(&json!(s), &call()).is_ok(), ok);
            }

            #[test]
            fn valid_strings_round_trip(s in "[ -~]{0,20}") {
                let rules = StringRules::new().maxlen(20).latin1_only();
                let ty = TypeDescriptor::string_with("printable", rules).unwrap();
                let call = call();
                let value = ty.resolve(&json!(s.clone()), &call).unwrap();
                prop_assert_eq!(ty.present(&value, &call).unwrap(), json!(s));
            }
        }
    }
}
