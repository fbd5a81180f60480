//! The wire error struct.

use crate::RpcError;
use rpcc_types::WireValue;
use serde::{Deserialize, Serialize};

/// The serialized form of every error returned to a caller.
///
/// | Field | Type | Meaning |
/// |-------|------|---------|
/// | `name` | string | `namelist` joined with `::` |
/// | `namelist` | [string] | kind path, top level first |
/// | `id` | string | correlation id, also written to the server log |
/// | `desc` | string | human description |
/// | `value` | any \| null | offending raw value |
/// | `traceback` | [string] | location annotations, outermost first |
/// | `argno` | int \| null | failing positional parameter |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorStruct {
    pub name: String,
    pub namelist: Vec<String>,
    pub id: String,
    pub desc: String,
    pub value: Option<WireValue>,
    pub traceback: Vec<String>,
    pub argno: Option<usize>,
}

impl From<&RpcError> for ErrorStruct {
    fn from(err: &RpcError) -> Self {
        err.to_struct()
    }
}

impl From<RpcError> for ErrorStruct {
    fn from(err: RpcError) -> Self {
        err.to_struct()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_all_seven_fields() {
        let mut err = RpcError::integer_out_of_range(0, 9).with_value(12);
        err.set_argno(1);
        err.add_traceback("1");

        let value = serde_json::to_value(ErrorStruct::from(&err)).expect("should serialize");
        let obj = value.as_object().expect("should be an object");

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["argno", "desc", "id", "name", "namelist", "traceback", "value"]
        );
        assert_eq!(obj["name"], json!("ValueError::IntegerOutOfRange"));
        assert_eq!(obj["namelist"], json!(["ValueError", "IntegerOutOfRange"]));
        assert_eq!(obj["value"], json!(12));
        assert_eq!(obj["argno"], json!(1));
        assert_eq!(obj["traceback"], json!(["1"]));
    }

    #[test]
    fn absent_value_and_argno_are_null() {
        let value = serde_json::to_value(RpcError::internal("boom").to_struct())
            .expect("should serialize");
        assert_eq!(value["value"], json!(null));
        assert_eq!(value["argno"], json!(null));
        assert_eq!(value["traceback"], json!([]));
    }

    #[test]
    fn deserializes_back() {
        let original = RpcError::access_denied("g").to_struct();
        let json = serde_json::to_string(&original).expect("should serialize");
        let back: ErrorStruct = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(back, original);
    }
}
