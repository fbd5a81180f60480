//! The built-in error kind tree.
//!
//! ```text
//! (root)
//! ├── ValueError
//! │   ├── MalformedString
//! │   │   ├── UnhandledCharacters
//! │   │   ├── StringTooLong
//! │   │   └── RegexpMismatch
//! │   ├── StringNotInEnum
//! │   ├── IntegerOutOfRange
//! │   └── MalformedStruct
//! │       ├── IncompleteStruct
//! │       └── UnknownStructKey
//! ├── LookupError
//! │   ├── NoSuchFunction
//! │   └── NoSuchAPIVersion
//! ├── TypeError
//! │   ├── ArgumentCount
//! │   └── ExpectedString / ExpectedInteger / ExpectedBoolean /
//! │       ExpectedNull / ExpectedStruct / ExpectedList
//! ├── RuntimeError
//! │   ├── AuthenticationFailed
//! │   └── AccessDenied
//! └── InternalError
//!     └── (OutputError, invisible)
//! ```
//!
//! Transport failures (malformed envelopes) belong to the transport layer,
//! which may hang its own kinds under [`ROOT`].

use crate::ErrorKind;

pub static ROOT: ErrorKind = ErrorKind::root("Error", "Unspecified error.");

// ValueError

pub static VALUE_ERROR: ErrorKind =
    ErrorKind::new("ValueError", &ROOT, "The value is not acceptable.");

pub static MALFORMED_STRING: ErrorKind =
    ErrorKind::new("MalformedStringError", &VALUE_ERROR, "The string is malformed.");

pub static UNHANDLED_CHARACTERS: ErrorKind = ErrorKind::new(
    "UnhandledCharactersError",
    &MALFORMED_STRING,
    "The string contained characters that this call can't handle.",
);

pub static STRING_TOO_LONG: ErrorKind = ErrorKind::new(
    "StringTooLongError",
    &MALFORMED_STRING,
    "The string exceeds the maximum length for this type.",
);

pub static REGEXP_MISMATCH: ErrorKind = ErrorKind::new(
    "RegexpMismatchError",
    &MALFORMED_STRING,
    "The string did not match the regexp for this type.",
);

pub static STRING_NOT_IN_ENUM: ErrorKind = ErrorKind::new(
    "StringNotInEnumError",
    &VALUE_ERROR,
    "The string is not among the valid values.",
);

pub static INTEGER_OUT_OF_RANGE: ErrorKind = ErrorKind::new(
    "IntegerOutOfRangeError",
    &VALUE_ERROR,
    "Integer out of range for this type.",
);

pub static MALFORMED_STRUCT: ErrorKind =
    ErrorKind::new("MalformedStructError", &VALUE_ERROR, "The struct is malformed.");

pub static INCOMPLETE_STRUCT: ErrorKind = ErrorKind::new(
    "IncompleteStructError",
    &MALFORMED_STRUCT,
    "Struct is incomplete, a mandatory key is missing.",
);

pub static UNKNOWN_STRUCT_KEY: ErrorKind = ErrorKind::new(
    "UnknownStructKeyError",
    &MALFORMED_STRUCT,
    "The struct has a key which is not defined for this type.",
);

// LookupError

pub static LOOKUP_ERROR: ErrorKind =
    ErrorKind::new("LookupError", &ROOT, "The referenced entity does not exist.");

pub static NO_SUCH_FUNCTION: ErrorKind = ErrorKind::new(
    "NoSuchFunctionError",
    &LOOKUP_ERROR,
    "No function by that name is callable on the server in the api version you selected.",
);

pub static NO_SUCH_API_VERSION: ErrorKind = ErrorKind::new(
    "NoSuchAPIVersionError",
    &LOOKUP_ERROR,
    "No such API version exists.",
);

// TypeError

pub static TYPE_ERROR: ErrorKind =
    ErrorKind::new("TypeError", &ROOT, "The value has the wrong type.");

pub static ARGUMENT_COUNT: ErrorKind = ErrorKind::new(
    "ArgumentCountError",
    &TYPE_ERROR,
    "Wrong number of arguments.",
);

pub static EXPECTED_STRING: ErrorKind =
    ErrorKind::new("ExpectedStringError", &TYPE_ERROR, "Expected a string.");

pub static EXPECTED_INTEGER: ErrorKind =
    ErrorKind::new("ExpectedIntegerError", &TYPE_ERROR, "Expected an integer.");

pub static EXPECTED_BOOLEAN: ErrorKind =
    ErrorKind::new("ExpectedBooleanError", &TYPE_ERROR, "Expected a boolean.");

pub static EXPECTED_NULL: ErrorKind =
    ErrorKind::new("ExpectedNullError", &TYPE_ERROR, "Expected null.");

pub static EXPECTED_STRUCT: ErrorKind =
    ErrorKind::new("ExpectedStructError", &TYPE_ERROR, "Expected a struct.");

pub static EXPECTED_LIST: ErrorKind =
    ErrorKind::new("ExpectedListError", &TYPE_ERROR, "Expected a list.");

// RuntimeError

pub static RUNTIME_ERROR: ErrorKind =
    ErrorKind::new("RuntimeError", &ROOT, "The call could not be carried out.");

pub static AUTHENTICATION_FAILED: ErrorKind = ErrorKind::new(
    "AuthenticationFailedError",
    &RUNTIME_ERROR,
    "Authentication failed.",
);

pub static ACCESS_DENIED: ErrorKind =
    ErrorKind::new("AccessDeniedError", &RUNTIME_ERROR, "Access not allowed.");

// InternalError

pub static INTERNAL_ERROR: ErrorKind =
    ErrorKind::new("InternalError", &ROOT, "An internal server error occurred.");

pub static OUTPUT_ERROR: ErrorKind = ErrorKind::new(
    "OutputError",
    &INTERNAL_ERROR,
    "An internal server error occurred.",
)
.invisible();

/// Every built-in kind, root first.
pub static ALL: &[&ErrorKind] = &[
    &ROOT,
    &VALUE_ERROR,
    &MALFORMED_STRING,
    &UNHANDLED_CHARACTERS,
    &STRING_TOO_LONG,
    &REGEXP_MISMATCH,
    &STRING_NOT_IN_ENUM,
    &INTEGER_OUT_OF_RANGE,
    &MALFORMED_STRUCT,
    &INCOMPLETE_STRUCT,
    &UNKNOWN_STRUCT_KEY,
    &LOOKUP_ERROR,
    &NO_SUCH_FUNCTION,
    &NO_SUCH_API_VERSION,
    &TYPE_ERROR,
    &ARGUMENT_COUNT,
    &EXPECTED_STRING,
    &EXPECTED_INTEGER,
    &EXPECTED_BOOLEAN,
    &EXPECTED_NULL,
    &EXPECTED_STRUCT,
    &EXPECTED_LIST,
    &RUNTIME_ERROR,
    &AUTHENTICATION_FAILED,
    &ACCESS_DENIED,
    &INTERNAL_ERROR,
    &OUTPUT_ERROR,
];
