//! Shared scalar descriptors.

use crate::descriptor::TypeDescriptor;
use std::sync::Arc;

/// The unconstrained scalars every server registers.
///
/// Wire names must be unique per version, so operations that want a
/// plain `string` or `integer` reuse these instances instead of building
/// their own.
#[derive(Debug, Clone)]
pub struct StandardTypes {
    pub string: Arc<TypeDescriptor>,
    pub integer: Arc<TypeDescriptor>,
    pub boolean: Arc<TypeDescriptor>,
    pub null: Arc<TypeDescriptor>,
    pub datetime: Arc<TypeDescriptor>,
}

impl StandardTypes {
    #[must_use]
    pub fn new() -> Self {
        Self {
            string: TypeDescriptor::string("string").shared(),
            integer: TypeDescriptor::integer("integer").shared(),
            boolean: TypeDescriptor::boolean("boolean").shared(),
            null: TypeDescriptor::null("null").shared(),
            datetime: TypeDescriptor::datetime("datetime").shared(),
        }
    }

    /// All of them, for registration.
    #[must_use]
    pub fn all(&self) -> [&Arc<TypeDescriptor>; 5] {
        [
            &self.string,
            &self.integer,
            &self.boolean,
            &self.null,
            &self.datetime,
        ]
    }
}

impl Default for StandardTypes {
    fn default() -> Self {
        Self::new()
    }
}
