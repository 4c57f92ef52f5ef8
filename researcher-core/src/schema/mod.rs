//! JSON-Schema to typed record translation.
//!
//! Tool providers describe their arguments with loosely structured JSON
//! Schema. [`translate`] turns that into a [`RecordDefinition`] which can
//! render itself back to a schema and validate keyword arguments.

mod error;
mod record;
mod translate;
mod validate;

pub use error::{SchemaError, ValidationError};
pub use record::{FieldDefault, FieldDefinition, FieldType, RecordDefinition};
pub use translate::translate;
