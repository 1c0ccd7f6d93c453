mod error;
mod functions;
mod traits;
mod types;

pub use error::{AdapterError, Result};
pub use functions::{
    check_attribute_name, check_attribute_names, check_user_attributes, is_reserved_attribute,
    is_session_expired, RESERVED_ATTRIBUTES,
};
pub use traits::{Adapter, SessionAdapter, UserAdapter};
pub use types::{Attributes, DatabaseSession, DatabaseUser};
