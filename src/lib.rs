// TODO Remove this attribute when the serialize side of the stash
// pipeline lands and exercises the depth-first traversal order.
#![allow(dead_code)]

mod convert;
mod fmt;
mod object;
mod process;

pub use self::object::array::Array;
pub use self::object::error::CycleError;
pub use self::object::map::Map;
pub use self::object::Value;
pub use self::process::escape::escape;
pub use self::process::escape::is_escaped;
pub use self::process::escape::unescape;
pub use self::process::escape::ObjectEscaper;
