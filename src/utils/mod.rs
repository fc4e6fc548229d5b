pub mod constants;
pub mod path_utils;

pub use constants::*;
pub use path_utils::{normalize_source_reference, resolve_under_root, strip_query_and_fragment};
