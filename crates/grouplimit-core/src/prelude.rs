pub use crate::app::App;
pub use grouplimit_types::prelude::*;

// vim: ts=4
