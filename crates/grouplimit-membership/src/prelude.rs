pub use grouplimit_core::prelude::*;

// vim: ts=4
