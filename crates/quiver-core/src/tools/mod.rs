//! Capabilities the core extensions put on the toolbox.

pub mod meta;
pub mod print;
pub mod system;

pub use meta::Meta;
pub use print::{format_columns, Print};
pub use system::System;
