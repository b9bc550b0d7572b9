//! Subcommand implementations

mod reader;
mod scan;

pub(crate) use reader::list_readers;
pub(crate) use scan::{scan_once, watch};
