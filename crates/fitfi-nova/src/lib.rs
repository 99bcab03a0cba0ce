pub mod client;
pub mod markers;

pub use client::{EventObserver, NovaClient, NovaConfig};
pub use markers::{parse_line, ParsedLine, DATA_PREFIX, JSON_END, JSON_START};
