// MIT License - Copyright (c) 2026 Peter Wright

pub mod log;
pub mod zone;

pub use log::{LogEntry, RawLogEntry};
pub use zone::{RawZone, ZoneAggregate, ZoneRecord, ZoneStatusFlags};
