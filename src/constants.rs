// MIT License - Copyright (c) 2026 Peter Wright
// iAlarm panel constants

use std::time::Duration;

/// Raw alarm status codes reported by the panel.
pub const STATUS_ARMED_AWAY: u8 = 0;
pub const STATUS_DISARMED: u8 = 1;
pub const STATUS_ARMED_STAY: u8 = 2;
pub const STATUS_CANCEL: u8 = 3;
pub const STATUS_TRIGGERED: u8 = 4;

/// Raw zone status codes reported by the panel.
pub const ZONE_CODE_NOT_USED: u32 = 0;
pub const ZONE_CODE_IN_USE: u32 = 1 << 0;
pub const ZONE_CODE_ALARM: u32 = 1 << 1;
pub const ZONE_CODE_BYPASS: u32 = 1 << 2;
pub const ZONE_CODE_FAULT: u32 = 1 << 3;
pub const ZONE_CODE_LOW_BATTERY: u32 = 1 << 4;
pub const ZONE_CODE_LOSS: u32 = 1 << 5;

pub const DEFAULT_HOST: &str = "192.168.1.81";
pub const DEFAULT_PORT: u16 = 18034;
pub const DEFAULT_SEND_EVENTS: bool = true;

/// Steady-state refresh cadence; also the retry interval after a failed poll.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// Bound on MAC lookup and the first refresh during setup.
pub const DEFAULT_SETUP_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_LOG_MAX_ENTRIES: usize = 25;

pub const MANUFACTURER: &str = "Antifurto365 - Meian";

/// Event bus names.
pub const EVENT_SNAPSHOT_UPDATED: &str = "ialarm_snapshot";
pub const EVENT_REFRESH_FAILED: &str = "ialarm_refresh_failed";
pub const EVENT_TRIGGERED: &str = "ialarm_triggered";
pub const EVENT_ARM_AWAY: &str = "ialarm_arm_away";
pub const EVENT_ARM_STAY: &str = "ialarm_arm_stay";
pub const EVENT_DISARM: &str = "ialarm_disarm";
pub const EVENT_CANCEL: &str = "ialarm_cancel";
pub const EVENT_LOGS: &str = "ialarm_logs";
