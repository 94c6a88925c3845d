// MIT License - Copyright (c) 2026 Peter Wright
// Device client seam

use std::future::Future;
use std::sync::Arc;

use crate::devices::{RawLogEntry, RawZone};
use crate::error::Result;

/// Raw alarm status together with the zones the panel considers alarmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status_value: u8,
    pub alarmed_zones: Vec<RawZone>,
}

/// Network client for one iAlarm panel.
///
/// The vendor wire protocol lives behind this trait. Every method may fail
/// with a connection-kind error (see [`IAlarmError::is_retryable`]); the
/// coordinator never issues two calls on the same client concurrently.
///
/// Implementors may write the methods as plain `async fn`.
///
/// [`IAlarmError::is_retryable`]: crate::error::IAlarmError::is_retryable
pub trait DeviceClient: Send + Sync + 'static {
    /// Address of the panel, used for logging.
    fn host(&self) -> &str;

    /// Stable device identity (MAC address).
    fn get_mac(&self) -> impl Future<Output = Result<String>> + Send;

    /// Raw alarm status code.
    fn get_status(&self) -> impl Future<Output = Result<u8>> + Send;

    /// Alarm status classified against already-fetched zone data.
    fn get_status_with_zones(
        &self,
        zones: &[RawZone],
    ) -> impl Future<Output = Result<StatusReport>> + Send {
        async move {
            let status_value = self.get_status().await?;
            Ok(StatusReport {
                status_value,
                alarmed_zones: zones.iter().filter(|z| z.has_alarm_code()).cloned().collect(),
            })
        }
    }

    fn get_zone_status(&self) -> impl Future<Output = Result<Vec<RawZone>>> + Send;

    fn arm_away(&self) -> impl Future<Output = Result<()>> + Send;

    fn arm_stay(&self) -> impl Future<Output = Result<()>> + Send;

    fn disarm(&self) -> impl Future<Output = Result<()>> + Send;

    /// Silence a sounding alarm without changing the arm state.
    fn cancel_alarm(&self) -> impl Future<Output = Result<()>> + Send;

    /// Up to `count` most recent log records, newest first as the panel reports them.
    fn get_last_log_entries(
        &self,
        count: usize,
    ) -> impl Future<Output = Result<Vec<RawLogEntry>>> + Send;

    /// Release the connection. Called exactly once on teardown.
    fn close(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

/// Shared clients, so a caller can keep a handle on the panel it hands over.
impl<T: DeviceClient> DeviceClient for Arc<T> {
    fn host(&self) -> &str {
        (**self).host()
    }

    fn get_mac(&self) -> impl Future<Output = Result<String>> + Send {
        (**self).get_mac()
    }

    fn get_status(&self) -> impl Future<Output = Result<u8>> + Send {
        (**self).get_status()
    }

    fn get_status_with_zones(
        &self,
        zones: &[RawZone],
    ) -> impl Future<Output = Result<StatusReport>> + Send {
        (**self).get_status_with_zones(zones)
    }

    fn get_zone_status(&self) -> impl Future<Output = Result<Vec<RawZone>>> + Send {
        (**self).get_zone_status()
    }

    fn arm_away(&self) -> impl Future<Output = Result<()>> + Send {
        (**self).arm_away()
    }

    fn arm_stay(&self) -> impl Future<Output = Result<()>> + Send {
        (**self).arm_stay()
    }

    fn disarm(&self) -> impl Future<Output = Result<()>> + Send {
        (**self).disarm()
    }

    fn cancel_alarm(&self) -> impl Future<Output = Result<()>> + Send {
        (**self).cancel_alarm()
    }

    fn get_last_log_entries(
        &self,
        count: usize,
    ) -> impl Future<Output = Result<Vec<RawLogEntry>>> + Send {
        (**self).get_last_log_entries(count)
    }

    fn close(&self) -> impl Future<Output = Result<()>> + Send {
        (**self).close()
    }
}
