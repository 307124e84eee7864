// DEX fleet-status endpoints
//
// `GET accounts/{account_id}/dex/fleet-status/devices`: the latest status
// of every device seen within a time window.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use tracing::{debug, warn};

use crate::dex::client::DexClient;
use crate::dex::models::DeviceStatus;
use crate::error::Error;

/// Look-back applied to every fleet-status query.
pub const LOOKBACK_MINUTES: i64 = 10;

/// Page size requested from the API. Only the first page is fetched.
pub const PER_PAGE: u32 = 50;

/// Device status keyed by device ID. Later duplicates overwrite earlier ones.
pub type DeviceStatusSet = HashMap<String, DeviceStatus>;

/// Closed time range `[start, end]` a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The standard window: the last [`LOOKBACK_MINUTES`] ending at `now`.
    pub fn lookback(now: DateTime<Utc>) -> Self {
        Self {
            start: now - TimeDelta::minutes(LOOKBACK_MINUTES),
            end: now,
        }
    }

    /// [`lookback`](Self::lookback) ending at the current wall-clock time.
    pub fn ending_now() -> Self {
        Self::lookback(Utc::now())
    }

    /// RFC3339 with second precision and a `Z` suffix.
    fn format(ts: DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Collapse a page of records into a map keyed by device ID.
pub fn index_by_device_id(records: Vec<DeviceStatus>) -> DeviceStatusSet {
    let mut set = HashMap::with_capacity(records.len());
    for record in records {
        set.insert(record.device_id.clone(), record);
    }
    set
}

impl DexClient {
    /// Query parameters for the device fleet-status endpoint.
    pub fn device_status_params(window: &TimeWindow) -> Vec<(&'static str, String)> {
        vec![
            ("per_page", PER_PAGE.to_string()),
            ("page", "1".into()),
            ("time_end", TimeWindow::format(window.end)),
            ("time_start", TimeWindow::format(window.start)),
            ("sort_by", "device_id".into()),
            ("status", "connected".into()),
            ("source", "last_seen".into()),
        ]
    }

    /// Fetch the first page of device status within `window`.
    ///
    /// Pagination is not followed: fleets larger than [`PER_PAGE`] are
    /// truncated, and a warning is logged when the envelope says so.
    pub async fn list_device_status(&self, window: &TimeWindow) -> Result<DeviceStatusSet, Error> {
        let url = self.account_url("dex/fleet-status/devices")?;
        let params = Self::device_status_params(window);
        debug!(account_id = self.account_id(), "listing device fleet status");

        let envelope = self
            .get_with_params::<DeviceStatus>("device status", url, &params)
            .await?;

        let total = envelope.result_info.as_ref().and_then(|info| info.total_count);
        let records = envelope.into_records();

        if let Some(total) = total {
            if usize::try_from(total).is_ok_and(|t| t > records.len()) {
                warn!(
                    returned = records.len(),
                    total, "device status truncated to the first page"
                );
            }
        }

        Ok(index_by_device_id(records))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::dex::models::ConnectionStatus;

    fn device(id: &str, name: &str) -> DeviceStatus {
        DeviceStatus {
            device_id: id.into(),
            device_name: name.into(),
            status: ConnectionStatus::Connected,
            ..DeviceStatus::default()
        }
    }

    #[test]
    fn lookback_spans_ten_minutes() {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let window = TimeWindow::lookback(now);
        assert_eq!(window.end, now);
        assert_eq!(window.end - window.start, TimeDelta::minutes(10));
    }

    #[test]
    fn params_use_second_precision_utc() {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap() + TimeDelta::milliseconds(731);
        let params = DexClient::device_status_params(&TimeWindow::lookback(now));
        let get = |k: &str| {
            params
                .iter()
                .find(|(name, _)| *name == k)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("time_end"), Some("2024-07-01T12:00:00Z"));
        assert_eq!(get("time_start"), Some("2024-07-01T11:50:00Z"));
        assert_eq!(get("per_page"), Some("50"));
        assert_eq!(get("page"), Some("1"));
        assert_eq!(get("sort_by"), Some("device_id"));
        assert_eq!(get("status"), Some("connected"));
        assert_eq!(get("source"), Some("last_seen"));
    }

    #[test]
    fn duplicate_ids_keep_last_record() {
        let set = index_by_device_id(vec![
            device("a", "first"),
            device("b", "other"),
            device("a", "second"),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set["a"].device_name, "second");
    }
}
