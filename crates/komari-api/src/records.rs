// Historical records
//
// Load samples come from a REST endpoint, latency samples from the
// `common:getRecords` RPC method. Both are windowed by hours back from now.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::client::KomariClient;
use crate::error::Error;
use crate::models::{LoadRecordsData, PingRecordData, PingRecordsData, PingTaskData, RecordData};

pub const METHOD_GET_RECORDS: &str = "common:getRecords";

/// A supported history window.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum RecordWindow {
    #[strum(serialize = "1h")]
    #[serde(rename = "1h")]
    Hour1,
    #[strum(serialize = "4h")]
    #[serde(rename = "4h")]
    Hours4,
    #[strum(serialize = "6h")]
    #[serde(rename = "6h")]
    Hours6,
    #[strum(serialize = "12h")]
    #[serde(rename = "12h")]
    Hours12,
    #[strum(serialize = "1d")]
    #[serde(rename = "1d")]
    Day1,
    #[strum(serialize = "7d")]
    #[serde(rename = "7d")]
    Days7,
    #[strum(serialize = "30d")]
    #[serde(rename = "30d")]
    Days30,
}

impl RecordWindow {
    /// Windows offered for load charts.
    pub const LOAD: [Self; 4] = [Self::Hours4, Self::Day1, Self::Days7, Self::Days30];

    /// Windows offered for latency charts.
    pub const PING: [Self; 4] = [Self::Hour1, Self::Hours6, Self::Hours12, Self::Day1];

    pub fn hours(self) -> u32 {
        match self {
            Self::Hour1 => 1,
            Self::Hours4 => 4,
            Self::Hours6 => 6,
            Self::Hours12 => 12,
            Self::Day1 => 24,
            Self::Days7 => 168,
            Self::Days30 => 720,
        }
    }
}

#[derive(Serialize)]
struct PingQuery<'a> {
    uuid: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    hours: u32,
}

/// Latency samples plus the probe tasks they belong to.
#[derive(Debug, Clone, Default)]
pub struct PingHistory {
    pub count: u64,
    pub records: Vec<PingRecordData>,
    pub tasks: Vec<PingTaskData>,
}

impl KomariClient {
    /// Load samples for one node over `window`.
    ///
    /// A missing `records` array is an empty history; a missing `data`
    /// object is an [`Error::Api`].
    pub async fn load_records(
        &self,
        uuid: &str,
        window: RecordWindow,
    ) -> Result<Vec<RecordData>, Error> {
        let url = self.api_url("/api/records/load")?;
        debug!(uuid, hours = window.hours(), "fetching load records");
        let query = [
            ("uuid", uuid.to_owned()),
            ("hours", window.hours().to_string()),
        ];

        let data = self
            .get_envelope::<LoadRecordsData>(url, &query, "Failed to fetch records")
            .await?
            .ok_or_else(|| Error::Api {
                message: "Failed to fetch records".into(),
            })?;

        Ok(data.records.unwrap_or_default())
    }

    /// Latency samples and probe tasks for one node over `window`.
    pub async fn ping_records(&self, uuid: &str, window: RecordWindow) -> Result<PingHistory, Error> {
        let params = PingQuery {
            uuid,
            kind: "ping",
            hours: window.hours(),
        };
        let data: PingRecordsData = self.call_with(METHOD_GET_RECORDS, &params).await?;
        let records = data.records.unwrap_or_default();
        Ok(PingHistory {
            count: data
                .count
                .unwrap_or_else(|| u64::try_from(records.len()).unwrap_or(u64::MAX)),
            records,
            tasks: data.tasks.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn window_labels_round_trip_through_strum() {
        for window in RecordWindow::iter() {
            assert_eq!(RecordWindow::from_str(&window.to_string()).unwrap(), window);
        }
        assert_eq!(RecordWindow::from_str("7d").unwrap().hours(), 168);
        assert!(RecordWindow::from_str("2h").is_err());
    }

    #[test]
    fn chart_window_sets() {
        let load: Vec<u32> = RecordWindow::LOAD.iter().map(|w| w.hours()).collect();
        assert_eq!(load, vec![4, 24, 168, 720]);
        let ping: Vec<u32> = RecordWindow::PING.iter().map(|w| w.hours()).collect();
        assert_eq!(ping, vec![1, 6, 12, 24]);
    }
}
