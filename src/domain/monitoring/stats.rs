//! Aggregate figures: live system stats and alert counts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Last-received aggregate stats, replaced wholesale on every update.
///
/// Counters read leniently: missing, `null` or non-numeric values are
/// zero and fractional values are truncated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemStats {
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_nodes: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub online_nodes: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_processes: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub running_processes: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub stopped_processes: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub failed_processes: u64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Alert totals loaded over HTTP when the dashboard mounts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlertCounts {
    #[serde(
        default,
        alias = "count",
        alias = "Total",
        deserialize_with = "lenient::count"
    )]
    pub total: u64,

    #[serde(flatten)]
    pub by_category: Map<String, Value>,
}
