use indexmap::IndexMap;

use crate::models::search_alert::{GroupKey, SearchAlert};

/// Alerts sharing one (origin, destination, date) key, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertGroup {
    pub key: GroupKey,
    pub alerts: Vec<SearchAlert>,
}

/// Partitions alerts by group key. Groups come out in the order their key was
/// first seen and keep the relative order of their members.
pub fn group_alerts(alerts: Vec<SearchAlert>) -> Vec<AlertGroup> {
    let mut groups: IndexMap<GroupKey, Vec<SearchAlert>> = IndexMap::new();
    for alert in alerts {
        groups.entry(alert.group_key()).or_default().push(alert);
    }

    groups
        .into_iter()
        .map(|(key, alerts)| AlertGroup { key, alerts })
        .collect()
}
