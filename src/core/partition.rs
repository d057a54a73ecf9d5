use crate::domain::model::{Directory, RawRecord};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// A row goes to every agent whose territory contains its location.
    Allow,
    /// A row goes only to the first matching agent in selection order.
    FirstMatch,
}

impl OverlapPolicy {
    pub fn from_allow_overlap(allow: bool) -> Self {
        if allow {
            OverlapPolicy::Allow
        } else {
            OverlapPolicy::FirstMatch
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentRows {
    pub agent: String,
    pub rows: Vec<RawRecord>,
}

#[derive(Debug, Default)]
pub struct Partitioned {
    pub buckets: Vec<AgentRows>,
    /// Selected names that are not in the directory.
    pub unknown_agents: Vec<String>,
    /// Rows whose location matched more than one selected agent.
    pub overlapping_rows: usize,
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Split `rows` into per-agent buckets by the location cell at `column`.
///
/// `selection` of `None` means every agent in directory order. Buckets come
/// back in selection order and may be empty.
pub fn partition(
    rows: &[RawRecord],
    directory: &Directory,
    selection: Option<&[String]>,
    column: usize,
    policy: OverlapPolicy,
) -> Partitioned {
    let mut result = Partitioned::default();

    let selected: Vec<String> = match selection {
        Some(names) => names.to_vec(),
        None => directory.names(),
    };

    let mut territories: Vec<(String, HashSet<String>)> = Vec::with_capacity(selected.len());
    for name in selected {
        match directory.get(&name) {
            Some(agent) => {
                if territories.iter().any(|(existing, _)| *existing == name) {
                    continue;
                }
                let locations = agent.locations.iter().map(|l| fold(l)).collect();
                territories.push((name, locations));
            }
            None => {
                tracing::warn!("⚠️ Agent '{}' is not in the directory, skipping", name);
                result.unknown_agents.push(name);
            }
        }
    }

    let mut buckets: Vec<Vec<RawRecord>> = vec![Vec::new(); territories.len()];

    for row in rows {
        let Some(location) = row.cell(column).map(fold) else {
            continue;
        };

        let mut matches = 0;
        for (slot, (_, locations)) in territories.iter().enumerate() {
            if !locations.contains(&location) {
                continue;
            }
            matches += 1;
            if matches == 1 || policy == OverlapPolicy::Allow {
                buckets[slot].push(row.clone());
            }
        }

        if matches > 1 {
            result.overlapping_rows += 1;
        }
    }

    if result.overlapping_rows > 0 {
        tracing::info!(
            "🔀 {} rows matched more than one agent ({:?})",
            result.overlapping_rows,
            policy
        );
    }

    result.buckets = territories
        .into_iter()
        .zip(buckets)
        .map(|((agent, _), rows)| AgentRows { agent, rows })
        .collect();

    result
}
