//! Merges per-ecosystem connectors into one entry per wallet.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::traits::RecentWallets;
use crate::types::{AdapterKind, Connector};

/// A wallet identity merged across the ecosystems it supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedConnector {
    /// Display name of the first connector seen for this wallet.
    pub name: String,
    pub icon: Option<String>,
    /// Deduplicated kinds, in first-seen order.
    pub adapters: Vec<AdapterKind>,
    pub connectors: Vec<Connector>,
}

impl GroupedConnector {
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn is_multi_adapter(&self) -> bool {
        self.adapters.len() > 1
    }

    pub fn supports(&self, kind: AdapterKind) -> bool {
        self.adapters.contains(&kind)
    }

    /// Connector to use when connecting through `kind`.
    pub fn connector_for(&self, kind: AdapterKind) -> Option<&Connector> {
        self.connectors.iter().find(|connector| connector.adapter == kind)
    }
}

/// Case and whitespace insensitive grouping key.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Groups connectors by normalized wallet name, keeping first-seen order.
pub fn group(connectors: &[Connector]) -> Vec<GroupedConnector> {
    let mut groups: Vec<GroupedConnector> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for connector in connectors {
        let key = normalize_name(&connector.name);
        match index.get(&key) {
            Some(&position) => {
                let group = &mut groups[position];
                if !group.adapters.contains(&connector.adapter) {
                    group.adapters.push(connector.adapter);
                }
                if group.icon.is_none() {
                    group.icon = connector.icon.clone();
                }
                group.connectors.push(connector.clone());
            }
            None => {
                index.insert(key, groups.len());
                groups.push(GroupedConnector {
                    name: connector.name.clone(),
                    icon: connector.icon.clone(),
                    adapters: vec![connector.adapter],
                    connectors: vec![connector.clone()],
                });
            }
        }
    }

    groups
}

/// Groups a store's per-kind connector map, walking kinds in declaration order.
pub fn group_by_kind(connectors: &HashMap<AdapterKind, Vec<Connector>>) -> Vec<GroupedConnector> {
    let flattened: Vec<Connector> = AdapterKind::ALL
        .iter()
        .filter_map(|kind| connectors.get(kind))
        .flatten()
        .cloned()
        .collect();
    group(&flattened)
}

/// Keeps only wallets offering `kind`, for a pre-selected network tab.
pub fn filter_by_adapter(groups: Vec<GroupedConnector>, kind: AdapterKind) -> Vec<GroupedConnector> {
    groups.into_iter().filter(|group| group.supports(kind)).collect()
}

/// Moves recently used wallets to the front.
///
/// Time-ordered data ranks wallets by recency; the per-kind map shape only
/// says "used", so those wallets keep their relative order.
pub fn order_by_recent(groups: Vec<GroupedConnector>, recent: Option<&RecentWallets>) -> Vec<GroupedConnector> {
    let ranks: HashMap<String, usize> = match recent {
        None => return groups,
        Some(RecentWallets::ByKind(by_kind)) => {
            let used: HashSet<String> = by_kind
                .values()
                .flat_map(|wallets| wallets.iter())
                .filter(|(_, used)| **used)
                .map(|(name, _)| normalize_name(name))
                .collect();
            used.into_iter().map(|name| (name, 0)).collect()
        }
        Some(RecentWallets::Ordered(wallets)) => {
            let mut ranks = HashMap::new();
            for (rank, wallet) in wallets.iter().enumerate() {
                ranks.entry(normalize_name(&wallet.name)).or_insert(rank);
            }
            ranks
        }
    };

    let (mut recent_groups, rest): (Vec<_>, Vec<_>) = groups
        .into_iter()
        .partition(|group| ranks.contains_key(&group.normalized_name()));
    recent_groups.sort_by_key(|group| ranks.get(&group.normalized_name()).copied().unwrap_or(usize::MAX));
    recent_groups.extend(rest);
    recent_groups
}
