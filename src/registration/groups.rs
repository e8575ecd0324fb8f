//! Group allocation
//!
//! Users are placed with a first-fit policy: the earliest group in
//! configuration order that still has room.

use std::collections::HashMap;

use serde::Serialize;

/// Load of a single group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLoad {
    pub group_id: String,
    pub count: usize,
    pub capacity: usize,
    /// `count / capacity` as a rounded percentage
    pub percentage: u32,
}

/// Fixed set of equally sized groups
#[derive(Debug, Clone)]
pub struct GroupAllocator {
    group_ids: Vec<String>,
    users_per_group: usize,
}

impl GroupAllocator {
    pub fn new(group_ids: Vec<String>, users_per_group: usize) -> Self {
        Self {
            group_ids,
            users_per_group,
        }
    }

    pub fn group_ids(&self) -> &[String] {
        &self.group_ids
    }

    pub fn users_per_group(&self) -> usize {
        self.users_per_group
    }

    /// Total number of users all groups can hold
    pub fn total_capacity(&self) -> usize {
        self.group_ids.len() * self.users_per_group
    }

    /// Pick the first group under capacity, or `None` when all are full
    pub fn assign<'a>(&'a self, counts: &HashMap<String, usize>) -> Option<&'a str> {
        self.group_ids
            .iter()
            .find(|id| counts.get(id.as_str()).copied().unwrap_or(0) < self.users_per_group)
            .map(|id| id.as_str())
    }

    /// Align `counts` with the configured groups: new groups start at zero,
    /// groups no longer configured are dropped
    pub fn reconcile(&self, counts: &mut HashMap<String, usize>) {
        counts.retain(|id, _| self.group_ids.contains(id));
        for id in &self.group_ids {
            counts.entry(id.clone()).or_insert(0);
        }
    }

    /// Per-group load in configuration order
    pub fn distribution(&self, counts: &HashMap<String, usize>) -> Vec<GroupLoad> {
        self.group_ids
            .iter()
            .map(|id| {
                let count = counts.get(id).copied().unwrap_or(0);
                GroupLoad {
                    group_id: id.clone(),
                    count,
                    capacity: self.users_per_group,
                    percentage: percentage(count, self.users_per_group),
                }
            })
            .collect()
    }
}

fn percentage(count: usize, capacity: usize) -> u32 {
    if capacity == 0 {
        return 0;
    }
    ((count * 100 + capacity / 2) / capacity) as u32
}
