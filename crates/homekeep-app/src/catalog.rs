// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Region/month maintenance catalog.
//!
//! The catalog is reference data: a library of tasks with explicit keys and,
//! per region, twelve month buckets naming which tasks are seasonal and which
//! respond to that month's weather. It is parsed once and then borrowed.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::{CostEstimate, Priority, TaskKey};

const BUILTIN_CATALOG: &str = include_str!("catalog.toml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogTask {
    pub key: TaskKey,
    pub title: String,
    pub description: String,
    pub action_summary: Option<String>,
    pub steps: Vec<String>,
    pub tools_and_supplies: Vec<String>,
    pub priority: Priority,
    pub cost_estimate: Option<CostEstimate>,
    pub impact: Option<String>,
    pub impact_cost: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub seasonal: Vec<CatalogTask>,
    pub weather_specific: Vec<CatalogTask>,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Region {
    name: String,
    aliases: Vec<String>,
    months: BTreeMap<u8, MonthBucket>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG).context("parse built-in maintenance catalog")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read catalog file {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parse catalog {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let document: RawCatalog = toml::from_str(raw).context("decode catalog TOML")?;

        let mut library = BTreeMap::new();
        for task in document.task {
            let task = task.into_catalog_task()?;
            let key = task.key.clone();
            if library.insert(key.clone(), task).is_some() {
                bail!("catalog task key `{key}` is defined more than once");
            }
        }

        let mut seen_regions = BTreeSet::new();
        let mut regions = Vec::with_capacity(document.region.len());
        for raw_region in document.region {
            if raw_region.name.trim().is_empty() {
                bail!("catalog region name must not be empty");
            }
            if !seen_regions.insert(region_lookup_key(&raw_region.name)) {
                bail!("catalog region `{}` is defined more than once", raw_region.name);
            }

            let mut months = BTreeMap::new();
            for raw_month in raw_region.month {
                if !(1..=12).contains(&raw_month.month) {
                    bail!(
                        "region `{}` has month {}; months must be 1-12",
                        raw_region.name,
                        raw_month.month
                    );
                }
                let bucket = MonthBucket {
                    seasonal: resolve_refs(&library, &raw_region.name, &raw_month.seasonal)?,
                    weather_specific: resolve_refs(
                        &library,
                        &raw_region.name,
                        &raw_month.weather_specific,
                    )?,
                    priority: raw_month.priority,
                };
                if months.insert(raw_month.month, bucket).is_some() {
                    bail!(
                        "region `{}` defines month {} more than once",
                        raw_region.name,
                        raw_month.month
                    );
                }
            }

            regions.push(Region {
                name: raw_region.name,
                aliases: raw_region.aliases,
                months,
            });
        }

        Ok(Self { regions })
    }

    /// Canonical region names in catalog order. Every catalog task applies to
    /// all of them.
    pub fn zones(&self) -> Vec<String> {
        self.regions.iter().map(|region| region.name.clone()).collect()
    }

    /// Map free-text climate zone input ("pacific_northwest", "PNW",
    /// "Pacific Northwest") to the canonical region name.
    pub fn resolve_region(&self, input: &str) -> Option<&str> {
        self.find_region(input).map(|region| region.name.as_str())
    }

    pub fn lookup(&self, region: &str, month: u8) -> Option<&MonthBucket> {
        self.find_region(region)?.months.get(&month)
    }

    pub fn task_count(&self) -> usize {
        self.regions
            .iter()
            .flat_map(|region| region.months.values())
            .map(|bucket| bucket.seasonal.len() + bucket.weather_specific.len())
            .sum()
    }

    /// The catalog task known as `key` in any region or month, by explicit
    /// key first and then by legacy title slug.
    pub fn find_task(&self, key: &TaskKey) -> Option<&CatalogTask> {
        self.tasks()
            .find(|task| &task.key == key)
            .or_else(|| self.tasks().find(|task| task.key.matches(key, &task.title)))
    }

    fn tasks(&self) -> impl Iterator<Item = &CatalogTask> {
        self.regions
            .iter()
            .flat_map(|region| region.months.values())
            .flat_map(|bucket| bucket.seasonal.iter().chain(&bucket.weather_specific))
    }

    fn find_region(&self, input: &str) -> Option<&Region> {
        let wanted = region_lookup_key(input);
        if wanted.is_empty() {
            return None;
        }
        self.regions.iter().find(|region| {
            region_lookup_key(&region.name) == wanted
                || region
                    .aliases
                    .iter()
                    .any(|alias| region_lookup_key(alias) == wanted)
        })
    }
}

fn region_lookup_key(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

fn resolve_refs(
    library: &BTreeMap<TaskKey, CatalogTask>,
    region: &str,
    keys: &[String],
) -> Result<Vec<CatalogTask>> {
    keys.iter()
        .map(|key| {
            library.get(&TaskKey::new(key.as_str())).cloned().ok_or_else(|| {
                anyhow::anyhow!("region `{region}` references unknown catalog task `{key}`")
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCatalog {
    #[serde(default)]
    task: Vec<RawTask>,
    #[serde(default)]
    region: Vec<RawRegion>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTask {
    key: Option<String>,
    title: String,
    description: String,
    action_summary: Option<String>,
    #[serde(default)]
    steps: Vec<String>,
    #[serde(default)]
    tools_and_supplies: Vec<String>,
    priority: Priority,
    cost: Option<RawCost>,
    impact: Option<String>,
    impact_cost: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCost {
    pro: [i64; 2],
    materials: [i64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRegion {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    month: Vec<RawMonth>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMonth {
    month: u8,
    priority: Priority,
    #[serde(default)]
    seasonal: Vec<String>,
    #[serde(default)]
    weather_specific: Vec<String>,
}

impl RawTask {
    fn into_catalog_task(self) -> Result<CatalogTask> {
        if self.title.trim().is_empty() {
            bail!("catalog task title must not be empty");
        }
        // Entries without an explicit key keep the legacy title-slug identity.
        let key = match self.key {
            Some(key) if !key.trim().is_empty() => TaskKey::new(key.trim()),
            _ => TaskKey::from_title(&self.title),
        };
        let cost_estimate = match self.cost {
            Some(cost) => {
                if cost.pro.iter().chain(&cost.materials).any(|dollars| *dollars < 0) {
                    bail!("catalog task `{key}` has a negative cost -- use amounts of 0 or more");
                }
                if cost.pro[0] > cost.pro[1] || cost.materials[0] > cost.materials[1] {
                    bail!("catalog task `{key}` has a cost range whose low end exceeds its high end");
                }
                let estimate = CostEstimate::checked_from_dollars(
                    (cost.pro[0], cost.pro[1]),
                    (cost.materials[0], cost.materials[1]),
                )
                .with_context(|| format!("catalog task `{key}` cost"))?;
                Some(estimate)
            }
            None => None,
        };
        Ok(CatalogTask {
            key,
            title: self.title,
            description: self.description,
            action_summary: self.action_summary,
            steps: self.steps,
            tools_and_supplies: self.tools_and_supplies,
            priority: self.priority,
            cost_estimate,
            impact: self.impact,
            impact_cost: self.impact_cost,
        })
    }
}
