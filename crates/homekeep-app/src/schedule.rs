// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Monthly task resolution.
//!
//! Turns a region/month catalog bucket, a house's installed systems, the
//! homeowner's custom tasks and the house's overrides into the ordered list
//! of tasks to show. Nothing here performs I/O or fails: a missing region,
//! month, override or requirement only ever narrows the result.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::catalog::{CatalogTask, RegionCatalog};
use crate::estimate::enrich_cost_estimate;
use crate::requirements::infer_system_requirements;
use crate::{CostEstimate, CustomTask, CustomTaskId, FrequencyType, Priority, TaskKey, TaskOverride};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSource {
    Seasonal,
    WeatherSpecific,
    Custom(CustomTaskId),
}

impl TaskSource {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Seasonal => "seasonal",
            Self::WeatherSpecific => "weather",
            Self::Custom(_) => "custom",
        }
    }
}

/// A task as presented for one house and month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayTask {
    pub id: String,
    pub key: TaskKey,
    pub source: TaskSource,
    pub title: String,
    pub description: String,
    pub action_summary: Option<String>,
    pub steps: Vec<String>,
    pub tools_and_supplies: Vec<String>,
    pub priority: Priority,
    pub cost_estimate: Option<CostEstimate>,
    pub impact: Option<String>,
    pub impact_cost: Option<String>,
    pub climate_zones: Vec<String>,
    pub system_requirements: Option<Vec<String>>,
    /// Custom tasks: the effective recurrence. Catalog tasks: an override's
    /// stored frequency, echoed for display only.
    pub frequency_type: Option<FrequencyType>,
    pub specific_months: Vec<u8>,
    pub is_customized: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    pub region: &'a str,
    pub month: u8,
    pub installed_systems: &'a BTreeSet<String>,
    pub custom_tasks: &'a [CustomTask],
    pub overrides: &'a [TaskOverride],
}

/// Resolve the tasks due for `input.month` in `input.region`, in the order
/// seasonal, weather-specific, custom.
pub fn resolve_tasks_for_month(catalog: &RegionCatalog, input: &ResolveInput<'_>) -> Vec<DisplayTask> {
    let zones = catalog.zones();
    let region = catalog
        .resolve_region(input.region)
        .unwrap_or(input.region)
        .to_owned();

    let mut tasks = Vec::new();
    if let Some(bucket) = catalog.lookup(&region, input.month) {
        tasks.extend(bucket.seasonal.iter().enumerate().map(|(index, task)| {
            catalog_display_task(
                task,
                TaskSource::Seasonal,
                format!("seasonal-{}-{index}", input.month),
                &zones,
            )
        }));
        tasks.extend(bucket.weather_specific.iter().enumerate().map(|(index, task)| {
            catalog_display_task(
                task,
                TaskSource::WeatherSpecific,
                format!("weather-{}-{index}", input.month),
                &zones,
            )
        }));
    }
    tasks.extend(expand_custom_tasks(
        input.custom_tasks,
        input.overrides,
        input.month,
        &zones,
    ));

    tasks
        .into_iter()
        .filter(|task| is_visible(task, &region, input.installed_systems))
        .filter_map(|task| apply_override(task, input.overrides))
        .collect()
}

/// Active custom tasks whose recurrence falls in `month`. A frequency
/// override stored under the task's key replaces the task's own recurrence.
pub fn expand_custom_tasks(
    custom_tasks: &[CustomTask],
    overrides: &[TaskOverride],
    month: u8,
    zones: &[String],
) -> Vec<DisplayTask> {
    custom_tasks
        .iter()
        .filter(|task| task.is_active)
        .filter_map(|task| {
            let key = task.key();
            let (frequency, specific_months) = match find_override(overrides, &key, &task.title)
                .and_then(|found| found.frequency_type.map(|f| (f, &found.specific_months)))
            {
                Some((frequency, months)) => (frequency, months.clone()),
                None => (task.frequency_type, task.specific_months.clone()),
            };
            if !frequency.includes_month(month, &specific_months) {
                return None;
            }
            Some(DisplayTask {
                id: format!("custom-{}", task.id.get()),
                key,
                source: TaskSource::Custom(task.id),
                title: task.title.clone(),
                description: task.description.clone(),
                action_summary: task.action_summary.clone(),
                steps: task.steps.clone(),
                tools_and_supplies: task.tools_and_supplies.clone(),
                priority: task.priority,
                cost_estimate: task.cost_estimate,
                impact: None,
                impact_cost: None,
                climate_zones: zones.to_vec(),
                system_requirements: None,
                frequency_type: Some(frequency),
                specific_months,
                is_customized: false,
            })
        })
        .collect()
}

/// Merge the override stored for `task`, if any. Returns `None` when the
/// override disables the task.
pub fn apply_override(mut task: DisplayTask, overrides: &[TaskOverride]) -> Option<DisplayTask> {
    let Some(found) = find_override(overrides, &task.key, &task.title) else {
        return Some(task);
    };
    if !found.is_enabled {
        return None;
    }
    if let Some(description) = &found.custom_description {
        task.description = description.clone();
    }
    if let Some(frequency) = found.frequency_type {
        task.frequency_type = Some(frequency);
        task.specific_months = found.specific_months.clone();
    }
    task.is_customized = true;
    Some(task)
}

/// A task is shown when its zones include the region and, if it needs any
/// home system, the house has at least one of them.
pub fn is_visible(task: &DisplayTask, region: &str, installed_systems: &BTreeSet<String>) -> bool {
    if !task.climate_zones.iter().any(|zone| zone == region) {
        return false;
    }
    match &task.system_requirements {
        None => true,
        Some(required) => required.iter().any(|tag| installed_systems.contains(tag)),
    }
}

fn find_override<'a>(
    overrides: &'a [TaskOverride],
    key: &TaskKey,
    title: &str,
) -> Option<&'a TaskOverride> {
    // An exact key match beats a legacy slug match when both exist.
    overrides
        .iter()
        .find(|found| &found.task_key == key)
        .or_else(|| overrides.iter().find(|found| key.matches(&found.task_key, title)))
}

fn catalog_display_task(
    task: &CatalogTask,
    source: TaskSource,
    id: String,
    zones: &[String],
) -> DisplayTask {
    DisplayTask {
        id,
        key: task.key.clone(),
        source,
        title: task.title.clone(),
        description: task.description.clone(),
        action_summary: task.action_summary.clone(),
        steps: task.steps.clone(),
        tools_and_supplies: task.tools_and_supplies.clone(),
        priority: task.priority,
        cost_estimate: enrich_cost_estimate(&task.title, task.cost_estimate),
        impact: task.impact.clone(),
        impact_cost: task.impact_cost.clone(),
        climate_zones: zones.to_vec(),
        system_requirements: infer_system_requirements(&task.title),
        frequency_type: None,
        specific_months: Vec::new(),
        is_customized: false,
    }
}
