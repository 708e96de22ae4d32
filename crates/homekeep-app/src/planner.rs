// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use tracing::{debug, warn};

use crate::catalog::RegionCatalog;
use crate::completion::{MonthlyDigest, mark_completion, notification_trigger};
use crate::repository::{
    CompletionRepository, CustomTaskRepository, HouseRepository, MaintenanceLogRepository,
    OverrideRepository,
};
use crate::schedule::{ResolveInput, resolve_tasks_for_month};
use crate::{House, HouseId};

/// Everything the planner reads. Blanket-implemented for any store that
/// provides the individual repositories.
pub trait PlannerStore:
    HouseRepository
    + CustomTaskRepository
    + OverrideRepository
    + MaintenanceLogRepository
    + CompletionRepository
{
}

impl<T> PlannerStore for T where
    T: HouseRepository
        + CustomTaskRepository
        + OverrideRepository
        + MaintenanceLogRepository
        + CompletionRepository
{
}

pub struct MaintenancePlanner<'a, S> {
    catalog: &'a RegionCatalog,
    store: &'a S,
    default_region: Option<String>,
}

impl<'a, S: PlannerStore> MaintenancePlanner<'a, S> {
    pub fn new(catalog: &'a RegionCatalog, store: &'a S) -> Self {
        Self {
            catalog,
            store,
            default_region: None,
        }
    }

    /// Region used for houses whose climate zone names no catalog region.
    pub fn with_default_region(mut self, region: Option<String>) -> Self {
        self.default_region = region;
        self
    }

    /// Canonical region for a house, falling back to the default region.
    /// Returns the raw climate zone when neither resolves, which selects
    /// nothing.
    pub fn region_for(&self, house: &House) -> String {
        if let Some(region) = self.catalog.resolve_region(&house.climate_zone) {
            return region.to_owned();
        }
        if let Some(region) = self
            .default_region
            .as_deref()
            .and_then(|fallback| self.catalog.resolve_region(fallback))
        {
            debug!(
                house_id = house.id.get(),
                climate_zone = %house.climate_zone,
                region,
                "climate zone not in catalog, using default region"
            );
            return region.to_owned();
        }
        warn!(
            house_id = house.id.get(),
            climate_zone = %house.climate_zone,
            "climate zone matches no catalog region; no tasks will be scheduled"
        );
        house.climate_zone.clone()
    }

    pub fn plan_month(&self, house_id: HouseId, month: u8, year: i32) -> Result<MonthlyDigest> {
        let house = self.store.get_house(house_id)?;
        let custom_tasks = self.store.list_custom_tasks(house.homeowner_id, house.id)?;
        let overrides = self.store.list_task_overrides(house.id)?;
        let logs = self.store.list_maintenance_logs(house.id)?;
        let flags = self.store.list_completion_flags(house.id)?;

        let region = self.region_for(&house);
        let tasks = resolve_tasks_for_month(
            self.catalog,
            &ResolveInput {
                region: &region,
                month,
                installed_systems: &house.home_systems,
                custom_tasks: &custom_tasks,
                overrides: &overrides,
            },
        );
        let tasks = mark_completion(tasks, month, year, &flags, &logs);
        let completed_count = tasks.iter().filter(|planned| planned.completed).count();
        let notification = notification_trigger(&tasks);

        debug!(
            house_id = house.id.get(),
            region = %region,
            month,
            year,
            tasks = tasks.len(),
            completed = completed_count,
            "planned month"
        );

        Ok(MonthlyDigest {
            house_id: house.id,
            house_nickname: house.nickname,
            region,
            month,
            year,
            tasks,
            completed_count,
            notification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::MaintenancePlanner;
    use crate::catalog::RegionCatalog;
    use crate::completion::NotificationTrigger;
    use crate::repository::{
        CompletionRepository, CustomTaskRepository, HouseRepository, MaintenanceLogRepository,
        OverrideRepository,
    };
    use crate::{
        CompletionFlag, CompletionMethod, CustomTask, CustomTaskId, FrequencyType, HomeownerId,
        House, HouseId, MaintenanceLog, MaintenanceLogId, Priority, TaskKey, TaskOverride,
        TaskOverridePatch,
    };
    use anyhow::{Result, anyhow};
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use time::{Date, Month, OffsetDateTime};

    const CATALOG: &str = r#"
[[task]]
key = "hvac-filter"
title = "Replace HVAC filter"
description = "Swap the filter."
priority = "high"

[[task]]
key = "clean-gutters"
title = "Clean gutters"
description = "Clear the gutters."
priority = "medium"

[[region]]
name = "Midwest"
aliases = ["Great Lakes"]

[[region.month]]
month = 7
priority = "high"
seasonal = ["hvac-filter"]
weather_specific = ["clean-gutters"]
"#;

    #[derive(Default)]
    struct MemoryStore {
        houses: Vec<House>,
        custom_tasks: Vec<CustomTask>,
        overrides: RefCell<Vec<TaskOverride>>,
        logs: Vec<MaintenanceLog>,
        flags: RefCell<Vec<CompletionFlag>>,
    }

    impl HouseRepository for MemoryStore {
        fn get_house(&self, id: HouseId) -> Result<House> {
            self.houses
                .iter()
                .find(|house| house.id == id)
                .cloned()
                .ok_or_else(|| anyhow!("house {} not found", id.get()))
        }

        fn list_houses(&self) -> Result<Vec<House>> {
            Ok(self.houses.clone())
        }
    }

    impl CustomTaskRepository for MemoryStore {
        fn list_custom_tasks(
            &self,
            homeowner_id: HomeownerId,
            house_id: HouseId,
        ) -> Result<Vec<CustomTask>> {
            Ok(self
                .custom_tasks
                .iter()
                .filter(|task| task.homeowner_id == homeowner_id && task.applies_to(house_id))
                .cloned()
                .collect())
        }
    }

    impl OverrideRepository for MemoryStore {
        fn list_task_overrides(&self, house_id: HouseId) -> Result<Vec<TaskOverride>> {
            Ok(self
                .overrides
                .borrow()
                .iter()
                .filter(|found| found.house_id == house_id)
                .cloned()
                .collect())
        }

        fn upsert_task_override(
            &self,
            house_id: HouseId,
            task_key: &TaskKey,
            patch: &TaskOverridePatch,
        ) -> Result<TaskOverride> {
            let stored = TaskOverride {
                house_id,
                task_key: task_key.clone(),
                is_enabled: patch.is_enabled.unwrap_or(true),
                frequency_type: patch.frequency_type,
                specific_months: patch.specific_months.clone(),
                custom_description: patch.custom_description.clone(),
                created_at: OffsetDateTime::UNIX_EPOCH,
                updated_at: OffsetDateTime::UNIX_EPOCH,
            };
            self.delete_task_override(house_id, task_key)?;
            self.overrides.borrow_mut().push(stored.clone());
            Ok(stored)
        }

        fn delete_task_override(&self, house_id: HouseId, task_key: &TaskKey) -> Result<bool> {
            let mut overrides = self.overrides.borrow_mut();
            let before = overrides.len();
            overrides.retain(|found| !(found.house_id == house_id && &found.task_key == task_key));
            Ok(overrides.len() != before)
        }
    }

    impl MaintenanceLogRepository for MemoryStore {
        fn list_maintenance_logs(&self, house_id: HouseId) -> Result<Vec<MaintenanceLog>> {
            Ok(self
                .logs
                .iter()
                .filter(|log| log.house_id == house_id)
                .cloned()
                .collect())
        }
    }

    impl CompletionRepository for MemoryStore {
        fn list_completion_flags(&self, house_id: HouseId) -> Result<Vec<CompletionFlag>> {
            Ok(self
                .flags
                .borrow()
                .iter()
                .filter(|flag| flag.house_id == house_id)
                .cloned()
                .collect())
        }

        fn set_task_completed(
            &self,
            house_id: HouseId,
            task_key: &TaskKey,
            month: u8,
            year: i32,
            completed: bool,
        ) -> Result<()> {
            let flag = CompletionFlag {
                house_id,
                task_key: task_key.clone(),
                month,
                year,
            };
            let mut flags = self.flags.borrow_mut();
            flags.retain(|existing| existing != &flag);
            if completed {
                flags.push(flag);
            }
            Ok(())
        }
    }

    fn house(id: i64, climate_zone: &str) -> House {
        let now = OffsetDateTime::UNIX_EPOCH;
        House {
            id: HouseId::new(id),
            homeowner_id: HomeownerId::new(1),
            nickname: format!("House {id}"),
            address: String::new(),
            climate_zone: climate_zone.to_owned(),
            home_systems: BTreeSet::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn custom(id: i64, house_id: Option<i64>, title: &str) -> CustomTask {
        let now = OffsetDateTime::UNIX_EPOCH;
        CustomTask {
            id: CustomTaskId::new(id),
            homeowner_id: HomeownerId::new(1),
            house_id: house_id.map(HouseId::new),
            title: title.to_owned(),
            description: String::new(),
            action_summary: None,
            steps: Vec::new(),
            tools_and_supplies: Vec::new(),
            priority: Priority::High,
            frequency_type: FrequencyType::Monthly,
            specific_months: Vec::new(),
            is_active: true,
            cost_estimate: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore {
            houses: vec![house(1, "great_lakes"), house(2, "Atlantis")],
            custom_tasks: vec![
                custom(10, None, "Check water pressure"),
                custom(11, Some(1), "Bleed radiators"),
                custom(12, Some(2), "Rake the sand"),
            ],
            ..MemoryStore::default()
        }
    }

    #[test]
    fn plan_combines_catalog_and_custom_tasks() -> Result<()> {
        let catalog = RegionCatalog::from_toml_str(CATALOG)?;
        let store = store();
        let planner = MaintenancePlanner::new(&catalog, &store);

        let digest = planner.plan_month(HouseId::new(1), 7, 2026)?;
        assert_eq!(digest.region, "Midwest");
        let titles = digest
            .tasks
            .iter()
            .map(|planned| planned.task.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            titles,
            vec![
                "Replace HVAC filter",
                "Clean gutters",
                "Check water pressure",
                "Bleed radiators"
            ]
        );
        assert_eq!(digest.completed_count, 0);
        assert_eq!(
            digest.notification,
            NotificationTrigger::TasksDue {
                pending: 4,
                high_priority: 3
            }
        );
        Ok(())
    }

    #[test]
    fn flags_and_logs_count_as_completed() -> Result<()> {
        let catalog = RegionCatalog::from_toml_str(CATALOG)?;
        let mut store = store();
        store.logs.push(MaintenanceLog {
            id: MaintenanceLogId::new(1),
            house_id: HouseId::new(1),
            service_type: "Clean gutters".to_owned(),
            service_date: Date::from_calendar_date(2026, Month::July, 4)?,
            completion_method: Some(CompletionMethod::Contractor),
            cost_cents: Some(20_000),
            contractor_name: "Gutter Pros".to_owned(),
            notes: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            deleted_at: None,
        });
        let planner = MaintenancePlanner::new(&catalog, &store);

        for key in ["hvac-filter", "check-water-pressure", "bleed-radiators"] {
            store.set_task_completed(HouseId::new(1), &TaskKey::new(key), 7, 2026, true)?;
        }
        let digest = planner.plan_month(HouseId::new(1), 7, 2026)?;
        assert_eq!(digest.completed_count, 4);
        assert_eq!(digest.notification, NotificationTrigger::AllComplete);

        store.set_task_completed(HouseId::new(1), &TaskKey::new("hvac-filter"), 7, 2026, false)?;
        let digest = planner.plan_month(HouseId::new(1), 7, 2026)?;
        assert_eq!(digest.completed_count, 3);
        Ok(())
    }

    #[test]
    fn upsert_then_delete_override_restores_defaults() -> Result<()> {
        let catalog = RegionCatalog::from_toml_str(CATALOG)?;
        let store = store();
        let planner = MaintenancePlanner::new(&catalog, &store);
        let before = planner.plan_month(HouseId::new(1), 7, 2026)?;

        let key = TaskKey::new("clean-gutters");
        store.upsert_task_override(
            HouseId::new(1),
            &key,
            &TaskOverridePatch {
                is_enabled: Some(false),
                ..TaskOverridePatch::default()
            },
        )?;
        let hidden = planner.plan_month(HouseId::new(1), 7, 2026)?;
        assert!(
            hidden
                .tasks
                .iter()
                .all(|planned| planned.task.key != key)
        );

        assert!(store.delete_task_override(HouseId::new(1), &key)?);
        let after = planner.plan_month(HouseId::new(1), 7, 2026)?;
        assert_eq!(after, before);
        Ok(())
    }

    #[test]
    fn unknown_zone_uses_default_region_when_configured() -> Result<()> {
        let catalog = RegionCatalog::from_toml_str(CATALOG)?;
        let store = store();

        let quiet = MaintenancePlanner::new(&catalog, &store).plan_month(HouseId::new(2), 7, 2026)?;
        assert!(quiet.tasks.is_empty());
        assert_eq!(quiet.notification, NotificationTrigger::Quiet);

        let planner = MaintenancePlanner::new(&catalog, &store)
            .with_default_region(Some("midwest".to_owned()));
        let digest = planner.plan_month(HouseId::new(2), 7, 2026)?;
        assert_eq!(digest.region, "Midwest");
        let titles = digest
            .tasks
            .iter()
            .map(|planned| planned.task.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            titles,
            vec![
                "Replace HVAC filter",
                "Clean gutters",
                "Check water pressure",
                "Rake the sand"
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_house_is_an_error() -> Result<()> {
        let catalog = RegionCatalog::from_toml_str(CATALOG)?;
        let store = store();
        let error = MaintenancePlanner::new(&catalog, &store)
            .plan_month(HouseId::new(99), 7, 2026)
            .expect_err("house 99 does not exist");
        assert!(error.to_string().contains("house 99"));
        Ok(())
    }
}
