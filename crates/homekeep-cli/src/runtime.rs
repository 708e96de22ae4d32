// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use homekeep_app::{
    Appliance, CompletionRepository, FormPayload, HouseId, HouseRepository, MaintenancePlanner,
    MonthlyDigest, OverrideRepository, RegionCatalog, TaskKey,
};
use homekeep_db::Store;
use homekeep_db::validation::{format_cents_range, format_date, month_name};
use std::fmt::Write as _;
use time::Date;
use tracing::info;

/// Days before and after today that count as "expiring soon".
const WARRANTY_LOOK_BACK_DAYS: i64 = 30;
const WARRANTY_HORIZON_DAYS: i64 = 90;

pub struct DbRuntime<'a> {
    store: &'a Store,
    catalog: &'a RegionCatalog,
    default_region: Option<String>,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store, catalog: &'a RegionCatalog, default_region: Option<String>) -> Self {
        Self {
            store,
            catalog,
            default_region,
        }
    }

    /// The requested house, or the first live one.
    pub fn resolve_house(&self, requested: Option<HouseId>) -> Result<HouseId> {
        if let Some(house_id) = requested {
            return Ok(self.store.get_house(house_id)?.id);
        }
        self.store
            .list_houses()?
            .first()
            .map(|house| house.id)
            .context("no houses in the database -- add one, or run with --demo to try sample data")
    }

    pub fn plan(&self, house_id: HouseId, month: u8, year: i32) -> Result<MonthlyDigest> {
        MaintenancePlanner::new(self.catalog, self.store)
            .with_default_region(self.default_region.clone())
            .plan_month(house_id, month, year)
    }

    /// Flags are written under the catalog key; reopening also clears one
    /// written under the legacy title slug.
    pub fn set_completed(
        &self,
        house_id: HouseId,
        task_key: &TaskKey,
        month: u8,
        year: i32,
        completed: bool,
    ) -> Result<()> {
        let found = self.catalog.find_task(task_key);
        let key = found.map_or(task_key, |task| &task.key);
        if completed {
            return self
                .store
                .set_task_completed(house_id, key, month, year, true);
        }
        self.store.reopen_task(
            house_id,
            key,
            found.map(|task| task.title.as_str()),
            month,
            year,
        )
    }

    /// Clear an override so the task goes back to catalog defaults.
    pub fn reset_override(&self, house_id: HouseId, task_key: &TaskKey) -> Result<bool> {
        let found = self.catalog.find_task(task_key);
        self.store.reset_task_override(
            house_id,
            found.map_or(task_key, |task| &task.key),
            found.map(|task| task.title.as_str()),
        )
    }

    pub fn expiring_warranties(&self, house_id: HouseId, today: Date) -> Result<Vec<Appliance>> {
        self.store.list_expiring_warranties(
            house_id,
            today,
            WARRANTY_LOOK_BACK_DAYS,
            WARRANTY_HORIZON_DAYS,
        )
    }

    pub fn submit_form(&self, payload: &FormPayload) -> Result<()> {
        payload.validate()?;

        match payload {
            FormPayload::House(form) => {
                self.store.create_house(form)?;
            }
            FormPayload::CustomTask(form) => {
                self.store.create_custom_task(form)?;
            }
            FormPayload::TaskOverride(form) => {
                self.store
                    .upsert_task_override(form.house_id, &form.task_key, &form.to_patch())?;
            }
            FormPayload::MaintenanceLog(form) => {
                self.store.create_maintenance_log(form)?;
            }
            FormPayload::Appliance(form) => {
                self.store.create_appliance(form)?;
            }
        }
        info!(kind = ?payload.kind(), "saved form");
        Ok(())
    }
}

/// True when `key` names a task in the digest, by key or legacy title slug.
pub fn digest_has_task(digest: &MonthlyDigest, key: &TaskKey) -> bool {
    digest
        .tasks
        .iter()
        .any(|planned| planned.task.key.matches(key, &planned.task.title))
}

pub fn render_digest(digest: &MonthlyDigest) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}) -- {} {}",
        digest.house_nickname,
        digest.region,
        month_name(digest.month),
        digest.year
    );

    if digest.tasks.is_empty() {
        let _ = writeln!(out, "  No maintenance scheduled.");
    }
    for planned in &digest.tasks {
        let task = &planned.task;
        let mark = if planned.completed { "x" } else { " " };
        let _ = write!(
            out,
            "  [{mark}] {:<6} {:<8} {}",
            task.priority.as_str(),
            task.source.label(),
            task.title
        );
        if task.is_customized {
            out.push_str(" *");
        }
        out.push('\n');
        let _ = writeln!(out, "      key: {}", task.key);
        if let Some(estimate) = &task.cost_estimate {
            let _ = writeln!(
                out,
                "      pro {} / diy {}",
                format_cents_range(estimate.pro_low_cents, estimate.pro_high_cents),
                format_cents_range(estimate.materials_low_cents, estimate.materials_high_cents),
            );
        }
    }

    let _ = writeln!(
        out,
        "{}/{} complete -- {}",
        digest.completed_count,
        digest.tasks.len(),
        digest.notification.describe()
    );
    out
}

pub fn render_warranties(appliances: &[Appliance]) -> String {
    let mut out = String::new();
    if appliances.is_empty() {
        return out;
    }
    let _ = writeln!(out, "Warranties ending soon:");
    for appliance in appliances {
        let _ = writeln!(
            out,
            "  {} ({}) -- {}",
            appliance.name,
            if appliance.location.is_empty() {
                "no location"
            } else {
                appliance.location.as_str()
            },
            format_date(appliance.warranty_expiry)
        );
    }
    out
}

pub fn render_json(digest: &MonthlyDigest) -> Result<String> {
    serde_json::to_string_pretty(digest).context("encode digest as JSON")
}
