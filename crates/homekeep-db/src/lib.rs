// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod validation;

use anyhow::{Context, Result, anyhow, bail};
use homekeep_app::{
    Appliance, ApplianceFormInput, ApplianceId, CompletionFlag, CompletionMethod,
    CompletionRepository, CostEstimate, CustomTask, CustomTaskFormInput, CustomTaskId,
    CustomTaskRepository, FrequencyType, HomeownerId, House, HouseFormInput, HouseId,
    HouseRepository, MaintenanceLog, MaintenanceLogFormInput, MaintenanceLogId,
    MaintenanceLogRepository, OverrideRepository, Priority, TaskKey, TaskOverride,
    TaskOverrideFormInput, TaskOverridePatch,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info};

use crate::validation::{format_month_list, parse_month_list};

pub const APP_NAME: &str = "homekeep";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "houses",
        &[
            "id",
            "homeowner_id",
            "nickname",
            "address",
            "climate_zone",
            "created_at",
            "updated_at",
            "deleted_at",
        ],
    ),
    ("house_systems", &["house_id", "system_type"]),
    (
        "custom_tasks",
        &[
            "id",
            "homeowner_id",
            "house_id",
            "title",
            "description",
            "action_summary",
            "steps",
            "tools_and_supplies",
            "priority",
            "frequency_type",
            "specific_months",
            "is_active",
            "pro_low_cents",
            "pro_high_cents",
            "materials_low_cents",
            "materials_high_cents",
            "created_at",
            "updated_at",
            "deleted_at",
        ],
    ),
    (
        "task_overrides",
        &[
            "id",
            "house_id",
            "task_key",
            "is_enabled",
            "frequency_type",
            "specific_months",
            "custom_description",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "maintenance_logs",
        &[
            "id",
            "house_id",
            "service_type",
            "service_date",
            "completion_method",
            "cost_cents",
            "contractor_name",
            "notes",
            "created_at",
            "updated_at",
            "deleted_at",
        ],
    ),
    (
        "appliances",
        &[
            "id",
            "house_id",
            "name",
            "warranty_expiry",
            "created_at",
            "updated_at",
            "deleted_at",
        ],
    ),
    (
        "task_completions",
        &["house_id", "task_key", "month", "year", "completed_at"],
    ),
    (
        "deletion_records",
        &["id", "entity", "target_id", "deleted_at", "restored_at"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_houses_homeowner_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_houses_homeowner_id ON houses (homeowner_id);",
    },
    RequiredIndex {
        name: "idx_houses_deleted_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_houses_deleted_at ON houses (deleted_at);",
    },
    RequiredIndex {
        name: "idx_custom_tasks_owner_house",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_custom_tasks_owner_house ON custom_tasks (homeowner_id, house_id);",
    },
    RequiredIndex {
        name: "idx_custom_tasks_deleted_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_custom_tasks_deleted_at ON custom_tasks (deleted_at);",
    },
    RequiredIndex {
        name: "idx_task_overrides_house_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_task_overrides_house_id ON task_overrides (house_id);",
    },
    RequiredIndex {
        name: "idx_maintenance_logs_house_date",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_maintenance_logs_house_date ON maintenance_logs (house_id, service_date);",
    },
    RequiredIndex {
        name: "idx_maintenance_logs_deleted_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_maintenance_logs_deleted_at ON maintenance_logs (deleted_at);",
    },
    RequiredIndex {
        name: "idx_appliances_house_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_appliances_house_id ON appliances (house_id);",
    },
    RequiredIndex {
        name: "idx_appliances_warranty_expiry",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_appliances_warranty_expiry ON appliances (warranty_expiry);",
    },
    RequiredIndex {
        name: "idx_appliances_deleted_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_appliances_deleted_at ON appliances (deleted_at);",
    },
    RequiredIndex {
        name: "idx_deletion_records_entity",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_deletion_records_entity ON deletion_records (entity);",
    },
    RequiredIndex {
        name: "idx_entity_restored",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_entity_restored ON deletion_records (entity, restored_at);",
    },
];

const HOUSE_COLUMNS: &str = "
    id, homeowner_id, nickname, address, climate_zone,
    created_at, updated_at, deleted_at
";

const CUSTOM_TASK_COLUMNS: &str = "
    id, homeowner_id, house_id, title, description, action_summary,
    steps, tools_and_supplies, priority, frequency_type, specific_months,
    is_active, pro_low_cents, pro_high_cents, materials_low_cents,
    materials_high_cents, created_at, updated_at, deleted_at
";

const OVERRIDE_COLUMNS: &str = "
    house_id, task_key, is_enabled, frequency_type, specific_months,
    custom_description, created_at, updated_at
";

const LOG_COLUMNS: &str = "
    id, house_id, service_type, service_date, completion_method,
    cost_cents, contractor_name, notes, created_at, updated_at, deleted_at
";

const APPLIANCE_COLUMNS: &str = "
    id, house_id, name, brand, model_number, serial_number,
    purchase_date, warranty_expiry, location, cost_cents, notes,
    created_at, updated_at, deleted_at
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEntityRef {
    House(HouseId),
    CustomTask(CustomTaskId),
    MaintenanceLog(MaintenanceLogId),
    Appliance(ApplianceId),
}

impl LifecycleEntityRef {
    const fn table(self) -> &'static str {
        match self {
            Self::House(_) => "houses",
            Self::CustomTask(_) => "custom_tasks",
            Self::MaintenanceLog(_) => "maintenance_logs",
            Self::Appliance(_) => "appliances",
        }
    }

    const fn deleted_tag(self) -> &'static str {
        match self {
            Self::House(_) => "house",
            Self::CustomTask(_) => "custom_task",
            Self::MaintenanceLog(_) => "maintenance_log",
            Self::Appliance(_) => "appliance",
        }
    }

    const fn id(self) -> i64 {
        match self {
            Self::House(id) => id.get(),
            Self::CustomTask(id) => id.get(),
            Self::MaintenanceLog(id) => id.get(),
            Self::Appliance(id) => id.get(),
        }
    }
}

/// Live rows that keep a house from being deleted: (table, label).
const HOUSE_DEPENDENTS: [(&str, &str); 3] = [
    ("custom_tasks", "custom task(s)"),
    ("maintenance_logs", "maintenance log(s)"),
    ("appliances", "appliance(s)"),
];

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            info!("created database schema");
        }

        ensure_required_indexes(&self.conn)?;
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, error)| error)
            .context("close database")
    }

    pub fn create_house(&self, house: &HouseFormInput) -> Result<HouseId> {
        house.validate()?;
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO houses (
                  homeowner_id, nickname, address, climate_zone, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?)
                ",
                params![
                    house.homeowner_id.get(),
                    house.nickname.trim(),
                    house.address,
                    house.climate_zone.trim(),
                    now,
                    now,
                ],
            )
            .context("insert house")?;
        let house_id = HouseId::new(self.conn.last_insert_rowid());
        self.replace_house_systems(house_id, &house.home_systems)?;
        Ok(house_id)
    }

    pub fn update_house(&self, house_id: HouseId, house: &HouseFormInput) -> Result<()> {
        house.validate()?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE houses
                SET
                  homeowner_id = ?,
                  nickname = ?,
                  address = ?,
                  climate_zone = ?,
                  updated_at = ?
                WHERE id = ? AND deleted_at IS NULL
                ",
                params![
                    house.homeowner_id.get(),
                    house.nickname.trim(),
                    house.address,
                    house.climate_zone.trim(),
                    now,
                    house_id.get(),
                ],
            )
            .context("update house")?;
        if rows_affected == 0 {
            bail!(
                "house {} not found or deleted -- choose an existing house and retry",
                house_id.get()
            );
        }
        self.replace_house_systems(house_id, &house.home_systems)
    }

    pub fn list_all_houses(&self, include_deleted: bool) -> Result<Vec<House>> {
        let mut sql = format!("SELECT {HOUSE_COLUMNS} FROM houses\n");
        if !include_deleted {
            sql.push_str("WHERE deleted_at IS NULL\n");
        }
        sql.push_str("ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql).context("prepare houses query")?;
        let rows = stmt
            .query_map([], house_from_row)
            .context("query houses")?;
        let mut houses = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect houses")?;
        for house in &mut houses {
            house.home_systems = self.load_house_systems(house.id)?;
        }
        Ok(houses)
    }

    pub fn soft_delete(&self, target: LifecycleEntityRef) -> Result<()> {
        self.ensure_can_soft_delete(target)?;
        self.soft_delete_entity(target)
    }

    pub fn restore(&self, target: LifecycleEntityRef) -> Result<()> {
        self.ensure_can_restore(target)?;
        self.restore_entity(target)
    }

    pub fn soft_delete_house(&self, house_id: HouseId) -> Result<()> {
        self.soft_delete(LifecycleEntityRef::House(house_id))
    }

    pub fn restore_house(&self, house_id: HouseId) -> Result<()> {
        self.restore(LifecycleEntityRef::House(house_id))
    }

    pub fn create_custom_task(&self, task: &CustomTaskFormInput) -> Result<CustomTaskId> {
        task.validate()?;
        if let Some(house_id) = task.house_id {
            self.require_house_alive(house_id)?;
        }
        let now = now_rfc3339()?;
        let estimate = split_estimate(task.cost_estimate);
        self.conn
            .execute(
                "
                INSERT INTO custom_tasks (
                  homeowner_id, house_id, title, description, action_summary,
                  steps, tools_and_supplies, priority, frequency_type, specific_months,
                  is_active, pro_low_cents, pro_high_cents, materials_low_cents,
                  materials_high_cents, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    task.homeowner_id.get(),
                    task.house_id.map(HouseId::get),
                    task.title.trim(),
                    task.description,
                    task.action_summary,
                    encode_list(&task.steps)?,
                    encode_list(&task.tools_and_supplies)?,
                    task.priority.as_str(),
                    task.frequency_type.as_str(),
                    format_month_list(&task.specific_months),
                    task.is_active,
                    estimate[0],
                    estimate[1],
                    estimate[2],
                    estimate[3],
                    now,
                    now,
                ],
            )
            .context("insert custom task")?;
        Ok(CustomTaskId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_custom_task(
        &self,
        task_id: CustomTaskId,
        task: &CustomTaskFormInput,
    ) -> Result<()> {
        task.validate()?;
        if let Some(house_id) = task.house_id {
            self.require_house_alive(house_id)?;
        }
        let now = now_rfc3339()?;
        let estimate = split_estimate(task.cost_estimate);
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE custom_tasks
                SET
                  homeowner_id = ?,
                  house_id = ?,
                  title = ?,
                  description = ?,
                  action_summary = ?,
                  steps = ?,
                  tools_and_supplies = ?,
                  priority = ?,
                  frequency_type = ?,
                  specific_months = ?,
                  is_active = ?,
                  pro_low_cents = ?,
                  pro_high_cents = ?,
                  materials_low_cents = ?,
                  materials_high_cents = ?,
                  updated_at = ?
                WHERE id = ? AND deleted_at IS NULL
                ",
                params![
                    task.homeowner_id.get(),
                    task.house_id.map(HouseId::get),
                    task.title.trim(),
                    task.description,
                    task.action_summary,
                    encode_list(&task.steps)?,
                    encode_list(&task.tools_and_supplies)?,
                    task.priority.as_str(),
                    task.frequency_type.as_str(),
                    format_month_list(&task.specific_months),
                    task.is_active,
                    estimate[0],
                    estimate[1],
                    estimate[2],
                    estimate[3],
                    now,
                    task_id.get(),
                ],
            )
            .context("update custom task")?;
        if rows_affected == 0 {
            bail!(
                "custom task {} not found or deleted -- choose an existing task and retry",
                task_id.get()
            );
        }
        Ok(())
    }

    pub fn get_custom_task(&self, task_id: CustomTaskId) -> Result<CustomTask> {
        self.conn
            .query_row(
                &format!("SELECT {CUSTOM_TASK_COLUMNS} FROM custom_tasks WHERE id = ?"),
                params![task_id.get()],
                custom_task_from_row,
            )
            .with_context(|| format!("load custom task {}", task_id.get()))
    }

    /// Custom tasks visible to `house_id`, optionally including deleted rows.
    pub fn list_house_custom_tasks(
        &self,
        homeowner_id: HomeownerId,
        house_id: HouseId,
        include_deleted: bool,
    ) -> Result<Vec<CustomTask>> {
        let mut sql = format!(
            "
            SELECT {CUSTOM_TASK_COLUMNS}
            FROM custom_tasks
            WHERE homeowner_id = ? AND (house_id IS NULL OR house_id = ?)
            "
        );
        if !include_deleted {
            sql.push_str("AND deleted_at IS NULL\n");
        }
        sql.push_str("ORDER BY id ASC");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare custom tasks query")?;
        let rows = stmt
            .query_map(
                params![homeowner_id.get(), house_id.get()],
                custom_task_from_row,
            )
            .context("query custom tasks")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect custom tasks")
    }

    pub fn soft_delete_custom_task(&self, task_id: CustomTaskId) -> Result<()> {
        self.soft_delete(LifecycleEntityRef::CustomTask(task_id))
    }

    pub fn restore_custom_task(&self, task_id: CustomTaskId) -> Result<()> {
        self.restore(LifecycleEntityRef::CustomTask(task_id))
    }

    pub fn get_task_override(
        &self,
        house_id: HouseId,
        task_key: &TaskKey,
    ) -> Result<Option<TaskOverride>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {OVERRIDE_COLUMNS} FROM task_overrides WHERE house_id = ? AND task_key = ?"
                ),
                params![house_id.get(), task_key.as_str()],
                override_from_row,
            )
            .optional()
            .with_context(|| format!("load override {task_key} for house {}", house_id.get()))
    }

    /// Remove the override for a task whether it was saved under `task_key`
    /// or under the legacy slug of `title`. True when anything was removed.
    pub fn reset_task_override(
        &self,
        house_id: HouseId,
        task_key: &TaskKey,
        title: Option<&str>,
    ) -> Result<bool> {
        let mut removed = false;
        for key in key_aliases(task_key, title) {
            removed |= self.delete_task_override(house_id, &key)?;
        }
        Ok(removed)
    }

    /// Clear the (month, year) completion flag under `task_key` and the legacy
    /// slug of `title`.
    pub fn reopen_task(
        &self,
        house_id: HouseId,
        task_key: &TaskKey,
        title: Option<&str>,
        month: u8,
        year: i32,
    ) -> Result<()> {
        for key in key_aliases(task_key, title) {
            self.set_task_completed(house_id, &key, month, year, false)?;
        }
        Ok(())
    }

    pub fn create_maintenance_log(&self, log: &MaintenanceLogFormInput) -> Result<MaintenanceLogId> {
        log.validate()?;
        self.require_house_alive(log.house_id)?;
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO maintenance_logs (
                  house_id, service_type, service_date, completion_method,
                  cost_cents, contractor_name, notes, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    log.house_id.get(),
                    log.service_type.trim(),
                    format_date(log.service_date),
                    log.completion_method.map(CompletionMethod::as_str),
                    log.cost_cents,
                    log.contractor_name,
                    log.notes,
                    now,
                    now,
                ],
            )
            .context("insert maintenance log")?;
        Ok(MaintenanceLogId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_maintenance_log(
        &self,
        log_id: MaintenanceLogId,
        log: &MaintenanceLogFormInput,
    ) -> Result<()> {
        log.validate()?;
        self.require_house_alive(log.house_id)?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE maintenance_logs
                SET
                  house_id = ?,
                  service_type = ?,
                  service_date = ?,
                  completion_method = ?,
                  cost_cents = ?,
                  contractor_name = ?,
                  notes = ?,
                  updated_at = ?
                WHERE id = ? AND deleted_at IS NULL
                ",
                params![
                    log.house_id.get(),
                    log.service_type.trim(),
                    format_date(log.service_date),
                    log.completion_method.map(CompletionMethod::as_str),
                    log.cost_cents,
                    log.contractor_name,
                    log.notes,
                    now,
                    log_id.get(),
                ],
            )
            .context("update maintenance log")?;
        if rows_affected == 0 {
            bail!(
                "maintenance log {} not found or deleted -- choose an existing log and retry",
                log_id.get()
            );
        }
        Ok(())
    }

    pub fn list_house_logs(
        &self,
        house_id: HouseId,
        include_deleted: bool,
    ) -> Result<Vec<MaintenanceLog>> {
        let mut sql = format!("SELECT {LOG_COLUMNS} FROM maintenance_logs WHERE house_id = ?\n");
        if !include_deleted {
            sql.push_str("AND deleted_at IS NULL\n");
        }
        sql.push_str("ORDER BY service_date DESC, id DESC");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare maintenance logs query")?;
        let rows = stmt
            .query_map(params![house_id.get()], log_from_row)
            .context("query maintenance logs")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect maintenance logs")
    }

    pub fn soft_delete_maintenance_log(&self, log_id: MaintenanceLogId) -> Result<()> {
        self.soft_delete(LifecycleEntityRef::MaintenanceLog(log_id))
    }

    pub fn restore_maintenance_log(&self, log_id: MaintenanceLogId) -> Result<()> {
        self.restore(LifecycleEntityRef::MaintenanceLog(log_id))
    }

    pub fn create_appliance(&self, appliance: &ApplianceFormInput) -> Result<ApplianceId> {
        appliance.validate()?;
        self.require_house_alive(appliance.house_id)?;
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO appliances (
                  house_id, name, brand, model_number, serial_number, purchase_date,
                  warranty_expiry, location, cost_cents, notes,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    appliance.house_id.get(),
                    appliance.name.trim(),
                    appliance.brand,
                    appliance.model_number,
                    appliance.serial_number,
                    appliance.purchase_date.map(format_date),
                    appliance.warranty_expiry.map(format_date),
                    appliance.location,
                    appliance.cost_cents,
                    appliance.notes,
                    now,
                    now,
                ],
            )
            .context("insert appliance")?;
        Ok(ApplianceId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_appliance(
        &self,
        appliance_id: ApplianceId,
        appliance: &ApplianceFormInput,
    ) -> Result<()> {
        appliance.validate()?;
        self.require_house_alive(appliance.house_id)?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE appliances
                SET
                  house_id = ?,
                  name = ?,
                  brand = ?,
                  model_number = ?,
                  serial_number = ?,
                  purchase_date = ?,
                  warranty_expiry = ?,
                  location = ?,
                  cost_cents = ?,
                  notes = ?,
                  updated_at = ?
                WHERE id = ? AND deleted_at IS NULL
                ",
                params![
                    appliance.house_id.get(),
                    appliance.name.trim(),
                    appliance.brand,
                    appliance.model_number,
                    appliance.serial_number,
                    appliance.purchase_date.map(format_date),
                    appliance.warranty_expiry.map(format_date),
                    appliance.location,
                    appliance.cost_cents,
                    appliance.notes,
                    now,
                    appliance_id.get(),
                ],
            )
            .context("update appliance")?;
        if rows_affected == 0 {
            bail!(
                "appliance {} not found or deleted -- choose an existing appliance and retry",
                appliance_id.get()
            );
        }
        Ok(())
    }

    pub fn list_appliances(&self, house_id: HouseId, include_deleted: bool) -> Result<Vec<Appliance>> {
        let mut sql = format!("SELECT {APPLIANCE_COLUMNS} FROM appliances WHERE house_id = ?\n");
        if !include_deleted {
            sql.push_str("AND deleted_at IS NULL\n");
        }
        sql.push_str("ORDER BY updated_at DESC, id DESC");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare appliances query")?;
        let rows = stmt
            .query_map(params![house_id.get()], appliance_from_row)
            .context("query appliances")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect appliances")
    }

    /// Live appliances whose warranty ends between `look_back_days` before
    /// and `horizon_days` after `now`, soonest first.
    pub fn list_expiring_warranties(
        &self,
        house_id: HouseId,
        now: Date,
        look_back_days: i64,
        horizon_days: i64,
    ) -> Result<Vec<Appliance>> {
        if look_back_days < 0 {
            bail!("look_back_days must be non-negative, got {look_back_days}");
        }
        if horizon_days < 0 {
            bail!("horizon_days must be non-negative, got {horizon_days}");
        }

        let from = now - time::Duration::days(look_back_days);
        let to = now + time::Duration::days(horizon_days);

        let mut appliances = self.list_appliances(house_id, false)?;
        appliances.retain(|appliance| {
            appliance
                .warranty_expiry
                .is_some_and(|warranty| warranty >= from && warranty <= to)
        });
        appliances.sort_by(|left, right| {
            left.warranty_expiry
                .cmp(&right.warranty_expiry)
                .then_with(|| right.id.cmp(&left.id))
        });
        Ok(appliances)
    }

    pub fn soft_delete_appliance(&self, appliance_id: ApplianceId) -> Result<()> {
        self.soft_delete(LifecycleEntityRef::Appliance(appliance_id))
    }

    pub fn restore_appliance(&self, appliance_id: ApplianceId) -> Result<()> {
        self.restore(LifecycleEntityRef::Appliance(appliance_id))
    }

    pub fn seed_demo_data(&self) -> Result<()> {
        self.seed_demo_data_for(OffsetDateTime::now_utc().date())
    }

    /// Two houses with systems, custom tasks, an override, a log dated
    /// `today` and appliances, one with a warranty running out soon.
    pub fn seed_demo_data_for(&self, today: Date) -> Result<()> {
        if !self.list_all_houses(true)?.is_empty() {
            bail!("demo data needs an empty database -- use --demo without an existing db path");
        }

        let owner = HomeownerId::new(1);
        let maple = self.create_house(&HouseFormInput {
            homeowner_id: owner,
            nickname: "Maple house".to_owned(),
            address: "412 Maple St, Madison, WI".to_owned(),
            climate_zone: "Midwest".to_owned(),
            home_systems: BTreeSet::from(
                ["gas-furnace", "central-ac", "sump-pump", "garage-door"].map(str::to_owned),
            ),
        })?;
        let cabin = self.create_house(&HouseFormInput {
            homeowner_id: owner,
            nickname: "Lake cabin".to_owned(),
            address: "9 Birch Ln, Lincoln, NH".to_owned(),
            climate_zone: "new_england".to_owned(),
            home_systems: BTreeSet::from(["boiler", "fireplace", "well"].map(str::to_owned)),
        })?;

        self.create_custom_task(&CustomTaskFormInput {
            homeowner_id: owner,
            house_id: None,
            title: "Clean range hood filter".to_owned(),
            description: "Degrease the mesh filter so the hood keeps pulling cooking smoke out."
                .to_owned(),
            action_summary: Some("Soak the filter in hot soapy water.".to_owned()),
            steps: vec![
                "Pop the filter out of the hood".to_owned(),
                "Soak it for fifteen minutes".to_owned(),
                "Scrub, rinse and let it dry before refitting".to_owned(),
            ],
            tools_and_supplies: vec!["Degreasing dish soap".to_owned()],
            priority: Priority::High,
            frequency_type: FrequencyType::Quarterly,
            specific_months: Vec::new(),
            is_active: true,
            cost_estimate: None,
        })?;
        self.create_custom_task(&CustomTaskFormInput {
            homeowner_id: owner,
            house_id: Some(maple),
            title: "Test sump pump float".to_owned(),
            description: "Pour a bucket of water into the pit and watch the pump cycle."
                .to_owned(),
            action_summary: None,
            steps: Vec::new(),
            tools_and_supplies: vec!["5 gallon bucket".to_owned()],
            priority: Priority::Medium,
            frequency_type: FrequencyType::Monthly,
            specific_months: Vec::new(),
            is_active: true,
            cost_estimate: Some(CostEstimate::from_dollars((100, 200), (0, 0))),
        })?;
        self.create_custom_task(&CustomTaskFormInput {
            homeowner_id: owner,
            house_id: Some(cabin),
            title: "Shock the well".to_owned(),
            description: "Chlorinate the well and flush the lines.".to_owned(),
            action_summary: None,
            steps: Vec::new(),
            tools_and_supplies: vec!["Unscented bleach".to_owned()],
            priority: Priority::Medium,
            frequency_type: FrequencyType::Annually,
            specific_months: vec![5],
            is_active: true,
            cost_estimate: None,
        })?;

        self.upsert_task_override(
            maple,
            &TaskKey::new("clean-gutters"),
            &TaskOverridePatch {
                custom_description: Some(
                    "North side clogs first; use the tall ladder in the garage.".to_owned(),
                ),
                ..TaskOverridePatch::default()
            },
        )?;

        self.create_maintenance_log(&MaintenanceLogFormInput {
            house_id: maple,
            service_type: "Replace HVAC filter".to_owned(),
            service_date: today,
            completion_method: Some(CompletionMethod::Diy),
            cost_cents: Some(2_499),
            contractor_name: String::new(),
            notes: "MERV 11, 16x25x1".to_owned(),
        })?;

        self.create_appliance(&ApplianceFormInput {
            house_id: maple,
            name: "Furnace".to_owned(),
            brand: "Carrier".to_owned(),
            model_number: "59SC5".to_owned(),
            serial_number: "CA-21-004512".to_owned(),
            purchase_date: Some(today - time::Duration::days(5 * 365)),
            warranty_expiry: Some(today + time::Duration::days(45)),
            location: "Basement".to_owned(),
            cost_cents: Some(480_000),
            notes: String::new(),
        })?;
        self.create_appliance(&ApplianceFormInput {
            house_id: cabin,
            name: "Water heater".to_owned(),
            brand: "Rheem".to_owned(),
            model_number: "XE50".to_owned(),
            serial_number: "RH-19-228140".to_owned(),
            purchase_date: Some(today - time::Duration::days(3 * 365)),
            warranty_expiry: Some(today + time::Duration::days(3 * 365)),
            location: "Utility closet".to_owned(),
            cost_cents: Some(135_000),
            notes: String::new(),
        })?;

        info!("seeded demo data");
        Ok(())
    }

    fn load_house_systems(&self, house_id: HouseId) -> Result<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT system_type FROM house_systems WHERE house_id = ? ORDER BY system_type")
            .context("prepare house systems query")?;
        let rows = stmt
            .query_map(params![house_id.get()], |row| row.get::<_, String>(0))
            .context("query house systems")?;
        rows.collect::<rusqlite::Result<BTreeSet<_>>>()
            .with_context(|| format!("collect systems for house {}", house_id.get()))
    }

    fn replace_house_systems(&self, house_id: HouseId, systems: &BTreeSet<String>) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM house_systems WHERE house_id = ?",
                params![house_id.get()],
            )
            .context("clear house systems")?;
        for system in systems {
            self.conn
                .execute(
                    "INSERT INTO house_systems (house_id, system_type) VALUES (?, ?)",
                    params![house_id.get(), system],
                )
                .with_context(|| format!("insert house system {system}"))?;
        }
        Ok(())
    }

    fn count_live(&self, table: &str, house_id: HouseId) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE house_id = ? AND deleted_at IS NULL");
        self.conn
            .query_row(&sql, params![house_id.get()], |row| row.get(0))
            .with_context(|| format!("count {table} for house {}", house_id.get()))
    }

    fn ensure_can_soft_delete(&self, target: LifecycleEntityRef) -> Result<()> {
        if let LifecycleEntityRef::House(house_id) = target {
            for (table, label) in HOUSE_DEPENDENTS {
                let count = self.count_live(table, house_id)?;
                if count > 0 {
                    bail!(
                        "house {} has {count} active {label} -- delete them first",
                        house_id.get()
                    );
                }
            }
        }
        Ok(())
    }

    fn ensure_can_restore(&self, target: LifecycleEntityRef) -> Result<()> {
        let parent: Option<i64> = match target {
            LifecycleEntityRef::House(_) => None,
            LifecycleEntityRef::CustomTask(_)
            | LifecycleEntityRef::MaintenanceLog(_)
            | LifecycleEntityRef::Appliance(_) => {
                let sql = format!("SELECT house_id FROM {} WHERE id = ?", target.table());
                self.conn
                    .query_row(&sql, params![target.id()], |row| {
                        row.get::<_, Option<i64>>(0)
                    })
                    .optional()
                    .with_context(|| format!("load {} {}", target.deleted_tag(), target.id()))?
                    .flatten()
            }
        };
        if let Some(house_id) = parent {
            self.require_house_alive(HouseId::new(house_id))?;
        }
        Ok(())
    }

    fn soft_delete_entity(&self, target: LifecycleEntityRef) -> Result<()> {
        let now = now_rfc3339()?;
        let sql = format!(
            "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
            target.table()
        );
        let rows_affected = self
            .conn
            .execute(&sql, params![now, now, target.id()])
            .with_context(|| format!("soft delete {} {}", target.deleted_tag(), target.id()))?;
        if rows_affected == 0 {
            bail!(
                "{} {} not found or already deleted",
                target.deleted_tag(),
                target.id()
            );
        }
        self.conn
            .execute(
                "INSERT INTO deletion_records (entity, target_id, deleted_at) VALUES (?, ?, ?)",
                params![target.deleted_tag(), target.id(), now],
            )
            .with_context(|| {
                format!(
                    "record deletion for {} {}",
                    target.deleted_tag(),
                    target.id()
                )
            })?;
        info!(entity = target.deleted_tag(), id = target.id(), "soft deleted");
        Ok(())
    }

    fn restore_entity(&self, target: LifecycleEntityRef) -> Result<()> {
        let now = now_rfc3339()?;
        let sql = format!(
            "UPDATE {} SET deleted_at = NULL, updated_at = ? WHERE id = ? AND deleted_at IS NOT NULL",
            target.table()
        );
        let rows_affected = self
            .conn
            .execute(&sql, params![now, target.id()])
            .with_context(|| format!("restore {} {}", target.deleted_tag(), target.id()))?;
        if rows_affected == 0 {
            bail!(
                "{} {} is not deleted or does not exist",
                target.deleted_tag(),
                target.id()
            );
        }
        self.conn
            .execute(
                "
                UPDATE deletion_records
                SET restored_at = ?
                WHERE entity = ? AND target_id = ? AND restored_at IS NULL
                ",
                params![now, target.deleted_tag(), target.id()],
            )
            .with_context(|| {
                format!(
                    "mark deletion record restored for {} {}",
                    target.deleted_tag(),
                    target.id()
                )
            })?;
        info!(entity = target.deleted_tag(), id = target.id(), "restored");
        Ok(())
    }

    fn require_house_alive(&self, house_id: HouseId) -> Result<()> {
        let deleted_at: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT deleted_at FROM houses WHERE id = ?",
                params![house_id.get()],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("load house {} for relationship check", house_id.get()))?;

        match deleted_at {
            Some(None) => Ok(()),
            Some(Some(_)) => bail!("house {} is deleted -- restore it first", house_id.get()),
            None => bail!("house {} no longer exists", house_id.get()),
        }
    }
}

impl HouseRepository for Store {
    fn get_house(&self, id: HouseId) -> Result<House> {
        let house = self
            .conn
            .query_row(
                &format!("SELECT {HOUSE_COLUMNS} FROM houses WHERE id = ? AND deleted_at IS NULL"),
                params![id.get()],
                house_from_row,
            )
            .optional()
            .with_context(|| format!("load house {}", id.get()))?;
        let Some(mut house) = house else {
            bail!(
                "house {} not found or deleted -- run with --house <id> using a listed house",
                id.get()
            );
        };
        house.home_systems = self.load_house_systems(house.id)?;
        Ok(house)
    }

    fn list_houses(&self) -> Result<Vec<House>> {
        self.list_all_houses(false)
    }
}

impl CustomTaskRepository for Store {
    fn list_custom_tasks(
        &self,
        homeowner_id: HomeownerId,
        house_id: HouseId,
    ) -> Result<Vec<CustomTask>> {
        self.list_house_custom_tasks(homeowner_id, house_id, false)
    }
}

impl OverrideRepository for Store {
    fn list_task_overrides(&self, house_id: HouseId) -> Result<Vec<TaskOverride>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {OVERRIDE_COLUMNS} FROM task_overrides WHERE house_id = ? ORDER BY task_key ASC"
            ))
            .context("prepare task overrides query")?;
        let rows = stmt
            .query_map(params![house_id.get()], override_from_row)
            .context("query task overrides")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect task overrides")
    }

    fn upsert_task_override(
        &self,
        house_id: HouseId,
        task_key: &TaskKey,
        patch: &TaskOverridePatch,
    ) -> Result<TaskOverride> {
        TaskOverrideFormInput {
            house_id,
            task_key: task_key.clone(),
            is_enabled: patch.is_enabled,
            frequency_type: patch.frequency_type,
            specific_months: patch.specific_months.clone(),
            custom_description: patch.custom_description.clone(),
        }
        .validate()?;
        self.require_house_alive(house_id)?;

        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO task_overrides (
                  house_id, task_key, is_enabled, frequency_type, specific_months,
                  custom_description, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (house_id, task_key) DO UPDATE SET
                  is_enabled = excluded.is_enabled,
                  frequency_type = excluded.frequency_type,
                  specific_months = excluded.specific_months,
                  custom_description = excluded.custom_description,
                  updated_at = excluded.updated_at
                ",
                params![
                    house_id.get(),
                    task_key.as_str(),
                    patch.is_enabled.unwrap_or(true),
                    patch.frequency_type.map(FrequencyType::as_str),
                    format_month_list(&patch.specific_months),
                    patch.custom_description,
                    now,
                    now,
                ],
            )
            .with_context(|| format!("upsert override {task_key} for house {}", house_id.get()))?;
        info!(house_id = house_id.get(), task_key = %task_key, "upserted task override");

        self.get_task_override(house_id, task_key)?
            .ok_or_else(|| anyhow!("override {task_key} vanished after upsert"))
    }

    fn delete_task_override(&self, house_id: HouseId, task_key: &TaskKey) -> Result<bool> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM task_overrides WHERE house_id = ? AND task_key = ?",
                params![house_id.get(), task_key.as_str()],
            )
            .with_context(|| format!("delete override {task_key} for house {}", house_id.get()))?;
        info!(
            house_id = house_id.get(),
            task_key = %task_key,
            existed = rows_affected > 0,
            "deleted task override"
        );
        Ok(rows_affected > 0)
    }
}

impl MaintenanceLogRepository for Store {
    fn list_maintenance_logs(&self, house_id: HouseId) -> Result<Vec<MaintenanceLog>> {
        self.list_house_logs(house_id, false)
    }
}

impl CompletionRepository for Store {
    fn list_completion_flags(&self, house_id: HouseId) -> Result<Vec<CompletionFlag>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT house_id, task_key, month, year
                FROM task_completions
                WHERE house_id = ?
                ORDER BY year ASC, month ASC, task_key ASC
                ",
            )
            .context("prepare completion flags query")?;
        let rows = stmt
            .query_map(params![house_id.get()], |row| {
                let task_key: String = row.get(1)?;
                Ok(CompletionFlag {
                    house_id: HouseId::new(row.get(0)?),
                    task_key: TaskKey::new(task_key),
                    month: row.get(2)?,
                    year: row.get(3)?,
                })
            })
            .context("query completion flags")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect completion flags")
    }

    fn set_task_completed(
        &self,
        house_id: HouseId,
        task_key: &TaskKey,
        month: u8,
        year: i32,
        completed: bool,
    ) -> Result<()> {
        if !(1..=12).contains(&month) {
            bail!("month {month} is out of range -- use 1-12");
        }
        if task_key.as_str().trim().is_empty() {
            bail!("task key is required to mark completion");
        }
        self.require_house_alive(house_id)?;

        if completed {
            self.conn
                .execute(
                    "
                    INSERT INTO task_completions (house_id, task_key, month, year, completed_at)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT (house_id, task_key, month, year) DO NOTHING
                    ",
                    params![house_id.get(), task_key.as_str(), month, year, now_rfc3339()?],
                )
                .with_context(|| format!("mark {task_key} complete for {month}/{year}"))?;
        } else {
            self.conn
                .execute(
                    "
                    DELETE FROM task_completions
                    WHERE house_id = ? AND task_key = ? AND month = ? AND year = ?
                    ",
                    params![house_id.get(), task_key.as_str(), month, year],
                )
                .with_context(|| format!("clear completion of {task_key} for {month}/{year}"))?;
        }
        debug!(
            house_id = house_id.get(),
            task_key = %task_key,
            month,
            year,
            completed,
            "set completion flag"
        );
        Ok(())
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("HOMEKEEP_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set HOMEKEEP_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("homekeep.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn house_from_row(row: &Row<'_>) -> rusqlite::Result<House> {
    let created_at_raw: String = row.get(5)?;
    let updated_at_raw: String = row.get(6)?;
    let deleted_at_raw: Option<String> = row.get(7)?;
    Ok(House {
        id: HouseId::new(row.get(0)?),
        homeowner_id: HomeownerId::new(row.get(1)?),
        nickname: row.get(2)?,
        address: row.get(3)?,
        climate_zone: row.get(4)?,
        home_systems: BTreeSet::new(),
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
        deleted_at: parse_opt_datetime(deleted_at_raw).map_err(to_sql_error)?,
    })
}

fn custom_task_from_row(row: &Row<'_>) -> rusqlite::Result<CustomTask> {
    let house_id: Option<i64> = row.get(2)?;
    let steps_raw: String = row.get(6)?;
    let tools_raw: String = row.get(7)?;
    let priority_raw: String = row.get(8)?;
    let priority = Priority::parse(&priority_raw)
        .ok_or_else(|| invalid_column(8, format!("unknown task priority {priority_raw}")))?;
    let frequency_raw: String = row.get(9)?;
    let frequency_type = FrequencyType::parse(&frequency_raw)
        .ok_or_else(|| invalid_column(9, format!("unknown task frequency {frequency_raw}")))?;
    let months_raw: String = row.get(10)?;
    let created_at_raw: String = row.get(16)?;
    let updated_at_raw: String = row.get(17)?;
    let deleted_at_raw: Option<String> = row.get(18)?;

    Ok(CustomTask {
        id: CustomTaskId::new(row.get(0)?),
        homeowner_id: HomeownerId::new(row.get(1)?),
        house_id: house_id.map(HouseId::new),
        title: row.get(3)?,
        description: row.get(4)?,
        action_summary: row.get(5)?,
        steps: decode_list(&steps_raw).map_err(to_sql_error)?,
        tools_and_supplies: decode_list(&tools_raw).map_err(to_sql_error)?,
        priority,
        frequency_type,
        specific_months: decode_months(&months_raw).map_err(to_sql_error)?,
        is_active: row.get(11)?,
        cost_estimate: join_estimate([row.get(12)?, row.get(13)?, row.get(14)?, row.get(15)?]),
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
        deleted_at: parse_opt_datetime(deleted_at_raw).map_err(to_sql_error)?,
    })
}

fn override_from_row(row: &Row<'_>) -> rusqlite::Result<TaskOverride> {
    let task_key: String = row.get(1)?;
    let frequency_raw: Option<String> = row.get(3)?;
    let frequency_type = match frequency_raw {
        Some(raw) => Some(
            FrequencyType::parse(&raw)
                .ok_or_else(|| invalid_column(3, format!("unknown override frequency {raw}")))?,
        ),
        None => None,
    };
    let months_raw: String = row.get(4)?;
    let created_at_raw: String = row.get(6)?;
    let updated_at_raw: String = row.get(7)?;

    Ok(TaskOverride {
        house_id: HouseId::new(row.get(0)?),
        task_key: TaskKey::new(task_key),
        is_enabled: row.get(2)?,
        frequency_type,
        specific_months: decode_months(&months_raw).map_err(to_sql_error)?,
        custom_description: row.get(5)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
    })
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<MaintenanceLog> {
    let service_date_raw: String = row.get(3)?;
    // Values other than diy/contractor were written by older clients; they
    // never count toward completion.
    let method_raw: Option<String> = row.get(4)?;
    let created_at_raw: String = row.get(8)?;
    let updated_at_raw: String = row.get(9)?;
    let deleted_at_raw: Option<String> = row.get(10)?;

    Ok(MaintenanceLog {
        id: MaintenanceLogId::new(row.get(0)?),
        house_id: HouseId::new(row.get(1)?),
        service_type: row.get(2)?,
        service_date: parse_date(&service_date_raw).map_err(to_sql_error)?,
        completion_method: method_raw.as_deref().and_then(CompletionMethod::parse),
        cost_cents: row.get(5)?,
        contractor_name: row.get(6)?,
        notes: row.get(7)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
        deleted_at: parse_opt_datetime(deleted_at_raw).map_err(to_sql_error)?,
    })
}

fn appliance_from_row(row: &Row<'_>) -> rusqlite::Result<Appliance> {
    let purchase_date_raw: Option<String> = row.get(6)?;
    let warranty_expiry_raw: Option<String> = row.get(7)?;
    let created_at_raw: String = row.get(11)?;
    let updated_at_raw: String = row.get(12)?;
    let deleted_at_raw: Option<String> = row.get(13)?;

    Ok(Appliance {
        id: ApplianceId::new(row.get(0)?),
        house_id: HouseId::new(row.get(1)?),
        name: row.get(2)?,
        brand: row.get(3)?,
        model_number: row.get(4)?,
        serial_number: row.get(5)?,
        purchase_date: parse_opt_date(purchase_date_raw).map_err(to_sql_error)?,
        warranty_expiry: parse_opt_date(warranty_expiry_raw).map_err(to_sql_error)?,
        location: row.get(8)?,
        cost_cents: row.get(9)?,
        notes: row.get(10)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
        deleted_at: parse_opt_datetime(deleted_at_raw).map_err(to_sql_error)?,
    })
}

fn split_estimate(estimate: Option<CostEstimate>) -> [Option<i64>; 4] {
    match estimate {
        Some(estimate) => [
            Some(estimate.pro_low_cents),
            Some(estimate.pro_high_cents),
            Some(estimate.materials_low_cents),
            Some(estimate.materials_high_cents),
        ],
        None => [None; 4],
    }
}

fn join_estimate(values: [Option<i64>; 4]) -> Option<CostEstimate> {
    let [Some(pro_low), Some(pro_high), Some(materials_low), Some(materials_high)] = values else {
        return None;
    };
    Some(CostEstimate {
        pro_low_cents: pro_low,
        pro_high_cents: pro_high,
        materials_low_cents: materials_low,
        materials_high_cents: materials_high,
    })
}

fn encode_list(items: &[String]) -> Result<String> {
    serde_json::to_string(items).context("encode list column")
}

fn decode_list(raw: &str) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).with_context(|| format!("decode list column {raw:?}"))
}

fn key_aliases(task_key: &TaskKey, title: Option<&str>) -> Vec<TaskKey> {
    let mut keys = vec![task_key.clone()];
    if let Some(title) = title {
        let legacy = TaskKey::from_title(title);
        if !legacy.as_str().is_empty() && &legacy != task_key {
            keys.push(legacy);
        }
    }
    keys
}

fn decode_months(raw: &str) -> Result<Vec<u8>> {
    parse_month_list(raw).map_err(|error| anyhow!("stored months {raw:?}: {error}"))
}

fn invalid_column(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use a homekeep database or migrate first"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; run migration before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn parse_date(raw: &str) -> Result<Date> {
    if let Ok(value) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return Ok(value);
    }

    // Older rows may carry a full timestamp; keep the calendar date.
    let date_time = parse_datetime(raw)?;
    Ok(date_time.date())
}

fn parse_opt_datetime(raw: Option<String>) -> Result<Option<OffsetDateTime>> {
    raw.as_deref().map(parse_datetime).transpose()
}

fn parse_opt_date(raw: Option<String>) -> Result<Option<Date>> {
    raw.as_deref().map(parse_date).transpose()
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    invalid_column(0, error.to_string())
}

fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}

/// `(month, year)` of a date, as the planner takes them.
pub fn month_and_year(date: Date) -> (u8, i32) {
    (u8::from(date.month()), date.year())
}
