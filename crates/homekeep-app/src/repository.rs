// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Storage seams read by the planner. The SQLite store implements all of
//! them; tests use in-memory fakes.

use anyhow::Result;

use crate::{
    CompletionFlag, CustomTask, HomeownerId, House, HouseId, MaintenanceLog, TaskKey,
    TaskOverride, TaskOverridePatch,
};

pub trait HouseRepository {
    /// Errors when no live house has this id.
    fn get_house(&self, id: HouseId) -> Result<House>;
    fn list_houses(&self) -> Result<Vec<House>>;
}

pub trait CustomTaskRepository {
    /// Active and inactive tasks the homeowner wrote either for every house
    /// or for `house_id` specifically.
    fn list_custom_tasks(
        &self,
        homeowner_id: HomeownerId,
        house_id: HouseId,
    ) -> Result<Vec<CustomTask>>;
}

pub trait OverrideRepository {
    fn list_task_overrides(&self, house_id: HouseId) -> Result<Vec<TaskOverride>>;
    fn upsert_task_override(
        &self,
        house_id: HouseId,
        task_key: &TaskKey,
        patch: &TaskOverridePatch,
    ) -> Result<TaskOverride>;
    /// Returns whether an override existed.
    fn delete_task_override(&self, house_id: HouseId, task_key: &TaskKey) -> Result<bool>;
}

pub trait MaintenanceLogRepository {
    fn list_maintenance_logs(&self, house_id: HouseId) -> Result<Vec<MaintenanceLog>>;
}

pub trait CompletionRepository {
    fn list_completion_flags(&self, house_id: HouseId) -> Result<Vec<CompletionFlag>>;
    fn set_task_completed(
        &self,
        house_id: HouseId,
        task_key: &TaskKey,
        month: u8,
        year: i32,
        completed: bool,
    ) -> Result<()>;
}
