// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod catalog;
pub mod completion;
pub mod estimate;
pub mod forms;
pub mod ids;
pub mod model;
pub mod planner;
pub mod repository;
pub mod requirements;
pub mod schedule;

pub use catalog::{CatalogTask, MonthBucket, RegionCatalog};
pub use completion::{MonthlyDigest, NotificationTrigger, PlannedTask, is_task_completed};
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use planner::{MaintenancePlanner, PlannerStore};
pub use repository::*;
pub use requirements::{infer_system_requirements, known_system_types};
pub use schedule::{DisplayTask, ResolveInput, TaskSource, resolve_tasks_for_month};
