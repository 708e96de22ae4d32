// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;

use crate::schedule::DisplayTask;
use crate::{CompletionFlag, HouseId, MaintenanceLog, Priority};

/// A task is complete for (month, year) when a flag is stored under its key
/// (or legacy title slug), or a maintenance log with the exact task title was
/// recorded that month as DIY or contractor work.
pub fn is_task_completed(
    task: &DisplayTask,
    month: u8,
    year: i32,
    flags: &[CompletionFlag],
    logs: &[MaintenanceLog],
) -> bool {
    let flagged = flags.iter().any(|flag| {
        flag.month == month && flag.year == year && task.key.matches(&flag.task_key, &task.title)
    });
    flagged
        || logs.iter().any(|log| {
            log.deleted_at.is_none()
                && log.completion_method.is_some()
                && log.service_type == task.title
                && u8::from(log.service_date.month()) == month
                && log.service_date.year() == year
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationTrigger {
    /// Nothing is scheduled this month.
    Quiet,
    TasksDue { pending: usize, high_priority: usize },
    AllComplete,
}

impl NotificationTrigger {
    pub fn describe(self) -> String {
        match self {
            Self::Quiet => "nothing scheduled".to_owned(),
            Self::AllComplete => "all tasks complete".to_owned(),
            Self::TasksDue {
                pending,
                high_priority: 0,
            } => format!("{pending} due"),
            Self::TasksDue {
                pending,
                high_priority,
            } => format!("{pending} due ({high_priority} high priority)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTask {
    #[serde(flatten)]
    pub task: DisplayTask,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyDigest {
    pub house_id: HouseId,
    pub house_nickname: String,
    pub region: String,
    pub month: u8,
    pub year: i32,
    pub tasks: Vec<PlannedTask>,
    pub completed_count: usize,
    pub notification: NotificationTrigger,
}

/// Pending and high-priority pending counts decide the trigger.
pub fn notification_trigger(tasks: &[PlannedTask]) -> NotificationTrigger {
    if tasks.is_empty() {
        return NotificationTrigger::Quiet;
    }
    let pending = tasks.iter().filter(|planned| !planned.completed).count();
    if pending == 0 {
        return NotificationTrigger::AllComplete;
    }
    let high_priority = tasks
        .iter()
        .filter(|planned| !planned.completed && planned.task.priority == Priority::High)
        .count();
    NotificationTrigger::TasksDue {
        pending,
        high_priority,
    }
}

/// Mark each task's completion and derive the digest counters.
pub fn mark_completion(
    tasks: Vec<DisplayTask>,
    month: u8,
    year: i32,
    flags: &[CompletionFlag],
    logs: &[MaintenanceLog],
) -> Vec<PlannedTask> {
    tasks
        .into_iter()
        .map(|task| {
            let completed = is_task_completed(&task, month, year, flags, logs);
            PlannedTask { task, completed }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{NotificationTrigger, PlannedTask, is_task_completed, notification_trigger};
    use crate::schedule::{DisplayTask, TaskSource};
    use crate::{
        CompletionFlag, CompletionMethod, HouseId, MaintenanceLog, MaintenanceLogId, Priority,
        TaskKey,
    };
    use time::{Date, Month, OffsetDateTime};

    fn task(key: &str, title: &str, priority: Priority) -> DisplayTask {
        DisplayTask {
            id: "seasonal-7-0".to_owned(),
            key: TaskKey::new(key),
            source: TaskSource::Seasonal,
            title: title.to_owned(),
            description: String::new(),
            action_summary: None,
            steps: Vec::new(),
            tools_and_supplies: Vec::new(),
            priority,
            cost_estimate: None,
            impact: None,
            impact_cost: None,
            climate_zones: vec!["Midwest".to_owned()],
            system_requirements: None,
            frequency_type: None,
            specific_months: Vec::new(),
            is_customized: false,
        }
    }

    fn flag(key: &str, month: u8, year: i32) -> CompletionFlag {
        CompletionFlag {
            house_id: HouseId::new(1),
            task_key: TaskKey::new(key),
            month,
            year,
        }
    }

    fn log(service_type: &str, date: Date, method: Option<CompletionMethod>) -> MaintenanceLog {
        let now = OffsetDateTime::UNIX_EPOCH;
        MaintenanceLog {
            id: MaintenanceLogId::new(1),
            house_id: HouseId::new(1),
            service_type: service_type.to_owned(),
            service_date: date,
            completion_method: method,
            cost_cents: None,
            contractor_name: String::new(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn july(day: u8) -> Date {
        Date::from_calendar_date(2026, Month::July, day).expect("valid date")
    }

    #[test]
    fn flag_for_the_exact_month_completes_the_task() {
        let gutters = task("clean-gutters", "Clean gutters", Priority::Medium);
        assert!(is_task_completed(&gutters, 7, 2026, &[flag("clean-gutters", 7, 2026)], &[]));
        assert!(!is_task_completed(&gutters, 7, 2026, &[flag("clean-gutters", 6, 2026)], &[]));
        assert!(!is_task_completed(&gutters, 7, 2026, &[flag("clean-gutters", 7, 2025)], &[]));
        assert!(!is_task_completed(&gutters, 7, 2026, &[flag("hvac-filter", 7, 2026)], &[]));
    }

    #[test]
    fn legacy_slug_flag_completes_the_task() {
        let filter = task("hvac-filter", "Replace HVAC filter", Priority::High);
        assert!(is_task_completed(
            &filter,
            7,
            2026,
            &[flag("replace-hvac-filter", 7, 2026)],
            &[]
        ));
    }

    #[test]
    fn same_month_log_completes_without_a_flag() {
        let gutters = task("clean-gutters", "Clean gutters", Priority::Medium);
        let diy = log("Clean gutters", july(12), Some(CompletionMethod::Diy));
        let pro = log("Clean gutters", july(30), Some(CompletionMethod::Contractor));
        assert!(is_task_completed(&gutters, 7, 2026, &[], &[diy]));
        assert!(is_task_completed(&gutters, 7, 2026, &[], &[pro]));
    }

    #[test]
    fn log_must_match_title_month_year_and_method() {
        let gutters = task("clean-gutters", "Clean gutters", Priority::Medium);
        let wrong_title = log("clean gutters", july(1), Some(CompletionMethod::Diy));
        let wrong_month = log(
            "Clean gutters",
            Date::from_calendar_date(2026, Month::June, 30).expect("valid date"),
            Some(CompletionMethod::Diy),
        );
        let wrong_year = log(
            "Clean gutters",
            Date::from_calendar_date(2025, Month::July, 1).expect("valid date"),
            Some(CompletionMethod::Diy),
        );
        let unknown_method = log("Clean gutters", july(1), None);
        let mut deleted = log("Clean gutters", july(1), Some(CompletionMethod::Diy));
        deleted.deleted_at = Some(OffsetDateTime::UNIX_EPOCH);

        for miss in [wrong_title, wrong_month, wrong_year, unknown_method, deleted] {
            assert!(
                !is_task_completed(&gutters, 7, 2026, &[], std::slice::from_ref(&miss)),
                "unexpected completion from {miss:?}"
            );
        }
    }

    #[test]
    fn trigger_reflects_pending_work() {
        assert_eq!(notification_trigger(&[]), NotificationTrigger::Quiet);

        let planned = vec![
            PlannedTask {
                task: task("a", "A", Priority::High),
                completed: false,
            },
            PlannedTask {
                task: task("b", "B", Priority::Low),
                completed: false,
            },
            PlannedTask {
                task: task("c", "C", Priority::High),
                completed: true,
            },
        ];
        assert_eq!(
            notification_trigger(&planned),
            NotificationTrigger::TasksDue {
                pending: 2,
                high_priority: 1
            }
        );

        let done = planned
            .into_iter()
            .map(|mut planned| {
                planned.completed = true;
                planned
            })
            .collect::<Vec<_>>();
        assert_eq!(notification_trigger(&done), NotificationTrigger::AllComplete);
    }

    #[test]
    fn trigger_descriptions() {
        assert_eq!(NotificationTrigger::Quiet.describe(), "nothing scheduled");
        assert_eq!(
            NotificationTrigger::TasksDue {
                pending: 3,
                high_priority: 0
            }
            .describe(),
            "3 due"
        );
        assert_eq!(
            NotificationTrigger::TasksDue {
                pending: 3,
                high_priority: 2
            }
            .describe(),
            "3 due (2 high priority)"
        );
    }
}
