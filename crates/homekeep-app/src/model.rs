// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::{Date, OffsetDateTime};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyType {
    Monthly,
    Quarterly,
    Biannually,
    Annually,
    Custom,
}

impl FrequencyType {
    pub const ALL: [Self; 5] = [
        Self::Monthly,
        Self::Quarterly,
        Self::Biannually,
        Self::Annually,
        Self::Custom,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Biannually => "biannually",
            Self::Annually => "annually",
            Self::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "biannually" => Some(Self::Biannually),
            "annually" => Some(Self::Annually),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Whether a task recurring at this frequency falls due in `month`.
    ///
    /// `specific_months` only applies to `Annually`; an empty list there
    /// means January. `Custom` has no finer structure and is due every month.
    pub fn includes_month(self, month: u8, specific_months: &[u8]) -> bool {
        if !(1..=12).contains(&month) {
            return false;
        }
        match self {
            Self::Monthly | Self::Custom => true,
            Self::Quarterly => month % 3 == 1,
            Self::Biannually => month == 1 || month == 7,
            Self::Annually => {
                if specific_months.is_empty() {
                    month == 1
                } else {
                    specific_months.contains(&month)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMethod {
    Diy,
    Contractor,
}

impl CompletionMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Diy => "diy",
            Self::Contractor => "contractor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "diy" => Some(Self::Diy),
            "contractor" => Some(Self::Contractor),
            _ => None,
        }
    }
}

/// Typical price ranges for a task, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub pro_low_cents: i64,
    pub pro_high_cents: i64,
    pub materials_low_cents: i64,
    pub materials_high_cents: i64,
}

impl CostEstimate {
    pub const fn from_dollars(pro: (i64, i64), materials: (i64, i64)) -> Self {
        Self {
            pro_low_cents: pro.0 * 100,
            pro_high_cents: pro.1 * 100,
            materials_low_cents: materials.0 * 100,
            materials_high_cents: materials.1 * 100,
        }
    }

    /// Like [`CostEstimate::from_dollars`] for untrusted input: fails instead
    /// of overflowing when a dollar amount does not fit in cents.
    pub fn checked_from_dollars(pro: (i64, i64), materials: (i64, i64)) -> Result<Self> {
        let cents = |dollars: i64| {
            dollars
                .checked_mul(100)
                .ok_or_else(|| anyhow!("cost ${dollars} is too large -- use a smaller amount"))
        };
        Ok(Self {
            pro_low_cents: cents(pro.0)?,
            pro_high_cents: cents(pro.1)?,
            materials_low_cents: cents(materials.0)?,
            materials_high_cents: cents(materials.1)?,
        })
    }

    pub fn diy_savings_high_cents(&self) -> i64 {
        (self.pro_high_cents - self.materials_low_cents).max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    pub homeowner_id: HomeownerId,
    pub nickname: String,
    pub address: String,
    pub climate_zone: String,
    pub home_systems: BTreeSet<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTask {
    pub id: CustomTaskId,
    pub homeowner_id: HomeownerId,
    pub house_id: Option<HouseId>,
    pub title: String,
    pub description: String,
    pub action_summary: Option<String>,
    pub steps: Vec<String>,
    pub tools_and_supplies: Vec<String>,
    pub priority: Priority,
    pub frequency_type: FrequencyType,
    pub specific_months: Vec<u8>,
    pub is_active: bool,
    pub cost_estimate: Option<CostEstimate>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

impl CustomTask {
    pub fn key(&self) -> TaskKey {
        TaskKey::from_title(&self.title)
    }

    /// A homeowner-wide task (no house) applies to every house they own.
    pub fn applies_to(&self, house_id: HouseId) -> bool {
        self.house_id.is_none_or(|id| id == house_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOverride {
    pub house_id: HouseId,
    pub task_key: TaskKey,
    pub is_enabled: bool,
    pub frequency_type: Option<FrequencyType>,
    pub specific_months: Vec<u8>,
    pub custom_description: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields written by an override upsert. `None` for `is_enabled` stores the
/// default (enabled).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskOverridePatch {
    pub is_enabled: Option<bool>,
    pub frequency_type: Option<FrequencyType>,
    pub specific_months: Vec<u8>,
    pub custom_description: Option<String>,
}

/// A task marked done by hand for one month of one year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionFlag {
    pub house_id: HouseId,
    pub task_key: TaskKey,
    pub month: u8,
    pub year: i32,
}

impl CompletionFlag {
    /// Flat identity string, `{key}-{month}-{year}`.
    pub fn completion_key(&self) -> String {
        format!("{}-{}-{}", self.task_key, self.month, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceLog {
    pub id: MaintenanceLogId,
    pub house_id: HouseId,
    pub service_type: String,
    pub service_date: Date,
    pub completion_method: Option<CompletionMethod>,
    pub cost_cents: Option<i64>,
    pub contractor_name: String,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appliance {
    pub id: ApplianceId,
    pub house_id: HouseId,
    pub name: String,
    pub brand: String,
    pub model_number: String,
    pub serial_number: String,
    pub purchase_date: Option<Date>,
    pub warranty_expiry: Option<Date>,
    pub location: String,
    pub cost_cents: Option<i64>,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}
