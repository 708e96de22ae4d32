// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::BTreeSet;
use time::Date;

use crate::{
    CompletionMethod, CostEstimate, FrequencyType, HomeownerId, HouseId, Priority, TaskKey,
    TaskOverridePatch, slugify,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    House,
    CustomTask,
    TaskOverride,
    MaintenanceLog,
    Appliance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseFormInput {
    pub homeowner_id: HomeownerId,
    pub nickname: String,
    pub address: String,
    pub climate_zone: String,
    pub home_systems: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomTaskFormInput {
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
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOverrideFormInput {
    pub house_id: HouseId,
    pub task_key: TaskKey,
    pub is_enabled: Option<bool>,
    pub frequency_type: Option<FrequencyType>,
    pub specific_months: Vec<u8>,
    pub custom_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceLogFormInput {
    pub house_id: HouseId,
    pub service_type: String,
    pub service_date: Date,
    pub completion_method: Option<CompletionMethod>,
    pub cost_cents: Option<i64>,
    pub contractor_name: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceFormInput {
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
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    House(HouseFormInput),
    CustomTask(CustomTaskFormInput),
    TaskOverride(TaskOverrideFormInput),
    MaintenanceLog(MaintenanceLogFormInput),
    Appliance(ApplianceFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::House(_) => FormKind::House,
            Self::CustomTask(_) => FormKind::CustomTask,
            Self::TaskOverride(_) => FormKind::TaskOverride,
            Self::MaintenanceLog(_) => FormKind::MaintenanceLog,
            Self::Appliance(_) => FormKind::Appliance,
        }
    }

    /// Empty form for the editor. Log and override forms need a date or a
    /// task key picked first, so they have no blank.
    pub fn blank_for(kind: FormKind) -> Option<Self> {
        match kind {
            FormKind::House => Some(Self::House(HouseFormInput {
                homeowner_id: HomeownerId::new(0),
                nickname: String::new(),
                address: String::new(),
                climate_zone: String::new(),
                home_systems: BTreeSet::new(),
            })),
            FormKind::CustomTask => Some(Self::CustomTask(CustomTaskFormInput {
                homeowner_id: HomeownerId::new(0),
                house_id: None,
                title: String::new(),
                description: String::new(),
                action_summary: None,
                steps: Vec::new(),
                tools_and_supplies: Vec::new(),
                priority: Priority::Medium,
                frequency_type: FrequencyType::Monthly,
                specific_months: Vec::new(),
                is_active: true,
                cost_estimate: None,
            })),
            FormKind::Appliance => Some(Self::Appliance(ApplianceFormInput {
                house_id: HouseId::new(0),
                name: String::new(),
                brand: String::new(),
                model_number: String::new(),
                serial_number: String::new(),
                purchase_date: None,
                warranty_expiry: None,
                location: String::new(),
                cost_cents: None,
                notes: String::new(),
            })),
            FormKind::TaskOverride | FormKind::MaintenanceLog => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::House(house) => house.validate(),
            Self::CustomTask(task) => task.validate(),
            Self::TaskOverride(task_override) => task_override.validate(),
            Self::MaintenanceLog(log) => log.validate(),
            Self::Appliance(appliance) => appliance.validate(),
        }
    }
}

impl HouseFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.homeowner_id.get() <= 0 {
            bail!("house owner is required -- choose a homeowner and retry");
        }
        if self.nickname.trim().is_empty() {
            bail!("house nickname is required -- enter a nickname and retry");
        }
        if self.climate_zone.trim().is_empty() {
            bail!("climate zone is required -- pick a region and retry");
        }
        for system in &self.home_systems {
            if system.is_empty() || slugify(system) != *system {
                bail!(
                    "home system `{system}` must be lowercase words joined by hyphens, like `central-ac`"
                );
            }
        }
        Ok(())
    }
}

impl CustomTaskFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.homeowner_id.get() <= 0 {
            bail!("task owner is required -- choose a homeowner and retry");
        }
        if let Some(house_id) = self.house_id
            && house_id.get() <= 0
        {
            bail!("task house id must be positive -- pick a house or leave it blank");
        }
        if self.title.trim().is_empty() {
            bail!("task title is required -- enter a title and retry");
        }
        if slugify(&self.title).is_empty() {
            bail!("task title needs at least one letter or digit");
        }
        validate_months("task", self.frequency_type, &self.specific_months)?;
        if let Some(estimate) = &self.cost_estimate {
            validate_estimate(estimate)?;
        }
        Ok(())
    }

    pub fn key(&self) -> TaskKey {
        TaskKey::from_title(&self.title)
    }
}

impl TaskOverrideFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.house_id.get() <= 0 {
            bail!("override house is required -- choose a house and retry");
        }
        if self.task_key.as_str().trim().is_empty() {
            bail!("override task key is required -- pick a task and retry");
        }
        if let Some(frequency) = self.frequency_type {
            validate_months("override", frequency, &self.specific_months)?;
        } else if !self.specific_months.is_empty() {
            bail!("override specific months need a frequency -- set frequency to annually and retry");
        }
        if let Some(description) = &self.custom_description
            && description.trim().is_empty()
        {
            bail!("override description is blank -- enter text or clear the field");
        }
        Ok(())
    }

    pub fn to_patch(&self) -> TaskOverridePatch {
        TaskOverridePatch {
            is_enabled: self.is_enabled,
            frequency_type: self.frequency_type,
            specific_months: self.specific_months.clone(),
            custom_description: self.custom_description.clone(),
        }
    }
}

impl MaintenanceLogFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.house_id.get() <= 0 {
            bail!("log house is required -- choose a house and retry");
        }
        if self.service_type.trim().is_empty() {
            bail!("service type is required -- enter what was done and retry");
        }
        if let Some(cost) = self.cost_cents
            && cost < 0
        {
            bail!("service cost cannot be negative");
        }
        Ok(())
    }
}

impl ApplianceFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.house_id.get() <= 0 {
            bail!("appliance house is required -- choose a house and retry");
        }
        if self.name.trim().is_empty() {
            bail!("appliance name is required -- enter a name and retry");
        }
        if let Some(cost) = self.cost_cents
            && cost < 0
        {
            bail!("appliance cost cannot be negative");
        }
        if let (Some(purchased), Some(expiry)) = (self.purchase_date, self.warranty_expiry)
            && expiry < purchased
        {
            bail!("appliance warranty expiry must be on/after purchase date");
        }
        Ok(())
    }
}

fn validate_months(label: &str, frequency: FrequencyType, months: &[u8]) -> Result<()> {
    if months.is_empty() {
        return Ok(());
    }
    if frequency != FrequencyType::Annually {
        bail!(
            "{label} specific months only apply to annual tasks -- set frequency to annually or clear the months"
        );
    }
    let mut seen = BTreeSet::new();
    for month in months {
        if !(1..=12).contains(month) {
            bail!("{label} month {month} is out of range -- use 1-12");
        }
        if !seen.insert(*month) {
            bail!("{label} month {month} is listed twice");
        }
    }
    Ok(())
}

fn validate_estimate(estimate: &CostEstimate) -> Result<()> {
    let values = [
        estimate.pro_low_cents,
        estimate.pro_high_cents,
        estimate.materials_low_cents,
        estimate.materials_high_cents,
    ];
    if values.iter().any(|cents| *cents < 0) {
        bail!("cost estimate values cannot be negative");
    }
    if estimate.pro_low_cents > estimate.pro_high_cents
        || estimate.materials_low_cents > estimate.materials_high_cents
    {
        bail!("cost estimate low end must not exceed its high end");
    }
    Ok(())
}
