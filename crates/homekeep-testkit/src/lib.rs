// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use homekeep_app::{
    ApplianceFormInput, CompletionMethod, CostEstimate, CustomTaskFormInput, FrequencyType,
    HomeownerId, HouseFormInput, HouseId, MaintenanceLogFormInput, Priority, known_system_types,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use time::{Date, Duration, Month};

const REFERENCE_YEAR: i32 = 2026;

const CLIMATE_ZONES: [&str; 5] = [
    "Pacific Northwest",
    "Northeast",
    "Midwest",
    "Southeast",
    "Southwest",
];

const CITIES: [&str; 10] = [
    "Seattle",
    "Portland",
    "Boston",
    "Burlington",
    "Madison",
    "Omaha",
    "Raleigh",
    "Savannah",
    "Phoenix",
    "Tucson",
];
const STREET_NAMES: [&str; 12] = [
    "Cedar", "Maple", "Oak", "Pine", "Willow", "Elm", "Birch", "Juniper", "Ridge", "Valley",
    "Lakeview", "Aspen",
];

const TASK_VERBS: [&str; 8] = [
    "Clean", "Inspect", "Test", "Seal", "Flush", "Oil", "Tighten", "Descale",
];
const TASK_OBJECTS: [&str; 12] = [
    "range hood filter",
    "shower heads",
    "deck boards",
    "window screens",
    "cabinet hinges",
    "grout lines",
    "mailbox post",
    "fence gate",
    "bathroom caulk",
    "door locks",
    "basement windows",
    "porch railing",
];

const SERVICE_TYPES: [&str; 8] = [
    "Replace HVAC filter",
    "Clean gutters",
    "Test sump pump",
    "Flush water heater",
    "Clean dryer vent",
    "Lubricate garage door",
    "Inspect roof",
    "Trim trees",
];
const CONTRACTORS: [&str; 6] = [
    "Summit HVAC",
    "Reed Plumbing",
    "Apex Roofing",
    "Greenleaf Tree Care",
    "Hartley Handyman",
    "Bright Gutters",
];

const APPLIANCE_NAMES: [&str; 10] = [
    "Refrigerator",
    "Washer",
    "Dryer",
    "Dishwasher",
    "Water Heater",
    "Furnace",
    "Central AC",
    "Sump Pump",
    "Water Softener",
    "Garage Door Opener",
];
const APPLIANCE_BRANDS: [&str; 8] = [
    "Whirlpool",
    "GE",
    "Bosch",
    "Rheem",
    "Carrier",
    "Trane",
    "LG",
    "Chamberlain",
];
const APPLIANCE_LOCATIONS: [&str; 6] = [
    "Kitchen",
    "Basement",
    "Garage",
    "Laundry Room",
    "Utility Closet",
    "Attic",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of plausible form inputs. The same seed always yields
/// the same sequence.
#[derive(Debug, Clone)]
pub struct HomeFaker {
    rng: DeterministicRng,
}

impl HomeFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn house(&mut self, homeowner_id: HomeownerId) -> HouseFormInput {
        let street = self.pick(&STREET_NAMES);
        let systems = known_system_types();
        let count = self.int_range_i64(1, 4) as usize;
        let mut home_systems = BTreeSet::new();
        for _ in 0..count {
            home_systems.insert(systems[self.rng.int_n(systems.len())].to_owned());
        }

        HouseFormInput {
            homeowner_id,
            nickname: format!("{street} house"),
            address: format!(
                "{} {street} St, {}",
                self.int_range_i64(100, 9_999),
                self.pick(&CITIES)
            ),
            climate_zone: self.pick(&CLIMATE_ZONES).to_owned(),
            home_systems,
        }
    }

    /// A custom task owned by `homeowner_id`, scoped to `house_id` when given.
    pub fn custom_task(
        &mut self,
        homeowner_id: HomeownerId,
        house_id: Option<HouseId>,
    ) -> CustomTaskFormInput {
        let title = format!("{} {}", self.pick(&TASK_VERBS), self.pick(&TASK_OBJECTS));
        let frequency_type = FrequencyType::ALL[self.rng.int_n(FrequencyType::ALL.len())];
        let specific_months = if frequency_type == FrequencyType::Annually {
            let first = self.int_range_i64(1, 6) as u8;
            vec![first, first + 6]
        } else {
            Vec::new()
        };
        let cost_estimate = self.rng.bool().then(|| {
            let pro_low = self.int_range_i64(50, 200);
            let materials_low = self.int_range_i64(0, 30);
            CostEstimate::from_dollars(
                (pro_low, pro_low + self.int_range_i64(0, 200)),
                (materials_low, materials_low + self.int_range_i64(0, 50)),
            )
        });

        CustomTaskFormInput {
            homeowner_id,
            house_id,
            title: title.clone(),
            description: format!("{title} before it turns into a repair."),
            action_summary: None,
            steps: Vec::new(),
            tools_and_supplies: Vec::new(),
            priority: [Priority::Low, Priority::Medium, Priority::High][self.rng.int_n(3)],
            frequency_type,
            specific_months,
            is_active: true,
            cost_estimate,
        }
    }

    pub fn maintenance_log(&mut self, house_id: HouseId) -> MaintenanceLogFormInput {
        let service_date = self.date_in_year(REFERENCE_YEAR);
        self.maintenance_log_on(house_id, service_date)
    }

    pub fn maintenance_log_on(
        &mut self,
        house_id: HouseId,
        service_date: Date,
    ) -> MaintenanceLogFormInput {
        let completion_method = if self.rng.bool() {
            CompletionMethod::Diy
        } else {
            CompletionMethod::Contractor
        };
        let contractor_name = match completion_method {
            CompletionMethod::Contractor => self.pick(&CONTRACTORS).to_owned(),
            CompletionMethod::Diy => String::new(),
        };
        MaintenanceLogFormInput {
            house_id,
            service_type: self.pick(&SERVICE_TYPES).to_owned(),
            service_date,
            completion_method: Some(completion_method),
            cost_cents: Some(self.int_range_i64(1_000, 60_000)),
            contractor_name,
            notes: String::new(),
        }
    }

    pub fn appliance(&mut self, house_id: HouseId) -> ApplianceFormInput {
        let brand = self.pick(&APPLIANCE_BRANDS).to_owned();
        let prefix = brand_prefix(&brand);
        let purchase_date = self.date_between(
            reference_date() - Duration::days(3_650),
            reference_date() - Duration::days(365),
        );
        let warranty_expiry = (self.int_range_i64(1, 10) <= 6).then(|| {
            let years = self.int_range_i64(1, 10);
            purchase_date + Duration::days(years * 365)
        });

        ApplianceFormInput {
            house_id,
            name: self.pick(&APPLIANCE_NAMES).to_owned(),
            model_number: format!("{prefix}-{:04}", self.int_range_i64(100, 9_999)),
            serial_number: format!(
                "{prefix}-{:02}-{:06}",
                self.int_range_i64(0, 99),
                self.int_range_i64(0, 999_999),
            ),
            brand,
            purchase_date: Some(purchase_date),
            warranty_expiry,
            location: self.pick(&APPLIANCE_LOCATIONS).to_owned(),
            cost_cents: Some(self.int_range_i64(15_000, 800_000)),
            notes: String::new(),
        }
    }

    pub fn date_in_year(&mut self, year: i32) -> Date {
        let start = calendar_date(year, Month::January, 1);
        let end = calendar_date(year, Month::December, 31);
        self.date_between(start, end)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn date_between(&mut self, start: Date, end: Date) -> Date {
        let start_day = start.to_julian_day();
        let end_day = end.to_julian_day();
        if end_day <= start_day {
            return start;
        }
        let offset = self.int_range_i64(0, i64::from(end_day - start_day));
        Date::from_julian_day(start_day + offset as i32).unwrap_or(start)
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("homekeep.db");
    Ok((dir, db_path))
}

pub fn climate_zones() -> &'static [&'static str] {
    &CLIMATE_ZONES
}

pub fn brand_prefix(brand: &str) -> String {
    brand.chars().take(2).collect::<String>().to_uppercase()
}

/// Fixed "today" for tests that need one.
pub fn reference_date() -> Date {
    calendar_date(REFERENCE_YEAR, Month::July, 15)
}

fn calendar_date(year: i32, month: Month, day: u8) -> Date {
    Date::from_calendar_date(year, month, day).expect("valid calendar date")
}

#[cfg(test)]
mod tests {
    use super::{HomeFaker, brand_prefix, climate_zones, reference_date};
    use homekeep_app::{FrequencyType, HomeownerId, HouseId, RegionCatalog};
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_output() {
        let mut left = HomeFaker::new(42);
        let mut right = HomeFaker::new(42);
        assert_eq!(
            left.house(HomeownerId::new(1)),
            right.house(HomeownerId::new(1))
        );
        assert_eq!(
            left.appliance(HouseId::new(1)),
            right.appliance(HouseId::new(1))
        );
    }

    #[test]
    fn houses_are_valid_and_use_known_regions() {
        let catalog = RegionCatalog::builtin().expect("builtin catalog");
        for seed in 1..30 {
            let mut faker = HomeFaker::new(seed);
            let house = faker.house(HomeownerId::new(1));
            house.validate().expect("generated house should validate");
            assert!(!house.home_systems.is_empty());
            assert!(
                catalog.resolve_region(&house.climate_zone).is_some(),
                "zone {}",
                house.climate_zone
            );
        }
    }

    #[test]
    fn every_listed_zone_resolves() {
        let catalog = RegionCatalog::builtin().expect("builtin catalog");
        for zone in climate_zones() {
            assert_eq!(catalog.resolve_region(zone), Some(*zone));
        }
    }

    #[test]
    fn custom_tasks_validate_and_only_annual_tasks_carry_months() {
        let mut faker = HomeFaker::new(7);
        for _ in 0..50 {
            let task = faker.custom_task(HomeownerId::new(1), Some(HouseId::new(2)));
            task.validate().expect("generated task should validate");
            if task.frequency_type != FrequencyType::Annually {
                assert!(task.specific_months.is_empty());
            }
        }
    }

    #[test]
    fn logs_have_contractor_only_when_hired() {
        let mut faker = HomeFaker::new(3);
        for _ in 0..20 {
            let log = faker.maintenance_log(HouseId::new(1));
            log.validate().expect("generated log should validate");
            assert_eq!(log.service_date.year(), 2026);
            let hired = log.completion_method == Some(homekeep_app::CompletionMethod::Contractor);
            assert_eq!(hired, !log.contractor_name.is_empty());
        }
    }

    #[test]
    fn appliances_have_warranty_after_purchase() {
        let mut faker = HomeFaker::new(5);
        for _ in 0..20 {
            let appliance = faker.appliance(HouseId::new(1));
            appliance.validate().expect("generated appliance should validate");
            let purchased = appliance.purchase_date.expect("purchase date");
            assert!(purchased < reference_date());
            assert!(appliance.model_number.starts_with(&brand_prefix(&appliance.brand)));
        }
    }

    #[test]
    fn variety_across_seeds() {
        let mut names = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            let mut faker = HomeFaker::new(seed);
            names.insert(faker.custom_task(HomeownerId::new(1), None).title);
        }
        assert!(names.len() >= 8, "got {}", names.len());
    }

    #[test]
    fn int_n() {
        let mut faker = HomeFaker::new(42);
        for _ in 0..100 {
            assert!(faker.int_n(5) < 5);
        }
    }
}
