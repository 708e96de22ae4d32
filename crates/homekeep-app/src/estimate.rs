// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::CostEstimate;

/// Fallback price ranges for catalog tasks authored without a cost. First
/// keyword hit in the lowercased title wins.
const TYPICAL_COSTS: &[(&str, CostEstimate)] = &[
    ("water heater", CostEstimate::from_dollars((100, 250), (0, 15))),
    ("condensate", CostEstimate::from_dollars((75, 150), (2, 10))),
    ("irrigation", CostEstimate::from_dollars((75, 175), (0, 50))),
    ("garage door", CostEstimate::from_dollars((75, 150), (5, 15))),
    ("pipe", CostEstimate::from_dollars((150, 500), (10, 40))),
    ("weatherstrip", CostEstimate::from_dollars((150, 400), (20, 60))),
    ("ceiling fan", CostEstimate::from_dollars((0, 0), (0, 0))),
    ("coil", CostEstimate::from_dollars((75, 150), (5, 20))),
    ("gfci", CostEstimate::from_dollars((100, 200), (0, 15))),
    ("foundation", CostEstimate::from_dollars((300, 700), (0, 0))),
    ("siding", CostEstimate::from_dollars((250, 600), (20, 80))),
    ("tree", CostEstimate::from_dollars((300, 1_000), (0, 30))),
    ("lawn", CostEstimate::from_dollars((75, 250), (20, 100))),
    ("attic", CostEstimate::from_dollars((200, 500), (0, 0))),
    ("exhaust fan", CostEstimate::from_dollars((100, 250), (0, 10))),
    ("pest", CostEstimate::from_dollars((100, 300), (0, 40))),
    ("termite", CostEstimate::from_dollars((100, 300), (0, 40))),
    ("drain", CostEstimate::from_dollars((100, 300), (0, 20))),
    ("ice dam", CostEstimate::from_dollars((300, 800), (30, 60))),
    ("vent", CostEstimate::from_dollars((50, 150), (0, 0))),
    ("storm", CostEstimate::from_dollars((0, 0), (50, 200))),
    ("hurricane", CostEstimate::from_dollars((0, 0), (100, 500))),
    ("wildfire", CostEstimate::from_dollars((200, 800), (0, 30))),
    ("humidity", CostEstimate::from_dollars((0, 0), (0, 250))),
];

/// Typical cost for a task title, if the title mentions a known job.
pub fn typical_cost(title: &str) -> Option<CostEstimate> {
    let lowered = title.to_lowercase();
    TYPICAL_COSTS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, estimate)| *estimate)
}

/// The authored estimate when present, otherwise the typical one.
pub fn enrich_cost_estimate(title: &str, authored: Option<CostEstimate>) -> Option<CostEstimate> {
    authored.or_else(|| typical_cost(title))
}

#[cfg(test)]
mod tests {
    use super::{enrich_cost_estimate, typical_cost};
    use crate::CostEstimate;

    #[test]
    fn authored_estimate_wins() {
        let authored = CostEstimate::from_dollars((1, 2), (3, 4));
        assert_eq!(
            enrich_cost_estimate("Flush water heater", Some(authored)),
            Some(authored)
        );
    }

    #[test]
    fn missing_estimate_is_filled_from_title() {
        let estimate = enrich_cost_estimate("Flush water heater", None).expect("typical cost");
        assert_eq!(estimate.pro_low_cents, 10_000);
        assert_eq!(estimate.pro_high_cents, 25_000);
    }

    #[test]
    fn first_keyword_wins() {
        // "condensate" precedes "drain" in the table.
        let estimate = typical_cost("Flush AC condensate drain line").expect("typical cost");
        assert_eq!(estimate.pro_high_cents, 15_000);
    }

    #[test]
    fn unknown_title_stays_unestimated() {
        assert_eq!(enrich_cost_estimate("Polish the doorknobs", None), None);
    }
}
