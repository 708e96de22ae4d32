// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Home-system gating inferred from task titles.
//!
//! Catalog tasks do not declare which installed systems they need. The keyword
//! table below is the classification: a title mentioning "pool" is only shown
//! to houses that list a pool, and so on.

const HEATING: &[&str] = &["gas-furnace", "electric-furnace", "oil-furnace", "heat-pump"];
const COOLING: &[&str] = &["central-ac", "window-ac", "mini-split"];

/// (keywords, tags). Keywords are matched against the lowercased title padded
/// with one space on each side, so " ac " also matches at either end.
pub const SYSTEM_KEYWORDS: &[(&[&str], &[&str])] = &[
    (&["furnace", "heating system"], HEATING),
    (&["heat pump"], &["heat-pump"]),
    (&["boiler"], &["boiler"]),
    (&["air condition", " ac "], COOLING),
    (&["pool"], &["pool"]),
    (&["hot tub"], &["hot-tub"]),
    (&["septic"], &["septic"]),
    (&["well pump", "well water"], &["well"]),
    (&["sump pump"], &["sump-pump"]),
    (&["fireplace", "chimney"], &["fireplace"]),
    (&["sprinkler", "irrigation"], &["sprinkler-system"]),
    (&["water softener"], &["water-softener"]),
    (&["generator"], &["generator"]),
    (&["solar panel"], &["solar-panels"]),
    (&["garage door"], &["garage-door"]),
];

/// Every tag the keyword table can produce, in table order without repeats.
pub fn known_system_types() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for (_, tags) in SYSTEM_KEYWORDS {
        for tag in *tags {
            if !out.contains(tag) {
                out.push(*tag);
            }
        }
    }
    out
}

/// Union of tags whose keywords appear in `title`, or `None` when nothing
/// matches (the task is not gated on any system).
pub fn infer_system_requirements(title: &str) -> Option<Vec<String>> {
    let haystack = format!(" {} ", title.to_lowercase());
    let mut tags: Vec<String> = Vec::new();
    for (keywords, matched) in SYSTEM_KEYWORDS {
        if keywords.iter().any(|keyword| haystack.contains(keyword)) {
            for tag in *matched {
                if !tags.iter().any(|existing| existing == tag) {
                    tags.push((*tag).to_owned());
                }
            }
        }
    }
    if tags.is_empty() { None } else { Some(tags) }
}
