// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(HomeownerId);
entity_id!(HouseId);
entity_id!(CustomTaskId);
entity_id!(MaintenanceLogId);
entity_id!(ApplianceId);

/// Stable identity of a maintenance task for override and completion lookup.
///
/// Catalog entries carry an explicit key assigned when the catalog is
/// authored. Records written before explicit keys existed are keyed by the
/// slug of the task title, so lookups accept both (see [`TaskKey::matches`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskKey(String);

impl TaskKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn from_title(title: &str) -> Self {
        Self(slugify(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `other` names the task keyed by `self` whose title is
    /// `title`, either by explicit key or by the legacy title slug.
    pub fn matches(&self, other: &TaskKey, title: &str) -> bool {
        self == other || other.0 == slugify(title)
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase, collapse each run of non-alphanumerics into one hyphen, and
/// trim hyphens from both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
