use std::collections::HashMap;

use async_trait::async_trait;

use crate::license::spdx;
use crate::models::{License, Module, Outcome};
use crate::status::StatusHandle;

/// Answers from the user's `override` table (module path → license).
///
/// Values naming a registered SPDX id (or a common alias of one) resolve to
/// the canonical name; anything else is kept as a free-text license name.
pub struct OverrideFinder {
    map: HashMap<String, String>,
}

impl OverrideFinder {
    pub fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }
}

pub fn license_from_str(value: &str) -> License {
    let value = value.trim();
    match spdx::lookup(value).or_else(|| spdx::lookup(&spdx::normalize(value))) {
        Some(entry) => License::new(entry.name, entry.id),
        None => License::new(value, ""),
    }
}

#[async_trait]
impl super::Finder for OverrideFinder {
    fn name(&self) -> &'static str {
        "override"
    }

    async fn find(&self, module: &Module, _status: &StatusHandle) -> Outcome {
        match self.map.get(&module.path) {
            Some(value) => Outcome::Found(license_from_str(value)),
            None => Outcome::NotFound,
        }
    }
}
