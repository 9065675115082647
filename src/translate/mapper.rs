use std::collections::HashMap;

use async_trait::async_trait;

use crate::models::Module;
use crate::status::StatusHandle;

/// Rewrites paths through the user's `translate` table.
///
/// A key matches the exact path or any path below it (`key/...`); the
/// longest matching key wins, and the remainder of the path is kept.
pub struct MapTranslator {
    map: HashMap<String, String>,
}

impl MapTranslator {
    pub fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    fn rewrite(&self, path: &str) -> Option<String> {
        if let Some(to) = self.map.get(path) {
            return Some(to.clone());
        }

        self.map
            .iter()
            .filter(|(from, _)| {
                path.strip_prefix(from.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|(from, _)| from.len())
            .map(|(from, to)| format!("{}{}", to, &path[from.len()..]))
    }
}

#[async_trait]
impl super::Translator for MapTranslator {
    fn name(&self) -> &'static str {
        "config"
    }

    async fn translate(&self, module: &Module, _status: &StatusHandle) -> Option<Module> {
        self.rewrite(&module.path).map(|path| module.with_path(path))
    }
}
