//! License finders.
//!
//! A finder turns a module coordinate into an [`Outcome`]. Finders are tried
//! in priority order; the first `Found` or `Failed` outcome ends the search.
//!
//! - [`mapper`]: user `override` table, no network
//! - [`github`]: GitHub repository license API, with a content classifier
//!   fallback when the API reports no SPDX id

use async_trait::async_trait;
use tracing::debug;

use crate::models::{Module, Outcome};
use crate::status::StatusHandle;

pub mod github;
pub mod mapper;

#[async_trait]
pub trait Finder: Send + Sync {
    fn name(&self) -> &'static str;

    async fn find(&self, module: &Module, status: &StatusHandle) -> Outcome;
}

/// Run `finders` in order. `NotFound` only if every finder says so.
pub async fn find(module: &Module, finders: &[Box<dyn Finder>], status: &StatusHandle) -> Outcome {
    for finder in finders {
        match finder.find(module, status).await {
            Outcome::NotFound => continue,
            outcome => {
                debug!(module = %module.path, finder = finder.name(), ?outcome, "finder answered");
                return outcome;
            }
        }
    }
    Outcome::NotFound
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::models::License;
    use crate::status::StatusChannel;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Answers from a fixed path → outcome table; unknown paths are `NotFound`.
    #[derive(Default)]
    pub(crate) struct TableFinder {
        pub answers: HashMap<String, Outcome>,
        pub calls: Arc<AtomicUsize>,
    }

    impl TableFinder {
        pub(crate) fn with(mut self, path: &str, outcome: Outcome) -> Self {
            self.answers.insert(path.to_string(), outcome);
            self
        }
    }

    #[async_trait]
    impl Finder for TableFinder {
        fn name(&self) -> &'static str {
            "table"
        }

        async fn find(&self, module: &Module, _status: &StatusHandle) -> Outcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers
                .get(&module.path)
                .cloned()
                .unwrap_or(Outcome::NotFound)
        }
    }

    fn mit() -> Outcome {
        Outcome::Found(License::new("MIT License", "MIT"))
    }

    async fn run(finders: &[Box<dyn Finder>]) -> Outcome {
        let module = Module::new("github.com/foo/bar", "v1.0.0");
        let status = StatusChannel::detached().handle(&module);
        find(&module, finders, &status).await
    }

    #[tokio::test]
    async fn test_skips_not_found() {
        let finders: Vec<Box<dyn Finder>> = vec![
            Box::new(TableFinder::default()),
            Box::new(TableFinder::default().with("github.com/foo/bar", mit())),
        ];
        assert_eq!(run(&finders).await, mit());
    }

    #[tokio::test]
    async fn test_failure_stops_the_chain() {
        let later = TableFinder::default().with("github.com/foo/bar", mit());
        let later_calls = later.calls.clone();
        let failed = Outcome::Failed(LookupError::Network("connection reset".to_string()));
        let finders: Vec<Box<dyn Finder>> = vec![
            Box::new(TableFinder::default().with("github.com/foo/bar", failed.clone())),
            Box::new(later),
        ];

        assert_eq!(run(&finders).await, failed);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_not_found() {
        let finders: Vec<Box<dyn Finder>> = vec![
            Box::new(TableFinder::default()),
            Box::new(TableFinder::default()),
        ];
        assert_eq!(run(&finders).await, Outcome::NotFound);
        assert_eq!(run(&[]).await, Outcome::NotFound);
    }
}
