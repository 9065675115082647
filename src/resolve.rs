//! Resolution orchestrator.
//!
//! Every module goes through the same two-phase lookup: the finder chain on
//! the module as declared, and only if that does not find a license, the
//! finder chain again on the translated coordinate. Modules are resolved
//! concurrently, at most `concurrency` at a time.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::{apply_policy, Config};
use crate::finder::{self, Finder};
use crate::models::{Module, Outcome, Resolution};
use crate::status::{StatusChannel, StatusHandle, UpdateKind};
use crate::translate::{self, Translator};

pub const DEFAULT_CONCURRENCY: usize = 5;

pub struct Resolver {
    translators: Vec<Box<dyn Translator>>,
    finders: Vec<Box<dyn Finder>>,
    policy: Option<Config>,
    concurrency: usize,
}

impl Resolver {
    pub fn new(translators: Vec<Box<dyn Translator>>, finders: Vec<Box<dyn Finder>>) -> Self {
        Self {
            translators,
            finders,
            policy: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_policy(mut self, policy: Option<Config>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Resolve a single module: direct lookup, then translated lookup.
    ///
    /// The translated outcome is final even when it is no better than the
    /// direct one.
    pub async fn resolve(&self, module: &Module, status: &StatusHandle) -> Outcome {
        let direct = finder::find(module, &self.finders, status).await;
        if direct.is_found() {
            return direct;
        }

        if let Outcome::Failed(err) = &direct {
            status.update(UpdateKind::Error, format!("lookup failed: {}", err));
        }
        debug!(module = %module.path, ?direct, "direct lookup found nothing, translating");
        let (translated, matched) = translate::translate(module, &self.translators, status).await;
        if !matched {
            debug!(module = %module.path, "no translator matched, retrying as-is");
        }
        finder::find(&translated, &self.finders, status).await
    }

    /// Resolve every distinct module and return the results sorted by module.
    ///
    /// Each module runs in its own task; a semaphore permit is held for the
    /// whole two-phase lookup and released before the task reports `Finish`.
    /// Returns once every task has finished.
    pub async fn run(self: Arc<Self>, modules: Vec<Module>, channel: &StatusChannel) -> Vec<Resolution> {
        let modules: BTreeSet<Module> = modules.into_iter().collect();
        info!(
            modules = modules.len(),
            concurrency = self.concurrency,
            "resolving licenses"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set: JoinSet<Resolution> = JoinSet::new();

        for module in modules {
            let resolver = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            let status = channel.handle(&module);

            join_set.spawn(async move {
                // Acquire only fails on a closed semaphore, and this one is never closed.
                let permit = semaphore.acquire_owned().await.ok();

                status.start();
                let outcome = resolver.resolve(&module, &status).await;
                drop(permit);

                let verdict = apply_policy(resolver.policy.as_ref(), &outcome);
                let resolution = Resolution::new(module, outcome, verdict);
                status.finish(resolution.clone());
                resolution
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(resolution) => results.push(resolution),
                Err(e) => error!("license lookup task failed: {}", e),
            }
        }

        results.sort_by(|a, b| a.module.cmp(&b.module));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::finder::tests::TableFinder;
    use crate::models::{License, PolicyVerdict};
    use crate::status::tests::RecordingSink;
    use crate::translate::mapper::MapTranslator;
    use crate::translate::tests::FixedTranslator;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn bsd3() -> License {
        License::new("BSD-3-Clause", "BSD-3-Clause")
    }

    fn detached(module: &Module) -> StatusHandle {
        StatusChannel::detached().handle(module)
    }

    #[tokio::test]
    async fn test_found_directly_skips_translation() {
        let translator = FixedTranslator::new(Some("github.com/other/repo"));
        let translator_calls = translator.calls.clone();
        let finder = TableFinder::default().with("github.com/foo/bar", Outcome::Found(bsd3()));
        let resolver = Resolver::new(vec![Box::new(translator)], vec![Box::new(finder)]);

        let module = Module::new("github.com/foo/bar", "v1.0.0");
        let outcome = resolver.resolve(&module, &detached(&module)).await;

        assert_eq!(outcome, Outcome::Found(bsd3()));
        assert_eq!(translator_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translated_lookup_after_not_found() {
        let mut map = HashMap::new();
        map.insert(
            "go.googlesource.com/text".to_string(),
            "github.com/golang/text".to_string(),
        );
        let finder = TableFinder::default()
            .with("go.googlesource.com/text", Outcome::NotFound)
            .with("github.com/golang/text", Outcome::Found(bsd3()));
        let resolver = Arc::new(Resolver::new(
            vec![Box::new(MapTranslator::new(map))],
            vec![Box::new(finder)],
        ));

        let modules = vec![Module::new("go.googlesource.com/text", "v0.1.0")];
        let results = resolver.run(modules, &StatusChannel::detached()).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].module.path, "go.googlesource.com/text");
        assert_eq!(results[0].outcome, Outcome::Found(bsd3()));
    }

    #[tokio::test]
    async fn test_failure_is_retried_translated() {
        let finder = TableFinder::default()
            .with(
                "example.com/x",
                Outcome::Failed(LookupError::Network("reset".to_string())),
            )
            .with("github.com/example/x", Outcome::Found(bsd3()));
        let resolver = Resolver::new(
            vec![Box::new(FixedTranslator::new(Some("github.com/example/x")))],
            vec![Box::new(finder)],
        );

        let module = Module::new("example.com/x", "v1.0.0");
        assert_eq!(
            resolver.resolve(&module, &detached(&module)).await,
            Outcome::Found(bsd3())
        );
    }

    #[tokio::test]
    async fn test_untranslated_not_found_is_looked_up_twice() {
        let finder = TableFinder::default();
        let calls = finder.calls.clone();
        let resolver = Arc::new(
            Resolver::new(vec![Box::new(FixedTranslator::new(None))], vec![Box::new(finder)])
                .with_policy(Some(Config::new(vec!["*".to_string()], vec![]).unwrap())),
        );

        let results = resolver
            .run(vec![Module::new("example.com/x", "v1.0.0")], &StatusChannel::detached())
            .await;

        assert_eq!(results[0].outcome, Outcome::NotFound);
        assert_eq!(results[0].verdict, PolicyVerdict::Unknown);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_outcome_is_final() {
        let failed = Outcome::Failed(LookupError::Unauthorized);
        let finder = TableFinder::default().with("github.com/example/x", failed.clone());
        let resolver = Resolver::new(
            vec![Box::new(FixedTranslator::new(Some("github.com/example/x")))],
            vec![Box::new(finder)],
        );

        let module = Module::new("example.com/x", "v1.0.0");
        assert_eq!(resolver.resolve(&module, &detached(&module)).await, failed);
    }

    #[tokio::test]
    async fn test_duplicates_are_looked_up_once() {
        let finder = TableFinder::default().with("github.com/foo/bar", Outcome::Found(bsd3()));
        let calls = finder.calls.clone();
        let resolver = Arc::new(Resolver::new(vec![], vec![Box::new(finder)]));

        let mut indirect = Module::new("github.com/foo/bar", "v1.0.0");
        indirect.indirect = true;
        let modules = vec![Module::new("github.com/foo/bar", "v1.0.0"), indirect];
        let results = resolver.run(modules, &StatusChannel::detached()).await;

        assert_eq!(results.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Tracks how many lookups are in flight at once.
    struct SlowFinder {
        live: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        cap: usize,
    }

    #[async_trait]
    impl Finder for SlowFinder {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn find(&self, _module: &Module, _status: &StatusHandle) -> Outcome {
            let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            assert!(now <= self.cap, "{} lookups in flight, cap is {}", now, self.cap);
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.live.fetch_sub(1, Ordering::SeqCst);
            Outcome::NotFound
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_cap_is_respected() {
        let cap = 3;
        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let finder = SlowFinder {
            live: live.clone(),
            peak: peak.clone(),
            cap,
        };
        // NotFound everywhere forces the translated second phase too.
        let resolver = Arc::new(
            Resolver::new(vec![Box::new(FixedTranslator::new(None))], vec![Box::new(finder)])
                .with_concurrency(cap),
        );

        let modules: Vec<Module> = (0..20)
            .map(|i| Module::new(format!("example.com/m{}", i), "v1.0.0"))
            .collect();
        let results = resolver.run(modules, &StatusChannel::detached()).await;

        assert_eq!(results.len(), 20);
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert!(peak.load(Ordering::SeqCst) <= cap);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_every_module_reports_start_and_finish() {
        let sink = Arc::new(RecordingSink::default());
        let (channel, dispatcher) = StatusChannel::spawn(sink.clone());
        let finder = TableFinder::default().with("github.com/a/a", Outcome::Found(bsd3()));
        let resolver = Arc::new(Resolver::new(vec![], vec![Box::new(finder)]));

        let modules = vec![
            Module::new("github.com/a/a", "v1.0.0"),
            Module::new("github.com/b/b", "v1.0.0"),
        ];
        resolver.run(modules, &channel).await;
        drop(channel);
        dispatcher.await.unwrap();

        let events = sink.events.lock().unwrap();
        for path in ["github.com/a/a", "github.com/b/b"] {
            let start = events.iter().position(|e| e == &format!("start {}", path));
            let finish = events
                .iter()
                .position(|e| e.starts_with(&format!("finish {} ", path)));
            assert!(start.is_some() && finish.is_some(), "{:?}", events);
            assert!(start < finish);
        }
    }

    #[tokio::test]
    async fn test_runs_are_idempotent() {
        let build = || {
            let finder = TableFinder::default()
                .with("github.com/golang/text", Outcome::Found(bsd3()))
                .with(
                    "github.com/gpl/thing",
                    Outcome::Found(License::new("GNU General Public License v3.0", "GPL-3.0")),
                )
                .with("example.com/broken", Outcome::Failed(LookupError::Unauthorized));
            let mut map = HashMap::new();
            map.insert(
                "go.googlesource.com/text".to_string(),
                "github.com/golang/text".to_string(),
            );
            let policy = Config::new(vec!["*".to_string()], vec!["GPL*".to_string()]).unwrap();
            Arc::new(
                Resolver::new(vec![Box::new(MapTranslator::new(map))], vec![Box::new(finder)])
                    .with_policy(Some(policy)),
            )
        };
        let modules = || {
            vec![
                Module::new("go.googlesource.com/text", "v0.1.0"),
                Module::new("github.com/gpl/thing", "v1.0.0"),
                Module::new("example.com/broken", "v1.0.0"),
                Module::new("example.com/nothing", "v1.0.0"),
            ]
        };

        let summarize = |results: Vec<Resolution>| {
            results
                .into_iter()
                .map(|r| (r.module.path, r.outcome, r.verdict))
                .collect::<Vec<_>>()
        };
        let first = summarize(build().run(modules(), &StatusChannel::detached()).await);
        let second = summarize(build().run(modules(), &StatusChannel::detached()).await);

        assert_eq!(first, second);
        let verdicts: Vec<_> = first.iter().map(|(p, _, v)| (p.as_str(), *v)).collect();
        assert_eq!(
            verdicts,
            vec![
                ("example.com/broken", PolicyVerdict::Unknown),
                ("example.com/nothing", PolicyVerdict::Unknown),
                ("github.com/gpl/thing", PolicyVerdict::Denied),
                ("go.googlesource.com/text", PolicyVerdict::Allowed),
            ]
        );
    }
}
