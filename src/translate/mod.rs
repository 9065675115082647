//! Coordinate translators.
//!
//! A translator proposes an alternate import path for a module that is more
//! likely to carry discoverable license metadata (usually its GitHub mirror).
//! Translators are tried in priority order and the first match wins:
//!
//! - [`mapper`]: user `translate` table from the policy config
//! - [`vanity`]: follows `go-import` meta tags on vanity import domains
//! - [`golang`]: fixed rewrites for well-known hosts (`golang.org/x`, `k8s.io`, ...)
//! - [`gopkg`]: `gopkg.in` versioned paths

use async_trait::async_trait;
use tracing::debug;

use crate::models::Module;
use crate::status::{StatusHandle, UpdateKind};

pub mod golang;
pub mod gopkg;
pub mod mapper;
pub mod vanity;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Short label used in logs and status updates.
    fn name(&self) -> &'static str;

    /// Return a rewritten module, or `None` if this translator does not apply.
    ///
    /// Implementations that hit the network must map any failure to `None`.
    async fn translate(&self, module: &Module, status: &StatusHandle) -> Option<Module>;
}

/// Run `translators` in order and return the first rewrite.
///
/// When nothing matches the input module is returned unchanged with
/// `matched = false`.
pub async fn translate(
    module: &Module,
    translators: &[Box<dyn Translator>],
    status: &StatusHandle,
) -> (Module, bool) {
    for translator in translators {
        if let Some(translated) = translator.translate(module, status).await {
            debug!(
                module = %module.path,
                translator = translator.name(),
                "translated to {}",
                translated.path
            );
            status.update(
                UpdateKind::Normal,
                format!("translated to {} ({})", translated.path, translator.name()),
            );
            return (translated, true);
        }
    }
    (module.clone(), false)
}
