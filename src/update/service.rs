//! Single-flight entry point for update passes

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::update::orchestrator::Updater;
use crate::update::outcome::UpdateReport;
use crate::update::source::AuthConfig;
use crate::update::target::{TargetMap, TargetRegistry, TargetSet};

/// Owns the dynamic registry and runs at most one pass at a time
pub struct UpdateService {
    registry: Arc<TargetRegistry>,
    updater: Updater,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a pass ends, even on panic
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl UpdateService {
    pub fn new(registry: Arc<TargetRegistry>, updater: Updater) -> Self {
        Self {
            registry,
            updater,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Merge the current registrations with freshly loaded file targets
    pub fn targets(&self, file_targets: &TargetMap) -> TargetSet {
        TargetSet::merge(&self.registry.snapshot(), file_targets)
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one pass over the merged target set.
    ///
    /// Returns `None` without doing any work when another pass is still
    /// running.
    pub async fn check(
        &self,
        file_targets: &TargetMap,
        auth: &AuthConfig,
        cancel: &CancellationToken,
    ) -> Option<Vec<UpdateReport>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("An update check is already running; skipping this one");
            return None;
        }
        let _guard = InFlight(&self.in_flight);

        let targets = self.targets(file_targets);
        if targets.is_empty() {
            info!("No plugins configured for update, either from repositories.json or dynamic registration.");
            return Some(Vec::new());
        }

        Some(self.updater.run_pass(&targets, auth, cancel).await)
    }
}
