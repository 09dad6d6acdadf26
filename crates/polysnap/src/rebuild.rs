use std::sync::{
    Arc, Weak,
    atomic::{AtomicBool, Ordering},
};

use tracing::debug;

/// Capability handed to the host's viewport-change notifications. It can
/// only request a rebuild; the session performs it on its next event.
#[derive(Debug, Clone)]
pub struct RebuildHandle {
    requested: Weak<AtomicBool>,
}

impl RebuildHandle {
    /// Returns `false` once the drawing session has ended, in which case the
    /// request is dropped.
    pub fn request_rebuild(&self) -> bool {
        match self.requested.upgrade() {
            Some(requested) => {
                requested.store(true, Ordering::Release);
                true
            }
            None => {
                debug!("Ignoring rebuild request, drawing session has ended");
                false
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.requested.strong_count() > 0
    }
}

/// Session side of [`RebuildHandle`].
#[derive(Debug, Default)]
pub(crate) struct RebuildSignal {
    requested: Arc<AtomicBool>,
}

impl RebuildSignal {
    pub(crate) fn handle(&self) -> RebuildHandle {
        RebuildHandle {
            requested: Arc::downgrade(&self.requested),
        }
    }

    pub(crate) fn take(&self) -> bool {
        self.requested.swap(false, Ordering::AcqRel)
    }
}
