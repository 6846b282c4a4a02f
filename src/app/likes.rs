use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::Result;
use crate::infra::api::BlogApi;

/// Point-in-time view of a like state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeSnapshot {
    pub liked: bool,
    pub count: u64,
}

#[derive(Debug)]
struct LikeCell {
    liked: bool,
    count: u64,
    // Monotonic per-entity sequence; a revert or reconciliation only lands
    // when no newer write has touched the cell in the meantime.
    seq: u64,
}

/// Live like display state for one likable entity, shared between the view
/// and any in-flight toggle requests.
#[derive(Clone, Debug)]
pub struct LikeHandle {
    cell: Arc<Mutex<LikeCell>>,
}

impl LikeHandle {
    pub fn new(liked: bool, count: u64) -> Self {
        Self {
            cell: Arc::new(Mutex::new(LikeCell {
                liked,
                count,
                seq: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> LikeSnapshot {
        let cell = self.cell.lock().unwrap();
        LikeSnapshot {
            liked: cell.liked,
            count: cell.count,
        }
    }

    pub fn liked(&self) -> bool {
        self.snapshot().liked
    }

    pub fn count(&self) -> u64 {
        self.snapshot().count
    }

    /// Replaces the local view with server truth.
    pub(crate) fn reconcile(&self, liked: bool, count: u64) {
        let mut cell = self.cell.lock().unwrap();
        cell.liked = liked;
        cell.count = count;
        cell.seq += 1;
    }

    /// Applies the optimistic flip against the state at the time of
    /// invocation and returns the pre-toggle snapshot plus the write's
    /// sequence number.
    fn begin_toggle(&self) -> (LikeSnapshot, u64) {
        let mut cell = self.cell.lock().unwrap();
        let prev = LikeSnapshot {
            liked: cell.liked,
            count: cell.count,
        };
        cell.liked = !cell.liked;
        cell.count = if cell.liked {
            cell.count + 1
        } else {
            cell.count.saturating_sub(1)
        };
        cell.seq += 1;
        (prev, cell.seq)
    }

    /// Restores the pre-toggle snapshot unless a newer write superseded this
    /// toggle. Returns whether the revert was applied.
    fn revert(&self, prev: LikeSnapshot, seq: u64) -> bool {
        let mut cell = self.cell.lock().unwrap();
        if cell.seq != seq {
            return false;
        }
        cell.liked = prev.liked;
        cell.count = prev.count;
        cell.seq += 1;
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub enum LikeTarget<'a> {
    Post(&'a str),
    Comment(&'a str),
}

/// Optimistic boolean-toggle-with-count over any likable entity.
///
/// The flip is applied to the shared display state immediately; the remote
/// toggle follows. A remote failure restores the exact pre-toggle values,
/// unless a newer toggle or reconciliation already replaced them.
pub struct LikeToggleController {
    api: Arc<dyn BlogApi>,
}

impl LikeToggleController {
    pub fn new(api: Arc<dyn BlogApi>) -> Self {
        Self { api }
    }

    pub async fn toggle(&self, target: LikeTarget<'_>, state: &LikeHandle) -> Result<()> {
        let (prev, seq) = state.begin_toggle();

        let outcome = match target {
            LikeTarget::Post(id) => self.api.toggle_post_like(id).await,
            LikeTarget::Comment(id) => self.api.toggle_comment_like(id).await,
        };

        if let Err(err) = outcome {
            if !state.revert(prev, seq) {
                debug!("discarding stale like revert");
            }
            return Err(err.into());
        }

        Ok(())
    }
}
