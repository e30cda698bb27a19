//! Like toggle and count for one post card.
//!
//! Local state only changes after the gateway confirms a mutation. While a
//! mutation is outstanding the reconciler is `Pending` and further toggles
//! are ignored; the shared [`InFlightRegistry`] extends that guard to every
//! card showing the same post for the same viewer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};

use crate::card::ViewContext;
use crate::error::ActionError;
use crate::models::{LikeKey, PostId};
use crate::notice::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No toggle issued since mount.
    Idle,
    /// A like/unlike call is outstanding.
    Pending,
    /// The last toggle resolved, successfully or not.
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Liked { count: i64 },
    Unliked { count: i64 },
    /// Another toggle for this post was still in flight.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementState {
    pub liked: bool,
    pub count: i64,
    pub phase: Phase,
}

pub struct LikeReconciler {
    post_id: Option<PostId>,
    ctx: ViewContext,
    state: Mutex<EngagementState>,
    // Bumped under the state lock each time a toggle enters `Pending`.
    toggles: AtomicU64,
}

// Clears `Pending` if the toggle future is dropped before the call resolves.
// The call may still have reached the store, so the flag and count can be
// stale afterwards; `mount` again to resync.
struct PendingReset<'a>(&'a Mutex<EngagementState>);

impl Drop for PendingReset<'_> {
    fn drop(&mut self) {
        let mut s = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if s.phase == Phase::Pending {
            s.phase = Phase::Settled;
        }
    }
}

impl LikeReconciler {
    /// `count` is the aggregate the card was rendered with.
    pub fn new(post_id: Option<PostId>, count: i64, ctx: ViewContext) -> Self {
        Self {
            post_id,
            ctx,
            state: Mutex::new(EngagementState { liked: false, count, phase: Phase::Idle }),
            toggles: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngagementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> EngagementState { *self.lock() }
    pub fn liked(&self) -> bool { self.lock().liked }
    pub fn count(&self) -> i64 { self.lock().count }
    pub fn phase(&self) -> Phase { self.lock().phase }
    pub fn post_id(&self) -> Option<PostId> { self.post_id }

    /// Seed the liked flag and count from the store. Anonymous viewers and
    /// unsaved posts keep the rendered values and issue no lookup.
    ///
    /// A snapshot is discarded if any toggle started while it was being
    /// fetched. Call again after a cancelled toggle to resync.
    pub async fn mount(&self) -> Result<(), ActionError> {
        let (Some(post_id), Some(viewer)) = (self.post_id, self.ctx.viewer.as_ref()) else {
            return Ok(());
        };
        let epoch = self.toggles.load(Ordering::SeqCst);
        match self.ctx.gateway.like_snapshot(post_id, viewer.user_id).await {
            Ok(snap) => {
                let mut s = self.lock();
                // snapshot predates a toggle; the toggle's result stands
                if self.toggles.load(Ordering::SeqCst) != epoch {
                    debug!(%post_id, "stale like snapshot discarded");
                } else if s.phase != Phase::Pending {
                    s.liked = snap.liked;
                    s.count = snap.count;
                }
                Ok(())
            }
            Err(e) => {
                warn!(%post_id, "like lookup failed: {e}");
                Err(e.into())
            }
        }
    }

    pub async fn toggle(&self) -> Result<ToggleOutcome, ActionError> {
        let Some(viewer) = self.ctx.viewer.as_ref() else {
            let err = ActionError::Unauthenticated;
            self.ctx.notify(err.notice());
            return Err(err);
        };
        let Some(post_id) = self.post_id else {
            error!("like toggled on a post without an id");
            let err = ActionError::MissingIdentifier;
            self.ctx.notify(err.notice());
            return Err(err);
        };
        let key = LikeKey::new(post_id, viewer.user_id);

        let (was_liked, _guard) = {
            let mut s = self.lock();
            if s.phase == Phase::Pending {
                debug!(%post_id, "toggle ignored, previous call still pending");
                return Ok(ToggleOutcome::Ignored);
            }
            let Some(guard) = self.ctx.inflight.try_acquire(key) else {
                debug!(%post_id, "toggle ignored, another card holds this like");
                return Ok(ToggleOutcome::Ignored);
            };
            s.phase = Phase::Pending;
            self.toggles.fetch_add(1, Ordering::SeqCst);
            (s.liked, guard)
        };
        let _reset = PendingReset(&self.state);

        let result = if was_liked {
            self.ctx.gateway.delete_like(post_id, viewer.user_id).await
        } else {
            self.ctx.gateway.insert_like(post_id, viewer.user_id).await.map(|_| ())
        };

        let mut s = self.lock();
        s.phase = Phase::Settled;
        match result {
            Ok(()) if was_liked => {
                s.liked = false;
                s.count -= 1;
                Ok(ToggleOutcome::Unliked { count: s.count })
            }
            Ok(()) => {
                s.liked = true;
                s.count += 1;
                Ok(ToggleOutcome::Liked { count: s.count })
            }
            Err(e) => {
                drop(s);
                warn!(%post_id, liked = was_liked, "like toggle rejected: {e}");
                let action = if was_liked { "unlike" } else { "like" };
                self.ctx.notify(Notice::error("Error", format!("Failed to {action} post")));
                Err(e.into())
            }
        }
    }
}
