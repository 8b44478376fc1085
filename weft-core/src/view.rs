//! The view variant
//!
//! A view keeps a view state alongside its config. `picture` emissions merge
//! into that state and schedule an update; however many merges land before
//! the scheduler gets to it, the update flushes once, evaluating the picture
//! over the merged state and handing it to the renderer.

use crate::component::Component;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use weft_types::{InstanceId, Map, Value};

/// Output key that targets the view state
pub const PICTURE: &str = "picture";

/// Evaluates a view state into a picture
pub type PictureFn = Arc<dyn Fn(&Map) -> Value + Send + Sync>;

/// Receives flushed pictures
pub trait Render: Send + Sync {
    fn render(&self, instance: InstanceId, picture: &Value);
}

pub(crate) struct VisualState {
    state: Mutex<Map>,
    pending: AtomicBool,
    picture: PictureFn,
    renderer: Option<Arc<dyn Render>>,
    last: Mutex<Option<Value>>,
    flushes: AtomicU64,
}

impl VisualState {
    pub(crate) fn new(picture: PictureFn, renderer: Option<Arc<dyn Render>>, initial: Map) -> Self {
        Self {
            state: Mutex::new(initial),
            pending: AtomicBool::new(false),
            picture,
            renderer,
            last: Mutex::new(None),
            flushes: AtomicU64::new(0),
        }
    }

    /// Last-writer-wins merge of a partial state
    fn merge(&self, partial: &Value) -> bool {
        let Some(fields) = partial.as_map() else {
            return false;
        };
        let mut state = self.state.lock();
        for (key, value) in fields {
            state.insert(key.clone(), value.clone());
        }
        true
    }

    /// Merge a partial map into one map-valued field
    fn merge_field(&self, field: &str, partial: &Value) {
        let mut state = self.state.lock();
        let entry = state.entry(field.to_string()).or_insert_with(Value::map);
        if !entry.merge(partial) {
            *entry = partial.clone();
        }
    }
}

impl Component {
    /// Snapshot of the view state
    pub fn view_state(&self) -> Option<Map> {
        self.inner.visual.as_ref().map(|visual| visual.state.lock().clone())
    }

    /// Evaluate the picture over the current view state
    pub fn render(&self) -> Option<Value> {
        let visual = self.inner.visual.as_ref()?;
        let state = visual.state.lock().clone();
        let picture = (visual.picture)(&state);
        *visual.last.lock() = Some(picture.clone());
        Some(picture)
    }

    /// The picture produced by the latest render
    pub fn last_picture(&self) -> Option<Value> {
        self.inner.visual.as_ref().and_then(|visual| visual.last.lock().clone())
    }

    /// Number of flushed updates
    pub fn flush_count(&self) -> u64 {
        self.inner
            .visual
            .as_ref()
            .map_or(0, |visual| visual.flushes.load(Ordering::SeqCst))
    }

    pub fn has_pending_update(&self) -> bool {
        self.inner
            .visual
            .as_ref()
            .is_some_and(|visual| visual.pending.load(Ordering::SeqCst))
    }

    pub(crate) fn update_view_state(&self, partial: &Value) {
        let Some(visual) = &self.inner.visual else {
            return;
        };
        if visual.merge(partial) {
            self.enqueue_update();
        } else {
            tracing::trace!(component = %self.id(), value = %partial, "non-map picture ignored");
        }
    }

    pub(crate) fn update_view_field(&self, field: &str, partial: &Value) {
        if let Some(visual) = &self.inner.visual {
            visual.merge_field(field, partial);
            self.enqueue_update();
        }
    }

    /// Schedule a flush unless one is already pending
    pub fn enqueue_update(&self) {
        let Some(visual) = &self.inner.visual else {
            return;
        };
        if visual.pending.swap(true, Ordering::SeqCst) {
            return;
        }

        let owner = self.downgrade();
        self.inner.scheduler.defer(move || {
            if let Some(component) = Component::upgrade(&owner) {
                component.flush_update();
            }
        });
    }

    fn flush_update(&self) {
        let Some(visual) = &self.inner.visual else {
            return;
        };
        visual.pending.store(false, Ordering::SeqCst);

        let Some(picture) = self.render() else {
            return;
        };
        visual.flushes.fetch_add(1, Ordering::SeqCst);
        if let Some(renderer) = &visual.renderer {
            renderer.render(self.id(), &picture);
        }
        tracing::debug!(component = %self.id(), "view updated");
    }
}
