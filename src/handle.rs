//! Ownership of engine handles.
//!
//! An [`SrsHandle`] either owns its engine handle, in which case the handle is
//! destroyed exactly once when the guard drops, or borrows one whose lifetime
//! is managed elsewhere and never destroys it. [`TransformHandle`] always owns
//! its transformation object.

use crate::engine::{GeodesyEngine, RawSrs, RawTransform};
use crate::lock::engine_lock;
use std::fmt;
use std::sync::Arc;

pub struct SrsHandle {
    engine: Arc<dyn GeodesyEngine>,
    raw: RawSrs,
    owned: bool,
}

impl SrsHandle {
    /// Ask `engine` for a fresh, empty handle owned by the returned guard.
    pub fn new(engine: Arc<dyn GeodesyEngine>) -> Self {
        let raw = {
            let _lock = engine_lock();
            engine.new_handle()
        };
        SrsHandle {
            engine,
            raw,
            owned: true,
        }
    }

    /// Wrap a handle owned by someone else. Dropping the guard leaves it alone.
    pub fn borrowed(engine: Arc<dyn GeodesyEngine>, raw: RawSrs) -> Self {
        SrsHandle {
            engine,
            raw,
            owned: false,
        }
    }

    pub fn raw(&self) -> RawSrs {
        self.raw
    }

    pub fn engine(&self) -> &Arc<dyn GeodesyEngine> {
        &self.engine
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }
}

impl fmt::Debug for SrsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SrsHandle")
            .field("raw", &self.raw)
            .field("owned", &self.owned)
            .finish()
    }
}

impl Drop for SrsHandle {
    fn drop(&mut self) {
        if self.owned {
            let _lock = engine_lock();
            self.engine.destroy_handle(self.raw);
        }
    }
}

/// A transient transformation object, destroyed on drop.
pub(crate) struct TransformHandle<'a> {
    engine: &'a dyn GeodesyEngine,
    raw: RawTransform,
}

impl<'a> TransformHandle<'a> {
    /// `None` when the engine cannot convert between the two systems.
    pub fn new(engine: &'a dyn GeodesyEngine, from: RawSrs, to: RawSrs) -> Option<Self> {
        let _lock = engine_lock();
        let raw = engine.new_transform(from, to)?;
        Some(TransformHandle { engine, raw })
    }

    pub fn raw(&self) -> RawTransform {
        self.raw
    }
}

impl Drop for TransformHandle<'_> {
    fn drop(&mut self) {
        let _lock = engine_lock();
        self.engine.destroy_transform(self.raw);
    }
}
