//! The process-wide lock serializing every call into the geodesy engine.
//!
//! Engines are not assumed to be reentrant across threads, so every engine
//! call made by this crate happens while holding this lock. The lock is
//! reentrant: a thread that already holds it (for example while building a
//! transform) can call accessors that take it again.

use lazy_static::lazy_static;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

lazy_static! {
    static ref ENGINE_LOCK: ReentrantMutex<()> = ReentrantMutex::new(());
}

/// Guard returned by [`engine_lock`]. The lock is released on drop.
pub type EngineGuard = ReentrantMutexGuard<'static, ()>;

/// Acquire the engine lock, blocking until it is available.
pub fn engine_lock() -> EngineGuard {
    ENGINE_LOCK.lock()
}
