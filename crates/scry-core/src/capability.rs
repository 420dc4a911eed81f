//! Capability interception
//!
//! A [`CapabilitySlot`] holds the current implementation of one shared host
//! capability (a console method, `fetch`, the XHR open/send pair, the history
//! push method). Host code always calls through the slot, so an
//! [`Interceptor`] can swap an instrumented wrapper in and later put back the
//! exact implementation it captured.
//!
//! Known limitation: uninstalling restores the captured original even if a
//! third party replaced the slot after the wrapper went in.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::sync::{read, write};

pub struct CapabilitySlot<T: ?Sized> {
    current: RwLock<Arc<T>>,
}

impl<T: ?Sized> CapabilitySlot<T> {
    pub fn new(initial: Arc<T>) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// The implementation host calls currently dispatch to.
    pub fn current(&self) -> Arc<T> {
        read(&self.current).clone()
    }

    /// Swap in `next`, returning the implementation it displaced.
    pub fn replace(&self, next: Arc<T>) -> Arc<T> {
        std::mem::replace(&mut *write(&self.current), next)
    }

    pub fn is_current(&self, candidate: &Arc<T>) -> bool {
        Arc::ptr_eq(&read(&self.current), candidate)
    }
}

impl<T: ?Sized> fmt::Debug for CapabilitySlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySlot").finish_non_exhaustive()
    }
}

/// Owns one patch of a [`CapabilitySlot`].
///
/// The implementation to restore is captured when the interceptor is created,
/// not when it is installed.
pub struct Interceptor<T: ?Sized> {
    slot: Arc<CapabilitySlot<T>>,
    original: Arc<T>,
    installed: AtomicBool,
}

impl<T: ?Sized> Interceptor<T> {
    pub fn capture(slot: Arc<CapabilitySlot<T>>) -> Self {
        let original = slot.current();
        Self {
            slot,
            original,
            installed: AtomicBool::new(false),
        }
    }

    pub fn original(&self) -> Arc<T> {
        self.original.clone()
    }

    /// Install `wrapper`. Returns false (and leaves the slot alone) when
    /// already installed.
    pub fn install(&self, wrapper: Arc<T>) -> bool {
        if self.installed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.slot.replace(wrapper);
        true
    }

    /// Put the captured original back. No-op when not installed.
    pub fn uninstall(&self) -> bool {
        if !self.installed.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.slot.replace(self.original.clone());
        true
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }
}

impl<T: ?Sized> fmt::Debug for Interceptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("installed", &self.is_installed())
            .finish_non_exhaustive()
    }
}
