//! Wall-clock seam so cache expiry and time factors can be tested.

use chrono::{Local, NaiveDateTime};

/// Source of the current local wall-clock time.
///
/// Implementations must be thread-safe so the background refresher can
/// share the engine's clock.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// [`Clock`] backed by the operating system's local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
