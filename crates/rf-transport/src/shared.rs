use crate::{BackendInfo, Gpio, Level, PinNumbering, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to one [`Gpio`] backend.
///
/// Backends such as rppal claim pins process-wide, so several drivers on the
/// same data pin must go through a single handle. Each call locks the backend
/// for its duration; a pin claimed by one clone is claimed for all of them.
pub struct SharedGpio<G> {
    inner: Arc<Mutex<G>>,
}

impl<G> SharedGpio<G> {
    pub fn new(gpio: G) -> Self {
        Self {
            inner: Arc::new(Mutex::new(gpio)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, G> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the underlying backend.
    pub fn with<R>(&self, f: impl FnOnce(&G) -> R) -> R {
        f(&self.lock())
    }
}

impl<G> Clone for SharedGpio<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: Gpio> Gpio for SharedGpio<G> {
    fn info(&self) -> BackendInfo {
        self.lock().info()
    }

    fn set_mode(&mut self, mode: PinNumbering) -> Result<()> {
        self.lock().set_mode(mode)
    }

    fn configure_output(&mut self, pin: u8) -> Result<()> {
        self.lock().configure_output(pin)
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<()> {
        self.lock().write(pin, level)
    }

    fn delay_us(&mut self, us: u64) {
        self.lock().delay_us(us)
    }

    fn release_all(&mut self) {
        self.lock().release_all()
    }
}
