//! Viewport dimensions as seen by the petal shower.

use serde::Deserialize;
use std::sync::{Arc, RwLock};

/// The visible area petals fall through, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A zero-sized or non-finite viewport can't show anything.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Reports the current viewport, or `None` in a headless context.
pub trait ViewportSource: Send + Sync {
    fn viewport(&self) -> Option<Viewport>;
}

/// No viewport at all, e.g. when rendering without a display.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl ViewportSource for Headless {
    fn viewport(&self) -> Option<Viewport> {
        None
    }
}

impl ViewportSource for Viewport {
    fn viewport(&self) -> Option<Viewport> {
        self.is_usable().then_some(*self)
    }
}

/// A viewport that can be resized (or removed) while petals are falling.
#[derive(Debug, Clone, Default)]
pub struct SharedViewport {
    inner: Arc<RwLock<Option<Viewport>>>,
}

impl SharedViewport {
    pub fn new(viewport: Option<Viewport>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(viewport)),
        }
    }

    pub fn resize(&self, width: f32, height: f32) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Some(Viewport::new(width, height));
    }

    pub fn detach(&self) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl ViewportSource for SharedViewport {
    fn viewport(&self) -> Option<Viewport> {
        let viewport = *self.inner.read().unwrap_or_else(|e| e.into_inner());
        viewport.filter(Viewport::is_usable)
    }
}
