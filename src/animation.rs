//! Time-driven property tweening.
//!
//! An [`AnimationScheduler`] owns a registry of tweens, each writing an
//! interpolated value into a shared [`TweenTarget`] on every
//! [`AnimationScheduler::update`]. Schedulers are plain values: construct one
//! per owner and pass it where it is needed.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::easing::Easing;
use crate::math::{Vec2, Vec3, Vec4};

/// Linear blend between two values of the same type.
pub trait Interpolate: Copy {
    fn interpolate(from: &Self, to: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(from: &Self, to: &Self, t: f32) -> Self {
        *from + (*to - *from) * t
    }
}

impl Interpolate for Vec2 {
    fn interpolate(from: &Self, to: &Self, t: f32) -> Self {
        *from + (*to - *from) * t
    }
}

impl Interpolate for Vec3 {
    fn interpolate(from: &Self, to: &Self, t: f32) -> Self {
        *from + (*to - *from) * t
    }
}

impl Interpolate for Vec4 {
    fn interpolate(from: &Self, to: &Self, t: f32) -> Self {
        *from + (*to - *from) * t
    }
}

/// Shared handle to the value a tween writes. Clones refer to the same slot.
pub struct TweenTarget<T>(Rc<Cell<T>>);

impl<T: Copy> TweenTarget<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    pub fn get(&self) -> T {
        self.0.get()
    }

    pub fn set(&self, value: T) {
        self.0.set(value);
    }
}

impl<T> Clone for TweenTarget<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for TweenTarget<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TweenTarget").field(&self.get()).finish()
    }
}

impl<T: Copy + Default> Default for TweenTarget<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Identifier returned by [`AnimationScheduler::create_tween`].
///
/// [`AnimationId::NONE`] (zero) means the tween was not created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u32);

impl AnimationId {
    pub const NONE: Self = Self(0);

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type CompletionCallback = Box<dyn FnOnce()>;

/// Object-safe view of a tween of any value type.
trait ActiveTween {
    fn id(&self) -> AnimationId;

    /// Advances by `delta_time` and writes the target. Returns true once the
    /// end value has been written.
    fn advance(&mut self, delta_time: f32) -> bool;

    fn rewind(&mut self);

    fn take_on_complete(&mut self) -> Option<CompletionCallback>;
}

struct Tween<T> {
    id: AnimationId,
    target: TweenTarget<T>,
    start: T,
    end: T,
    duration: f32,
    elapsed: f32,
    easing: Easing,
    on_complete: Option<CompletionCallback>,
}

impl<T: Interpolate> ActiveTween for Tween<T> {
    fn id(&self) -> AnimationId {
        self.id
    }

    fn advance(&mut self, delta_time: f32) -> bool {
        self.elapsed += delta_time;
        let progress = if self.duration > 0.0 {
            (self.elapsed / self.duration).min(1.0)
        } else {
            1.0
        };

        if progress >= 1.0 {
            self.target.set(self.end);
            return true;
        }

        let eased = self.easing.apply(progress.max(0.0));
        self.target.set(T::interpolate(&self.start, &self.end, eased));
        false
    }

    fn rewind(&mut self) {
        self.elapsed = 0.0;
        self.target.set(self.start);
    }

    fn take_on_complete(&mut self) -> Option<CompletionCallback> {
        self.on_complete.take()
    }
}

pub struct AnimationScheduler {
    tweens: Vec<Box<dyn ActiveTween>>,
    next_id: u32,
    initialized: bool,
}

impl AnimationScheduler {
    /// Builds an uninitialized scheduler; [`AnimationScheduler::initialize`]
    /// must run before tweens can be created.
    pub fn new() -> Self {
        Self {
            tweens: Vec::new(),
            next_id: 1,
            initialized: false,
        }
    }

    pub fn initialize(&mut self) -> bool {
        if self.initialized {
            log::warn!("animation scheduler already initialized");
            return true;
        }

        self.tweens.clear();
        self.next_id = 1;
        self.initialized = true;

        log::info!("animation scheduler initialized");
        true
    }

    /// Drops every tween without firing completion callbacks.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }

        self.stop_all();
        self.initialized = false;

        log::info!("animation scheduler shut down");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Registers a tween writing `target` from `start` to `end` over
    /// `duration` seconds. Returns [`AnimationId::NONE`] when the scheduler
    /// is not initialized.
    pub fn create_tween<T: Interpolate + 'static>(
        &mut self,
        target: &TweenTarget<T>,
        start: T,
        end: T,
        duration: f32,
        easing: Easing,
        on_complete: Option<CompletionCallback>,
    ) -> AnimationId {
        if !self.initialized {
            log::error!("animation scheduler not initialized; tween dropped");
            return AnimationId::NONE;
        }

        let id = AnimationId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);

        let duration = if duration.is_finite() { duration } else { 0.0 };
        self.tweens.push(Box::new(Tween {
            id,
            target: target.clone(),
            start,
            end,
            duration,
            elapsed: 0.0,
            easing,
            on_complete,
        }));

        log::debug!(
            "created {} tween {} ({:.3}s)",
            std::any::type_name::<T>(),
            id,
            duration
        );
        id
    }

    /// Advances every tween. Finished tweens receive their exact end value,
    /// leave the registry, and then fire their callbacks in registry order
    /// before this call returns.
    pub fn update(&mut self, delta_time: f32) {
        if !self.initialized || self.tweens.is_empty() {
            return;
        }
        let delta_time = if delta_time.is_finite() {
            delta_time.max(0.0)
        } else {
            0.0
        };

        let mut completed = Vec::new();
        self.tweens.retain_mut(|tween| {
            if tween.advance(delta_time) {
                if let Some(callback) = tween.take_on_complete() {
                    completed.push(callback);
                }
                false
            } else {
                true
            }
        });

        for callback in completed {
            callback();
        }
    }

    /// Removes a tween without firing its callback. Unknown ids are ignored.
    pub fn stop_animation(&mut self, id: AnimationId) {
        let before = self.tweens.len();
        self.tweens.retain(|tween| tween.id() != id);
        if self.tweens.len() != before {
            log::debug!("stopped tween {}", id);
        }
    }

    /// Removes every tween without firing callbacks.
    pub fn stop_all(&mut self) {
        let count = self.tweens.len();
        self.tweens.clear();
        if count > 0 {
            log::debug!("stopped all {} tweens", count);
        }
    }

    /// Rewinds a running tween to its start value. Returns false for unknown
    /// ids.
    pub fn restart(&mut self, id: AnimationId) -> bool {
        match self.tweens.iter_mut().find(|tween| tween.id() == id) {
            Some(tween) => {
                tween.rewind();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, id: AnimationId) -> bool {
        !id.is_none() && self.tweens.iter().any(|tween| tween.id() == id)
    }

    pub fn active_animation_count(&self) -> u32 {
        self.tweens.len() as u32
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}
