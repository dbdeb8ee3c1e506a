//! Per-character effect strategies consumed by the text renderer.

use crate::animation::TweenTarget;
use crate::glitch::{CharacterGlitchState, GlitchGenerator};
use crate::math::{Vec2, Vec3};

/// How one glyph deviates from plain rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharTransform {
    pub offset: Vec2,
    pub color_mod: Vec3,
    pub alpha: f32,
    pub scale: f32,
    pub visible: bool,
    /// Request for an extra, dimmer copy at this offset from the glyph.
    pub duplicate: Option<Vec2>,
}

impl CharTransform {
    pub const IDENTITY: Self = Self {
        offset: Vec2::ZERO,
        color_mod: Vec3::ONE,
        alpha: 1.0,
        scale: 1.0,
        visible: true,
        duplicate: None,
    };

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::IDENTITY
        }
    }

    /// Layers `other` on top of `self`: offsets add, color, alpha and scale
    /// multiply, visibility requires both, the first duplicate request wins.
    pub fn then(self, other: Self) -> Self {
        Self {
            offset: self.offset + other.offset,
            color_mod: self.color_mod.modulate(other.color_mod),
            alpha: self.alpha * other.alpha,
            scale: self.scale * other.scale,
            visible: self.visible && other.visible,
            duplicate: self.duplicate.or(other.duplicate),
        }
    }
}

impl Default for CharTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<CharacterGlitchState> for CharTransform {
    fn from(state: CharacterGlitchState) -> Self {
        Self {
            offset: state.offset,
            color_mod: state.color_mod,
            alpha: state.alpha,
            scale: state.scale,
            visible: state.visible,
            duplicate: state.duplicate.then_some(state.duplicate_offset),
        }
    }
}

/// Strategy computing a glyph's transform from its position in the string.
pub trait CharacterEffect {
    fn compute(&self, index: u32, count: u32) -> CharTransform;
}

impl CharacterEffect for GlitchGenerator {
    fn compute(&self, index: u32, count: u32) -> CharTransform {
        self.get_character_state(index, count).into()
    }
}

impl<F> CharacterEffect for F
where
    F: Fn(u32, u32) -> CharTransform,
{
    fn compute(&self, index: u32, count: u32) -> CharTransform {
        self(index, count)
    }
}

/// Several effects applied in order.
#[derive(Default)]
pub struct EffectStack<'a> {
    effects: Vec<&'a dyn CharacterEffect>,
}

impl<'a> EffectStack<'a> {
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    pub fn with(mut self, effect: &'a dyn CharacterEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn push(&mut self, effect: &'a dyn CharacterEffect) {
        self.effects.push(effect);
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl CharacterEffect for EffectStack<'_> {
    fn compute(&self, index: u32, count: u32) -> CharTransform {
        self.effects
            .iter()
            .fold(CharTransform::IDENTITY, |acc, effect| {
                acc.then(effect.compute(index, count))
            })
    }
}

/// Whole-string transform read from tween targets each frame.
#[derive(Debug, Clone, Default)]
pub struct TweenedTransform {
    pub offset: Option<TweenTarget<Vec2>>,
    pub tint: Option<TweenTarget<Vec3>>,
    pub alpha: Option<TweenTarget<f32>>,
    pub scale: Option<TweenTarget<f32>>,
}

impl CharacterEffect for TweenedTransform {
    fn compute(&self, _index: u32, _count: u32) -> CharTransform {
        CharTransform {
            offset: self.offset.as_ref().map_or(Vec2::ZERO, TweenTarget::get),
            color_mod: self.tint.as_ref().map_or(Vec3::ONE, TweenTarget::get),
            alpha: self.alpha.as_ref().map_or(1.0, TweenTarget::get),
            scale: self.scale.as_ref().map_or(1.0, TweenTarget::get),
            ..CharTransform::IDENTITY
        }
    }
}

/// Typewriter reveal: characters past `progress * count` stay hidden.
#[derive(Debug, Clone)]
pub struct RevealEffect {
    progress: TweenTarget<f32>,
}

impl RevealEffect {
    pub fn new(progress: TweenTarget<f32>) -> Self {
        Self { progress }
    }

    pub fn revealed_count(&self, count: u32) -> u32 {
        let progress = self.progress.get().clamp(0.0, 1.0);
        ((progress * count as f32).floor() as u32).min(count)
    }
}

impl CharacterEffect for RevealEffect {
    fn compute(&self, index: u32, count: u32) -> CharTransform {
        if index < self.revealed_count(count) {
            CharTransform::IDENTITY
        } else {
            CharTransform::hidden()
        }
    }
}
