//! Procedural per-character glitch generator.
//!
//! A [`GlitchGenerator`] runs an idle/active timing state machine once per
//! frame via [`GlitchGenerator::update`]. While active, callers query
//! [`GlitchGenerator::get_character_state`] for every glyph; the query is pure
//! and returns [`CharacterGlitchState::NEUTRAL`] whenever the generator is
//! idle, disabled or uninitialized.

use anyhow::Result;

use crate::glitch_config::GlitchConfig;
use crate::math::{Vec2, Vec3};
use crate::noise::{channel_noise, NoiseChannel, XorShift64};

pub const REFERENCE_WIDTH: f32 = 1920.0;
pub const REFERENCE_HEIGHT: f32 = 1080.0;
pub const MIN_RESOLUTION_SCALE: f32 = 0.3;
pub const MAX_RESOLUTION_SCALE: f32 = 3.0;

/// Fraction of the active phase spent ramping up to full intensity.
const RAMP_FRACTION: f32 = 0.2;

const SLICE_GATE: f32 = 0.15;
const BLOCK_GATE: f32 = 0.2;
const DISPLACEMENT_GATE: f32 = 0.1;
const DUPLICATION_GATE: f32 = 0.3;
const COLOR_GATE: f32 = 0.2;

/// Blocks whose draw falls below this stay in place.
const BLOCK_MOVE_THRESHOLD: f32 = 0.6;
/// Slice zones move ten times per second.
const SLICE_ZONE_RATE: f32 = 10.0;
const WAVE_WEIGHT: f32 = 0.7;
const RANDOM_WEIGHT: f32 = 0.3;
const SCANLINE_DIM: f32 = 0.8;

/// Mutable timing state owned by a [`GlitchGenerator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlitchRuntimeState {
    pub is_glitching: bool,
    /// Seconds into the active phase, `0..=duration`.
    pub glitch_timer: f32,
    /// Seconds left until the next glitch while idle.
    pub idle_timer: f32,
    /// Envelope value in `0..=config.intensity`.
    pub current_intensity: f32,
    /// Monotonic clock driving waves, slice zones and scanlines.
    pub elapsed_time: f32,
    /// Re-rolled on every cycle transition.
    pub noise_seed: u32,
    pub resolution_scale: f32,
}

impl Default for GlitchRuntimeState {
    fn default() -> Self {
        Self {
            is_glitching: false,
            glitch_timer: 0.0,
            idle_timer: 0.0,
            current_intensity: 0.0,
            elapsed_time: 0.0,
            noise_seed: 0,
            resolution_scale: 1.0,
        }
    }
}

/// Transform for one character in one frame. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterGlitchState {
    /// Position offset in pixels.
    pub offset: Vec2,
    /// RGB multiplier applied to the base color.
    pub color_mod: Vec3,
    pub alpha: f32,
    pub scale: f32,
    pub visible: bool,
    /// The caller should draw a second, dimmer copy at `duplicate_offset`.
    pub duplicate: bool,
    pub duplicate_offset: Vec2,
    /// Horizontal slice displacement, already included in `offset`.
    pub slice_offset: f32,
    pub in_slice_zone: bool,
    pub scanline_phase: f32,
}

impl CharacterGlitchState {
    pub const NEUTRAL: Self = Self {
        offset: Vec2::ZERO,
        color_mod: Vec3::ONE,
        alpha: 1.0,
        scale: 1.0,
        visible: true,
        duplicate: false,
        duplicate_offset: Vec2::ZERO,
        slice_offset: 0.0,
        in_slice_zone: false,
        scanline_phase: 0.0,
    };

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

impl Default for CharacterGlitchState {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

pub struct GlitchGenerator {
    config: GlitchConfig,
    state: GlitchRuntimeState,
    rng: XorShift64,
    initialized: bool,
    screen_width: u32,
    screen_height: u32,
}

impl GlitchGenerator {
    /// Builds a generator after validating `config`.
    ///
    /// The generator stays inert until [`GlitchGenerator::initialize`] runs.
    pub fn new(config: GlitchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: GlitchRuntimeState::default(),
            rng: XorShift64::from_seed(0),
            initialized: false,
            screen_width: REFERENCE_WIDTH as u32,
            screen_height: REFERENCE_HEIGHT as u32,
        })
    }

    /// Seeds the noise seed stream and arms the idle countdown. Calling it
    /// again is a logged no-op.
    pub fn initialize(&mut self) -> bool {
        if self.initialized {
            log::warn!("glitch generator already initialized");
            return true;
        }

        let stream_seed = self.config.seed.unwrap_or_else(rand::random);
        self.rng = XorShift64::from_seed(stream_seed);
        self.state.noise_seed = self.rng.next_u32();
        self.state.idle_timer = self.config.idle_time;
        self.initialized = true;

        log::info!(
            "glitch generator initialized (idle {:.2}s, active {:.2}s)",
            self.config.idle_time,
            self.config.duration
        );
        true
    }

    /// Advances the timing state machine by `delta_time` seconds.
    ///
    /// Negative or non-finite deltas are treated as zero.
    pub fn update(&mut self, delta_time: f32) {
        if !self.initialized {
            return;
        }
        let delta_time = if delta_time.is_finite() {
            delta_time.max(0.0)
        } else {
            0.0
        };

        self.state.elapsed_time += delta_time;
        if !self.config.enabled {
            return;
        }

        if self.state.is_glitching {
            self.state.glitch_timer += delta_time;
            if self.state.glitch_timer >= self.config.duration {
                self.end_glitch();
            } else {
                let progress = self.state.glitch_timer / self.config.duration;
                self.state.current_intensity = envelope(progress, self.config.intensity);
            }
        } else {
            self.state.idle_timer -= delta_time;
            if self.state.idle_timer <= 0.0 {
                self.trigger_glitch();
            }
        }
    }

    /// Forces the idle state and restarts the clocks, e.g. when the owning
    /// widget becomes visible again.
    pub fn reset(&mut self) {
        self.state.is_glitching = false;
        self.state.glitch_timer = 0.0;
        self.state.idle_timer = self.config.idle_time;
        self.state.current_intensity = 0.0;
        self.state.elapsed_time = 0.0;
        self.roll_noise_seed();
    }

    /// Starts a glitch immediately, skipping the idle countdown.
    pub fn trigger_glitch(&mut self) {
        if !self.initialized || !self.config.enabled {
            log::debug!("glitch trigger ignored: generator inactive");
            return;
        }

        self.state.is_glitching = true;
        self.state.glitch_timer = 0.0;
        self.state.current_intensity = 0.0;
        self.roll_noise_seed();

        log::debug!("glitch triggered (seed {:#010x})", self.state.noise_seed);
    }

    /// Recomputes the resolution scale against the 1920x1080 reference,
    /// using the tighter axis so the effect reads on any aspect ratio.
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.screen_width = width;
        self.screen_height = height;
        self.state.resolution_scale = resolution_scale(width, height);

        log::debug!(
            "glitch screen size {}x{}, scale {:.3}",
            width,
            height,
            self.state.resolution_scale
        );
    }

    /// Replaces the whole configuration. An invalid config leaves the
    /// current one in place.
    pub fn set_config(&mut self, config: GlitchConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        if !self.config.enabled {
            self.drop_to_idle();
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        let config = GlitchConfig {
            enabled,
            ..self.config.clone()
        };
        self.set_config(config)
    }

    pub fn config(&self) -> &GlitchConfig {
        &self.config
    }

    pub fn runtime(&self) -> GlitchRuntimeState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_active(&self) -> bool {
        self.state.is_glitching
    }

    pub fn current_intensity(&self) -> f32 {
        self.state.current_intensity
    }

    pub fn elapsed_time(&self) -> f32 {
        self.state.elapsed_time
    }

    pub fn noise_seed(&self) -> u32 {
        self.state.noise_seed
    }

    pub fn resolution_scale(&self) -> f32 {
        self.state.resolution_scale
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    /// Scanline scroll position in pixels, `0..scanline_height * 10`.
    pub fn scanline_phase(&self) -> f32 {
        if !self.config.scanlines || self.config.scanline_height <= 0.0 {
            return 0.0;
        }
        (self.state.elapsed_time * self.config.scanline_speed)
            .rem_euclid(self.config.scanline_height * 10.0)
    }

    /// Per-character transform for the current frame. Pure: never touches
    /// generator state, so repeated queries within a frame agree.
    pub fn get_character_state(&self, char_index: u32, character_count: u32) -> CharacterGlitchState {
        let mut state = CharacterGlitchState::NEUTRAL;
        if !self.initialized || !self.config.enabled || !self.state.is_glitching {
            return state;
        }

        let config = &self.config;
        let kind = config.kind;
        let intensity = self.state.current_intensity;
        let seed = self.state.noise_seed;

        if config.text_slicing && kind.allows_slicing() && intensity > SLICE_GATE {
            if let Some(offset) = self.slice_offset(char_index, character_count) {
                state.slice_offset = offset * intensity;
                state.in_slice_zone = true;
                state.offset.x += state.slice_offset;
            }
        }

        if config.block_displacement && kind.allows_blocks() && intensity > BLOCK_GATE {
            state.offset += self.block_offset(char_index, character_count) * intensity;
        }

        if config.character_displacement && kind.allows_displacement() && intensity > DISPLACEMENT_GATE
        {
            let wave = self.wave_offset(char_index, character_count);
            let blend = if kind.allows_random_jitter() {
                wave * WAVE_WEIGHT + self.random_offset(char_index) * RANDOM_WEIGHT
            } else {
                wave
            };
            let modulation = channel_noise(NoiseChannel::JitterModulation, char_index, seed);
            state.offset += blend * (intensity * modulation);
        }

        if config.text_duplication && kind.allows_duplication() && intensity > DUPLICATION_GATE {
            if let Some(offset) = self.duplicate_offset(char_index) {
                state.duplicate = true;
                state.duplicate_offset = offset * (intensity * self.state.resolution_scale);
            }
        }

        if kind.allows_color() && intensity > COLOR_GATE {
            if config.chromatic_aberration {
                let strength = intensity * config.chromatic_intensity;
                state.color_mod = channel_push(char_index, strength, 0.8, 0.5, 0.7)
                    + config.glitch_color * (strength * 0.4);
            } else if config.rgb_separation {
                state.color_mod = channel_push(char_index, intensity, 0.5, 0.3, 0.3)
                    + config.glitch_color * (intensity * 0.3);
            }
            state.color_mod = clamp_non_negative(state.color_mod);
        }

        if config.random_corruption {
            let draw = channel_noise(NoiseChannel::Corruption, char_index, seed);
            if draw < config.corruption_chance * intensity {
                state.visible = false;
            }
        }

        if config.scanlines {
            state.scanline_phase = self.scanline_phase();
        }

        state
    }

    fn end_glitch(&mut self) {
        self.state.is_glitching = false;
        self.state.glitch_timer = 0.0;
        self.state.current_intensity = 0.0;
        self.state.idle_timer = self.config.idle_time;
        self.roll_noise_seed();
    }

    fn drop_to_idle(&mut self) {
        if self.state.is_glitching {
            self.end_glitch();
        }
    }

    fn roll_noise_seed(&mut self) {
        self.state.noise_seed = self.rng.next_u32();
    }

    /// Horizontal offset for characters inside the current slice zone.
    fn slice_offset(&self, char_index: u32, character_count: u32) -> Option<f32> {
        if character_count == 0 || self.config.slice_height <= 0.0 {
            return None;
        }

        let seed = self.state.noise_seed;
        let position = char_index as f32 / character_count as f32;
        let zone_tick = (self.state.elapsed_time * SLICE_ZONE_RATE) as u32;
        let center = channel_noise(NoiseChannel::SliceZone, zone_tick, seed);

        let distance = (position - center).abs();
        if distance >= self.config.slice_height {
            return None;
        }

        // Every character of a zone shares the center, hence the direction.
        let direction_draw =
            channel_noise(NoiseChannel::SliceDirection, (center * 1000.0) as u32, seed);
        let direction = if direction_draw > 0.5 { 1.0 } else { -1.0 };
        let falloff = 1.0 - distance / self.config.slice_height;

        Some(direction * self.config.max_slice_offset * falloff * self.state.resolution_scale)
    }

    fn block_offset(&self, char_index: u32, character_count: u32) -> Vec2 {
        if character_count == 0 {
            return Vec2::ZERO;
        }

        let seed = self.state.noise_seed;
        let block_len = ((character_count as f32 * self.config.block_size) as u32).max(1);
        let block = char_index / block_len;

        let draw_x = channel_noise(NoiseChannel::BlockX, block, seed);
        if draw_x < BLOCK_MOVE_THRESHOLD {
            return Vec2::ZERO;
        }
        let draw_y = channel_noise(NoiseChannel::BlockY, block, seed);

        let reach = self.config.max_block_offset * self.state.resolution_scale;
        Vec2::new(
            (draw_x - 0.5) * 2.0 * reach,
            (draw_y - 0.5) * 2.0 * reach * 0.5,
        )
    }

    fn wave_offset(&self, char_index: u32, character_count: u32) -> Vec2 {
        if character_count == 0 {
            return Vec2::ZERO;
        }

        let t = self.state.elapsed_time;
        let position = char_index as f32 / character_count as f32;

        let wave1 = (t * 10.0 + position * 20.0).sin();
        let wave2 = (t * 7.3 + position * 15.0 + 1.5).sin();
        let wave3 = (t * 13.7 - position * 10.0).cos();

        let scale = self.state.resolution_scale;
        Vec2::new(
            (wave1 * 0.5 + wave2 * 0.3) * self.config.max_jitter * scale,
            wave3 * 0.2 * self.config.vertical_jitter * scale,
        )
    }

    fn random_offset(&self, char_index: u32) -> Vec2 {
        let seed = self.state.noise_seed;
        let scale = self.state.resolution_scale;
        let draw_x = channel_noise(NoiseChannel::JitterX, char_index, seed);
        let draw_y = channel_noise(NoiseChannel::JitterY, char_index, seed);
        Vec2::new(
            (draw_x - 0.5) * 2.0 * self.config.max_jitter * scale,
            (draw_y - 0.5) * 2.0 * self.config.vertical_jitter * scale,
        )
    }

    /// Unscaled duplicate offset, or `None` when the character stays single.
    fn duplicate_offset(&self, char_index: u32) -> Option<Vec2> {
        let seed = self.state.noise_seed;
        let draw = channel_noise(NoiseChannel::Duplicate, char_index, seed);
        if draw >= self.config.duplication_chance {
            return None;
        }

        let draw_x = channel_noise(NoiseChannel::DuplicateX, char_index, seed);
        let draw_y = channel_noise(NoiseChannel::DuplicateY, char_index, seed);
        Some(Vec2::new((draw_x - 0.5) * 10.0, (draw_y - 0.5) * 5.0))
    }
}

/// Asymmetric envelope: linear ramp to `peak` over the first 20% of the
/// active phase, then linear decay back to zero.
pub fn envelope(progress: f32, peak: f32) -> f32 {
    let progress = progress.clamp(0.0, 1.0);
    let value = if progress < RAMP_FRACTION {
        progress / RAMP_FRACTION * peak
    } else {
        peak * (1.0 - (progress - RAMP_FRACTION) / (1.0 - RAMP_FRACTION))
    };
    value.clamp(0.0, peak)
}

pub fn resolution_scale(width: u32, height: u32) -> f32 {
    let width_scale = width as f32 / REFERENCE_WIDTH;
    let height_scale = height as f32 / REFERENCE_HEIGHT;
    width_scale
        .min(height_scale)
        .clamp(MIN_RESOLUTION_SCALE, MAX_RESOLUTION_SCALE)
}

/// Brightness multiplier for pixel row `y` under a scrolling scanline pattern.
pub fn scanline_factor(phase: f32, y: f32, band_height: f32) -> f32 {
    if band_height <= 0.0 {
        return 1.0;
    }
    let band = ((y + phase) / band_height).floor() as i64;
    if band.rem_euclid(2) == 0 {
        1.0
    } else {
        SCANLINE_DIM
    }
}

/// Pushes one channel up and the other two down, rotating by `index mod 3`.
fn channel_push(index: u32, strength: f32, up: f32, down_near: f32, down_far: f32) -> Vec3 {
    let up = 1.0 + strength * up;
    let near = 1.0 - strength * down_near;
    let far = 1.0 - strength * down_far;
    match index % 3 {
        0 => Vec3::new(up, near, far),
        1 => Vec3::new(near, up, near),
        _ => Vec3::new(far, near, up),
    }
}

/// Strong pushes would drive the pulled channels below zero.
fn clamp_non_negative(color: Vec3) -> Vec3 {
    Vec3::new(color.x.max(0.0), color.y.max(0.0), color.z.max(0.0))
}
