//! Monospace text rasterization with a per-character hook.
//!
//! [`TextRenderer`] walks a string left to right. Before each glyph is drawn
//! the caller's hook may move it, recolor it or hide it; the cursor then
//! advances by the glyph's advance regardless, so hidden glyphs keep their
//! layout space.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use fontdue::{Font, FontSettings};
use image::RgbaImage;

use crate::char_effect::CharacterEffect;
use crate::glitch::scanline_factor;
use crate::math::Vec3;

/// Alpha of the extra copy drawn for duplicated glyphs.
pub const DUPLICATE_ALPHA: f32 = 0.6;

/// Draw sizes are rasterized on a quarter-pixel grid.
const SIZE_STEP: f32 = 0.25;
/// The glyph cache is dropped once it holds this many bitmaps.
const MAX_CACHED_GLYPHS: usize = 4096;

/// Cache key for a pixel size snapped to [`SIZE_STEP`].
fn size_key(size: f32) -> u32 {
    if size.is_finite() {
        (size.max(0.0) / SIZE_STEP).round() as u32
    } else {
        0
    }
}

#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    /// Offset from the pen position (top-left of the line box) to the
    /// bitmap's top-left corner.
    pub left: i32,
    pub top: i32,
    pub coverage: Vec<u8>,
}

/// Glyph metrics and coverage bitmaps for one font at a base pixel size.
pub trait GlyphSource {
    /// Horizontal advance in pixels at `scale`.
    fn advance(&self, ch: char, scale: f32) -> f32;

    fn line_height(&self, scale: f32) -> f32;

    /// Advance of a representative full-width glyph.
    fn cell_width(&self, scale: f32) -> f32 {
        self.advance('M', scale)
    }

    /// Coverage bitmap, or `None` for glyphs with no ink.
    fn glyph(&mut self, ch: char, scale: f32) -> Option<&GlyphBitmap>;
}

pub struct FontdueGlyphs {
    font: Font,
    font_size: f32,
    cache: HashMap<(char, u32), GlyphBitmap>,
}

impl FontdueGlyphs {
    pub fn from_bytes(bytes: Vec<u8>, font_size: f32) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|error| anyhow!("failed to parse font: {error}"))?;
        Ok(Self {
            font,
            font_size,
            cache: HashMap::new(),
        })
    }

    pub fn from_path(font_path: &Path, font_size: f32) -> Result<Self> {
        let bytes = std::fs::read(font_path)
            .with_context(|| format!("failed to read font file {}", font_path.display()))?;
        Self::from_bytes(bytes, font_size)
            .with_context(|| format!("failed to load font {}", font_path.display()))
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn cached_glyphs(&self) -> usize {
        self.cache.len()
    }
}

impl GlyphSource for FontdueGlyphs {
    fn advance(&self, ch: char, scale: f32) -> f32 {
        self.font.metrics(ch, self.font_size * scale).advance_width
    }

    fn line_height(&self, scale: f32) -> f32 {
        (self.font_size * scale * 1.45).round().max(1.0)
    }

    fn glyph(&mut self, ch: char, scale: f32) -> Option<&GlyphBitmap> {
        let key = (ch, size_key(self.font_size * scale));
        if self.cache.len() >= MAX_CACHED_GLYPHS && !self.cache.contains_key(&key) {
            self.cache.clear();
        }

        let size = key.1 as f32 * SIZE_STEP;
        let glyph = self.cache.entry(key).or_insert_with(|| {
            let (metrics, coverage) = self.font.rasterize(ch, size);
            let ascent = self
                .font
                .horizontal_line_metrics(size)
                .map_or(size, |line| line.ascent);
            GlyphBitmap {
                width: metrics.width,
                height: metrics.height,
                left: metrics.xmin,
                top: (ascent - (metrics.height as f32 + metrics.ymin as f32)).round() as i32,
                coverage,
            }
        });

        (glyph.width > 0 && glyph.height > 0).then_some(&*glyph)
    }
}

/// Fontless monospace source drawing every visible character as a solid
/// box inset by one pixel inside its cell.
pub struct BoxGlyphs {
    cell_width: f32,
    cell_height: f32,
    /// Keyed by bitmap size in whole pixels.
    cache: HashMap<(usize, usize), GlyphBitmap>,
}

impl BoxGlyphs {
    pub fn new(cell_width: f32, cell_height: f32) -> Self {
        Self {
            cell_width: cell_width.max(1.0),
            cell_height: cell_height.max(1.0),
            cache: HashMap::new(),
        }
    }

    pub fn cached_glyphs(&self) -> usize {
        self.cache.len()
    }
}

impl GlyphSource for BoxGlyphs {
    fn advance(&self, _ch: char, scale: f32) -> f32 {
        self.cell_width * scale
    }

    fn line_height(&self, scale: f32) -> f32 {
        self.cell_height * scale
    }

    fn glyph(&mut self, ch: char, scale: f32) -> Option<&GlyphBitmap> {
        if ch.is_whitespace() || ch.is_control() {
            return None;
        }

        let scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
        let width = ((self.cell_width * scale).round() as usize).saturating_sub(2).max(1);
        let height = ((self.cell_height * scale).round() as usize).saturating_sub(2).max(1);
        if self.cache.len() >= MAX_CACHED_GLYPHS && !self.cache.contains_key(&(width, height)) {
            self.cache.clear();
        }

        let glyph = self.cache.entry((width, height)).or_insert_with(|| {
            GlyphBitmap {
                width,
                height,
                left: 1,
                top: 1,
                coverage: vec![255; width * height],
            }
        });
        Some(&*glyph)
    }
}

/// RGBA8 frame buffer the renderer draws into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut canvas = Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
        };
        canvas.clear(color);
        canvas
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.rgba.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.rgba[idx..idx + 4]);
        Some(out)
    }

    /// Composites `glyph` with its top-left at `(x, y)`, clipped to the frame.
    pub fn blend_glyph(&mut self, x: i32, y: i32, glyph: &GlyphBitmap, color: [u8; 4]) {
        let (x, y) = (i64::from(x), i64::from(y));
        let (glyph_width, glyph_height) = (glyph.width as i64, glyph.height as i64);
        let col_start = (-x).clamp(0, glyph_width) as usize;
        let col_end = (i64::from(self.width) - x).clamp(0, glyph_width) as usize;
        let row_start = (-y).clamp(0, glyph_height) as usize;
        let row_end = (i64::from(self.height) - y).clamp(0, glyph_height) as usize;
        if col_start >= col_end {
            return;
        }

        let [r, g, b, a] = color;
        for row in row_start..row_end {
            let coverage_start = row * glyph.width;
            let coverage = &glyph.coverage[coverage_start + col_start..coverage_start + col_end];

            let py = (y + row as i64) as usize;
            let px = (x + col_start as i64) as usize;
            let start = (py * self.width as usize + px) * 4;
            let pixels = &mut self.rgba[start..start + coverage.len() * 4];

            for (pixel, &mask) in pixels.chunks_exact_mut(4).zip(coverage) {
                if mask == 0 {
                    continue;
                }
                let alpha = (u16::from(mask) * u16::from(a) / 255) as u8;
                blend_over(pixel, [r, g, b], alpha);
            }
        }
    }

    /// Darkens alternating bands of rows scrolled by `phase` pixels.
    pub fn apply_scanlines(&mut self, phase: f32, band_height: f32) {
        let row_len = self.width as usize * 4;
        if row_len == 0 {
            return;
        }
        for (y, row) in self.rgba.chunks_exact_mut(row_len).enumerate() {
            let factor = scanline_factor(phase, y as f32, band_height);
            if factor >= 1.0 {
                continue;
            }
            for pixel in row.chunks_exact_mut(4) {
                for channel in &mut pixel[..3] {
                    *channel = (f32::from(*channel) * factor).round() as u8;
                }
            }
        }
    }

    pub fn to_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
            .ok_or_else(|| anyhow!("canvas buffer does not match {}x{}", self.width, self.height))
    }
}

/// Source-over onto an opaque destination pixel.
fn blend_over(pixel: &mut [u8], rgb: [u8; 3], alpha: u8) {
    if alpha == 0 {
        return;
    }

    let alpha = u16::from(alpha);
    let keep = 255 - alpha;
    for (dst, src) in pixel.iter_mut().zip(rgb) {
        *dst = ((u16::from(src) * alpha + u16::from(*dst) * keep + 127) / 255) as u8;
    }
    pixel[3] = 255;
}

/// Mutable view of one glyph handed to the per-character hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphSlot {
    pub index: u32,
    pub count: u32,
    pub ch: char,
    /// Would-be draw position of the pen (top-left of the line box).
    pub x: f32,
    pub y: f32,
    pub color: Vec3,
    pub alpha: f32,
    /// Draw-only size multiplier; the cursor advance ignores it.
    pub scale: f32,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Characters handed to the rasterizer in the main pass.
    pub drawn: u32,
    pub hidden: u32,
    /// Extra copies flushed after the main pass.
    pub duplicates: u32,
}

#[derive(Debug, Clone, Copy)]
struct ExtraDraw {
    ch: char,
    x: f32,
    y: f32,
    scale: f32,
    color: Vec3,
    alpha: f32,
}

pub struct TextRenderer<G> {
    glyphs: G,
    extra_draws: Vec<ExtraDraw>,
}

impl<G: GlyphSource> TextRenderer<G> {
    pub fn new(glyphs: G) -> Self {
        Self {
            glyphs,
            extra_draws: Vec::new(),
        }
    }

    pub fn glyphs(&self) -> &G {
        &self.glyphs
    }

    pub fn render_text(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        x: f32,
        y: f32,
        scale: f32,
        color: Vec3,
    ) -> RenderStats {
        self.render_text_with_callback(canvas, text, x, y, scale, color, |_| {})
    }

    /// Renders `text` calling `hook` once per character before it is drawn.
    pub fn render_text_with_callback<F>(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        x: f32,
        y: f32,
        scale: f32,
        color: Vec3,
        mut hook: F,
    ) -> RenderStats
    where
        F: FnMut(&mut GlyphSlot),
    {
        let count = text.chars().count() as u32;
        let mut stats = RenderStats::default();
        let mut cursor = x;

        for (index, ch) in text.chars().enumerate() {
            let mut slot = GlyphSlot {
                index: index as u32,
                count,
                ch,
                x: cursor,
                y,
                color,
                alpha: 1.0,
                scale: 1.0,
                visible: true,
            };
            hook(&mut slot);

            if slot.visible {
                self.draw_glyph(canvas, ch, slot.x, slot.y, scale * slot.scale, slot.color, slot.alpha);
                stats.drawn += 1;
            } else {
                stats.hidden += 1;
            }

            cursor += self.glyphs.advance(ch, scale);
        }

        stats
    }

    /// Renders `text` through `effect`, computing each character's transform
    /// once. Duplicate requests are queued during the pass and drawn after
    /// it, so the extra copies sit underneath nothing drawn later.
    pub fn render_text_with_effect(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        x: f32,
        y: f32,
        scale: f32,
        color: Vec3,
        effect: &dyn CharacterEffect,
    ) -> RenderStats {
        let mut extra_draws = std::mem::take(&mut self.extra_draws);
        extra_draws.clear();

        let mut stats = self.render_text_with_callback(canvas, text, x, y, scale, color, |slot| {
            let transform = effect.compute(slot.index, slot.count);
            slot.x += transform.offset.x;
            slot.y += transform.offset.y;
            slot.color = slot.color.modulate(transform.color_mod);
            slot.alpha *= transform.alpha;
            slot.scale *= transform.scale;
            slot.visible = transform.visible && slot.alpha > 0.0;

            if let Some(offset) = transform.duplicate {
                extra_draws.push(ExtraDraw {
                    ch: slot.ch,
                    x: slot.x + offset.x,
                    y: slot.y + offset.y,
                    scale: scale * slot.scale,
                    color: slot.color,
                    alpha: slot.alpha * DUPLICATE_ALPHA,
                });
            }
        });

        for extra in extra_draws.drain(..) {
            self.draw_glyph(canvas, extra.ch, extra.x, extra.y, extra.scale, extra.color, extra.alpha);
            stats.duplicates += 1;
        }
        self.extra_draws = extra_draws;

        stats
    }

    pub fn text_width(&self, text: &str, scale: f32) -> f32 {
        text.chars().map(|ch| self.glyphs.advance(ch, scale)).sum()
    }

    pub fn char_width(&self, scale: f32) -> f32 {
        self.glyphs.cell_width(scale)
    }

    pub fn line_height(&self, scale: f32) -> f32 {
        self.glyphs.line_height(scale)
    }

    fn draw_glyph(
        &mut self,
        canvas: &mut Canvas,
        ch: char,
        x: f32,
        y: f32,
        scale: f32,
        color: Vec3,
        alpha: f32,
    ) {
        let Some(glyph) = self.glyphs.glyph(ch, scale) else {
            return;
        };
        let [r, g, b] = color.to_rgb8();
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        canvas.blend_glyph(
            x.round() as i32 + glyph.left,
            y.round() as i32 + glyph.top,
            glyph,
            [r, g, b, a],
        );
    }
}
