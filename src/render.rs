//! Raster rendering of a single sweep frame.

use std::path::Path;

use image::{Rgb, RgbImage};
use log::debug;

use crate::annotation::{AnnotationMap, UNANNOTATED};
use crate::error::{Error, Result};
use crate::font::{draw_text, text_width, GLYPH_ADVANCE, GLYPH_HEIGHT};
use crate::layout::Layout;
use crate::palette::ColorRegistry;
use crate::sweep::Frame;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);
/// matplotlib "lightgrey"
const EDGE_COLOR: Rgb<u8> = Rgb([211, 211, 211]);

const MARGIN: u32 = 20;
const TITLE_SCALE: u32 = 2;
const LEGEND_SCALE: u32 = 1;
const LEGEND_ROW: u32 = 12;
const LEGEND_SWATCH: u32 = 8;
const LEGEND_MAX_CHARS: usize = 24;

/// Image geometry and decorations.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub node_radius: u32,
    pub legend: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1000,
            node_radius: 4,
            legend: true,
        }
    }
}

/// Everything shared by the frames of one sweep. Read-only once built.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub layout: &'a Layout,
    pub annotations: &'a AnnotationMap,
    pub colors: &'a ColorRegistry,
    pub options: &'a RenderOptions,
}

/// Pixel rectangle the unit-square layout is mapped onto.
#[derive(Debug, Clone, Copy)]
struct Plot {
    x0: f64,
    y0: f64,
    side: f64,
}

impl Plot {
    fn project(&self, (x, y): (f64, f64)) -> (i64, i64) {
        (
            (self.x0 + x * self.side).round() as i64,
            (self.y0 + y * self.side).round() as i64,
        )
    }
}

pub fn frame_title(threshold: f64) -> String {
    format!("SSN organisation {threshold}")
}

impl Scene<'_> {
    fn legend_entries(&self) -> Vec<(&str, Rgb<u8>)> {
        let mut entries: Vec<(&str, Rgb<u8>)> = self.colors.iter().collect();
        if self.annotations.has_unannotated() {
            entries.push((UNANNOTATED, self.colors.unannotated()));
        }
        entries
    }

    fn legend_width(&self, entries: &[(&str, Rgb<u8>)]) -> u32 {
        if !self.options.legend || entries.is_empty() {
            return 0;
        }
        let longest = entries
            .iter()
            .map(|(l, _)| l.chars().count().min(LEGEND_MAX_CHARS))
            .max()
            .unwrap_or(0) as u32;
        LEGEND_SWATCH + 4 + longest * GLYPH_ADVANCE * LEGEND_SCALE + MARGIN
    }

    fn plot(&self, legend_width: u32) -> Plot {
        let opts = self.options;
        let r = opts.node_radius as f64;
        let top = (MARGIN + GLYPH_HEIGHT * TITLE_SCALE + MARGIN / 2) as f64 + r;
        let avail_w = opts.width.saturating_sub(2 * MARGIN + legend_width) as f64 - 2.0 * r;
        let avail_h = opts.height as f64 - top - MARGIN as f64 - r;
        let side = avail_w.min(avail_h).max(1.0);
        Plot {
            x0: MARGIN as f64 + r + (avail_w - side).max(0.0) / 2.0,
            y0: top + (avail_h - side).max(0.0) / 2.0,
            side,
        }
    }

    /// Draw one frame. Never fails: nodes without a position or color fall
    /// back to defaults.
    pub fn render(&self, frame: &Frame<'_>) -> RgbImage {
        let opts = self.options;
        let mut img = RgbImage::from_pixel(opts.width, opts.height, BACKGROUND);
        let entries = self.legend_entries();
        let legend_width = self.legend_width(&entries);
        let plot = self.plot(legend_width);
        let at = |idx: usize| plot.project(self.layout.position(idx).unwrap_or((0.5, 0.5)));

        for edge in frame.edges {
            draw_line(&mut img, at(edge.a), at(edge.b), EDGE_COLOR);
        }

        let r = opts.node_radius as i64;
        for idx in 0..frame.node_count() {
            let fill = self.colors.color_for(self.annotations.label(idx));
            let center = at(idx);
            draw_disc(&mut img, center, r, INK);
            draw_disc(&mut img, center, (r - 1).max(0), fill);
        }

        let title = frame_title(frame.threshold);
        let title_x = opts.width.saturating_sub(text_width(&title, TITLE_SCALE)) / 2;
        draw_text(&mut img, title_x, MARGIN, &title, usize::MAX, TITLE_SCALE, INK);

        if legend_width > 0 {
            let x = opts.width.saturating_sub(legend_width);
            let mut y = MARGIN + GLYPH_HEIGHT * TITLE_SCALE + MARGIN / 2;
            for (label, color) in entries {
                if y + LEGEND_ROW > opts.height {
                    break;
                }
                fill_rect(&mut img, x, y, LEGEND_SWATCH, LEGEND_SWATCH, color);
                draw_text(&mut img, x + LEGEND_SWATCH + 4, y, label, LEGEND_MAX_CHARS, LEGEND_SCALE, INK);
                y += LEGEND_ROW;
            }
        }

        debug!(
            "Rendered frame {} at threshold {}: {} edges",
            frame.index,
            frame.threshold,
            frame.edges.len()
        );
        img
    }

    /// Render `frame` and save it as an image at `path`. The format follows
    /// the extension.
    pub fn write(&self, frame: &Frame<'_>, path: &Path) -> Result<()> {
        self.render(frame)
            .save(path)
            .map_err(|source| Error::RenderWrite {
                path: path.to_path_buf(),
                source,
            })
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x < 0 || y < 0 {
        return;
    }
    if let Some(px) = img.get_pixel_mut_checked(x as u32, y as u32) {
        *px = color;
    }
}

/// Bresenham line between two pixel centers.
fn draw_line(img: &mut RgbImage, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y) = (x0, y0);
    let mut err = dx + dy;
    loop {
        put(img, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn draw_disc(img: &mut RgbImage, (cx, cy): (i64, i64), r: i64, color: Rgb<u8>) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for py in y..y + h {
        for px in x..x + w {
            if let Some(p) = img.get_pixel_mut_checked(px, py) {
                *p = color;
            }
        }
    }
}
