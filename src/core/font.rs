// Minimal reader for the three.js `typeface.json` font format, plus layout
// of snippet text into line-list outline geometry.
//
// Glyph outlines in the format are command strings over font-unit
// coordinates: `m x y` starts a contour, `l x y` extends it, and `q`/`b`
// append quadratic/cubic curves with the end point first and the control
// points after it. Curves are flattened at a fixed subdivision; the result
// per glyph is a set of closed contours.

use anyhow::{bail, Context, Result};
use fnv::FnvHashMap;
use glam::{Vec2, Vec3};
use serde::Deserialize;

/// Subdivision steps when flattening quadratic/cubic curve commands.
const CURVE_STEPS: usize = 6;

#[derive(Deserialize)]
struct TypefaceData {
    glyphs: std::collections::HashMap<String, GlyphData>,
    resolution: f32,
}

#[derive(Deserialize)]
struct GlyphData {
    ha: f32,
    o: Option<String>,
}

pub struct Glyph {
    /// Horizontal advance in font units.
    pub advance: f32,
    /// Closed contours in font units.
    pub contours: Vec<Vec<Vec2>>,
}

pub struct Typeface {
    glyphs: FnvHashMap<char, Glyph>,
    resolution: f32,
}

impl Typeface {
    pub fn parse(json: &str) -> Result<Self> {
        let data: TypefaceData = serde_json::from_str(json).context("invalid typeface json")?;
        if data.resolution <= 0.0 {
            bail!("typeface resolution must be positive");
        }
        let mut glyphs = FnvHashMap::default();
        for (key, raw) in data.glyphs {
            let Some(ch) = key.chars().next() else {
                continue;
            };
            let contours = match raw.o.as_deref() {
                Some(cmds) => parse_outline(cmds)
                    .with_context(|| format!("bad outline for glyph {ch:?}"))?,
                None => Vec::new(),
            };
            glyphs.insert(
                ch,
                Glyph {
                    advance: raw.ha,
                    contours,
                },
            );
        }
        Ok(Self {
            glyphs,
            resolution: data.resolution,
        })
    }

    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    /// Advance width of `text` at the given size. Characters without a glyph
    /// contribute nothing.
    pub fn line_width(&self, text: &str, size: f32) -> f32 {
        let scale = size / self.resolution;
        text.chars()
            .filter_map(|ch| self.glyph(ch))
            .map(|g| g.advance * scale)
            .sum()
    }

    /// Lay out `text` centered on X and emit line-list vertex pairs for the
    /// front and back outline loops at z = ±depth/2. Characters without a
    /// glyph are skipped silently.
    pub fn outline_segments(&self, text: &str, size: f32, depth: f32) -> Vec<Vec3> {
        let scale = size / self.resolution;
        let mut out = Vec::new();
        let mut pen_x = -self.line_width(text, size) * 0.5;
        for ch in text.chars() {
            let Some(glyph) = self.glyph(ch) else {
                continue;
            };
            for contour in &glyph.contours {
                for &z in &[depth * 0.5, -depth * 0.5] {
                    emit_loop(&mut out, contour, pen_x, scale, z);
                }
            }
            pen_x += glyph.advance * scale;
        }
        out
    }
}

fn emit_loop(out: &mut Vec<Vec3>, contour: &[Vec2], pen_x: f32, scale: f32, z: f32) {
    if contour.len() < 2 {
        return;
    }
    let at = |p: Vec2| Vec3::new(pen_x + p.x * scale, p.y * scale, z);
    for pair in contour.windows(2) {
        out.push(at(pair[0]));
        out.push(at(pair[1]));
    }
    let first = contour[0];
    let last = contour[contour.len() - 1];
    if last != first {
        out.push(at(last));
        out.push(at(first));
    }
}

fn parse_outline(cmds: &str) -> Result<Vec<Vec<Vec2>>> {
    let mut tokens = cmds.split_whitespace();
    let mut contours: Vec<Vec<Vec2>> = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();

    while let Some(cmd) = tokens.next() {
        match cmd {
            "m" => {
                let x = read(&mut tokens)?;
                let y = read(&mut tokens)?;
                if current.len() >= 2 {
                    contours.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                current.push(Vec2::new(x, y));
            }
            "l" => {
                let x = read(&mut tokens)?;
                let y = read(&mut tokens)?;
                if current.is_empty() {
                    bail!("line command before any moveto");
                }
                current.push(Vec2::new(x, y));
            }
            "q" => {
                let end = Vec2::new(read(&mut tokens)?, read(&mut tokens)?);
                let ctrl = Vec2::new(read(&mut tokens)?, read(&mut tokens)?);
                let Some(&from) = current.last() else {
                    bail!("curve command before any moveto");
                };
                for step in 1..=CURVE_STEPS {
                    let t = step as f32 / CURVE_STEPS as f32;
                    current.push(quadratic_point(from, ctrl, end, t));
                }
            }
            "b" => {
                let end = Vec2::new(read(&mut tokens)?, read(&mut tokens)?);
                let c1 = Vec2::new(read(&mut tokens)?, read(&mut tokens)?);
                let c2 = Vec2::new(read(&mut tokens)?, read(&mut tokens)?);
                let Some(&from) = current.last() else {
                    bail!("curve command before any moveto");
                };
                for step in 1..=CURVE_STEPS {
                    let t = step as f32 / CURVE_STEPS as f32;
                    current.push(cubic_point(from, c1, c2, end, t));
                }
            }
            other => bail!("unknown outline command {other:?}"),
        }
    }
    if current.len() >= 2 {
        contours.push(current);
    }
    Ok(contours)
}

fn read(tokens: &mut std::str::SplitWhitespace<'_>) -> Result<f32> {
    let t = tokens.next().context("truncated outline command")?;
    t.parse::<f32>()
        .with_context(|| format!("bad outline number {t:?}"))
}

fn quadratic_point(p0: Vec2, c: Vec2, p1: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u) + c * (2.0 * u * t) + p1 * (t * t)
}

fn cubic_point(p0: Vec2, c1: Vec2, c2: Vec2, p1: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + p1 * (t * t * t)
}
