// Host-side tests for the typeface parser and outline layout.
// The main crate is wasm-only, so we include the pure-Rust module directly.

#![allow(dead_code)]
mod font {
    include!("../src/core/font.rs");
}

use font::Typeface;

// Two real-shaped glyphs and a space: a bar "I" (straight contour), a "c"
// with a quadratic command (end point first, control after, as in the
// three.js typeface format), and an outline-less space.
const TEST_FONT: &str = r#"{
  "resolution": 1000,
  "glyphs": {
    "I": { "ha": 600, "o": "m 100 0 l 500 0 l 500 700 l 100 700" },
    "c": { "ha": 400, "o": "m 0 0 q 100 100 0 100" },
    " ": { "ha": 300 }
  }
}"#;

#[test]
fn parse_accepts_minimal_typeface() {
    let face = Typeface::parse(TEST_FONT).unwrap();
    let glyph = face.glyph('I').unwrap();
    assert_eq!(glyph.advance, 600.0);
    assert_eq!(glyph.contours.len(), 1);
    assert_eq!(glyph.contours[0].len(), 4);
    assert!(face.glyph(' ').unwrap().contours.is_empty());
    assert!(face.glyph('Z').is_none());
}

#[test]
fn quadratic_commands_are_flattened_to_the_end_point() {
    let face = Typeface::parse(TEST_FONT).unwrap();
    let contour = &face.glyph('c').unwrap().contours[0];
    assert!(contour.len() > 2, "curve should flatten to several points");
    let last = contour[contour.len() - 1];
    assert!((last.x - 100.0).abs() < 1e-4);
    assert!((last.y - 100.0).abs() < 1e-4);
}

#[test]
fn line_width_scales_with_size_and_skips_unknown_chars() {
    let face = Typeface::parse(TEST_FONT).unwrap();
    // scale = 150 / 1000
    assert!((face.line_width("II", 150.0) - 180.0).abs() < 1e-4);
    assert!((face.line_width("I I", 150.0) - 225.0).abs() < 1e-4);
    assert_eq!(face.line_width("IZ", 150.0), face.line_width("I", 150.0));
    assert_eq!(face.line_width("", 150.0), 0.0);
}

#[test]
fn outline_segments_come_in_pairs_on_both_faces() {
    let face = Typeface::parse(TEST_FONT).unwrap();
    let depth = 0.03;
    let segments = face.outline_segments("I", 0.15, depth);
    assert!(!segments.is_empty());
    assert_eq!(segments.len() % 2, 0, "line list needs vertex pairs");

    // The closed square contour yields 4 segments per loop, front and back.
    assert_eq!(segments.len(), 2 * 4 * 2);
    let front = segments.iter().filter(|v| v.z > 0.0).count();
    let back = segments.iter().filter(|v| v.z < 0.0).count();
    assert_eq!(front, back);
    for v in &segments {
        assert!((v.z.abs() - depth * 0.5).abs() < 1e-6);
    }
}

#[test]
fn layout_is_centered_on_x() {
    let face = Typeface::parse(TEST_FONT).unwrap();
    let segments = face.outline_segments("I", 0.15, 0.03);
    // The bar sits symmetric inside its advance, so the laid-out outline is
    // symmetric around x = 0.
    let min_x = segments.iter().map(|v| v.x).fold(f32::MAX, f32::min);
    let max_x = segments.iter().map(|v| v.x).fold(f32::MIN, f32::max);
    assert!((min_x + max_x).abs() < 1e-4);
}

#[test]
fn unknown_chars_are_skipped_in_layout() {
    let face = Typeface::parse(TEST_FONT).unwrap();
    let with = face.outline_segments("I", 0.15, 0.03);
    let with_unknown = face.outline_segments("ZI", 0.15, 0.03);
    assert_eq!(with.len(), with_unknown.len());
}

#[test]
fn malformed_input_is_rejected() {
    assert!(Typeface::parse("not json").is_err());
    assert!(Typeface::parse(r#"{"resolution": 0, "glyphs": {}}"#).is_err());

    // Truncated command operands
    let truncated = r#"{"resolution": 1000, "glyphs": {"I": {"ha": 600, "o": "m 100"}}}"#;
    assert!(Typeface::parse(truncated).is_err());

    // Unknown command letter
    let unknown = r#"{"resolution": 1000, "glyphs": {"I": {"ha": 600, "o": "z 1 2"}}}"#;
    assert!(Typeface::parse(unknown).is_err());

    // Curve with no current contour
    let orphan = r#"{"resolution": 1000, "glyphs": {"I": {"ha": 600, "o": "q 1 2 3 4"}}}"#;
    assert!(Typeface::parse(orphan).is_err());

    // Non-numeric operand
    let garbage = r#"{"resolution": 1000, "glyphs": {"I": {"ha": 600, "o": "l x y"}}}"#;
    assert!(Typeface::parse(garbage).is_err());
}

#[test]
fn multiple_contours_per_glyph_are_kept() {
    let two = r#"{"resolution": 1000, "glyphs": {
        "=": { "ha": 600, "o": "m 0 200 l 600 200 m 0 400 l 600 400" }
    }}"#;
    let face = Typeface::parse(two).unwrap();
    assert_eq!(face.glyph('=').unwrap().contours.len(), 2);
}
