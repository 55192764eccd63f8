//! Coordinate transformation between overlay and native page coordinate systems
//!
//! Overlay space has a top-left origin with y increasing downward, measured in
//! on-screen pixels at the render scale captured with each annotation. Native
//! space has a bottom-left origin measured in page units (points). Annotations
//! are stored in overlay space and mapped here only at flatten time.

use signoff_types::{OverlayRect, RenderSize};

/// Axis-aligned rectangle in native page space. `x`/`y` name the lower-left
/// corner, matching how page content streams position objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Map an overlay rectangle onto the native page (flip Y axis).
///
/// The returned `y` is the rectangle's bottom edge in native space, so the
/// overlay's top edge and the native top edge coincide after the flip.
pub fn overlay_to_native(
    rect: &OverlayRect,
    render_size: RenderSize,
    native_width: f64,
    native_height: f64,
) -> NativeRect {
    let scale_x = native_width / render_size.width;
    let scale_y = native_height / render_size.height;

    NativeRect {
        x: rect.x * scale_x,
        y: native_height - (rect.y + rect.height) * scale_y,
        width: rect.width * scale_x,
        height: rect.height * scale_y,
    }
}

/// Inverse of [`overlay_to_native`]
pub fn native_to_overlay(
    rect: &NativeRect,
    render_size: RenderSize,
    native_width: f64,
    native_height: f64,
) -> OverlayRect {
    let scale_x = render_size.width / native_width;
    let scale_y = render_size.height / native_height;

    let height = rect.height * scale_y;
    OverlayRect {
        x: rect.x * scale_x,
        y: (native_height - rect.y) * scale_y - height,
        width: rect.width * scale_x,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_page_at_reduced_render_scale() {
        // 612x792 page rendered at 600x776 on screen
        let render = RenderSize::new(600.0, 776.0);
        let rect = OverlayRect::new(100.0, 50.0, 150.0, 50.0);

        let native = overlay_to_native(&rect, render, 612.0, 792.0);
        assert!((native.x - 102.0).abs() < 0.01);
        assert!((native.y - 689.9381).abs() < 0.01);
        assert!((native.width - 153.0).abs() < 0.01);
        assert!((native.height - 51.0309).abs() < 0.01);
    }

    #[test]
    fn test_identity_scale_only_flips_y() {
        let render = RenderSize::new(612.0, 792.0);
        let rect = OverlayRect::new(100.0, 50.0, 150.0, 50.0);

        let native = overlay_to_native(&rect, render, 612.0, 792.0);
        assert_eq!(native.x, 100.0);
        assert_eq!(native.y, 792.0 - 100.0);
        assert_eq!(native.width, 150.0);
        assert_eq!(native.height, 50.0);
    }

    #[test]
    fn test_corners() {
        let render = RenderSize::new(600.0, 800.0);

        // Top-left overlay corner lands at the native top-left
        let top_left = OverlayRect::new(0.0, 0.0, 10.0, 10.0);
        let native = overlay_to_native(&top_left, render, 612.0, 792.0);
        assert!((native.x - 0.0).abs() < 0.01);
        assert!((native.y + native.height - 792.0).abs() < 0.01);

        // Bottom-right overlay corner lands at the native bottom-right
        let bottom_right = OverlayRect::new(590.0, 790.0, 10.0, 10.0);
        let native = overlay_to_native(&bottom_right, render, 612.0, 792.0);
        assert!((native.x + native.width - 612.0).abs() < 0.01);
        assert!((native.y - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_round_trip() {
        let render = RenderSize::new(918.0, 1188.0); // 1.5x render scale
        let rect = OverlayRect::new(123.4, 56.7, 150.0, 50.0);

        let native = overlay_to_native(&rect, render, 612.0, 792.0);
        let back = native_to_overlay(&native, render, 612.0, 792.0);
        assert!((back.x - rect.x).abs() < 0.001);
        assert!((back.y - rect.y).abs() < 0.001);
        assert!((back.width - rect.width).abs() < 0.001);
        assert!((back.height - rect.height).abs() < 0.001);
    }
}
