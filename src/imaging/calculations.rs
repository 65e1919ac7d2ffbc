//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit dimensions inside a square bound, preserving aspect ratio.
///
/// If the longer edge exceeds `max_dimension` both edges are scaled by
/// `max_dimension / longer_edge`: the longer edge lands exactly on the bound
/// and the shorter one is rounded (never below 1px). Images already inside
/// the bound pass through unchanged; nothing is upscaled.
///
/// # Examples
/// ```
/// # use style_morph::imaging::calculate_fit_dimensions;
/// assert_eq!(calculate_fit_dimensions((4000, 3000), 1024), (1024, 768));
/// assert_eq!(calculate_fit_dimensions((800, 600), 1024), (800, 600));
/// ```
pub fn calculate_fit_dimensions(original: (u32, u32), max_dimension: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let longer_edge = orig_w.max(orig_h);

    if longer_edge <= max_dimension {
        return original;
    }

    let ratio = max_dimension as f64 / longer_edge as f64;
    let scale = |edge: u32| ((edge as f64 * ratio).round() as u32).max(1);

    if orig_w >= orig_h {
        // Landscape or square
        (max_dimension, scale(orig_h))
    } else {
        // Portrait
        (scale(orig_w), max_dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_scaled_to_max() {
        // 4000x3000, ratio 1024/4000 → 1024x768
        assert_eq!(calculate_fit_dimensions((4000, 3000), 1024), (1024, 768));
    }

    #[test]
    fn portrait_scaled_to_max() {
        assert_eq!(calculate_fit_dimensions((3000, 4000), 1024), (768, 1024));
    }

    #[test]
    fn square_scaled_to_max() {
        assert_eq!(calculate_fit_dimensions((2048, 2048), 1024), (1024, 1024));
    }

    #[test]
    fn smaller_image_passes_through() {
        assert_eq!(calculate_fit_dimensions((640, 480), 1024), (640, 480));
    }

    #[test]
    fn exactly_at_bound_passes_through() {
        assert_eq!(calculate_fit_dimensions((1024, 300), 1024), (1024, 300));
    }

    #[test]
    fn rounds_shorter_edge() {
        // 3000x2001 → 1024 x 683.0 (2001 * 0.34133 = 683.0)
        assert_eq!(calculate_fit_dimensions((3000, 2001), 1024), (1024, 683));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(calculate_fit_dimensions((100_000, 10), 1024), (1024, 1));
    }
}
