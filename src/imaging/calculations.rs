//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate aspect-preserving dimensions whose longer edge is `long_edge`.
///
/// The longer source edge becomes exactly `long_edge`; the shorter one is
/// scaled by the same ratio and rounded. Square sources count as landscape.
/// Both output edges are at least 1, even for degenerate sources.
///
/// # Examples
/// ```
/// # use imgvar::imaging::calculate_long_edge_dimensions;
/// assert_eq!(calculate_long_edge_dimensions((400, 200), 256), (256, 128));
/// assert_eq!(calculate_long_edge_dimensions((200, 400), 256), (128, 256));
/// ```
pub fn calculate_long_edge_dimensions(source: (u32, u32), long_edge: u32) -> (u32, u32) {
    let src_w = source.0.max(1) as f64;
    let src_h = source.1.max(1) as f64;
    let target = long_edge.max(1);

    if src_w >= src_h {
        // Landscape or square
        let h = (src_h * target as f64 / src_w).round() as u32;
        (target, h.max(1))
    } else {
        // Portrait
        let w = (src_w * target as f64 / src_h).round() as u32;
        (w.max(1), target)
    }
}
