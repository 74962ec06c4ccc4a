//! Pure heading geometry: normalization, cardinal-boundary proximity
//! and crossing detection.
//!
//! Everything here is stateless. The orchestrator combines these
//! predicates with its own per-boundary latches to turn them into
//! edge-triggered events; this layer never decides whether an event
//! should fire, only whether the geometry is satisfied.

/// The four cardinal boundaries that trigger tactile feedback, in
/// degrees.
pub const CARDINAL_BOUNDARIES: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

/// Tolerance band half-width around each cardinal boundary, in degrees.
pub const CARDINAL_TOLERANCE_DEG: f64 = 2.0;

/// Normalize a heading to `[0,360)`.
///
/// Reduces modulo 360 and shifts negative remainders up by 360.
/// Non-finite input maps to 0.0 so downstream math stays defined.
pub fn normalize_heading(heading: f64) -> f64 {
    if !heading.is_finite() {
        return 0.0;
    }
    let remainder = heading % 360.0;
    if remainder < 0.0 {
        remainder + 360.0
    } else {
        remainder
    }
}

/// Smallest angular distance between two headings, in `[0,180]`.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = (normalize_heading(a) - normalize_heading(b)).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// True if `heading` is within the tolerance band of any cardinal
/// boundary. Wrap-aware: 358.5° is within tolerance of 0°.
pub fn near_cardinal(heading: f64) -> bool {
    CARDINAL_BOUNDARIES
        .iter()
        .any(|&boundary| angular_distance(heading, boundary) < CARDINAL_TOLERANCE_DEG)
}

/// Index into [`CARDINAL_BOUNDARIES`] of the boundary the shortest arc
/// from `prev` to `curr` passes over, if any.
///
/// Consecutive sensor samples are close together, so the shortest arc
/// is the path the needle actually took. A sample landing exactly on
/// a boundary is not a crossing here; the tolerance band covers it.
pub fn boundary_crossed(prev: f64, curr: f64) -> Option<usize> {
    for (index, &boundary) in CARDINAL_BOUNDARIES.iter().enumerate() {
        let before = signed_offset(prev, boundary);
        let after = signed_offset(curr, boundary);
        // Opposite sides of the boundary, both within a quarter turn,
        // means the shortest arc between the samples swept across it.
        if before * after < 0.0 && before.abs() < 90.0 && after.abs() < 90.0 {
            return Some(index);
        }
    }
    None
}

/// Signed offset of `heading` from `boundary` in `(-180,180]`.
fn signed_offset(heading: f64, boundary: f64) -> f64 {
    let delta = (normalize_heading(heading) - boundary + 540.0) % 360.0 - 180.0;
    if delta == -180.0 {
        180.0
    } else {
        delta
    }
}
