//! Discrete-value snapping
//!
//! Targets that only accept values from a fixed set get the nearest
//! allowed value instead of a rejection. Duration snaps by numeric
//! distance with ties going to the smaller value; aspect-ratio and
//! resolution hints resolve against the profile's size table with a
//! fixed precedence: exact match, then nearest by ratio, then the
//! table's default entry.

use crate::profile::SizeOption;

/// Snap a requested duration to the nearest allowed one.
///
/// Ties favor the smaller value, so a request halfway between two
/// allowed durations never silently gets the longer (more expensive)
/// render.
pub(crate) fn snap_duration(allowed: &[u32], requested: f64) -> Option<u32> {
    let mut best: Option<u32> = None;
    for &candidate in allowed {
        let distance = (f64::from(candidate) - requested).abs();
        match best {
            None => best = Some(candidate),
            Some(current) => {
                let current_distance = (f64::from(current) - requested).abs();
                if distance < current_distance
                    || (distance == current_distance && candidate < current)
                {
                    best = Some(candidate);
                }
            }
        }
    }
    best
}

/// Parse a `W:H` aspect label into a ratio.
pub(crate) fn parse_aspect_ratio(label: &str) -> Option<f64> {
    let (w, h) = label.split_once(':')?;
    let w: f64 = w.trim().parse().ok()?;
    let h: f64 = h.trim().parse().ok()?;
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return None;
    }
    Some(w / h)
}

/// Parse a resolution label like `720p` into a pixel height.
pub(crate) fn parse_resolution(label: &str) -> Option<u32> {
    label.trim().strip_suffix('p')?.parse().ok()
}

const RATIO_EPSILON: f64 = 1e-6;

/// Resolve an aspect-ratio and/or resolution hint against a size table.
///
/// Precedence: an entry matching both the aspect label and the
/// resolution height wins outright; otherwise the entry nearest by
/// numeric ratio (resolution height breaking ties, then table order);
/// with no usable aspect, the resolution height or the default entry.
pub(crate) fn resolve_size<'a>(
    sizes: &'a [SizeOption],
    aspect: Option<&str>,
    resolution: Option<&str>,
) -> Option<&'a SizeOption> {
    if sizes.is_empty() {
        return None;
    }
    let height_hint = resolution.and_then(parse_resolution);

    if let (Some(label), Some(height)) = (aspect, height_hint) {
        if let Some(exact) = sizes
            .iter()
            .find(|s| s.aspect_ratio == label && s.height == height)
        {
            return Some(exact);
        }
    }

    if let Some(target) = aspect.and_then(parse_aspect_ratio) {
        let best_distance = sizes
            .iter()
            .map(|s| (s.ratio() - target).abs())
            .fold(f64::INFINITY, f64::min);
        return sizes
            .iter()
            .filter(|s| (s.ratio() - target).abs() <= best_distance + RATIO_EPSILON)
            .reduce(|best, candidate| {
                if height_hint == Some(candidate.height) && height_hint != Some(best.height) {
                    candidate
                } else {
                    best
                }
            });
    }

    if let Some(height) = height_hint {
        if let Some(matched) = sizes.iter().find(|s| s.height == height) {
            return Some(matched);
        }
    }

    sizes.iter().find(|s| s.is_default).or_else(|| sizes.first())
}

/// Whether a chosen size honors what the caller asked for.
pub(crate) fn size_honors_request(
    chosen: &SizeOption,
    aspect: Option<&str>,
    resolution: Option<&str>,
) -> bool {
    if let Some(label) = aspect {
        match parse_aspect_ratio(label) {
            Some(target) if (chosen.ratio() - target).abs() > RATIO_EPSILON => return false,
            None => return false,
            _ => {}
        }
    }
    if let Some(height) = resolution.and_then(parse_resolution) {
        if chosen.height != height {
            return false;
        }
    }
    true
}
