//! Utility modules
//!
//! Small helpers shared across the library.

pub mod cancel;
pub mod url;

pub use cancel::CancelHandle;
pub use url::join_url;

const EXCERPT_LIMIT: usize = 200;

/// Clip a body to a short diagnostic excerpt, respecting char
/// boundaries.
pub(crate) fn excerpt(body: &str) -> String {
    if body.chars().count() <= EXCERPT_LIMIT {
        body.to_string()
    } else {
        let clipped: String = body.chars().take(EXCERPT_LIMIT).collect();
        format!("{clipped}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_clips_long_bodies() {
        let long = "x".repeat(500);
        let clipped = excerpt(&long);
        assert_eq!(clipped.chars().count(), EXCERPT_LIMIT + 3);
        assert!(clipped.ends_with("..."));
    }

    #[test]
    fn excerpt_keeps_short_bodies() {
        assert_eq!(excerpt("{\"ok\":true}"), "{\"ok\":true}");
    }
}
