use tracing::info;

// Content heights outside this band fall back to MIN_HEIGHT
pub const MIN_HEIGHT: usize = 900;
pub const MAX_HEIGHT: usize = 1100;

/// Pixel dimensions of the sky, captured once when a session starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportMetrics {
    pub width: usize,
    pub height: usize,
    // Unclamped height; recycled stars are scattered over it
    pub content_height: usize,
}

impl ViewportMetrics {
    pub fn new(width: usize, raw_content_height: usize) -> Self {
        let width = width.max(1);
        let content_height = raw_content_height.max(1);
        let height = clamp_height(content_height);

        if height != content_height {
            info!(raw = content_height, height, "content height outside {MIN_HEIGHT}..={MAX_HEIGHT}, clamped");
        }

        Self {
            width,
            height,
            content_height,
        }
    }
}

pub fn clamp_height(raw: usize) -> usize {
    if (MIN_HEIGHT..=MAX_HEIGHT).contains(&raw) {
        raw
    } else {
        MIN_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heights_outside_band_become_900() {
        assert_eq!(ViewportMetrics::new(1024, 500).height, 900);
        assert_eq!(ViewportMetrics::new(1024, 950).height, 950);
        assert_eq!(ViewportMetrics::new(1024, 1200).height, 900);
    }

    #[test]
    fn band_edges_are_inclusive() {
        assert_eq!(clamp_height(900), 900);
        assert_eq!(clamp_height(1100), 1100);
        assert_eq!(clamp_height(1101), 900);
        assert_eq!(clamp_height(899), 900);
    }

    #[test]
    fn raw_height_is_kept_and_width_never_zero() {
        let metrics = ViewportMetrics::new(0, 1200);
        assert_eq!(metrics.width, 1);
        assert_eq!(metrics.content_height, 1200);

        let metrics = ViewportMetrics::new(640, 0);
        assert_eq!(metrics.content_height, 1);
        assert_eq!(metrics.height, 900);
    }
}
