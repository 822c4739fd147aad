//! Stage scaling
//!
//! The mirror renders inside a fixed container; when the live viewport
//! resizes, the stage recomputes one uniform scale so the whole document
//! fits while preserving aspect ratio.

/// Fixed margin kept around the stage on every side
pub const STAGE_MARGIN: f64 = 16.0;

/// Replay-side viewport state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    container_width: f64,
    container_height: f64,
    source_width: f64,
    source_height: f64,
    scale: f64,
}

impl Stage {
    pub fn new(container_width: f64, container_height: f64) -> Self {
        Self {
            container_width,
            container_height,
            source_width: 0.0,
            source_height: 0.0,
            scale: 1.0,
        }
    }

    /// Fit a live viewport of `width` x `height` into the container: the
    /// smaller of the width-constrained and height-constrained scales wins
    pub fn fit(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.source_width = width as f64;
        self.source_height = height as f64;
        let avail_width = (self.container_width - 2.0 * STAGE_MARGIN).max(1.0);
        let avail_height = (self.container_height - 2.0 * STAGE_MARGIN).max(1.0);
        self.scale = (avail_width / self.source_width).min(avail_height / self.source_height);
    }

    /// Current uniform scale
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Live viewport dimensions last fitted
    pub fn source(&self) -> (f64, f64) {
        (self.source_width, self.source_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_picks_smaller_scale() {
        let mut stage = Stage::new(832.0, 632.0); // 800x600 usable
        stage.fit(1600, 600);
        // Width-constrained: 800/1600 = 0.5; height: 600/600 = 1.0
        assert_eq!(stage.scale(), 0.5);

        stage.fit(800, 1200);
        // Width: 1.0; height: 0.5
        assert_eq!(stage.scale(), 0.5);
    }

    #[test]
    fn test_fit_ignores_zero_viewport() {
        let mut stage = Stage::new(832.0, 632.0);
        stage.fit(800, 600);
        let scale = stage.scale();
        stage.fit(0, 600);
        assert_eq!(stage.scale(), scale);
    }
}
