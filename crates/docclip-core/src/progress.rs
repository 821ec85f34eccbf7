//! Combined progress over the two legs of a transfer.

/// Which network leg is reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Leg {
    Download,
    Upload,
}

/// Remaps per-leg progress (0–100) into one 0–100 value: download covers the
/// first half, upload the second. Output never moves backwards.
#[derive(Clone, Debug, Default)]
pub struct TransferProgress {
    current: u8,
}

impl TransferProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a leg's percentage; returns the combined value.
    pub fn advance(&mut self, leg: Leg, percent: u8) -> u8 {
        let half = percent.min(100) / 2;
        let combined = match leg {
            Leg::Download => half,
            Leg::Upload => 50 + half,
        };
        self.current = self.current.max(combined);
        self.current
    }

    pub fn current(&self) -> u8 {
        self.current
    }
}
