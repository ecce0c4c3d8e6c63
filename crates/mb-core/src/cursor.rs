//! Selection index into a day's session list.

/// Zero-based position in a list whose length can change under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionCursor {
    index: usize,
}

impl SessionCursor {
    pub const fn index(self) -> usize {
        self.index
    }

    /// Moves forward, wrapping to the start. No-op for an empty list.
    pub const fn next(&mut self, len: usize) {
        if len > 0 {
            self.index = (self.index + 1) % len;
        }
    }

    /// Moves backward, wrapping to the end. No-op for an empty list.
    pub const fn previous(&mut self, len: usize) {
        if len > 0 {
            self.index = (self.index + len - 1) % len;
        }
    }

    /// Jumps to `index`, clamped to the list bounds.
    pub fn select(&mut self, index: usize, len: usize) {
        self.index = index.min(len.saturating_sub(1));
    }

    pub const fn reset(&mut self) {
        self.index = 0;
    }

    /// Re-clamps after the list changed length.
    pub fn resolve(&mut self, len: usize) {
        self.select(self.index, len);
    }
}
