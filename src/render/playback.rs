//! Presentation order for animating a frame stack.

use std::fmt;

/// Direction the display layer steps through frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackDirection {
    /// First frame to last.
    #[default]
    Forward,
    /// Last frame to first.
    Reverse,
}

impl PlaybackDirection {
    /// Get the opposite direction.
    pub fn toggle(self) -> Self {
        match self {
            PlaybackDirection::Forward => PlaybackDirection::Reverse,
            PlaybackDirection::Reverse => PlaybackDirection::Forward,
        }
    }

    /// Get display name.
    pub fn name(self) -> &'static str {
        match self {
            PlaybackDirection::Forward => "forward",
            PlaybackDirection::Reverse => "reverse",
        }
    }

    /// Frame indices of a `len`-frame stack in presentation order.
    pub fn frame_order(self, len: usize) -> Vec<usize> {
        match self {
            PlaybackDirection::Forward => (0..len).collect(),
            PlaybackDirection::Reverse => (0..len).rev().collect(),
        }
    }

    /// The frame shown after `current`, wrapping at either end.
    pub fn step(self, current: usize, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let current = current.min(len - 1);
        match self {
            PlaybackDirection::Forward => (current + 1) % len,
            PlaybackDirection::Reverse => current.checked_sub(1).unwrap_or(len - 1),
        }
    }
}

impl fmt::Display for PlaybackDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order() {
        assert_eq!(PlaybackDirection::Forward.frame_order(3), vec![0, 1, 2]);
        assert_eq!(PlaybackDirection::Reverse.frame_order(3), vec![2, 1, 0]);
        assert!(PlaybackDirection::Reverse.frame_order(0).is_empty());
    }

    #[test]
    fn step_wraps() {
        assert_eq!(PlaybackDirection::Forward.step(2, 3), 0);
        assert_eq!(PlaybackDirection::Forward.step(0, 3), 1);
        assert_eq!(PlaybackDirection::Reverse.step(0, 3), 2);
        assert_eq!(PlaybackDirection::Reverse.step(2, 3), 1);
        assert_eq!(PlaybackDirection::Forward.step(0, 1), 0);
    }

    #[test]
    fn toggle_is_involution() {
        let d = PlaybackDirection::default();
        assert_eq!(d.toggle().toggle(), d);
        assert_ne!(d.toggle(), d);
    }
}
