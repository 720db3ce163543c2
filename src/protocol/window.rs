//! Sequence numbering and acknowledgment window.
//!
//! The client numbers every data frame with a sequence in `1..=u32::MAX`
//! and may keep at most `window_size` frames unacknowledged. The count is
//! computed as `sequence - (last_ack + 1)`, the frames sent before the
//! current one that the peer has not yet confirmed.
//!
//! # Example
//!
//! ```
//! use lumberjack_client::protocol::SequenceWindow;
//!
//! let mut window = SequenceWindow::new(2);
//! window.next();
//! window.next();
//! assert!(!window.is_window_full());
//! window.next();
//! assert!(window.is_window_full());
//!
//! window.record_ack(2);
//! assert!(!window.is_window_full());
//! ```

use super::wire_format::SEQUENCE_MAX;

/// Sequence counter plus ack accounting for one session.
///
/// Not synchronized: owned by a single client and mutated through
/// `&mut self` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceWindow {
    /// Last sequence handed out (0 = none yet).
    sequence: u32,
    /// Highest sequence acknowledged by the peer (0 = none yet).
    last_ack: u32,
    /// Maximum unacknowledged frames.
    window_size: u32,
}

impl SequenceWindow {
    /// Create a window at the start of a session.
    ///
    /// A zero `window_size` is raised to 1.
    pub fn new(window_size: u32) -> Self {
        Self {
            sequence: 0,
            last_ack: 0,
            window_size: window_size.max(1),
        }
    }

    /// Advance and return the next sequence number.
    ///
    /// Wraps from `u32::MAX` back to 1; never returns 0.
    pub fn next(&mut self) -> u32 {
        if self.sequence == SEQUENCE_MAX {
            self.sequence = 0;
        }
        self.sequence += 1;
        self.sequence
    }

    /// Frames sent before the current one and not yet acknowledged.
    ///
    /// Negative right after a wrap, while `last_ack` still holds a
    /// pre-wrap value.
    #[inline]
    pub fn unacked_count(&self) -> i64 {
        i64::from(self.sequence) - (i64::from(self.last_ack) + 1)
    }

    /// Whether acks must be drained before sending another frame.
    #[inline]
    pub fn is_window_full(&self) -> bool {
        self.unacked_count() >= i64::from(self.window_size)
    }

    /// Record the peer's latest acknowledgment.
    #[inline]
    pub fn record_ack(&mut self, ack: u32) {
        self.last_ack = ack;
    }

    /// Last sequence handed out.
    #[inline]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Highest acknowledged sequence.
    #[inline]
    pub fn last_ack(&self) -> u32 {
        self.last_ack
    }

    /// Configured window size.
    #[inline]
    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    #[cfg(test)]
    pub(crate) fn with_sequence(window_size: u32, sequence: u32) -> Self {
        Self {
            sequence,
            ..Self::new(window_size)
        }
    }
}
