use chrono::{DateTime, Utc};

/// Half-open time range `(since, until]` covered by one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

/// Moment up to which a feed has already been fetched.
///
/// The watermark moves before the fetch starts, so a window is requested at
/// most once even when the poll fails halfway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    last: DateTime<Utc>,
}

impl Default for Watermark {
    fn default() -> Self {
        Self::starting_at(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Watermark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(last: DateTime<Utc>) -> Self {
        Self { last }
    }

    pub fn last(&self) -> DateTime<Utc> {
        self.last
    }

    /// Claim the window from the current mark up to `now`.
    ///
    /// A clock that went backwards yields an empty window instead of moving
    /// the mark back.
    pub fn advance(&mut self, now: DateTime<Utc>) -> PollWindow {
        let until = now.max(self.last);
        let window = PollWindow {
            since: self.last,
            until,
        };
        self.last = until;
        window
    }
}
