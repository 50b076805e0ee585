/// Handle for one scheduled repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickToken(u64);

/// Tracks the single in-flight "next tick" of a render loop.
///
/// At most one token is outstanding. Cancelling forgets it, so a callback
/// that fires after a pause or teardown carries a stale token and is refused.
#[derive(Debug, Default)]
pub struct RenderLoop {
    generation: u64,
    pending: Option<TickToken>,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a new token unless one is already in flight.
    pub fn request(&mut self) -> Option<TickToken> {
        if self.pending.is_some() {
            return None;
        }
        self.generation += 1;
        let token = TickToken(self.generation);
        self.pending = Some(token);
        Some(token)
    }

    /// Returns whether `token` is the one in flight, clearing it if so.
    pub fn complete(&mut self, token: TickToken) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
