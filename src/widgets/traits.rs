// ---------------------------------------------------------------------------
// InteractionResult
// ---------------------------------------------------------------------------

/// What a controller did with one host event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionResult {
    pub handled: bool,
    pub request_render: bool,
}

impl InteractionResult {
    pub fn ignored() -> Self {
        Self::default()
    }

    /// The event was meant for this controller but changed nothing.
    pub fn consumed() -> Self {
        Self {
            handled: true,
            request_render: false,
        }
    }

    pub fn handled() -> Self {
        Self {
            handled: true,
            request_render: true,
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.handled |= other.handled;
        self.request_render |= other.request_render;
    }
}
