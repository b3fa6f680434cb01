/// The "copied to clipboard" banner.
///
/// Every `show` starts a new generation. A timer armed for an older generation
/// is ignored when it fires, so a dismiss or a repeated copy never needs to
/// reach back and cancel the pending timer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CopiedNotice {
    visible: bool,
    generation: u64,
}

impl CopiedNotice {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show the banner and return the generation the dismissal timer belongs to.
    pub fn show(&mut self) -> u64 {
        self.visible = true;
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    /// Returns true if the banner was hidden by this expiry.
    pub fn expire(&mut self, generation: u64) -> bool {
        if self.visible && generation == self.generation {
            self.visible = false;
            true
        } else {
            false
        }
    }
}
