use super::BlockState;

/// Count of oversized blocks in one section.
///
/// The storage layer owns one per section and keeps it current: every block
/// replacement goes through [`OversizedCounter::on_block_replaced`], and a
/// full recount resets it. The sweeper only reads
/// [`OversizedCounter::has_oversized_blocks`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OversizedCounter {
    count: u16,
}

impl OversizedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_block_replaced<B: BlockState>(&mut self, old: &B, new: &B) {
        if old.counts_as_oversized() {
            self.count = self.count.saturating_sub(1);
        }
        if new.counts_as_oversized() {
            self.count = self.count.saturating_add(1);
        }
    }

    /// Resets the counter and recounts from every state of the section.
    pub fn recount<'a, B, I>(&mut self, states: I)
    where
        B: BlockState + 'a,
        I: IntoIterator<Item = &'a B>,
    {
        self.count = 0;
        for state in states {
            if state.counts_as_oversized() {
                self.count = self.count.saturating_add(1);
            }
        }
    }

    #[inline]
    pub fn count(&self) -> u16 {
        self.count
    }

    #[inline]
    pub fn has_oversized_blocks(&self) -> bool {
        self.count > 0
    }
}
