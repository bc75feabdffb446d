pub mod lru;
pub mod nru;
pub mod srrip;

use std::fmt::Debug;

use crate::cache::{BlockId, L2Line, Time};

/// Outcome of victim selection within one set.
pub struct Victim {
    pub way: usize,
    /// Set when the policy had to give up on its normal candidate order to
    /// avoid evicting an L1-resident line.
    pub forced: bool,
}

/// An L2 replacement policy: per-line state plus victim selection.
///
/// L1 victim selection is not part of this trait; every policy manages L1 by
/// recency order, so it lives in the hierarchy itself.
pub trait Replace {
    type State: Copy + Default + Debug;
    const NAME: &'static str;

    /// State for a line that was just filled at `now`.
    fn fill_state(&mut self, now: Time) -> Self::State;

    /// Refresh a resident line's state on an L2 hit at `now`.
    fn touch(&mut self, state: &mut Self::State, now: Time);

    /// Refresh a resident L2 line's state when its block hits in L1.
    /// Defaults to the L2-hit refresh; policies that only react to hits at
    /// their own level override this as a no-op.
    fn touch_from_l1(&mut self, state: &mut Self::State, now: Time) {
        self.touch(state, now);
    }

    /// Choose a victim way in `set` to make room for `incoming`. Only called
    /// on an L2 miss, so no line in `set` holds `incoming`. Must never pick
    /// a line with `in_l1` set unless the result is flagged `forced`.
    fn victim(&mut self, set: &mut [L2Line<Self::State>], incoming: BlockId) -> Victim;
}
