use crate::cache::{BlockId, L2Line, Time};

use super::{Replace, Victim};

/// Not-recently-used: one reference bit per line, set on fill and on every
/// hit. Victim search wants an unreferenced, unpinned line; when none exists
/// the whole set's reference bits are cleared (sparing any line holding the
/// incoming block) and the search runs once more.
pub struct Nru {}

impl Nru {
    pub fn new() -> Self {
        Nru {}
    }
}

impl Replace for Nru {
    type State = bool;
    const NAME: &'static str = "NRU";

    fn fill_state(&mut self, _now: Time) -> bool {
        true
    }

    fn touch(&mut self, state: &mut bool, _now: Time) {
        *state = true;
    }

    fn victim(&mut self, set: &mut [L2Line<bool>], incoming: BlockId) -> Victim {
        if let Some(way) = set.iter().position(|l| !l.valid) {
            return Victim { way, forced: false };
        }
        if let Some(way) = set.iter().position(|l| !l.state && !l.in_l1) {
            return Victim { way, forced: false };
        }
        for line in set.iter_mut() {
            if line.tag != incoming {
                line.state = false;
            }
        }
        if let Some(way) = set.iter().position(|l| !l.state && !l.in_l1) {
            return Victim { way, forced: false };
        }
        // Every unreferenced line is pinned in L1. Evicting a pinned line
        // would break inclusion, so take the first unpinned one instead and
        // flag the choice.
        match set.iter().position(|l| !l.in_l1) {
            Some(way) => Victim { way, forced: true },
            None => panic!(
                "{}: every line in the set is pinned in L1, inclusion is unsatisfiable",
                Self::NAME
            ),
        }
    }
}
