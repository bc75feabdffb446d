use crate::cache::{BlockId, L2Line, Time};

use super::{Replace, Victim};

/// Least-recently-used: each line carries a logical timestamp refreshed on
/// every access to its block, and the smallest timestamp loses.
///
/// No `in_l1` filter here: L2 timestamps are refreshed on L1 hits too, so
/// with an inclusive geometry (more L1-recent blocks than L1 ways would be
/// needed to out-age a resident one) the LRU minimum is never L1-resident.
pub struct Lru {}

impl Lru {
    pub fn new() -> Self {
        Lru {}
    }
}

impl Replace for Lru {
    type State = Time;
    const NAME: &'static str = "LRU";

    fn fill_state(&mut self, now: Time) -> Time {
        now
    }

    fn touch(&mut self, state: &mut Time, now: Time) {
        *state = now;
    }

    fn victim(&mut self, set: &mut [L2Line<Time>], _incoming: BlockId) -> Victim {
        if let Some(way) = set.iter().position(|l| !l.valid) {
            return Victim { way, forced: false };
        }
        let way = set
            .iter()
            .enumerate()
            .min_by_key(|(_, l)| l.state)
            .map(|(way, _)| way)
            .unwrap();
        Victim { way, forced: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(valid: bool, stamp: Time) -> L2Line<Time> {
        L2Line {
            valid,
            tag: 0,
            state: stamp,
            ..L2Line::default()
        }
    }

    #[test]
    fn prefers_invalid_lines() {
        let mut set = vec![line(true, 0), line(false, 0), line(true, 1)];
        let victim = Lru::new().victim(&mut set, 42);
        assert_eq!(victim.way, 1);
        assert!(!victim.forced);
    }

    #[test]
    fn evicts_smallest_timestamp() {
        let mut set = vec![line(true, 7), line(true, 3), line(true, 9)];
        assert_eq!(Lru::new().victim(&mut set, 42).way, 1);
    }

    #[test]
    fn timestamp_ties_break_toward_lowest_way() {
        let mut set = vec![line(true, 5), line(true, 2), line(true, 2)];
        assert_eq!(Lru::new().victim(&mut set, 42).way, 1);
    }
}
