use crate::cache::{BlockId, L2Line, Time};

use super::{Replace, Victim};

/// Maximum re-reference prediction value: "not needed soon".
const RRPV_MAX: u8 = 3;
/// RRPV given to a freshly filled line: long re-reference interval, so a
/// never-reused block ages out ahead of reused ones.
const RRPV_FILL: u8 = 2;

/// Static RRIP: 2-bit re-reference prediction values, filled at `RRPV_MAX-1`,
/// reset to 0 on a hit, and aged set-wide whenever no line is evictable.
pub struct Srrip {}

impl Srrip {
    pub fn new() -> Self {
        Srrip {}
    }
}

impl Replace for Srrip {
    type State = u8;
    const NAME: &'static str = "SRRIP";

    fn fill_state(&mut self, _now: Time) -> u8 {
        RRPV_FILL
    }

    fn touch(&mut self, state: &mut u8, _now: Time) {
        *state = 0;
    }

    // An L1 hit never reaches L2, so the RRPV keeps whatever age it has;
    // only the pin bookkeeping (done by the hierarchy) changes.
    fn touch_from_l1(&mut self, _state: &mut u8, _now: Time) {}

    fn victim(&mut self, set: &mut [L2Line<u8>], _incoming: BlockId) -> Victim {
        if let Some(way) = set.iter().position(|l| !l.valid) {
            return Victim { way, forced: false };
        }
        // Aging raises every unpinned line to RRPV_MAX within RRPV_MAX
        // passes, so the loop terminates as long as some line is not pinned
        // in L1. Eligibility is `>= RRPV_MAX`: a line aged past the maximum
        // while pinned must still qualify once its pin clears.
        for _ in 0..=RRPV_MAX {
            if let Some(way) = set.iter().position(|l| l.state >= RRPV_MAX && !l.in_l1) {
                return Victim { way, forced: false };
            }
            for line in set.iter_mut() {
                line.state = line.state.saturating_add(1);
            }
        }
        panic!(
            "{}: every line in the set is pinned in L1, inclusion is unsatisfiable",
            Self::NAME
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(rrpv: u8, in_l1: bool) -> L2Line<u8> {
        L2Line {
            valid: true,
            in_l1,
            tag: 0,
            state: rrpv,
            ..L2Line::default()
        }
    }

    #[test]
    fn prefers_invalid_lines() {
        let mut set = vec![line(RRPV_MAX, false), L2Line::default()];
        assert_eq!(Srrip::new().victim(&mut set, 42).way, 1);
    }

    #[test]
    fn picks_distant_line_without_aging() {
        let mut set = vec![line(0, false), line(RRPV_MAX, false), line(2, false)];
        assert_eq!(Srrip::new().victim(&mut set, 42).way, 1);
        // no aging happened
        assert_eq!(set[0].state, 0);
        assert_eq!(set[2].state, 2);
    }

    #[test]
    fn skips_pinned_line_and_ages_the_set() {
        let mut set = vec![line(RRPV_MAX, true), line(1, false), line(0, false)];
        let victim = Srrip::new().victim(&mut set, 42);
        assert_eq!(victim.way, 1);
        assert!(!victim.forced);
        // way 1 needed two aging passes to reach RRPV_MAX
        assert_eq!(set[2].state, 2);
    }

    #[test]
    fn line_aged_past_max_while_pinned_still_qualifies() {
        let mut set = vec![line(RRPV_MAX + 1, false), line(0, true)];
        assert_eq!(Srrip::new().victim(&mut set, 42).way, 0);
    }

    #[test]
    #[should_panic(expected = "pinned")]
    fn fully_pinned_set_is_fatal() {
        let mut set = vec![line(RRPV_MAX, true), line(RRPV_MAX, true)];
        let _ = Srrip::new().victim(&mut set, 42);
    }
}
