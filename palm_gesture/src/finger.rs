//! Finger closure test.
//!
//! Screen-space `y` grows downward, so a finger whose tip is lower than its
//! base (`tip.y > base.y`) is curled.  Only the first and last points of the
//! chain are consulted; no joint angles, no depth.  This is an accepted
//! approximation, not a defect.

use crate::landmark::{Landmark, CHAIN_LEN};

/// `true` when the finger is curled.  A tip level with the base is open.
pub fn is_closed(chain: &[Landmark; CHAIN_LEN]) -> bool {
    let base = chain[0];
    let tip  = chain[CHAIN_LEN - 1];
    tip.y > base.y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(base_y: f32, tip_y: f32) -> [Landmark; CHAIN_LEN] {
        [
            Landmark::new(10.0, base_y, 0.0),
            Landmark::new(11.0, (base_y + tip_y) / 2.0, 0.0),
            Landmark::new(12.0, (base_y + tip_y) / 2.0, 0.0),
            Landmark::new(13.0, tip_y, 0.0),
        ]
    }

    #[test]
    fn tip_below_base_is_closed() {
        assert!(is_closed(&chain(100.0, 140.0)));
    }

    #[test]
    fn tip_above_base_is_open() {
        assert!(!is_closed(&chain(100.0, 40.0)));
    }

    #[test]
    fn level_tip_is_open() {
        assert!(!is_closed(&chain(100.0, 100.0)));
    }

    #[test]
    fn middle_joints_are_ignored() {
        let mut c = chain(100.0, 40.0);
        c[1].y = 500.0;
        c[2].y = 500.0;
        assert!(!is_closed(&c));
    }

    #[test]
    fn depth_is_ignored() {
        let mut c = chain(100.0, 140.0);
        c[3].z = -80.0;
        assert!(is_closed(&c));
    }
}
