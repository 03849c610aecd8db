use crate::utilities::CopyStr;
use derive_more::{Add, Display, From, Sub};
use serde::{Deserialize, Serialize};

/// All ids may carry a short alphabetic prefix in the instance files (`spec.md`
/// §6); `cli::instance_io` strips it before constructing these.
pub type CourierId = CopyStr<24>;
pub type OrderId = CopyStr<24>;
pub type RestaurantId = CopyStr<24>;

/// Minutes elapsed since the start of the scheduling horizon. A plain
/// floating offset, not a calendar `DateTime`: the travel-time convention
/// (`spec.md` §3) adds service-time halves to a ceiling'd travel time, which
/// is not always an integer; nothing in the instance ever needs a calendar
/// (see DESIGN.md for why this departs from the teacher's
/// `rapid_time::DateTime`).
#[derive(Debug, Display, Copy, Clone, PartialEq, Add, Sub, From, Serialize, Deserialize)]
pub struct Minutes(pub f64);

impl Minutes {
    pub const ZERO: Minutes = Minutes(0.0);

    pub fn max(self, other: Minutes) -> Minutes {
        Minutes(self.0.max(other.0))
    }

    pub fn min(self, other: Minutes) -> Minutes {
        Minutes(self.0.min(other.0))
    }
}

impl Eq for Minutes {}

impl PartialOrd for Minutes {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Ord for Minutes {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).expect("Minutes must never be NaN")
    }
}

/// Dollars. Kept as `f64` throughout: the MIP objective and the payment
/// floors are genuinely continuous (per-minute wage, per-delivery fee).
pub type Cost = f64;

/// A location in the plane, metres.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Coord { x, y }
    }

    pub fn dist(&self, other: &Coord) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}
