// © 2023-2024 ETH Zurich
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// any later version.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use std::collections::BTreeMap;

use crate::base_types::{CourierId, Minutes};
use crate::config::GroupingMode;
use crate::instance::Courier;

/// The key couriers are partitioned by (`spec.md` §3 "CourierGroup").
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    OffTime(TotalMinutes),
    OnAndOffTime(TotalMinutes, TotalMinutes),
    Courier(CourierId),
}

/// `Minutes` wraps an `f64` and cannot be hashed/ordered totally; grouping
/// keys only ever hold whole-minute shift boundaries, so we bucket on the
/// rounded millisecond-free integer value instead of deriving `Hash` on
/// `Minutes` itself.
pub type TotalMinutes = i64;

fn bucket(m: Minutes) -> TotalMinutes {
    m.0.round() as TotalMinutes
}

#[derive(Debug, Clone)]
pub struct CourierGroup {
    pub key: GroupKey,
    pub members: Vec<CourierId>,
    /// The maximum off-time among members (`spec.md` §4.B).
    pub off: Minutes,
}

/// Partitions couriers per `mode`, then returns the groups alongside the
/// global off-time (the maximum off-time over all groups), which every
/// order's `latest_leave` is capped by (`spec.md` §4.A/§9).
pub fn group_couriers(couriers: &[Courier], mode: GroupingMode) -> (Vec<CourierGroup>, Minutes) {
    let mut buckets: BTreeMap<GroupKey, Vec<CourierId>> = BTreeMap::new();

    for courier in couriers {
        let key = match mode {
            GroupingMode::ByOffTime => GroupKey::OffTime(bucket(courier.off)),
            GroupingMode::ByOnAndOffTime => {
                GroupKey::OnAndOffTime(bucket(courier.on), bucket(courier.off))
            }
            GroupingMode::PerCourier => GroupKey::Courier(courier.id),
        };
        buckets.entry(key).or_default().push(courier.id);
    }

    let courier_off: std::collections::HashMap<CourierId, Minutes> =
        couriers.iter().map(|c| (c.id, c.off)).collect();

    let groups: Vec<CourierGroup> = buckets
        .into_iter()
        .map(|(key, members)| {
            let off = match key {
                GroupKey::OnAndOffTime(_, off_bucket) => Minutes(off_bucket as f64),
                _ => members
                    .iter()
                    .map(|id| courier_off[id])
                    .fold(Minutes(f64::MIN), Minutes::max),
            };
            CourierGroup { key, members, off }
        })
        .collect();

    let global_off = groups
        .iter()
        .map(|g| g.off)
        .fold(Minutes(f64::MIN), Minutes::max);

    (groups, global_off)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_types::Coord;

    fn courier(id: &str, on: f64, off: f64) -> Courier {
        Courier {
            id: CourierId::from(id),
            home: Coord::new(0.0, 0.0),
            on: Minutes(on),
            off: Minutes(off),
        }
    }

    #[test]
    fn groups_by_off_time_take_the_max_member_off() {
        let couriers = vec![courier("c1", 0.0, 100.0), courier("c2", 10.0, 100.0)];
        let (groups, global_off) = group_couriers(&couriers, GroupingMode::ByOffTime);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[0].off, Minutes(100.0));
        assert_eq!(global_off, Minutes(100.0));
    }

    #[test]
    fn per_courier_mode_makes_singleton_groups() {
        let couriers = vec![courier("c1", 0.0, 100.0), courier("c2", 0.0, 120.0)];
        let (groups, global_off) = group_couriers(&couriers, GroupingMode::PerCourier);
        assert_eq!(groups.len(), 2);
        assert_eq!(global_off, Minutes(120.0));
    }

    #[test]
    fn on_and_off_mode_splits_by_pair() {
        let couriers = vec![
            courier("c1", 0.0, 100.0),
            courier("c2", 5.0, 100.0),
            courier("c3", 0.0, 100.0),
        ];
        let (groups, _) = group_couriers(&couriers, GroupingMode::ByOnAndOffTime);
        assert_eq!(groups.len(), 2);
    }
}
