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

use serde::{Deserialize, Serialize};

/// How couriers are partitioned into equivalence classes (`spec.md` §4.B).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupingMode {
    /// Partition by off-time only.
    ByOffTime,
    /// Partition by (on-time, off-time).
    ByOnAndOffTime,
    /// One group per courier.
    PerCourier,
}

/// One immutable options object, passed down through every stage of the
/// pipeline (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Δ (minutes) between time nodes per (group, restaurant).
    pub node_time_interval: i64,
    /// How couriers are grouped.
    pub grouping: GroupingMode,
    /// If < 1, drop entire restaurants at random until this proportion of
    /// orders remains.
    pub order_proportion: f64,
    /// Seed controlling the restaurant subsampling.
    pub seed: u64,
    /// Snap node times to a common multiple of `node_time_interval`.
    pub global_node_intervals: bool,
    /// Enable §4.J valid-inequality separation.
    pub add_valid_inequality_constraints: bool,
    /// Lazy (recursive re-separation) vs. upfront VI addition.
    pub add_vi_recursively: bool,
    /// Restrict sequences to singletons (no bundling).
    pub limit_bundles_to_size_one: bool,
    /// Enable §4.I payment constraints/objective; otherwise any feasible
    /// assignment is returned.
    pub consider_objective: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            node_time_interval: 5,
            grouping: GroupingMode::ByOffTime,
            order_proportion: 1.0,
            seed: 0,
            global_node_intervals: false,
            add_valid_inequality_constraints: true,
            add_vi_recursively: true,
            limit_bundles_to_size_one: false,
            consider_objective: true,
        }
    }
}
