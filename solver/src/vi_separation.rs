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

//! Iterative valid-inequality separation (`spec.md` §4.J).

use network::{Network, TimedArcIx, UntimedArcIx};

use crate::cuts::Cut;

const USED_THRESHOLD: f64 = 0.001;
const VIOLATION_THRESHOLD: f64 = 0.01;

fn untimed_arc_values(arcs_by_untimed: &[Vec<TimedArcIx>], x: &[f64]) -> Vec<f64> {
    arcs_by_untimed
        .iter()
        .map(|timed| timed.iter().map(|&t| x[t]).sum())
        .collect()
}

/// One separation sweep: for every "used" non-waiting untimed arc, check the
/// predecessor/successor valid inequality and emit a cut where it is
/// violated by more than `0.01` (`spec.md` §4.J). Returns an empty vec once
/// the LP has stabilised — the driver's stopping condition.
pub fn separate(network: &Network, arcs_by_untimed: &[Vec<TimedArcIx>], x: &[f64]) -> Vec<Cut> {
    let activations = untimed_arc_values(arcs_by_untimed, x);
    let mut cuts = Vec::new();

    for (ix, arc) in network.untimed_arcs.iter().enumerate() {
        if activations[ix] <= USED_THRESHOLD {
            continue;
        }

        if !arc.orders.is_empty() {
            let predecessors: Vec<UntimedArcIx> = network.pred_succ.predecessors_of(ix).to_vec();
            let rhs: f64 = predecessors.iter().map(|&p| activations[p]).sum();
            if activations[ix] - rhs > VIOLATION_THRESHOLD {
                cuts.push(Cut::PredecessorVi { arc: ix, predecessors });
            }
        }

        if arc.to_restaurant.is_some() {
            let successors: Vec<UntimedArcIx> = network.pred_succ.successors_of(ix).to_vec();
            let rhs: f64 = successors.iter().map(|&s| activations[s]).sum();
            if activations[ix] - rhs > VIOLATION_THRESHOLD {
                cuts.push(Cut::SuccessorVi { arc: ix, successors });
            }
        }
    }

    cuts
}
