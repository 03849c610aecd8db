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

use rayon::prelude::*;

use model::base_types::{Minutes, RestaurantId};
use model::config::Options;
use model::courier_group::{group_couriers, CourierGroup};
use model::diagnostics::Diagnostics;
use model::instance::Instance;

use crate::node::{generate_nodes, Nodes};
use crate::pairing::enumerate_pairs;
use crate::pred_succ::{build_pred_succ_index, PredSuccIndex};
use crate::sequence::{enumerate_sequences, Sequence};
use crate::subsample::subsample;
use crate::timed_arc::{generate_timed_arcs, TimedArc};
use crate::untimed_arc::{build_entry_arcs, build_exit_arcs, build_main_arcs, UntimedArc};

/// Everything preprocessing produces (`spec.md` §2, components B through H):
/// immutable once built, read-only thereafter (`spec.md` §3 "Ownership and
/// lifecycle").
pub struct Network {
    pub groups: Vec<CourierGroup>,
    pub global_off_time: Minutes,
    pub sequences: Vec<Sequence>,
    pub untimed_arcs: Vec<UntimedArc>,
    pub pred_succ: PredSuccIndex,
    pub nodes: Nodes,
    pub timed_arcs: Vec<TimedArc>,
}

/// Runs components B–H in dependency order (`spec.md` §2's "A→B→C→D→E→F,
/// A+E→G→H" data-flow). Per-restaurant sequence enumeration (§4.C) runs on
/// `rayon`'s parallel iterator since each restaurant's enumeration is fully
/// independent; everything after the group partition (§4.B) depends on
/// `global_off_time`, so grouping stays sequential and happens first. The
/// seeded restaurant subsampling (§6 `orderProportion`/`seed`) also runs here,
/// single-threaded, right before that parallel stage, so the dropped set
/// stays a deterministic function of the seed. Returns the (possibly
/// subsampled) instance alongside the network built from it, since every
/// later stage — including the solver — must agree on which orders exist.
pub fn build_network(instance: &Instance, options: &Options, diagnostics: &mut Diagnostics) -> (Instance, Network) {
    let (groups, global_off_time) = group_couriers(&instance.couriers, options.grouping);

    let instance = subsample(instance, options.order_proportion, options.seed, global_off_time);

    let restaurant_ids: Vec<RestaurantId> = instance.restaurants.iter().map(|r| r.id).collect();

    let per_restaurant: Vec<(Vec<Sequence>, Diagnostics)> = restaurant_ids
        .par_iter()
        .map(|&r| {
            let mut local_diagnostics = Diagnostics::new();
            let seqs = enumerate_sequences(&instance, r, options.limit_bundles_to_size_one, global_off_time, &mut local_diagnostics);
            (seqs, local_diagnostics)
        })
        .collect();

    let mut sequences = Vec::new();
    for (seqs, local) in per_restaurant {
        sequences.extend(seqs);
        for d in local.entries() {
            diagnostics.push(d.clone());
        }
    }

    let pairs = enumerate_pairs(&instance, &sequences, &restaurant_ids);

    let mut untimed_arcs = build_main_arcs(&instance, &pairs, &groups, diagnostics);
    untimed_arcs.extend(build_exit_arcs(&instance, &sequences, &groups));
    untimed_arcs.extend(build_entry_arcs(&instance, &restaurant_ids, &groups));

    let pred_succ = build_pred_succ_index(&untimed_arcs);

    let nodes = generate_nodes(&instance, &groups, global_off_time, &untimed_arcs, options);

    let timed_arcs = generate_timed_arcs(&untimed_arcs, &nodes, diagnostics);

    let network = Network {
        groups,
        global_off_time,
        sequences,
        untimed_arcs,
        pred_succ,
        nodes,
        timed_arcs,
    };

    (instance, network)
}
