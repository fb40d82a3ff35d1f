//! Opponent model: draws villain actions consistent with the solved mixed
//! strategy. Over many draws the sample proportions converge to the node's
//! equilibrium frequencies.

use rand::Rng;

use crate::combos;
use crate::tree::{action_entries, average_vector, ActionNode};

/// Sample one action for the villain at `node`.
///
/// With a known combo the combo's (or its isomorphic) vector drives the
/// draw; otherwise the population-average vector stands in. Inverse-CDF:
/// the first entry whose running sum reaches `r` wins, with the last entry
/// as the floating-point backstop.
///
/// Returns `None` only when the node offers no actions at all (terminal).
pub fn sample<R: Rng>(node: &ActionNode, villain_combo: Option<&str>, rng: &mut R) -> Option<String> {
    let entries = action_entries(node);
    if entries.is_empty() {
        return None;
    }

    let table = match node.table() {
        Some(t) => t,
        None => {
            // No strategy dumped at this depth: uniform among children.
            let pick = rng.gen_range(0..entries.len());
            return Some(entries[pick].name.clone());
        }
    };

    let freqs: Vec<f64> = match villain_combo.and_then(|c| combos::resolve(table, c)) {
        Some(key) => table[key].clone(),
        None => average_vector(table, entries.len()),
    };

    let r: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (entry, freq) in entries.iter().zip(&freqs) {
        cumulative += freq;
        if r <= cumulative {
            return Some(entry.name.clone());
        }
    }
    entries.last().map(|e| e.name.clone())
}
