//! 加权不放回抽样：每次抽取都在剩余池上按权重占比重新计算概率。

use rand::Rng;

use crate::quiz::types::WeightedItem;

/// Select `min(count, items.len())` distinct items without replacement.
/// Each draw picks from the remaining pool with probability proportional
/// to the item's weight over the remaining total. O(count × pool size),
/// fine for the few hundred entries this system works with.
///
/// A pool whose weights sum to zero degenerates to uniform draws so that
/// no item can be starved.
pub fn select_weighted<T, R: Rng + ?Sized>(
    items: Vec<WeightedItem<T>>,
    count: usize,
    rng: &mut R,
) -> Vec<WeightedItem<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    if count >= items.len() {
        return items;
    }

    let mut available = items;
    let mut selected = Vec::with_capacity(count);

    for _ in 0..count {
        if available.is_empty() {
            break;
        }

        let total_weight: f64 = available.iter().map(|item| item.weight).sum();
        let index = if total_weight > 0.0 {
            let draw = rng.gen_range(0.0..total_weight);
            let mut cumulative = 0.0;
            let mut picked = available.len() - 1;
            for (i, item) in available.iter().enumerate() {
                cumulative += item.weight;
                if draw < cumulative {
                    picked = i;
                    break;
                }
            }
            picked
        } else {
            rng.gen_range(0..available.len())
        };

        selected.push(available.swap_remove(index));
    }

    selected
}
