use rand::seq::SliceRandom;
use rand::Rng;

/// Return a new vector with the same elements in uniformly random order.
/// The input is left untouched; used both for multiple-choice option
/// ordering and for sampling the distractor pool.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);
    shuffled
}
