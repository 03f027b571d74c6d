use crate::engines::generation::genome::Genome;
use rand::Rng;

/// Uniform crossover: each locus up to the shorter parent's length is
/// swapped with probability 1/2. Tail loci of the longer parent stay with
/// its child.
pub fn uniform_crossover<R: Rng>(
    parent1: &Genome,
    parent2: &Genome,
    rng: &mut R,
) -> (Genome, Genome) {
    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();
    let len = parent1.len().min(parent2.len());

    for i in 0..len {
        if rng.gen_bool(0.5) {
            std::mem::swap(&mut child1[i], &mut child2[i]);
        }
    }

    (child1, child2)
}

/// Mutation: redraw each locus from the catalog with probability `mutation_rate`
pub fn mutate<R: Rng>(
    genome: &mut Genome,
    mutation_rate: f64,
    indicator_count: usize,
    rng: &mut R,
) {
    if indicator_count == 0 {
        return;
    }
    for gene in genome.iter_mut() {
        if rng.gen::<f64>() < mutation_rate {
            *gene = rng.gen_range(0..indicator_count);
        }
    }
}

/// Generate random genome
pub fn random_genome<R: Rng>(
    length: usize,
    indicator_count: usize,
    rng: &mut R,
) -> Genome {
    if indicator_count == 0 {
        return Vec::new();
    }
    (0..length)
        .map(|_| rng.gen_range(0..indicator_count))
        .collect()
}

/// Two distinct indices in `0..pool`, or the same one twice when `pool` is 1.
pub fn pick_parents<R: Rng>(pool: usize, rng: &mut R) -> (usize, usize) {
    if pool <= 1 {
        return (0, 0);
    }
    let first = rng.gen_range(0..pool);
    let mut second = rng.gen_range(0..pool - 1);
    if second >= first {
        second += 1;
    }
    (first, second)
}
