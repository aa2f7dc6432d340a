// Copyright @yucwang 2026

use crate::core::sampler::{bits_to_unit_float, SampleGenerator};
use crate::math::constants::Float;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// 64-bit linear congruential stream.
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    pub fn next_f32(&mut self) -> Float {
        bits_to_unit_float(self.next_u32())
    }
}

impl SampleGenerator for LcgRng {
    fn seeded(seed: u64) -> Self {
        Self::new(seed)
    }

    fn next_1d(&mut self) -> Float {
        self.next_f32()
    }
}

/// Counter-based generator: the i-th sample is a pure hash of `(seed, i)`.
pub struct HashRng {
    key: u32,
    counter: u32,
}

impl HashRng {
    pub fn new(seed: u64) -> Self {
        let key = pcg_hash((seed as u32) ^ pcg_hash((seed >> 32) as u32));
        Self { key, counter: 0 }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }
}

impl SampleGenerator for HashRng {
    fn seeded(seed: u64) -> Self {
        Self::new(seed)
    }

    fn next_1d(&mut self) -> Float {
        let bits = pcg_hash(self.key ^ pcg_hash(self.counter));
        self.counter = self.counter.wrapping_add(1);
        bits_to_unit_float(bits)
    }
}

/// Full pseudorandom stream backed by `rand`'s small fast generator.
pub struct StreamRng {
    rng: SmallRng,
}

impl SampleGenerator for StreamRng {
    fn seeded(seed: u64) -> Self {
        Self { rng: SmallRng::seed_from_u64(seed) }
    }

    fn next_1d(&mut self) -> Float {
        bits_to_unit_float(self.rng.next_u32())
    }
}

/// PCG output permutation used as an integer hash.
pub fn pcg_hash(input: u32) -> u32 {
    let state = input.wrapping_mul(747796405).wrapping_add(2891336453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277803737);
    (word >> 22) ^ word
}
