//! Seeded corpus generation shared by the integration tests.
//!
//! Generated data mixes sections of very different statistics so a single
//! stream exercises escapes, long runs that saturate the root weight, and
//! sudden alphabet shifts:
//! - runs of a single byte
//! - text-like data over a small alphabet
//! - short repeating patterns
//! - uniformly random bytes

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate `size_bytes` of mixed-compressibility data from `seed`.
pub fn generate_sample_data(seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(size_bytes);

    while data.len() < size_bytes {
        let section = (size_bytes - data.len()).min(rng.gen_range(256..=8192));

        match rng.gen_range(0..10u8) {
            // 30% runs
            0..=2 => {
                let byte_value: u8 = rng.gen();
                data.extend(std::iter::repeat(byte_value).take(section));
            }

            // 30% text-like
            3..=5 => {
                let alphabet = b"abcdefghijklmnopqrstuvwxyz .!,\n";
                for _ in 0..section {
                    data.push(alphabet[rng.gen_range(0..alphabet.len())]);
                }
            }

            // 20% repeating patterns
            6..=7 => {
                let pattern = generate_pattern(&mut rng);
                data.extend(pattern.iter().cycle().take(section));
            }

            // 20% random bytes
            _ => {
                for _ in 0..section {
                    data.push(rng.gen());
                }
            }
        }
    }

    data
}

/// Bytes drawn from a heavily skewed distribution over `alphabet` symbols.
pub fn generate_skewed_data(seed: u64, size_bytes: usize, alphabet: u8) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..size_bytes)
        .map(|_| {
            let a: u8 = rng.gen_range(0..alphabet);
            let b: u8 = rng.gen_range(0..alphabet);
            a.min(b)
        })
        .collect()
}

fn generate_pattern(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let pattern_len = rng.gen_range(4..=32);
    (0..pattern_len).map(|_| rng.gen()).collect()
}
