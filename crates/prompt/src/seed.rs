//! Hash-derived deterministic randomness

use sha2::{Digest, Sha256};

use crate::types::PromptBuilderInput;

/// Hex SHA-256 of `subject|persona|question|counter|date`
pub fn generate_seed(input: &PromptBuilderInput) -> String {
    let raw = format!(
        "{}|{}|{}|{}|{}",
        input.subject_id, input.persona_id, input.question_id, input.counter, input.date
    );
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Uniform value in [0, 1) from the first 4 bytes of `SHA-256(seed + salt)`
pub fn unit_float(seed: &str, salt: &str) -> f64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();

    let value = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    f64::from(value) / 4_294_967_296.0
}

/// Index into a list of `len` items, `None` for an empty list
pub fn pick_index(len: usize, seed: &str, salt: &str) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let index = (unit_float(seed, salt) * len as f64) as usize;
    Some(index.min(len - 1))
}

pub fn pick<'a, T>(choices: &'a [T], seed: &str, salt: &str) -> Option<&'a T> {
    pick_index(choices.len(), seed, salt).map(|i| &choices[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_float_range_and_determinism() {
        for i in 0..500 {
            let seed = format!("seed-{}", i);
            let value = unit_float(&seed, "opener");
            assert!((0.0..1.0).contains(&value));
            assert_eq!(value, unit_float(&seed, "opener"));
        }
    }

    #[test]
    fn test_salts_are_independent() {
        let differing = (0..100)
            .filter(|i| {
                let seed = format!("s{}", i);
                pick_index(4, &seed, "opener") != pick_index(4, &seed, "rhythm")
            })
            .count();
        assert!(differing > 30);
    }

    #[test]
    fn test_pick_covers_every_choice() {
        let choices = ["a", "b", "c"];
        let picked: std::collections::HashSet<&str> = (0..200)
            .filter_map(|i| pick(&choices, &format!("{}", i), "x").copied())
            .collect();
        assert_eq!(picked.len(), 3);
        assert!(pick::<u8>(&[], "seed", "x").is_none());
    }
}
