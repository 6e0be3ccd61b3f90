//! Test helpers: a generator that replays a fixed list of uniform draws.

use rand::RngCore;

/// Replays scripted `f64` draws through `Rng::gen::<f64>()`.
///
/// Each value in [0, 1) is encoded into the 53 high-order bits consumed by
/// rand's `Standard` float sampling, so `gen::<f64>()` returns it exactly.
/// Panics once the script is exhausted, which doubles as an assertion that a
/// code path draws no more than expected.
pub struct ScriptedRng {
    draws: Vec<f64>,
    next: usize,
}

impl ScriptedRng {
    pub fn new(draws: &[f64]) -> Self {
        Self {
            draws: draws.to_vec(),
            next: 0,
        }
    }

    /// Draws not yet consumed.
    pub fn remaining(&self) -> usize {
        self.draws.len() - self.next
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let draw = *self
            .draws
            .get(self.next)
            .unwrap_or_else(|| panic!("scripted rng exhausted after {} draws", self.next));
        self.next += 1;
        assert!((0.0..1.0).contains(&draw), "scripted draw {} outside [0, 1)", draw);
        ((draw * (1u64 << 53) as f64) as u64) << 11
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_replays_exact_values() {
        let mut rng = ScriptedRng::new(&[0.0, 0.25, 0.5, 0.75]);
        assert_eq!(rng.gen::<f64>(), 0.0);
        assert_eq!(rng.gen::<f64>(), 0.25);
        assert_eq!(rng.gen::<f64>(), 0.5);
        assert_eq!(rng.gen::<f64>(), 0.75);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    #[should_panic(expected = "exhausted")]
    fn test_panics_when_exhausted() {
        let mut rng = ScriptedRng::new(&[0.1]);
        let _ = rng.gen::<f64>();
        let _ = rng.gen::<f64>();
    }
}
