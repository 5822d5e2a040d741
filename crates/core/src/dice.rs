//! d20 roller with flick-to-roll detection
//!
//! The UI feeds device-motion samples (~10 Hz) into [`FlickDetector`]; a fast
//! downward flick triggers a roll unless one is already animating.

use rand::Rng;

/// Sides on the die
pub const D20_SIDES: u8 = 20;

/// Z acceleration (g) a sample must exceed to count as a flick
pub const FLICK_MIN_Z: f64 = 1.5;
/// Minimum jump in Z acceleration between consecutive samples
pub const FLICK_MIN_DELTA: f64 = 1.0;

/// Roll a d20 (1..=20)
pub fn roll_d20<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(1..=D20_SIDES)
}

/// Detects a fast downward flick from Z acceleration samples
#[derive(Debug, Clone, Default)]
pub struct FlickDetector {
    last_z: f64,
    rolling: bool,
}

impl FlickDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample; returns true when it completes a flick
    ///
    /// Samples arriving while a roll is in progress are ignored entirely.
    pub fn observe(&mut self, z: f64) -> bool {
        if self.rolling {
            return false;
        }

        let delta = z - self.last_z;
        self.last_z = z;
        z > FLICK_MIN_Z && delta > FLICK_MIN_DELTA
    }

    /// Mark roll start/end (set by the UI around the roll animation)
    pub fn set_rolling(&mut self, rolling: bool) {
        self.rolling = rolling;
    }

    pub fn is_rolling(&self) -> bool {
        self.rolling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_roll_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut seen = [false; D20_SIDES as usize];
        for _ in 0..2000 {
            let roll = roll_d20(&mut rng);
            assert!((1..=D20_SIDES).contains(&roll));
            seen[(roll - 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "every face should come up");
    }

    #[test]
    fn test_roll_is_deterministic_for_seed() {
        let a: Vec<u8> = {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            (0..10).map(|_| roll_d20(&mut rng)).collect()
        };
        let b: Vec<u8> = {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            (0..10).map(|_| roll_d20(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_fast_flick_triggers() {
        let mut detector = FlickDetector::new();
        assert!(!detector.observe(0.1));
        assert!(detector.observe(1.8));
    }

    #[test]
    fn test_slow_tilt_does_not_trigger() {
        let mut detector = FlickDetector::new();
        for z in [0.5, 1.0, 1.4, 1.6, 1.9] {
            assert!(!detector.observe(z), "z={} should not trigger", z);
        }
    }

    #[test]
    fn test_ignored_while_rolling() {
        let mut detector = FlickDetector::new();
        detector.set_rolling(true);
        assert!(!detector.observe(3.0));

        detector.set_rolling(false);
        assert!(!detector.is_rolling());
        assert!(detector.observe(3.0));
    }
}
