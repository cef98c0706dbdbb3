use anyhow::{bail, Result};

/// Token-length bounds handed to the model, in its native generation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub max_length: usize,
    pub min_length: usize,
}

/// Turns a caller's word budget into generation bounds.
///
/// Out-of-range budgets are clamped, never rejected. The conversion factors
/// are empirical for one model family and therefore live in configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LengthPolicy {
    pub min_words: u32,
    pub max_words: u32,
    pub default_words: u32,
    pub tokens_per_word: f64,
    pub min_length_floor: usize,
    pub min_length_divisor: usize,
}

impl Default for LengthPolicy {
    fn default() -> Self {
        Self {
            min_words: 30,
            max_words: 200,
            default_words: 80,
            tokens_per_word: 1.3,
            min_length_floor: 10,
            min_length_divisor: 4,
        }
    }
}

impl LengthPolicy {
    /// Checks that every reachable word budget yields `min_length <= max_length`.
    pub fn validate(&self) -> Result<()> {
        if self.min_words == 0 || self.min_words > self.max_words {
            bail!(
                "word range [{}, {}] is empty or starts at zero",
                self.min_words,
                self.max_words
            );
        }
        if !(self.tokens_per_word.is_finite() && self.tokens_per_word > 0.0) {
            bail!("tokens per word must be positive, got {}", self.tokens_per_word);
        }
        if self.min_length_floor == 0 {
            bail!("min length floor must be at least 1");
        }
        if self.min_length_divisor == 0 {
            bail!("min length divisor must be at least 1");
        }

        // max_length grows with the budget, so the smallest budget is the tight case.
        let smallest = self.max_length_for(self.min_words);
        if smallest < self.min_length_floor {
            bail!(
                "{} words map to {} tokens, below the min length floor of {}",
                self.min_words,
                smallest,
                self.min_length_floor
            );
        }
        Ok(())
    }

    /// Clamps any integer into the configured word range.
    pub fn clamp_words(&self, words: i64) -> u32 {
        let clamped = words.clamp(i64::from(self.min_words), i64::from(self.max_words));
        // Lossless: the range bounds are u32.
        clamped as u32
    }

    pub fn resolve(&self, requested_words: Option<i64>) -> LengthBounds {
        let words = requested_words
            .map(|w| self.clamp_words(w))
            .unwrap_or_else(|| self.clamp_words(i64::from(self.default_words)));

        let max_length = self.max_length_for(words);
        let min_length = (max_length / self.min_length_divisor).max(self.min_length_floor);

        LengthBounds {
            max_length,
            min_length,
        }
    }

    fn max_length_for(&self, words: u32) -> usize {
        (f64::from(words) * self.tokens_per_word) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LengthPolicy {
        LengthPolicy::default()
    }

    #[test]
    fn default_budget_maps_to_104_tokens() {
        // 80 words * 1.3 = 104, 104 / 4 = 26
        assert_eq!(
            policy().resolve(None),
            LengthBounds {
                max_length: 104,
                min_length: 26
            }
        );
    }

    #[test]
    fn absent_budget_equals_explicit_default() {
        let p = policy();
        assert_eq!(p.resolve(None), p.resolve(Some(i64::from(p.default_words))));
    }

    #[test]
    fn oversized_budget_is_clamped_to_max() {
        let p = policy();
        assert_eq!(p.resolve(Some(9999)), p.resolve(Some(200)));
        assert_eq!(p.resolve(Some(200)).max_length, 260);
        assert_eq!(p.resolve(Some(200)).min_length, 65);
    }

    #[test]
    fn undersized_budget_is_clamped_to_min() {
        let p = policy();
        assert_eq!(p.resolve(Some(1)), p.resolve(Some(30)));
        // 30 * 1.3 = 39, 39 / 4 = 9 -> floored to 10
        assert_eq!(
            p.resolve(Some(30)),
            LengthBounds {
                max_length: 39,
                min_length: 10
            }
        );
    }

    #[test]
    fn negative_and_extreme_budgets_are_clamped() {
        let p = policy();
        assert_eq!(p.resolve(Some(-5)), p.resolve(Some(30)));
        assert_eq!(p.resolve(Some(0)), p.resolve(Some(30)));
        assert_eq!(p.resolve(Some(i64::MIN)), p.resolve(Some(30)));
        assert_eq!(p.resolve(Some(i64::MAX)), p.resolve(Some(200)));
    }

    #[test]
    fn bounds_are_ordered_and_floored_for_every_budget() {
        let p = policy();
        for w in -50..=400 {
            let b = p.resolve(Some(w));
            assert!(b.min_length >= 10, "w={w}: {b:?}");
            assert!(b.max_length >= b.min_length, "w={w}: {b:?}");
        }
    }

    #[test]
    fn clamping_is_idempotent() {
        let p = policy();
        for w in [-1_000, 1, 29, 30, 31, 80, 199, 200, 201, 9_999] {
            let clamped = i64::from(p.clamp_words(w));
            assert_eq!(p.resolve(Some(clamped)), p.resolve(Some(w)));
        }
    }

    #[test]
    fn default_policy_is_valid() {
        assert!(policy().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unreachable_floor() {
        let p = LengthPolicy {
            min_length_floor: 40,
            ..policy()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_factor() {
        let p = LengthPolicy {
            tokens_per_word: 0.0,
            ..policy()
        };
        assert!(p.validate().is_err());
        let p = LengthPolicy {
            tokens_per_word: f64::NAN,
            ..policy()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn custom_factors_follow_configuration() {
        let p = LengthPolicy {
            tokens_per_word: 2.0,
            min_length_divisor: 2,
            ..policy()
        };
        assert_eq!(
            p.resolve(Some(100)),
            LengthBounds {
                max_length: 200,
                min_length: 100
            }
        );
    }
}
