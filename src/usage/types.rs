use serde::Serialize;

/// Token usage buckets for a single session or message.
///
/// `total` is carried as its own field rather than recomputed on demand so
/// that partial usages reported by a source (which may already include a
/// total) can be combined pointwise without losing information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub reasoning: u64,
    pub cache_read: u64,
    pub cache_write: u64,
    pub total: u64,
}

impl TokenUsage {
    /// Build a usage whose `total` is the sum of the five buckets.
    pub fn from_buckets(
        input: u64,
        output: u64,
        reasoning: u64,
        cache_read: u64,
        cache_write: u64,
    ) -> Self {
        TokenUsage {
            input,
            output,
            reasoning,
            cache_read,
            cache_write,
            total: input + output + reasoning + cache_read + cache_write,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
            && self.input == 0
            && self.output == 0
            && self.reasoning == 0
            && self.cache_read == 0
            && self.cache_write == 0
    }

    /// Pointwise addition, including `total`.
    pub fn add(&self, other: &TokenUsage) -> TokenUsage {
        TokenUsage {
            input: self.input + other.input,
            output: self.output + other.output,
            reasoning: self.reasoning + other.reasoning,
            cache_read: self.cache_read + other.cache_read,
            cache_write: self.cache_write + other.cache_write,
            total: self.total + other.total,
        }
    }
}

/// Sum any number of usages pointwise across every field, including `total`.
///
/// Associative and commutative; zero operands yield the all-zero usage.
pub fn sum_tokens<'a, I>(usages: I) -> TokenUsage
where
    I: IntoIterator<Item = &'a TokenUsage>,
{
    usages
        .into_iter()
        .fold(TokenUsage::default(), |acc, u| acc.add(u))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(input: u64, output: u64) -> TokenUsage {
        TokenUsage::from_buckets(input, output, 0, 0, 0)
    }

    #[test]
    fn test_sum_empty_is_zero() {
        let summed = sum_tokens([]);
        assert_eq!(summed, TokenUsage::default());
    }

    #[test]
    fn test_sum_is_pointwise_including_total() {
        let a = TokenUsage::from_buckets(100, 50, 10, 5, 1);
        let b = TokenUsage::from_buckets(200, 25, 0, 15, 9);
        let summed = sum_tokens([&a, &b]);

        assert_eq!(summed.input, 300);
        assert_eq!(summed.output, 75);
        assert_eq!(summed.reasoning, 10);
        assert_eq!(summed.cache_read, 20);
        assert_eq!(summed.cache_write, 10);
        assert_eq!(summed.total, a.total + b.total);
        assert_eq!(
            summed.total,
            summed.input + summed.output + summed.reasoning + summed.cache_read + summed.cache_write
        );
    }

    #[test]
    fn test_sum_associative_commutative() {
        let a = usage(1, 2);
        let b = usage(30, 40);
        let c = usage(500, 600);

        let left = sum_tokens([&sum_tokens([&a, &b]), &c]);
        let right = sum_tokens([&a, &sum_tokens([&b, &c])]);
        let swapped = sum_tokens([&c, &a, &b]);

        assert_eq!(left, right);
        assert_eq!(left, swapped);
    }

    #[test]
    fn test_from_buckets_total_invariant() {
        let u = TokenUsage::from_buckets(1, 2, 3, 4, 5);
        assert_eq!(u.total, 15);
        assert!(!u.is_empty());
        assert!(TokenUsage::default().is_empty());
    }
}
