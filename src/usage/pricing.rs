use super::types::TokenUsage;

/// Per-million-token USD rates for one model.
#[derive(Debug, Clone, Copy)]
pub struct PricingEntry {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Rates applied when a model identifier is not in the table.
pub const FALLBACK_PRICING: PricingEntry = PricingEntry {
    input_per_million: 3.0,
    output_per_million: 15.0,
};

/// Static pricing table, first match wins.
///
/// More specific identifiers are listed before their prefixes (`gpt-4o-mini`
/// before `gpt-4o`) so substring matching stays deterministic.
const PRICING_TABLE: &[(&str, PricingEntry)] = &[
    (
        "claude-opus-4-1",
        PricingEntry {
            input_per_million: 15.0,
            output_per_million: 75.0,
        },
    ),
    (
        "claude-opus-4-5",
        PricingEntry {
            input_per_million: 5.0,
            output_per_million: 25.0,
        },
    ),
    (
        "claude-sonnet-4-5",
        PricingEntry {
            input_per_million: 3.0,
            output_per_million: 15.0,
        },
    ),
    (
        "claude-sonnet-4",
        PricingEntry {
            input_per_million: 3.0,
            output_per_million: 15.0,
        },
    ),
    (
        "claude-haiku-4-5",
        PricingEntry {
            input_per_million: 1.0,
            output_per_million: 5.0,
        },
    ),
    (
        "claude-3-5-haiku",
        PricingEntry {
            input_per_million: 0.8,
            output_per_million: 4.0,
        },
    ),
    (
        "gpt-4o-mini",
        PricingEntry {
            input_per_million: 0.15,
            output_per_million: 0.6,
        },
    ),
    (
        "gpt-4o",
        PricingEntry {
            input_per_million: 2.5,
            output_per_million: 10.0,
        },
    ),
    (
        "gpt-4.1-mini",
        PricingEntry {
            input_per_million: 0.4,
            output_per_million: 1.6,
        },
    ),
    (
        "gpt-4.1",
        PricingEntry {
            input_per_million: 2.0,
            output_per_million: 8.0,
        },
    ),
    (
        "gpt-5-codex",
        PricingEntry {
            input_per_million: 1.25,
            output_per_million: 10.0,
        },
    ),
    (
        "gpt-5-mini",
        PricingEntry {
            input_per_million: 0.25,
            output_per_million: 2.0,
        },
    ),
    (
        "gpt-5",
        PricingEntry {
            input_per_million: 1.25,
            output_per_million: 10.0,
        },
    ),
    (
        "o3",
        PricingEntry {
            input_per_million: 2.0,
            output_per_million: 8.0,
        },
    ),
    (
        "gemini-2.5-pro",
        PricingEntry {
            input_per_million: 1.25,
            output_per_million: 10.0,
        },
    ),
    (
        "gemini-2.5-flash",
        PricingEntry {
            input_per_million: 0.3,
            output_per_million: 2.5,
        },
    ),
];

/// Look up the pricing entry for a model identifier.
///
/// Exact match first, then the first table key that is a prefix of the id or
/// contained in it (dated variants like `claude-sonnet-4-5-20250929` resolve
/// to their base entry). Unknown models get [`FALLBACK_PRICING`].
pub fn pricing_for_model(model: &str) -> PricingEntry {
    for (key, entry) in PRICING_TABLE {
        if *key == model {
            return *entry;
        }
    }
    for (key, entry) in PRICING_TABLE {
        if model.starts_with(key) || model.contains(key) {
            return *entry;
        }
    }
    FALLBACK_PRICING
}

/// Estimate the USD cost of a usage under a model's rates.
///
/// Only input and output tokens are priced. Reasoning and cache tokens are
/// tracked but charge nothing here; whichever bucket a source classified them
/// into is what gets billed.
pub fn estimate_cost(model: &str, usage: &TokenUsage) -> f64 {
    let entry = pricing_for_model(model);
    usage.input as f64 / 1e6 * entry.input_per_million
        + usage.output as f64 / 1e6 * entry.output_per_million
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpt_4o_exact_rates() {
        let usage = TokenUsage::from_buckets(1_000_000, 500_000, 0, 0, 0);
        let cost = estimate_cost("gpt-4o", &usage);
        // $2.50 input + $5.00 output
        assert!((cost - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model_uses_fallback_rates() {
        let usage = TokenUsage::from_buckets(1_000_000, 1_000_000, 0, 0, 0);
        let cost = estimate_cost("mystery-model-xyz", &usage);
        // $3 input + $15 output
        assert!((cost - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_dated_variant_resolves_to_base_entry() {
        let usage = TokenUsage::from_buckets(1_000_000, 0, 0, 0, 0);
        let cost = estimate_cost("claude-sonnet-4-5-20250929", &usage);
        assert!((cost - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_mini_variant_not_shadowed_by_prefix() {
        let usage = TokenUsage::from_buckets(1_000_000, 1_000_000, 0, 0, 0);
        let cost = estimate_cost("gpt-4o-mini", &usage);
        assert!((cost - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_cache_and_reasoning_tokens_are_free() {
        let with_cache = TokenUsage::from_buckets(1_000_000, 500_000, 100_000, 200_000, 300_000);
        let without = TokenUsage::from_buckets(1_000_000, 500_000, 0, 0, 0);
        assert!((estimate_cost("gpt-4o", &with_cache) - estimate_cost("gpt-4o", &without)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_usage_costs_nothing() {
        assert_eq!(estimate_cost("gpt-4o", &TokenUsage::default()), 0.0);
    }
}
