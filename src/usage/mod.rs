pub mod pricing;
pub mod types;

pub use pricing::{estimate_cost, pricing_for_model, PricingEntry, FALLBACK_PRICING};
pub use types::{sum_tokens, TokenUsage};
