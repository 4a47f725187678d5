// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Cost ledger: per-call and cumulative token/dollar accounting with tiered
//! long-context pricing.
//!
//! Generalized from [`crate::agent::types::TurnStats`]'s per-turn token
//! fields into a standalone, longer-lived ledger, since tier selection
//! needs cumulative input across the whole session, not just one turn.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

/// Per-model pricing: base rates plus an optional long-context tier.
#[derive(Debug, Clone, Copy)]
pub struct PricingProfile {
    pub input_per_million: f64,
    pub output_per_million: f64,
    pub long_context_threshold: Option<u64>,
    pub long_context_input_per_million: Option<f64>,
    pub long_context_output_per_million: Option<f64>,
}

/// Model name this crate falls back to when the requested model has no
/// entry in [`PRICING_TABLE`].
pub const DEFAULT_PRICING_MODEL: &str = "gemini-2.5-pro";

/// Fixed pricing table keyed by model name, with a documented fallback to
/// [`DEFAULT_PRICING_MODEL`].
pub static PRICING_TABLE: Lazy<HashMap<&'static str, PricingProfile>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        "gemini-2.5-pro",
        PricingProfile {
            input_per_million: 1.25,
            output_per_million: 10.0,
            long_context_threshold: Some(200_000),
            long_context_input_per_million: Some(2.5),
            long_context_output_per_million: Some(15.0),
        },
    );
    table.insert(
        "claude-sonnet-4-20250514",
        PricingProfile {
            input_per_million: 3.0,
            output_per_million: 15.0,
            long_context_threshold: None,
            long_context_input_per_million: None,
            long_context_output_per_million: None,
        },
    );
    table.insert(
        "gpt-4o",
        PricingProfile {
            input_per_million: 2.5,
            output_per_million: 10.0,
            long_context_threshold: None,
            long_context_input_per_million: None,
            long_context_output_per_million: None,
        },
    );
    table
});

/// Resolve a [`PricingProfile`] for `model`, falling back to
/// [`DEFAULT_PRICING_MODEL`] when unknown.
pub fn pricing_for(model: &str) -> PricingProfile {
    *PRICING_TABLE
        .get(model)
        .unwrap_or_else(|| PRICING_TABLE.get(DEFAULT_PRICING_MODEL).unwrap())
}

/// A single recorded call.
#[derive(Debug, Clone)]
pub struct UsageEntry {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
}

/// Accumulates [`UsageEntry`] records for a session and prices each call
/// against the running cumulative input total.
pub struct CostLedger {
    model: String,
    profile: PricingProfile,
    cumulative_input: u64,
    entries: Vec<UsageEntry>,
}

impl CostLedger {
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        let profile = pricing_for(&model);
        Self {
            model,
            profile,
            cumulative_input: 0,
            entries: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Record a call's usage, pricing it against the tier implied by the
    /// running cumulative input *as of this call*: crossing the threshold
    /// once switches all subsequent calls to the long-context rate.
    pub fn record_usage(&mut self, input_tokens: u64, output_tokens: u64) -> UsageEntry {
        self.cumulative_input += input_tokens;

        let (input_rate, output_rate) = match (
            self.profile.long_context_threshold,
            self.profile.long_context_input_per_million,
            self.profile.long_context_output_per_million,
        ) {
            (Some(threshold), Some(in_rate), Some(out_rate))
                if self.cumulative_input > threshold =>
            {
                (in_rate, out_rate)
            }
            _ => (self.profile.input_per_million, self.profile.output_per_million),
        };

        let cost = (input_tokens as f64 / 1_000_000.0) * input_rate
            + (output_tokens as f64 / 1_000_000.0) * output_rate;

        let entry = UsageEntry {
            input_tokens,
            output_tokens,
            cost,
            timestamp: Utc::now(),
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn cumulative_input(&self) -> u64 {
        self.cumulative_input
    }

    pub fn total_input_tokens(&self) -> u64 {
        self.entries.iter().map(|e| e.input_tokens).sum()
    }

    pub fn total_output_tokens(&self) -> u64 {
        self.entries.iter().map(|e| e.output_tokens).sum()
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens() + self.total_output_tokens()
    }

    pub fn total_cost(&self) -> f64 {
        self.entries.iter().map(|e| e.cost).sum()
    }

    pub fn call_count(&self) -> usize {
        self.entries.len()
    }

    /// `"<tokenTotal> tokens | $<4dp>"`, with the token total locale-formatted
    /// using thousands separators.
    pub fn short_summary(&self) -> String {
        format!(
            "{} tokens | ${:.4}",
            format_with_commas(self.total_tokens()),
            self.total_cost()
        )
    }

    /// Multi-line report: call count, token breakdown, total cost, and the
    /// last five calls.
    pub fn detailed_report(&self) -> String {
        let mut lines = vec![
            format!("Model: {}", self.model),
            format!("Calls: {}", self.call_count()),
            format!("Input tokens:  {}", format_with_commas(self.total_input_tokens())),
            format!("Output tokens: {}", format_with_commas(self.total_output_tokens())),
            format!("Total tokens:  {}", format_with_commas(self.total_tokens())),
            format!("Total cost: ${:.4}", self.total_cost()),
            String::new(),
            "Last calls:".to_string(),
        ];
        for entry in self.entries.iter().rev().take(5) {
            lines.push(format!(
                "  {} in / {} out -> ${:.4} ({})",
                entry.input_tokens,
                entry.output_tokens,
                entry.cost,
                entry.timestamp.to_rfc3339()
            ));
        }
        lines.join("\n")
    }

    /// Clears all state, including the cumulative tier counter.
    pub fn reset(&mut self) {
        self.cumulative_input = 0;
        self.entries.clear();
    }
}

fn format_with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_profile() -> PricingProfile {
        PricingProfile {
            input_per_million: 1.25,
            output_per_million: 10.0,
            long_context_threshold: Some(200_000),
            long_context_input_per_million: Some(2.5),
            long_context_output_per_million: Some(15.0),
        }
    }

    #[test]
    fn crossing_long_context_threshold_switches_rate_for_next_call() {
        let mut ledger = CostLedger::new("gemini-2.5-pro");
        ledger.profile = test_profile();

        let first = ledger.record_usage(150_000, 1_000);
        let expected_first = 150_000.0 / 1e6 * 1.25 + 1_000.0 / 1e6 * 10.0;
        assert!((first.cost - expected_first).abs() < 1e-9);

        let second = ledger.record_usage(100_000, 1_000);
        let expected_second = 100_000.0 / 1e6 * 2.5 + 1_000.0 / 1e6 * 15.0;
        assert!((second.cost - expected_second).abs() < 1e-9);

        assert_eq!(ledger.cumulative_input(), 250_000);
    }

    #[test]
    fn cumulative_input_is_monotonic_and_cost_is_additive() {
        let mut ledger = CostLedger::new("gemini-2.5-pro");
        ledger.record_usage(10, 5);
        let after_one = ledger.cumulative_input();
        ledger.record_usage(20, 5);
        assert!(ledger.cumulative_input() >= after_one);
        let manual_total: f64 = vec![
            10.0 / 1e6 * ledger.profile.input_per_million + 5.0 / 1e6 * ledger.profile.output_per_million,
        ]
        .iter()
        .sum();
        assert!(ledger.total_cost() >= manual_total - 1e-9);
    }

    #[test]
    fn short_summary_has_tokens_and_dollar_sign() {
        let mut ledger = CostLedger::new("gemini-2.5-pro");
        ledger.record_usage(1_234_567, 1_000);
        let summary = ledger.short_summary();
        assert!(summary.contains("1,235,567"));
        assert!(summary.contains('$'));
    }

    #[test]
    fn unknown_model_falls_back_to_default() {
        let ledger = CostLedger::new("some-unknown-model");
        assert_eq!(ledger.profile.input_per_million, pricing_for(DEFAULT_PRICING_MODEL).input_per_million);
    }

    #[test]
    fn reset_clears_tier_counter() {
        let mut ledger = CostLedger::new("gemini-2.5-pro");
        ledger.record_usage(500_000, 0);
        assert!(ledger.cumulative_input() > 0);
        ledger.reset();
        assert_eq!(ledger.cumulative_input(), 0);
        assert_eq!(ledger.call_count(), 0);
    }
}
