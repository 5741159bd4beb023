//! Attribution bridge: reconciles independently reported spend figures for
//! one ASIN so gaps between sources are visible.

use serde::{Deserialize, Serialize};

/// Raw figures. Any of them may be negative or non-finite in bad reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributionInputs {
    pub reported_cost: f64,
    pub attributed_spend: f64,
    pub advertised_spend: f64,
    pub mapped_campaign_spend: f64,
    pub brand_attributed_spend: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributionBridge {
    pub reported_cost: f64,
    pub attributed_spend: f64,
    pub advertised_spend: f64,
    pub mapped_campaign_spend: f64,
    pub brand_attributed_spend: f64,
    /// Mapped campaign spend the attribution report could not place.
    pub sp_unattributed_spend_total: f64,
    pub gap_vs_attributed_total: f64,
    pub attributed_coverage_of_reported: Option<f64>,
    pub advertised_coverage_of_reported: Option<f64>,
    pub attributed_coverage_of_mapped_campaign: Option<f64>,
    pub brand_attributed_coverage_of_reported: Option<f64>,
}

/// Round to 6 decimal places.
pub fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

pub fn build_attribution_bridge(inputs: &AttributionInputs) -> AttributionBridge {
    let reported = non_negative(inputs.reported_cost);
    let attributed = non_negative(inputs.attributed_spend);
    let advertised = non_negative(inputs.advertised_spend);
    let mapped = non_negative(inputs.mapped_campaign_spend);
    let brand = non_negative(inputs.brand_attributed_spend);

    AttributionBridge {
        reported_cost: reported,
        attributed_spend: attributed,
        advertised_spend: advertised,
        mapped_campaign_spend: mapped,
        brand_attributed_spend: brand,
        sp_unattributed_spend_total: (mapped - attributed).max(0.0),
        gap_vs_attributed_total: (reported - attributed).max(0.0),
        attributed_coverage_of_reported: ratio(attributed, reported),
        advertised_coverage_of_reported: ratio(advertised, reported),
        attributed_coverage_of_mapped_campaign: ratio(attributed, mapped),
        brand_attributed_coverage_of_reported: ratio(brand, reported),
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(round6(numerator / denominator))
    } else {
        None
    }
}
