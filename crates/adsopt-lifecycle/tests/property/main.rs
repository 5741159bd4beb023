//! Property tests for adsopt-lifecycle.

mod coverage_properties;
mod evaluation_properties;
