/// Mark inserted into the timeline when the instrumentation starts.
pub const TRACING_INIT_MARK: &str = "sentry-tracing-init";

pub const ENTRY_TYPE_NAVIGATION: &str = "navigation";
pub const ENTRY_TYPE_MARK: &str = "mark";
pub const ENTRY_TYPE_PAINT: &str = "paint";
pub const ENTRY_TYPE_MEASURE: &str = "measure";
pub const ENTRY_TYPE_RESOURCE: &str = "resource";
pub const ENTRY_TYPE_LARGEST_CONTENTFUL_PAINT: &str = "largest-contentful-paint";
pub const ENTRY_TYPE_FIRST_INPUT: &str = "first-input";

pub const FIRST_PAINT: &str = "first-paint";
pub const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";

pub const MEASUREMENT_FP: &str = "fp";
pub const MEASUREMENT_FCP: &str = "fcp";
pub const MEASUREMENT_LCP: &str = "lcp";
pub const MEASUREMENT_FID: &str = "fid";
pub const MEASUREMENT_MARK_FP: &str = "mark.fp";
pub const MEASUREMENT_MARK_FCP: &str = "mark.fcp";
pub const MEASUREMENT_MARK_LCP: &str = "mark.lcp";
pub const MEASUREMENT_MARK_FID: &str = "mark.fid";

/// Keys that later LCP candidates are allowed to overwrite.
pub const OVERWRITABLE_MEASUREMENTS: &[&str] = &[MEASUREMENT_LCP, MEASUREMENT_MARK_LCP];

/// Resources already traced by the XHR/fetch instrumentation.
pub const SKIPPED_INITIATOR_TYPES: &[&str] = &["xmlhttprequest", "fetch"];

pub const OP_BROWSER: &str = "browser";
pub const OP_RESOURCE: &str = "resource";
pub const OP_SCRIPT: &str = "script";

pub const EVALUATION_DESCRIPTION: &str = "evaluation";
pub const REQUEST_DESCRIPTION: &str = "request";
pub const RESPONSE_DESCRIPTION: &str = "response";

pub const DATA_TRANSFER_SIZE: &str = "Transfer Size";
pub const DATA_ENCODED_BODY_SIZE: &str = "Encoded Body Size";
pub const DATA_DECODED_BODY_SIZE: &str = "Decoded Body Size";
