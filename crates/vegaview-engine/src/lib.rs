// Engine module - pure logic with no host or engine handles
// Everything here is deterministic given its inputs (the clock is injected)

pub mod datemath;
pub mod filters;
pub mod time_range;
pub mod url_gate;

pub use filters::{filters_match, index_titles_from_spec};
pub use time_range::{normalize_time_range, normalize_time_range_at};
pub use url_gate::{
    bypass_external_url_check, LoadOptions, ResourceLoader, SanitizedUri, StandardLoader,
    TrustedUrl, UriInput, UrlAccessGate,
};
