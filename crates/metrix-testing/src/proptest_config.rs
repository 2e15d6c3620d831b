//! Shared proptest configuration for consistent test behavior across crates.
//!
//! ```rust,ignore
//! use metrix_testing::proptest_config;
//!
//! proptest! {
//!     #![proptest_config(proptest_config::auto_config())]
//!
//!     #[test]
//!     fn my_property(x in 0..100i32) {
//!         // ...
//!     }
//! }
//! ```
//!
//! Set `PROPTEST_CASES` to control thoroughness (64 for PR checks, 5000 nightly).

use proptest::prelude::*;

/// Fast config for quick feedback in PR checks
pub fn ci_config() -> ProptestConfig {
    ProptestConfig {
        cases: 64,
        max_shrink_iters: 100,
        ..ProptestConfig::default()
    }
}

/// Config driven by `PROPTEST_CASES` (default 256)
pub fn auto_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(256);

    ProptestConfig {
        cases,
        ..ProptestConfig::default()
    }
}
