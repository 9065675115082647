//! License identity and text classification.
//!
//! - [`spdx`]: bundled SPDX registry (id → canonical name, risk category)
//!   and normalization of common non-SPDX strings.
//! - [`classifier`]: content-based fallback that turns raw license text into
//!   a [`License`](crate::models::License) when a code host reports no id.

pub mod classifier;
pub mod spdx;
