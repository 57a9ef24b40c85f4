//! promdist core: label keys, metric definitions and exposition formatting.
//!
//! Everything here is pure and store-agnostic. Writers use it to address
//! cells; scrapers use it to decode stored keys and render text.
//!
//! `unwrap`, `expect` and `panic!` are denied: a corrupt key or a bad
//! definition comes back as `PromDistError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod format;
pub mod labels;
pub mod metric;

pub use error::{PromDistError, Result};
pub use labels::{LabelKeyCodec, EMPTY_LABEL_KEY};
pub use metric::{Delivery, MetricDefinition, MetricKind, Suffix};
