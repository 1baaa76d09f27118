//! The built-in validator battery.
//!
//! Each rule is a small struct plus an `Arc<dyn DataValidator>` convenience
//! constructor, so `check_output` call sites stay terse.

pub mod kind;
pub mod missing;
pub mod numeric;

pub use kind::output_kind;
pub use missing::{max_fraction_missing, missing_allowed};
pub use numeric::{mean_in_range, range};
