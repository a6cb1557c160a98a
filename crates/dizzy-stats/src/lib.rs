//! Statistical utilities shared by the dizzy crates.
//!
//! - [`descriptive`]: summary measures of a dataset (min, max, mean, median, variance)
//!
//! # Examples
//!
//! ```
//! use dizzy_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.variance, 2.0);
//! ```

pub mod descriptive;
