//! Heading saccade detection for tracked animal trajectories.
//!
//! This library turns a noisy, per-frame heading signal into:
//! - a smoothed, revolution-aware trajectory from a constant-acceleration
//!   Kalman estimator
//! - a list of saccades (brief, rapid turns) with validated kinematics
//! - per-trial statistics over those saccades
//!
//! The segmentation pipeline consists of:
//! 1. Conditioning the unwrapped heading (median or zero-phase Butterworth)
//! 2. Differentiating to angular velocity
//! 3. Finding candidate windows (threshold runs or velocity peaks)
//! 4. Building saccades from the original heading and testing them against
//!    the pre-onset velocity noise
//! 5. Resolving overlapping saccades
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use heading_saccades::{bout::Trace, config::SegmenterConfig, segmenter::BoutSegmenter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let heading: Vec<f64> = vec![0.0; 600];
//! let trace = Trace::new(heading, 60.0)?;
//!
//! let segmenter = BoutSegmenter::new(SegmenterConfig::default())?;
//! let bout = segmenter.segment(&trace)?;
//!
//! for saccade in bout.saccades() {
//!     println!(
//!         "Saccade {}..{}: {:.1} deg/s",
//!         saccade.start_index,
//!         saccade.stop_index,
//!         saccade.peak_speed_deg()
//!     );
//! }
//! println!("Frequency: {:.2} Hz", bout.stats().saccade_frequency);
//! # Ok(())
//! # }
//! ```
//!
//! ## Tracking a Heading
//!
//! ```no_run
//! use heading_saccades::config::EstimatorConfig;
//! use heading_saccades::filters::kalman::AngleTracker;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tracker = AngleTracker::new(EstimatorConfig::with_framerate(60.0))?;
//!
//! for reading in [Some(3.1), Some(-3.1), None, Some(-3.0)] {
//!     tracker.store(reading)?;
//!     if let Some(heading) = tracker.predict() {
//!         println!("Predicted heading: {heading:.3} rad");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Filters
//!
//! ```no_run
//! use heading_saccades::filters::create_filter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let filter = create_filter("zerophase:0:10", 60.0)?;
//! let smoothed = filter.filter(&[0.0, 0.1, 0.3, 0.2, 0.4])?;
//! println!("{} smoothed {} samples", filter.name(), smoothed.len());
//! # Ok(())
//! # }
//! ```

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

/// Numeric and angle helpers
pub mod utils;

/// Signal conditioners and the state estimator
pub mod filters;

/// Peak detection with distance, prominence and width constraints
pub mod peaks;

/// Monotone cubic interpolation
pub mod interpolate;

/// Saccade value object and windowed queries
pub mod saccade;

/// Candidate detection and overlap resolution
pub mod segmenter;

/// Input traces, bouts and aggregate statistics
pub mod bout;

pub use error::{Error, Result};
