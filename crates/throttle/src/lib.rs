//! Bounded-concurrency task scheduling.
//!
//! [`throttle_all`] runs an ordered set of async tasks with at most `limit`
//! of them in flight, returns their values in input order and fails fast on
//! the first error. [`Throttle`] exposes the same scheduler with a
//! configurable [`FailurePolicy`].
//!
//! ```no_run
//! # async fn demo() -> Result<(), squash_throttle::ThrottleError<std::io::Error>> {
//! use squash_throttle::throttle_all;
//!
//! let tasks: Vec<_> = (0..10u32)
//!     .map(|i| move || async move { Ok::<_, std::io::Error>(i * 2) })
//!     .collect();
//! let doubled = throttle_all(3, tasks).await?;
//! assert_eq!(doubled[4], 8);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod limit;
pub mod policy;
pub mod runner;

pub use error::{InvalidArgument, ThrottleError};
pub use limit::Limit;
pub use policy::FailurePolicy;
pub use runner::{throttle_all, Throttle};
