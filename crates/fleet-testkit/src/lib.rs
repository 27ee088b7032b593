//! Fleet Testing Infrastructure
//!
//! Fixtures shared by the Fleet integration tests: a service wired to
//! in-memory handlers, a device builder and publisher doubles.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```rust,ignore
//! use fleet_testkit::*;
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let fleet = TestFleet::new();
//!     let device = fleet
//!         .seed(DeviceBuilder::new("acme", "vin-1").system_info(json!({"role": "sensor"})))
//!         .await;
//!     // ... test logic
//! }
//! ```

pub mod builders;
pub mod fixtures;
pub mod publishers;

pub use builders::DeviceBuilder;
pub use fixtures::{scope_for, TestFleet};
pub use publishers::{FailingPublisher, RecordingPublisher};
