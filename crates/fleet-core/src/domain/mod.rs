//! Domain records shared across crates

pub mod device;
pub mod events;
pub mod group;

pub use device::{Device, DeviceReference, NetworkInfo, DEVICE_ID_ATTRIBUTE};
pub use events::DeviceEvent;
pub use group::{Group, GroupKind, GroupType};
