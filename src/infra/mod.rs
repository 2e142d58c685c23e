//! Collaborator implementations for native targets and tests.

pub mod network;
pub mod platform;
pub mod proxy;
pub mod resources;
pub mod script;
pub mod store;

pub use network::{ChannelNetwork, NullNetwork};
pub use platform::NativePlatform;
pub use proxy::NullProxy;
pub use resources::FsResources;
pub use script::NullScript;
pub use store::NullConfigStore;
