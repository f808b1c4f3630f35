pub mod config;
pub mod kernel;
pub mod modules;
pub mod receptors;
pub mod scene;

// Re-export specific items for convenient access
pub use kernel::brain::{ModularBrain, ModuleKey};
pub use kernel::channel::{Channel, ChannelRegistry, Subscription};
pub use kernel::module::{FrameContext, Module, ModuleState};
pub use kernel::runtime::Runtime;
pub use kernel::variable::InitVariable;
