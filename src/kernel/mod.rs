pub mod brain;
pub mod channel;
pub mod error;
pub mod event;
pub mod host;
pub mod module;
pub mod pool;
pub mod receptor;
pub mod runtime;
pub mod scheduler;
pub mod telemetry;
pub mod time;
pub mod variable;
