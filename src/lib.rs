mod action_executor;
pub mod actions;
pub mod clock;
pub mod config;
pub mod error;
mod event_emitter;
pub mod gossip;
mod metrics;
pub mod node;
pub mod proto;
pub mod rpc_client;
pub mod web;

pub use self::action_executor::ActionExecutor;
pub use self::clock::Clock;
pub use self::config::Config;
pub use self::error::MembershipError;
