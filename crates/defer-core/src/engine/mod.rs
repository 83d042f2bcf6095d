//! Engine de construcción y su contexto.

pub mod builder;
pub mod config;
pub mod context;
pub mod core;
pub mod environment;
pub mod sequencer;

pub use self::builder::EngineBuilderInit;
pub use self::config::ConstructConfig;
pub use self::context::{BodyFrame, ConstructCtx, Phase};
pub use self::core::{construct, ConstructEngine};
pub use self::environment::{Environment, GlobalDecl};
pub use self::sequencer::{Sequencer, SequencerScope};
