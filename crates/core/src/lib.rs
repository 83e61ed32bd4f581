//! Core traits and types for driving an embedded simulation engine.
//!
//! This crate defines the seam between the co-simulation driver and the
//! engine it embeds:
//!
//! - [`Engine`]: a synchronous, non-reentrant simulation engine that can be
//!   stepped in time, queried for events, and read from or written to
//! - [`EngineLoader`]: creates one [`Engine`] per driver instance and owns the
//!   process-wide runtime the engine needs
//! - [`EventInfo`]: what the engine knows about upcoming discrete events
//! - [`EngineVariable`], [`Handle`], [`Lookup`]: identifiers for engine data
//!   and their resolution into concrete handles
//! - [`Unit`]: declared units and conversions between them

mod engine;
mod event;
mod message;
pub mod time;
mod unit;
mod variable;

pub use engine::{Engine, EngineLoader, EngineSetup};
pub use event::EventInfo;
pub use message::{EngineMessage, Severity};
pub use unit::{Unit, UnitError, UnitKind};
pub use variable::{EngineVariable, Handle, HandleInfo, Lookup, SurfaceQuantity, ZoneQuantity};
