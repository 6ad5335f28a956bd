//! BuildLens Stream - incremental list loading
//!
//! The synchronous half ([`IncrementalResultStream`], [`IndicatorsSidecar`],
//! [`ListEngine`]) owns all state and emits commands. The async half
//! ([`EngineDriver`]) turns commands into tokio tasks against a
//! [`BuildSource`] and hands completions back.

pub mod command;
pub mod driver;
pub mod engine;
pub mod sidecar;
pub mod source;
pub mod stream;
pub mod view;

pub use command::Command;
pub use driver::{EngineDriver, EngineEvent};
pub use engine::{EngineCommand, EngineConfig, ListEngine};
pub use sidecar::{IndicatorTicket, IndicatorsSidecar, IndicatorsStatus, SidecarCommand, SidecarOutcome};
pub use source::{BuildSource, PageRequest};
pub use stream::{
    IncrementalResultStream, LastPage, PageOutcome, PageTicket, PaginationCursor, StreamCommand,
    StreamError, StreamStatus,
};
pub use view::{FilterChip, IndicatorsView, ListView};
