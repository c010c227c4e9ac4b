mod diagnostics;
mod msg;
mod registry;
mod relay;

pub use diagnostics::{DiagnosticSink, ErrorRoom, LogDiagnostics};
pub use msg::{InboundMessage, OutboundMessage, Sender};
pub use registry::RoomRegistry;
pub use relay::RelayDispatcher;
