/// Lazily opened duplex channels: directory lookup, transport, managers.
pub mod channel;
/// Request/response façade for the remote model process.
pub mod client;
/// Settings loading (defaults, file, environment).
pub mod config;
/// Registry plus output and publisher channels behind one subscription API.
pub mod dispatcher;
/// Logging setup (filters, console and file sinks).
pub mod logging;
/// Pub/Sub core: topics, envelopes, listeners, registry, legacy broadcast.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Channel state and the pluggable transport seams.
pub use channel::{
    ChannelConnector, ChannelOpener, ChannelSnapshot, ChannelState, DirectoryResolver,
    HttpDirectory, MemoryConnector, StaticDirectory, WebSocketConnector,
};
/// Façade client.
pub use client::ModelClient;
/// Settings.
pub use config::{DispatchSettings, Settings};
/// Dispatcher.
pub use dispatcher::Dispatcher;
/// Error handling.
pub use probus_error::{
    ChannelError, DecodeError, LookupError, ProbusResult, RequestError, StackError, StatusCode,
};
/// Pub/Sub API.
pub use pubsub::{
    Callback, Envelope, FanOutReport, Listener, Notification, Registration, SubscriptionRegistry,
    Topic, TopicNamespace,
};
