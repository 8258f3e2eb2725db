//! Image Embedding blocks — block facade and JSON-RPC host bridge.

pub mod blocks;
pub mod config;
pub mod info;
pub mod locale;
pub mod protocol;
pub mod transport;
pub mod types;

pub use blocks::{BlockValue, ExtensionBlocks};
pub use config::resolve_model_path;
pub use locale::{DefaultFormatter, LocaleFormatter, MessageFormatter};
pub use protocol::ProtocolHandler;
pub use transport::StdioTransport;
