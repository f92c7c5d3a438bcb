pub mod http;
pub mod storage;
pub mod terminal;

pub use http::HttpGateway;
pub use storage::{FileStore, MemoryStore};
pub use terminal::{DirectorySink, Osc52Clipboard, TerminalUi};
