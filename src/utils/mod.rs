pub mod format;
pub mod logging;

pub use format::format_bytes;
pub use logging::{init_tracing, LogNotifier};
