mod file;
mod in_memory;
mod log;

pub use file::FileLog;
pub use in_memory::InMemoryLog;
pub use log::Entry;
pub use log::Index;
pub use log::Log;
