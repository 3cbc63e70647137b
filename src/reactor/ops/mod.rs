//! The three concrete operation strategies.

pub mod acceptor;
pub mod reader;
pub mod writer;

pub use acceptor::Acceptor;
pub use reader::Reader;
pub use writer::Writer;
