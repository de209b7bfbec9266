//! Directory access ports

pub mod ports;

pub use ports::{ConnectionError, ConnectionHandle, DirectoryConnection};
