pub mod field;
pub mod linking;
pub mod record;
pub mod formatter;
pub mod sink;
pub mod layer;

pub mod env;
pub mod init;
pub mod noop_sink;
