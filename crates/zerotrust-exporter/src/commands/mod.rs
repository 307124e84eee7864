//! Command dispatch: bridges CLI args to collectors, the server, and config.

pub mod collect;
pub mod config_cmd;
pub mod serve;
