pub mod config_cmd;
pub mod replay;
pub mod strategies;
pub mod tracks;
