pub mod export;
pub mod render;
pub mod serve;
pub mod theme;
pub mod themes;
pub mod watch;
