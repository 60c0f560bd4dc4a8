mod config;
mod launch;
mod opencode;
mod server;
mod sessions;
mod terminal;

pub use config::*;
pub use launch::*;
pub use opencode::*;
pub use server::*;
pub use sessions::*;
pub use terminal::*;

#[cfg(test)]
pub(crate) use sessions::fake;
