//! Event subscribers: the [`Subscribe`] trait and the built-in
//! tracing-backed [`LogWriter`].

mod log;
mod subscribe;

pub use log::LogWriter;
pub use subscribe::Subscribe;
