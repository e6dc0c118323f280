//! Development server for quire sites.
//!
//! Serves the build output, watches the source tree, rebuilds on change and
//! optionally pushes reloads to connected browsers over a WebSocket.

pub mod livereload;
pub mod server;
pub mod watcher;

pub use livereload::{LiveReloadHub, ReloadMessage};
pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
