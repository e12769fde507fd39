//! Library side of the `listsync` command: logging setup, the JSON file
//! store and the console notifier.

pub mod logging;
pub mod notify;
pub mod store;
