pub mod board;
pub mod config;
pub mod errors;
pub mod guard;
pub mod logging;
pub mod remote;
pub mod session;
pub mod ui;

pub use errors::{RemoteError, Result, TaskflowError};
pub use guard::{GuardedRoute, Navigation, Route, RouteGuard};
pub use session::{Session, SessionStore};
