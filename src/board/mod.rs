//! Project boards and the data hanging off them.
//!
//! - `partition` - pure split of a task list into the four status columns
//! - `sync` - `BoardSynchronizer`: load, mutate, and reload one project's tasks
//! - `comments` - `CommentThread`: the append-only discussion on one task
//! - `projects` - `ProjectDirectory`: listing and creating projects

pub mod comments;
pub mod partition;
pub mod projects;
pub mod sync;

pub use comments::CommentThread;
pub use partition::{BoardView, ColumnView, partition_by_status};
pub use projects::{NewProjectInput, ProjectDirectory};
pub use sync::{BoardEntry, BoardSynchronizer};
