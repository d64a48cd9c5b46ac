pub mod task;
pub mod user;

pub use task::{Task, TaskFilter, TaskInput, TaskStatus, TaskUpdate};
pub use user::{Role, User, UserInput};
