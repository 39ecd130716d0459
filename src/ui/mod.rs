//! Interaction state for the task views, independent of any rendering layer.
//!
//! A view drives these models with user events (`begin_*`), sends the returned
//! request to the matching server action, and feeds the [`ActionResult`] back in
//! (`finish_*`).
//!
//! [`ActionResult`]: crate::actions::ActionResult

pub mod task_form;
pub mod task_item;
pub mod task_list;

pub use task_form::TaskForm;
pub use task_item::{ItemPhase, ItemRequest, TaskItem};
pub use task_list::TaskList;
