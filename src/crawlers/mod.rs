pub mod driver;
pub mod traversal;
pub mod web;


pub use driver::{NavigateOptions, Navigation, PageDriver, RenderedDocument, WaitCondition};
pub use traversal::{TerminationReason, TraversalController, TraversalReport};
