pub mod apply;

pub use apply::{ApplyEdit, ApplyFilter, NewApply};
