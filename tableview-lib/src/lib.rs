//! Table data pipeline
//!
//! Derives what a data table shows from a dataset and its column
//! declarations: row keys, multi-column sorting, filtering, pagination,
//! row selection and decorated columns, plus one aggregated change
//! notification per interaction.

pub mod change;
pub mod column;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod filter;
pub mod key;
pub mod model;
pub mod pagination;
pub mod selection;
pub mod sort;
pub mod transform;

mod view;

pub use view::*;
