//! State propagation engine for declarative in-app layouts.
//!
//! A decoded layout ([`model::ModelSpec`]) is activated into a [`Layout`]: a
//! tree of nodes wired to shared form and pager state. Inputs bubble their
//! data to the nearest form, forms trickle their status back down, pagers
//! drive enable rules, and reportable events end up at a
//! [`reporting::ReportingSink`].

pub mod config;
pub mod error;
pub mod event;
pub mod form;
pub mod layout;
pub mod logging;
pub mod model;
pub mod mvi;
pub mod reporting;
pub mod state;

pub use config::{ConfigError, EngineConfig};
pub use error::LayoutError;
pub use layout::{Dismissal, Environment, Layout};
