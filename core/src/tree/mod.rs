#![deny(missing_docs)]

//! # Route Tree
//!
//! Typed entities built from the fully expanded YAML mapping. Each
//! constructor takes ownership of its raw mapping, consumes the fields its
//! allow-list names and hands whatever remains to the next stage: child
//! routes and options for routes, the trace log for leaf entities.

mod document;
mod entities;
mod fields;
mod route;

pub use document::{Document, RouteVisit, MODEL_VERSION};
pub use entities::{Example, Parameter, Request, Response, ResponseCodeEntry, Test};
pub use fields::Scope;
pub use route::{Route, RoutePath};
