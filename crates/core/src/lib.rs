//! Functional core for the itemrouter project.
//!
//! Everything here is pure: item and request types, the route table, the
//! repository trait the router talks to, and the mapping from failures to
//! HTTP status codes. The I/O lives in the `itemrouter` crate.

pub mod item;
pub mod request;
pub mod storage;
