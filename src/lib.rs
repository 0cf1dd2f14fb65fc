//! Per-document detection of reflected cross-site scripting.
//!
//! The filter compares content a document is about to execute or load
//! (inline scripts, event handlers, external script and object URLs,
//! `javascript:`/`data:` URLs, eval-style strings) against the parameters of
//! the request that produced the document. An approximate substring match
//! anchored where an injection has to sit marks the content as reflected,
//! and the policy layer reports and, outside report-only mode, denies it.
//!
//! Hosts construct one [`filter::XssFilter`] per document and call its
//! `permits_*` operations from their execution and load hooks.

pub mod config;
pub mod domains;
pub mod evaluator;
pub mod filter;
pub mod matcher;
pub mod normalize;
pub mod parameters;
pub mod report;
