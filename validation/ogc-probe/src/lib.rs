//! Command-line probe for WMS/WFS servers.
//!
//! Exercises the service layer against a live server and renders what it
//! finds as console tables or JSON.

pub mod report;

pub use report::Report;
