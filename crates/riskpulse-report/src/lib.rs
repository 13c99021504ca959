//! Static HTML rendering of scored files and repeat-critical alerts.

pub mod html;
