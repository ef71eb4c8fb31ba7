//! Client library for the NWDM water-quality geoserver.
//!
//! The NWDM publishes marine water-quality observations through a WFS
//! endpoint. This crate builds `GetFeature` query URLs, downloads the
//! CSV responses with basic authentication, and derives dissolved
//! inorganic nitrogen (DIN) from its three measured components.

pub mod client;
pub mod din;
pub mod error;
pub mod query;
pub mod record;
