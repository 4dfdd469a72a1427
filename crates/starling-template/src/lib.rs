//! # starling-template
//!
//! Template engine integration for starling. [`Templates`] loads Tera
//! templates from directories or strings, implements
//! [`starling_http::TemplateRenderer`], and builds
//! [`starling_http::TemplateResponse`]s bound to itself.

pub mod templates;

pub use templates::Templates;
