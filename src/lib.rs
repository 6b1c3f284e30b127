//! Publish local images and videos as Instagram stories.
//!
//! Media is first committed to a GitHub repository, whose raw download URL
//! serves as the public location the Graph API fetches from. The story is then
//! created as a media container, awaited until processed, and published.

pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod github;
pub mod graph;
pub mod http;
pub mod pipeline;
pub mod telemetry;
pub mod util;
