//! Meta Graph API client: token exchange and the story publishing flow
//! (create container, wait for processing, publish).

pub mod client;
pub mod container;
pub mod error;
pub mod publish;
pub mod status;
pub mod token;

pub use client::{GraphClient, StoryPublisher};
pub use container::{ContainerStyle, container_form};
pub use error::GraphError;
pub use status::{
    ContainerStatus, PollLimits, Readiness, StatusPolicy, StatusReport, StatusSource,
    UnknownStatus, wait_until_ready,
};
pub use token::TokenExchange;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";
