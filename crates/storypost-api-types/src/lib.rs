//! Wire types shared by the storypost clients.
//!
//! `graph` covers the Meta Graph API endpoints used for token exchange and
//! story publishing; `github` covers the repository contents API used to host
//! media publicly.

pub mod github;
pub mod graph;

pub use github::{ContentsEntry, PutContentsRequest, PutContentsResponse};
pub use graph::{
    ContainerStatusResponse, GraphErrorBody, GraphErrorEnvelope, IdResponse,
    TokenExchangeResponse,
};
