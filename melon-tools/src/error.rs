// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rpc error: {0}")]
    Rpc(#[from] alloy::transports::RpcError<alloy::transports::TransportErrorKind>),
    #[error("contract error: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("{0}")]
    Artifacts(#[from] crate::core::artifacts::ArtifactsError),
    #[error("{0}")]
    Deployer(#[from] crate::core::deployer::DeployerError),
    #[error("{0}")]
    Graph(#[from] crate::core::graph::GraphError),
    #[error("{0}")]
    Link(#[from] crate::core::link::LinkError),
    #[error("{0}")]
    Manifest(#[from] crate::core::manifest::ManifestError),
    #[error("{0}")]
    Resolve(#[from] crate::core::resolver::ResolveError),
    #[error("{0}")]
    Submit(#[from] crate::core::submit::SubmitError),
    #[error("{0}")]
    System(#[from] crate::ops::SystemError),
}
