//! Typed snapshots of registry entities.
//!
//! Entities are only ever built by decoding a response (see [`crate::decode`])
//! and are read through getters; nothing mutates them afterwards.

mod connection;
mod helm;
mod installation;
mod repository;
mod terraform;

pub use connection::{
    ChartEdge, ChartInstallationEdge, Connection, Edge, InstallationEdge, PageInfo,
    TerraformEdge, TerraformInstallationEdge, VersionEdge,
};
pub use helm::{Chart, ChartInstallation, Version};
pub use installation::Installation;
pub use repository::{Publisher, Repository, User};
pub use terraform::{Dependencies, Dependency, Terraform, TerraformInstallation, Wirings};
