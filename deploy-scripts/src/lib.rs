//! Scripts for deploying the Boomerang contracts and verifying them on a
//! block explorer.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod calldata;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod deploy;
pub mod deployments;
pub mod errors;
pub mod plan;
pub mod types;
pub mod verify;

#[cfg(test)]
mod test_helpers;
