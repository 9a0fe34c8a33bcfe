#![doc = "article-forge-core: core logic library for article-forge."]

//! Turns a long generated article into a publishable document: display
//! segmentation, image placeholder planning, concurrent asset generation, assembly
//! and publish gating. Transport code lives in the `article-forge` crate.
//!
//! # Usage
//! Build a [`workflow::Workflow`] from the collaborator implementations, or use the
//! lower-level modules directly.

pub mod assemble;
pub mod config;
pub mod contract;
pub mod error;
pub mod pipeline;
pub mod placeholder;
pub mod publish;
pub mod segment;
pub mod workflow;
