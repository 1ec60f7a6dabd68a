// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

pub mod artifacts;
pub mod deployer;
pub mod graph;
pub mod link;
pub mod manifest;
pub mod nonce;
pub mod resolver;
pub mod submit;
