//! # Vefr — Scene Export and Avatar Retargeting
//!
//! An entity hierarchy, a component registry and the glTF plumbing around
//! them: scenes export to a single glTF document with each component carried
//! as a node extension, and imported skeletons are mapped onto a canonical
//! humanoid bone set.
//!
//! Start with `use vefr::prelude::*`.

pub mod avatar;
pub mod config;
pub mod ecs;
pub mod error;
pub mod gltf;
pub mod math;
pub mod prelude;
pub mod registry;
pub mod scene;

pub use error::{Error, Result};
