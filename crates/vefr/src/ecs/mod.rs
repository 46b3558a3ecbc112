//! # Archetype ECS
//!
//! A small archetype-based entity component system holding the live scene
//! graph that the exporter walks and the retargeter rewrites.
//!
//! - [`entity`] — generational entity handles
//! - `component` — type-erased columnar storage
//! - `archetype` — entities grouped by component signature
//! - [`world`] — entities, components and resources
//! - `query` — closure-based iteration
//! - [`system`] — systems and the sequential schedule
//! - [`hierarchy`] — parent/child links and world transforms

pub(crate) mod archetype;
pub(crate) mod component;
pub mod entity;
pub mod hierarchy;
pub(crate) mod query;
pub mod system;
pub mod world;

pub use entity::Entity;
pub use hierarchy::{Children, GlobalTransform, Parent, propagate_transforms};
pub use system::{Schedule, System};
pub use world::{BoxedComponent, SpawnBundle, World};
