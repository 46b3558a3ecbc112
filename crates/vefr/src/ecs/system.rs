//! Systems and the sequential schedule that drives them.
//!
//! A system is any `FnMut(&mut World)`. The [`Schedule`] runs them in the order
//! they were added, once per [`Schedule::run`] call. This is the explicit
//! scheduler loop the component reactors are driven by: nothing runs
//! implicitly when a component changes.

use super::world::World;

pub trait System {
    fn run(&mut self, world: &mut World);
}

impl<F: FnMut(&mut World)> System for F {
    fn run(&mut self, world: &mut World) {
        (self)(world);
    }
}

struct NamedSystem {
    name: String,
    system: Box<dyn System>,
}

/// An ordered list of systems.
pub struct Schedule {
    systems: Vec<NamedSystem>,
}

impl Schedule {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    pub fn add_system<S: System + 'static>(&mut self, system: S) -> &mut Self {
        self.systems.push(NamedSystem {
            name: short_system_name(std::any::type_name::<S>()),
            system: Box::new(system),
        });
        self
    }

    /// Run every system once, in insertion order.
    pub fn run(&mut self, world: &mut World) {
        for ns in &mut self.systems {
            log::trace!("running system {}", ns.name);
            ns.system.run(world);
        }
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Names of the scheduled systems, in run order.
    pub fn system_names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|s| s.name.as_str())
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

/// `vefr::scene::media::sync_media_settings` → `sync_media_settings`,
/// closures → `<closure>`.
fn short_system_name(full: &str) -> String {
    let name = full.rsplit("::").next().unwrap_or(full);
    if name.contains("closure") {
        "<closure>".to_string()
    } else {
        name.to_string()
    }
}
