//! Visual script run control.
//!
//! The graph runner lives outside this crate; it consumes the
//! [`ScriptEffect`]s queued here. A disabled script is forced to `run = false`
//! and never plays.

use std::collections::HashMap;

use serde_json::{Value, json};

use crate::ecs::{Entity, World};
use crate::scene::components::VisualScript;
use crate::scene::reactor::{ComponentEvent, Lifecycle, drain_events, send_event};

/// What the runner last did for one script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptRunState {
    pub playing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptEffect {
    Play(Entity),
    Pause(Entity),
    /// The component must be rewritten with `run = false`.
    ForceStop(Entity),
    /// The component has no graph yet and gets the empty default.
    InstallDefaultGraph(Entity),
}

/// Per-entity run state, stored as a resource.
#[derive(Debug, Default)]
pub struct VisualScriptRunners(pub HashMap<Entity, ScriptRunState>);

/// The empty graph new scripts start from.
pub fn default_graph() -> Value {
    json!({ "nodes": [], "variables": [], "customEvents": [] })
}

pub fn reduce(
    state: Option<ScriptRunState>,
    entity: Entity,
    event: &Lifecycle<VisualScript>,
) -> (Option<ScriptRunState>, Vec<ScriptEffect>) {
    let was_playing = state.is_some_and(|s| s.playing);
    let mut effects = Vec::new();

    let script = match event {
        Lifecycle::Unmount => {
            if was_playing {
                effects.push(ScriptEffect::Pause(entity));
            }
            return (None, effects);
        }
        Lifecycle::Mount(script) => {
            if script.visual_script.is_none() {
                effects.push(ScriptEffect::InstallDefaultGraph(entity));
            }
            script
        }
        Lifecycle::Update(script) => script,
    };

    if script.disabled {
        if script.run {
            effects.push(ScriptEffect::ForceStop(entity));
        }
        if was_playing {
            effects.push(ScriptEffect::Pause(entity));
        }
        return (Some(ScriptRunState { playing: false }), effects);
    }

    if script.run != was_playing {
        effects.push(if script.run {
            ScriptEffect::Play(entity)
        } else {
            ScriptEffect::Pause(entity)
        });
    }
    (Some(ScriptRunState { playing: script.run }), effects)
}

/// Drain visual script events, apply the component rewrites directly and
/// queue play/pause effects for the runner. The runner reads them before the
/// next [`scene_schedule`](crate::scene::scene_schedule) run, which clears
/// them.
pub fn visual_script_system(world: &mut World) {
    let events = drain_events::<ComponentEvent<VisualScript>>(world);
    if events.is_empty() {
        return;
    }
    let mut runners = world
        .resource_remove::<VisualScriptRunners>()
        .unwrap_or_default();

    for event in events {
        let previous = runners.0.get(&event.entity).copied();
        let (next, effects) = reduce(previous, event.entity, &event.lifecycle);
        match next {
            Some(state) => runners.0.insert(event.entity, state),
            None => runners.0.remove(&event.entity),
        };

        for effect in effects {
            match effect {
                ScriptEffect::ForceStop(entity) => {
                    if let Some(script) = world.get_mut::<VisualScript>(entity) {
                        script.run = false;
                    }
                }
                ScriptEffect::InstallDefaultGraph(entity) => {
                    if let Some(script) = world.get_mut::<VisualScript>(entity) {
                        script.visual_script.get_or_insert_with(default_graph);
                    }
                }
                ScriptEffect::Play(_) | ScriptEffect::Pause(_) => {
                    log::debug!("visual script {:?}", effect);
                    send_event(world, effect);
                }
            }
        }
    }
    world.insert_resource(runners);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::reactor::{Events, remove_component, set_component};

    fn entity() -> Entity {
        let mut world = World::new();
        world.spawn_empty()
    }

    #[test]
    fn run_plays_and_clearing_run_pauses() {
        let e = entity();
        let running = VisualScript {
            run: true,
            visual_script: Some(default_graph()),
            ..Default::default()
        };
        let (state, effects) = reduce(None, e, &Lifecycle::Mount(running.clone()));
        assert_eq!(effects, vec![ScriptEffect::Play(e)]);

        let stopped = VisualScript {
            run: false,
            ..running
        };
        let (state, effects) = reduce(state, e, &Lifecycle::Update(stopped));
        assert_eq!(effects, vec![ScriptEffect::Pause(e)]);
        assert_eq!(state, Some(ScriptRunState { playing: false }));
    }

    #[test]
    fn disabled_forces_run_off() {
        let e = entity();
        let script = VisualScript {
            run: true,
            disabled: true,
            visual_script: Some(default_graph()),
            ..Default::default()
        };
        let (state, effects) = reduce(Some(ScriptRunState { playing: true }), e, &Lifecycle::Update(script));
        assert_eq!(effects, vec![ScriptEffect::ForceStop(e), ScriptEffect::Pause(e)]);
        assert_eq!(state, Some(ScriptRunState { playing: false }));
    }

    #[test]
    fn unchanged_run_flag_is_quiet() {
        let e = entity();
        let script = VisualScript {
            run: true,
            visual_script: Some(default_graph()),
            ..Default::default()
        };
        let (_, effects) = reduce(
            Some(ScriptRunState { playing: true }),
            e,
            &Lifecycle::Update(script),
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn system_rewrites_component_and_queues_effects() {
        let mut world = World::new();
        let e = world.spawn_empty();
        set_component(
            &mut world,
            e,
            VisualScript {
                run: true,
                ..Default::default()
            },
        );
        visual_script_system(&mut world);

        let script = world.get::<VisualScript>(e).unwrap();
        assert_eq!(script.visual_script, Some(default_graph()));
        assert_eq!(
            world.resource::<Events<ScriptEffect>>().iter().collect::<Vec<_>>(),
            vec![&ScriptEffect::Play(e)]
        );

        set_component(
            &mut world,
            e,
            VisualScript {
                run: true,
                disabled: true,
                ..Default::default()
            },
        );
        visual_script_system(&mut world);
        assert!(!world.get::<VisualScript>(e).unwrap().run);

        remove_component::<VisualScript>(&mut world, e);
        visual_script_system(&mut world);
        assert!(world.resource::<VisualScriptRunners>().0.is_empty());
    }
}
