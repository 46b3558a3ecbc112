//! Scene content: the built-in components and the systems that react to them.

pub mod components;
pub mod media;
pub mod reactor;
pub mod visual_script;

pub use components::{
    Bone, DistanceModel, GltfSource, Interactable, MediaSettings, Name, SceneSettings, SpawnPoint,
    VisualScript,
};
pub use media::{MediaEffect, MediaSettingsState, media_settings_system};
pub use reactor::{
    ComponentEvent, Events, Lifecycle, clear_events, drain_events, remove_component, set_component,
};
pub use visual_script::{ScriptEffect, visual_script_system};

use crate::ecs::{Schedule, World};

/// Drop the effects queued by the previous run. Effects are read by the
/// runner between runs, so each run starts with empty effect queues.
pub fn clear_scene_effects(world: &mut World) {
    clear_events::<MediaEffect>(world);
    clear_events::<ScriptEffect>(world);
}

/// Schedule running every scene reactor, in a fixed order, after clearing
/// the previous run's effects.
pub fn scene_schedule() -> Schedule {
    let mut schedule = Schedule::new();
    schedule
        .add_system(clear_scene_effects)
        .add_system(media_settings_system)
        .add_system(visual_script_system);
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_last_one_run() {
        let mut world = World::new();
        let scene = world.spawn_empty();
        let mut schedule = scene_schedule();

        set_component(
            &mut world,
            scene,
            MediaSettings {
                immersive_media: true,
                ..Default::default()
            },
        );
        set_component(&mut world, scene, VisualScript::default());
        schedule.run(&mut world);
        assert_eq!(world.resource::<Events<MediaEffect>>().len(), 1);
        let script_effects = world.resource::<Events<ScriptEffect>>().len();
        assert!(script_effects > 0);

        schedule.run(&mut world);
        assert!(world.resource::<Events<MediaEffect>>().is_empty());
        assert!(world.resource::<Events<ScriptEffect>>().is_empty());
    }
}
