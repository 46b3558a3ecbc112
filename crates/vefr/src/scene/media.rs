//! Scene media settings mirrored into the global [`MediaSettingsState`].
//!
//! Audio playback reads the global state; the scene's [`MediaSettings`]
//! component is only the authored source of it.

use crate::ecs::World;
use crate::scene::components::{DistanceModel, MediaSettings};
use crate::scene::reactor::{ComponentEvent, Lifecycle, drain_events, send_event};

/// Global audio defaults used by positional media.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSettingsState {
    pub immersive_media: bool,
    pub ref_distance: f32,
    pub rolloff_factor: f32,
    pub max_distance: f32,
    pub distance_model: DistanceModel,
    pub cone_inner_angle: f32,
    pub cone_outer_angle: f32,
    pub cone_outer_gain: f32,
}

impl Default for MediaSettingsState {
    fn default() -> Self {
        Self {
            immersive_media: false,
            ref_distance: 1.0,
            rolloff_factor: 1.0,
            max_distance: 10000.0,
            distance_model: DistanceModel::Linear,
            cone_inner_angle: 360.0,
            cone_outer_angle: 360.0,
            cone_outer_gain: 0.0,
        }
    }
}

impl From<&MediaSettings> for MediaSettingsState {
    fn from(s: &MediaSettings) -> Self {
        Self {
            immersive_media: s.immersive_media,
            ref_distance: s.ref_distance,
            rolloff_factor: s.rolloff_factor,
            max_distance: s.max_distance,
            distance_model: s.distance_model,
            cone_inner_angle: s.cone_inner_angle,
            cone_outer_angle: s.cone_outer_angle,
            cone_outer_gain: s.cone_outer_gain,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEffect {
    /// Audio sources must switch between spatial and immersive playback.
    ImmersiveMediaChanged(bool),
}

/// Fold one lifecycle event into the global state.
///
/// Unmounting leaves the last applied settings in place.
pub fn reduce(
    state: MediaSettingsState,
    event: &Lifecycle<MediaSettings>,
) -> (MediaSettingsState, Vec<MediaEffect>) {
    match event {
        Lifecycle::Mount(settings) | Lifecycle::Update(settings) => {
            let next = MediaSettingsState::from(settings);
            let mut effects = Vec::new();
            if next.immersive_media != state.immersive_media {
                effects.push(MediaEffect::ImmersiveMediaChanged(next.immersive_media));
            }
            (next, effects)
        }
        Lifecycle::Unmount => (state, Vec::new()),
    }
}

/// Drain media settings events into [`MediaSettingsState`] and queue the
/// resulting [`MediaEffect`]s. The effects stay readable until the next
/// [`scene_schedule`](crate::scene::scene_schedule) run clears them.
pub fn media_settings_system(world: &mut World) {
    let events = drain_events::<ComponentEvent<MediaSettings>>(world);
    if events.is_empty() {
        return;
    }
    let mut state = world
        .resource_remove::<MediaSettingsState>()
        .unwrap_or_default();
    for event in &events {
        let (next, effects) = reduce(state, &event.lifecycle);
        state = next;
        for effect in effects {
            log::debug!("media settings from {}: {:?}", event.entity, effect);
            send_event(world, effect);
        }
    }
    world.insert_resource(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Schedule;
    use crate::scene::reactor::{Events, set_component};

    #[test]
    fn state_defaults_differ_from_component_defaults() {
        let state = MediaSettingsState::default();
        assert_eq!(state.ref_distance, 1.0);
        assert_eq!(state.cone_outer_angle, 360.0);
        assert_ne!(state, MediaSettingsState::from(&MediaSettings::default()));
    }

    #[test]
    fn reduce_mirrors_component_values() {
        let settings = MediaSettings {
            ref_distance: 2.0,
            distance_model: DistanceModel::Exponential,
            cone_outer_angle: 9.0,
            ..Default::default()
        };
        let (state, effects) = reduce(MediaSettingsState::default(), &Lifecycle::Mount(settings));
        assert_eq!(state.ref_distance, 2.0);
        assert_eq!(state.distance_model, DistanceModel::Exponential);
        assert_eq!(state.cone_outer_angle, 9.0);
        assert!(effects.is_empty());
    }

    #[test]
    fn toggling_immersive_media_emits_effect() {
        let settings = MediaSettings {
            immersive_media: true,
            ..Default::default()
        };
        let (state, effects) = reduce(MediaSettingsState::default(), &Lifecycle::Update(settings));
        assert!(state.immersive_media);
        assert_eq!(effects, vec![MediaEffect::ImmersiveMediaChanged(true)]);

        let (after, effects) = reduce(state.clone(), &Lifecycle::Unmount);
        assert_eq!(after, state);
        assert!(effects.is_empty());
    }

    #[test]
    fn system_updates_global_state() {
        let mut world = World::new();
        let scene = world.spawn_empty();
        let mut schedule = Schedule::new();
        schedule.add_system(media_settings_system);

        set_component(
            &mut world,
            scene,
            MediaSettings {
                rolloff_factor: 3.0,
                immersive_media: true,
                ..Default::default()
            },
        );
        schedule.run(&mut world);

        let state = world.resource::<MediaSettingsState>();
        assert_eq!(state.rolloff_factor, 3.0);
        assert_eq!(state.ref_distance, 20.0);
        assert_eq!(world.resource::<Events<MediaEffect>>().len(), 1);
    }
}
