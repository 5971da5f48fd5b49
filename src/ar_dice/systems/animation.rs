//! Roll animation playback

use bevy::prelude::*;

use crate::ar_dice::types::RollAnimation;

/// Apply the rotation each in-flight roll contributes this frame.
pub fn animate_rolls(
    time: Res<Time>,
    mut commands: Commands,
    mut dice: Query<(Entity, &mut Transform, &mut RollAnimation)>,
) {
    let dt = time.delta_secs();

    for (entity, mut transform, mut animation) in dice.iter_mut() {
        let delta = animation.advance(dt);
        transform.rotation = (transform.rotation * delta).normalize();

        if animation.is_finished() {
            commands.entity(entity).remove::<RollAnimation>();
        }
    }
}
