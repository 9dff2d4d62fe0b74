pub mod rendering;
pub mod scene;

pub use rendering::*;
pub use scene::*;

use bevy::prelude::*;

pub struct DemoScenePlugin;

impl Plugin for DemoScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_scene)
            .add_systems(Update, (orbit_camera, toggle_pause));
    }
}
