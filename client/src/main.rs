mod config;
mod shaders;
mod world;

use bevy::{prelude::*, window::PresentMode};
use clap::Parser;
use config::{load_demo_config, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use world::{DemoScenePlugin, IcePlugin, IceSettings};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, help = "Path to the RON demo config")]
    config: Option<PathBuf>,

    #[arg(long, help = "Width and height of both capture targets")]
    texture_size: Option<u32>,

    #[arg(long, help = "Flow map texture, relative to the asset folder")]
    flow_map: Option<String>,

    #[arg(long, help = "Flow animation speed multiplier, e.g. 0.25 for a slower cycle")]
    flow_speed: Option<f32>,

    #[arg(long, help = "Start with the flow animation paused")]
    paused: bool,
}

fn main() {
    let args = Args::parse();

    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = match load_demo_config(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to read {}: {err}", config_path.display());
            std::process::exit(1);
        }
    };
    if let Some(size) = args.texture_size {
        config.ice.texture_width = Some(size);
        config.ice.texture_height = Some(size);
    }
    if args.flow_map.is_some() {
        config.ice.flow_map = args.flow_map;
    }
    if let Some(speed) = args.flow_speed {
        config.flow_speed = speed;
    }
    let settings = IceSettings {
        paused: args.paused,
        time_scale: config.flow_speed,
    };

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(AssetPlugin {
                file_path: "../data".to_string(),
                ..Default::default()
            })
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Icefloe".to_string(),
                    present_mode: PresentMode::AutoVsync,
                    ..default()
                }),
                ..default()
            }),
    );

    app.insert_resource(config)
        .insert_resource(settings)
        .add_plugins((IcePlugin, DemoScenePlugin))
        .run();
}
