//! Headless viewer demo
//!
//! Drives the engine the way a real host loop would: clock update, scene
//! tick, program bind and uniform upload every frame, with a mid-run hot
//! reload of the shader program. Runs against the software device, so it
//! works anywhere (including CI) without a GPU.

use std::f32::consts::TAU;
use std::path::Path;
use std::time::Duration;

use nalgebra::{Matrix4, Rotation3, Vector3, Vector4};

use glint_engine::prelude::*;

const FRAME_COUNT: u64 = 300;
const RELOAD_AT_FRAME: u64 = 150;

/// Spins the model about the Y axis.
struct Spinner {
    angle: f32,
    speed: f32,
}

impl Default for Spinner {
    fn default() -> Self {
        Self {
            angle: 0.0,
            speed: TAU / 8.0,
        }
    }
}

impl Behavior for Spinner {
    fn tick(&mut self, delta_time: f32) {
        self.angle = (self.angle + self.speed * delta_time) % TAU;
    }
}

impl Spinner {
    fn model_matrix(&self) -> Matrix4<f32> {
        Rotation3::from_euler_angles(0.0, self.angle, 0.0).to_homogeneous()
    }
}

/// Circles the camera around the origin at a fixed height.
struct OrbitCamera {
    angle: f32,
    radius: f32,
    height: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            angle: 0.0,
            radius: 5.0,
            height: 1.0,
        }
    }
}

impl Behavior for OrbitCamera {
    fn tick(&mut self, delta_time: f32) {
        self.angle = (self.angle + 0.5 * delta_time) % TAU;
    }
}

impl OrbitCamera {
    fn position(&self) -> Vector3<f32> {
        Vector3::new(
            self.radius * self.angle.cos(),
            self.height,
            self.radius * self.angle.sin(),
        )
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    glint_engine::foundation::logging::init();

    let base = Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = AppConfig::load_or_default(base.join("glint.toml"));
    log::info!("starting {} ({} frames)", config.title, FRAME_COUNT);

    let device = HeadlessDevice::new();
    let loader = FsLoader::with_root(base);

    let mut program = ShaderProgram::new(device.clone());
    program.compile_stage_auto(&loader, &config.shaders.vertex_path)?;
    program.compile_stage_auto(&loader, &config.shaders.fragment_path)?;
    program.link()?;
    program.validate()?;

    let mut scene = Scene::new();
    let model = scene.spawn();
    scene.entity_mut(model).unwrap().add_behavior::<Spinner>();
    let camera = scene.spawn();
    scene
        .entity_mut(camera)
        .unwrap()
        .add_behavior::<OrbitCamera>();

    let mut clock = Clock::new();
    let frame_budget = Duration::from_secs_f64(1.0 / config.target_fps);

    for frame in 1..=FRAME_COUNT {
        clock.update();
        scene.tick(clock.delta_time() as f32);

        if frame == RELOAD_AT_FRAME {
            match program.reload(&loader) {
                Ok(()) => log::info!("shader program reloaded at frame {frame}"),
                Err(err) => log::warn!("reload failed, keeping previous program: {err}"),
            }
        }

        program.bind()?;
        let model_matrix = scene
            .entity(model)
            .and_then(Entity::behavior::<Spinner>)
            .map_or_else(Matrix4::identity, Spinner::model_matrix);
        let camera_pos = scene
            .entity(camera)
            .and_then(Entity::behavior::<OrbitCamera>)
            .map_or_else(Vector3::zeros, OrbitCamera::position);

        program.set_uniform("viewProjection", Matrix4::<f32>::identity())?;
        program.set_uniform("model", model_matrix)?;
        program.set_uniform("cameraPos", camera_pos)?;
        program.set_uniform("baseColor", Vector4::new(0.8f32, 0.2, 0.1, 1.0))?;

        if frame % 60 == 0 {
            log::info!(
                "frame {frame}: dt={:.4}s avg_fps={:.1}",
                clock.delta_time(),
                clock.average_fps()
            );
        }

        std::thread::sleep(frame_budget);
    }

    log::info!(
        "done: {} frames in {:.2}s ({:.1} fps average), {} uniform uploads",
        clock.frame_count(),
        clock.current_time(),
        clock.average_fps(),
        device.uniform_upload_count()
    );
    Ok(())
}
