//! Render side of the frame gate: draws published snapshots on a device.

use std::f32::consts::FRAC_PI_4;

use super::device::{frustum, GraphicsDevice, PrimitiveType, TransformType, Vertex};
use crate::frame_gate::{FrameGate, RenderSnapshot};
use crate::math::{Matrix, Vec3};

const ASPECT: f32 = 4.0 / 3.0;
const NEAR: f32 = 1.0;
const FAR: f32 = 1000.0;
/// Bounding radius used for culling object markers
const OBJECT_RADIUS: f32 = 2.0;

/// Draws one snapshot. Returns the number of objects that passed culling.
pub fn draw_snapshot(device: &mut dyn GraphicsDevice, snapshot: &RenderSnapshot) -> usize {
    device.begin_scene();
    device.clear();
    device.set_transform(TransformType::Projection, &Matrix::perspective(FRAC_PI_4, ASPECT, NEAR, FAR));
    device.set_transform(
        TransformType::View,
        &Matrix::look_at(snapshot.camera_eye, snapshot.camera_target, Vec3::new(0.0, 1.0, 0.0)),
    );

    let mut drawn = 0;
    for pose in &snapshot.objects {
        device.set_transform(TransformType::World, &Matrix::IDENTITY);
        if device.compute_sphere_visibility(pose.position, OBJECT_RADIUS) != frustum::ALL {
            continue;
        }
        let world = Matrix::translation(pose.position)
            .multiply(&Matrix::rotation_y(pose.rotation.y))
            .multiply(&Matrix::scale(pose.scale));
        device.set_transform(TransformType::World, &world);
        let marker = [
            Vertex { coord: Vec3::new(-1.0, 0.0, 0.0), ..Default::default() },
            Vertex { coord: Vec3::new(1.0, 0.0, 0.0), ..Default::default() },
            Vertex { coord: Vec3::new(0.0, 2.0, 0.0), ..Default::default() },
        ];
        device.draw_primitive(PrimitiveType::Triangles, &marker);
        drawn += 1;
    }
    device.end_scene();
    drawn
}

/// Serves frame requests until the gate closes. Returns the number of
/// frames drawn.
pub fn run_render_loop(gate: &FrameGate, device: &mut dyn GraphicsDevice) -> u64 {
    let mut frames = 0;
    while let Some(snapshot) = gate.wait_for_frame() {
        draw_snapshot(device, &snapshot);
        gate.finish_frame(snapshot.frame);
        frames += 1;
    }
    log::debug!("Render loop stopped after {} frames", frames);
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_gate::ObjectPose;
    use crate::graphics::HeadlessDevice;
    use std::sync::Arc;

    fn pose(id: i32, position: Vec3) -> ObjectPose {
        ObjectPose {
            id,
            position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            highlighted: false,
        }
    }

    #[test]
    fn test_objects_behind_camera_are_culled() {
        let mut device = HeadlessDevice::new();
        let snapshot = RenderSnapshot {
            frame: 1,
            camera_eye: Vec3::new(0.0, 10.0, -50.0),
            camera_target: Vec3::ZERO,
            objects: vec![pose(1, Vec3::ZERO), pose(2, Vec3::new(0.0, 10.0, -200.0))],
        };
        assert_eq!(draw_snapshot(&mut device, &snapshot), 1);
        assert_eq!(device.frames, 1);
        assert_eq!(device.primitives, 1);
    }

    #[test]
    fn test_render_loop_drains_until_closed() {
        let gate = Arc::new(FrameGate::new());
        let render_gate = Arc::clone(&gate);
        let handle = std::thread::spawn(move || {
            let mut device = HeadlessDevice::new();
            run_render_loop(&render_gate, &mut device)
        });

        let frame = gate.request_frame(RenderSnapshot::default());
        gate.wait_finished(frame);
        assert_eq!(gate.last_rendered(), frame);
        gate.close();
        assert_eq!(handle.join().unwrap(), 1);
    }
}
