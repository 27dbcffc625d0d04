//! In-memory [`GraphicsDevice`] used by the harness and the tests.

use std::collections::HashMap;

use super::device::*;
use crate::math::{Color, Matrix, Vec3};

const MAX_LIGHTS: usize = 8;
const MAX_TEXTURE_STAGES: usize = 4;

/// Tracks device state and counts submitted work without drawing
#[derive(Debug)]
pub struct HeadlessDevice {
    created: bool,
    in_scene: bool,

    world: Matrix,
    view: Matrix,
    projection: Matrix,
    // World * View * Projection, rebuilt on every transform change
    model_view_proj: Matrix,

    material: Material,
    lights: Vec<Light>,
    lights_enabled: Vec<bool>,

    next_texture_id: u32,
    textures: HashMap<u32, Texture>,
    stage_textures: Vec<Texture>,
    stage_enabled: Vec<bool>,
    stage_params: Vec<TextureStageParams>,
    texture_factor: Color,

    render_states: HashMap<RenderState, bool>,
    depth_func: CompFunc,
    depth_bias: f32,
    alpha_func: (CompFunc, f32),
    blend: (BlendFunc, BlendFunc),
    clear_color: Color,
    global_ambient: Color,
    fog: FogParams,
    cull_mode: CullMode,
    shade_model: ShadeModel,
    fill_mode: FillMode,

    /// Completed begin/end scene pairs
    pub frames: u64,
    pub clears: u64,
    pub primitives: u64,
    pub vertices: u64,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self {
            created: false,
            in_scene: false,
            world: Matrix::IDENTITY,
            view: Matrix::IDENTITY,
            projection: Matrix::IDENTITY,
            model_view_proj: Matrix::IDENTITY,
            material: Material::default(),
            lights: vec![Light::default(); MAX_LIGHTS],
            lights_enabled: vec![false; MAX_LIGHTS],
            next_texture_id: 1,
            textures: HashMap::new(),
            stage_textures: vec![Texture::default(); MAX_TEXTURE_STAGES],
            stage_enabled: vec![false; MAX_TEXTURE_STAGES],
            stage_params: vec![TextureStageParams::default(); MAX_TEXTURE_STAGES],
            texture_factor: Color::WHITE,
            render_states: RenderState::ALL.iter().map(|s| (*s, false)).collect(),
            depth_func: CompFunc::LessEqual,
            depth_bias: 0.0,
            alpha_func: (CompFunc::Always, 0.0),
            blend: (BlendFunc::One, BlendFunc::Zero),
            clear_color: Color::BLACK,
            global_ambient: Color::BLACK,
            fog: FogParams::default(),
            cull_mode: CullMode::Ccw,
            shade_model: ShadeModel::Smooth,
            fill_mode: FillMode::Polygon,
            frames: 0,
            clears: 0,
            primitives: 0,
            vertices: 0,
        }
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn rebuild_combined(&mut self) {
        self.model_view_proj = self.projection.multiply(&self.view).multiply(&self.world);
    }

    fn check_light(&self, index: usize) -> Result<(), DeviceError> {
        if index >= MAX_LIGHTS {
            return Err(DeviceError::OutOfRange { index, max: MAX_LIGHTS });
        }
        Ok(())
    }

    fn check_stage(&self, index: usize) -> Result<(), DeviceError> {
        if index >= MAX_TEXTURE_STAGES {
            return Err(DeviceError::OutOfRange { index, max: MAX_TEXTURE_STAGES });
        }
        Ok(())
    }

    fn count_primitive(&mut self, count: usize) {
        self.primitives += 1;
        self.vertices += count as u64;
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create(&mut self) -> Result<(), DeviceError> {
        if self.created {
            return Err(DeviceError::AlreadyCreated);
        }
        self.created = true;
        log::debug!("Headless device created");
        Ok(())
    }

    fn destroy(&mut self) {
        self.destroy_all_textures();
        self.created = false;
    }

    fn begin_scene(&mut self) {
        self.in_scene = true;
    }

    fn end_scene(&mut self) {
        if self.in_scene {
            self.frames += 1;
        }
        self.in_scene = false;
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn set_transform(&mut self, kind: TransformType, matrix: &Matrix) {
        match kind {
            TransformType::World => self.world = *matrix,
            TransformType::View => self.view = *matrix,
            TransformType::Projection => self.projection = *matrix,
        }
        self.rebuild_combined();
    }

    fn transform(&self, kind: TransformType) -> Matrix {
        match kind {
            TransformType::World => self.world,
            TransformType::View => self.view,
            TransformType::Projection => self.projection,
        }
    }

    fn multiply_transform(&mut self, kind: TransformType, matrix: &Matrix) {
        let current = self.transform(kind);
        self.set_transform(kind, &current.multiply(matrix));
    }

    fn set_material(&mut self, material: &Material) {
        self.material = *material;
    }

    fn material(&self) -> Material {
        self.material
    }

    fn max_light_count(&self) -> usize {
        MAX_LIGHTS
    }

    fn set_light(&mut self, index: usize, light: &Light) -> Result<(), DeviceError> {
        self.check_light(index)?;
        self.lights[index] = *light;
        Ok(())
    }

    fn light(&self, index: usize) -> Option<Light> {
        self.lights.get(index).copied()
    }

    fn set_light_enabled(&mut self, index: usize, enabled: bool) -> Result<(), DeviceError> {
        self.check_light(index)?;
        self.lights_enabled[index] = enabled;
        Ok(())
    }

    fn light_enabled(&self, index: usize) -> bool {
        self.lights_enabled.get(index).copied().unwrap_or(false)
    }

    fn create_texture(&mut self, data: &ImageData, params: &TextureCreateParams) -> Result<Texture, DeviceError> {
        let channels = match params.format {
            TexImgFormat::Rgb => 3,
            TexImgFormat::Rgba => 4,
        };
        let expected = data.width as usize * data.height as usize * channels;
        if data.width == 0 || data.height == 0 || data.pixels.len() != expected {
            return Err(DeviceError::InvalidImage(format!(
                "{}x{} with {} bytes, expected {}",
                data.width,
                data.height,
                data.pixels.len(),
                expected
            )));
        }
        let texture = Texture {
            id: self.next_texture_id,
            width: data.width,
            height: data.height,
            alpha: params.format == TexImgFormat::Rgba,
        };
        self.next_texture_id += 1;
        self.textures.insert(texture.id, texture);
        Ok(texture)
    }

    fn destroy_texture(&mut self, texture: &Texture) {
        if self.textures.remove(&texture.id).is_some() {
            for stage in self.stage_textures.iter_mut() {
                if stage.id == texture.id {
                    *stage = Texture::default();
                }
            }
        }
    }

    fn destroy_all_textures(&mut self) {
        self.textures.clear();
        for stage in self.stage_textures.iter_mut() {
            *stage = Texture::default();
        }
    }

    fn max_texture_count(&self) -> usize {
        MAX_TEXTURE_STAGES
    }

    fn set_texture(&mut self, index: usize, texture: &Texture) -> Result<(), DeviceError> {
        self.check_stage(index)?;
        self.stage_textures[index] = *texture;
        Ok(())
    }

    fn texture(&self, index: usize) -> Texture {
        self.stage_textures.get(index).copied().unwrap_or_default()
    }

    fn set_texture_enabled(&mut self, index: usize, enabled: bool) -> Result<(), DeviceError> {
        self.check_stage(index)?;
        self.stage_enabled[index] = enabled;
        Ok(())
    }

    fn texture_enabled(&self, index: usize) -> bool {
        self.stage_enabled.get(index).copied().unwrap_or(false)
    }

    fn set_texture_stage_params(&mut self, index: usize, params: &TextureStageParams) -> Result<(), DeviceError> {
        self.check_stage(index)?;
        self.stage_params[index] = *params;
        Ok(())
    }

    fn texture_stage_params(&self, index: usize) -> TextureStageParams {
        self.stage_params.get(index).copied().unwrap_or_default()
    }

    fn set_texture_stage_wrap(&mut self, index: usize, wrap_s: TexWrapMode, wrap_t: TexWrapMode) -> Result<(), DeviceError> {
        self.check_stage(index)?;
        self.stage_params[index].wrap_s = wrap_s;
        self.stage_params[index].wrap_t = wrap_t;
        Ok(())
    }

    fn set_texture_factor(&mut self, color: Color) {
        self.texture_factor = color;
    }

    fn texture_factor(&self) -> Color {
        self.texture_factor
    }

    fn draw_primitive(&mut self, _kind: PrimitiveType, vertices: &[Vertex]) {
        self.count_primitive(vertices.len());
    }

    fn draw_primitive_col(&mut self, _kind: PrimitiveType, vertices: &[VertexCol]) {
        self.count_primitive(vertices.len());
    }

    fn draw_primitive_tex2(&mut self, _kind: PrimitiveType, vertices: &[VertexTex2]) {
        self.count_primitive(vertices.len());
    }

    fn compute_sphere_visibility(&self, center: Vec3, radius: f32) -> u32 {
        let m = &self.model_view_proj;
        let row = |r: usize| [m.get(r, 0), m.get(r, 1), m.get(r, 2), m.get(r, 3)];
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let combine = |a: [f32; 4], b: [f32; 4], sign: f32| {
            [a[0] + sign * b[0], a[1] + sign * b[1], a[2] + sign * b[2], a[3] + sign * b[3]]
        };
        let planes = [
            (frustum::LEFT, combine(r3, r0, 1.0)),
            (frustum::RIGHT, combine(r3, r0, -1.0)),
            (frustum::BOTTOM, combine(r3, r1, 1.0)),
            (frustum::TOP, combine(r3, r1, -1.0)),
            (frustum::FRONT, combine(r3, r2, 1.0)),
            (frustum::BACK, combine(r3, r2, -1.0)),
        ];

        let mut result = 0;
        for (bit, p) in planes {
            let norm = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            if norm == 0.0 {
                result |= bit;
                continue;
            }
            let distance = (p[0] * center.x + p[1] * center.y + p[2] * center.z + p[3]) / norm;
            if distance > -radius {
                result |= bit;
            }
        }
        result
    }

    fn set_render_state(&mut self, state: RenderState, enabled: bool) {
        self.render_states.insert(state, enabled);
    }

    fn render_state(&self, state: RenderState) -> bool {
        self.render_states.get(&state).copied().unwrap_or(false)
    }

    fn set_depth_test_func(&mut self, func: CompFunc) {
        self.depth_func = func;
    }

    fn depth_test_func(&self) -> CompFunc {
        self.depth_func
    }

    fn set_depth_bias(&mut self, factor: f32) {
        self.depth_bias = factor;
    }

    fn depth_bias(&self) -> f32 {
        self.depth_bias
    }

    fn set_alpha_test_func(&mut self, func: CompFunc, ref_value: f32) {
        self.alpha_func = (func, ref_value);
    }

    fn alpha_test_func(&self) -> (CompFunc, f32) {
        self.alpha_func
    }

    fn set_blend_func(&mut self, src: BlendFunc, dst: BlendFunc) {
        self.blend = (src, dst);
    }

    fn blend_func(&self) -> (BlendFunc, BlendFunc) {
        self.blend
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn clear_color(&self) -> Color {
        self.clear_color
    }

    fn set_global_ambient(&mut self, color: Color) {
        self.global_ambient = color;
    }

    fn global_ambient(&self) -> Color {
        self.global_ambient
    }

    fn set_fog_params(&mut self, params: FogParams) {
        self.fog = params;
    }

    fn fog_params(&self) -> FogParams {
        self.fog
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
    }

    fn cull_mode(&self) -> CullMode {
        self.cull_mode
    }

    fn set_shade_model(&mut self, model: ShadeModel) {
        self.shade_model = model;
    }

    fn shade_model(&self) -> ShadeModel {
        self.shade_model
    }

    fn set_fill_mode(&mut self, mode: FillMode) {
        self.fill_mode = mode;
    }

    fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_device() -> HeadlessDevice {
        let mut device = HeadlessDevice::new();
        device.set_transform(
            TransformType::View,
            &Matrix::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)),
        );
        device.set_transform(
            TransformType::Projection,
            &Matrix::perspective(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0),
        );
        device
    }

    #[test]
    fn test_create_twice_fails() {
        let mut device = HeadlessDevice::new();
        assert!(device.create().is_ok());
        assert!(matches!(device.create(), Err(DeviceError::AlreadyCreated)));
        device.destroy();
        assert!(!device.is_created());
    }

    #[test]
    fn test_sphere_visibility() {
        let device = camera_device();
        assert_eq!(device.compute_sphere_visibility(Vec3::ZERO, 1.0), frustum::ALL);
        // Behind the camera
        assert_ne!(device.compute_sphere_visibility(Vec3::new(0.0, 0.0, 50.0), 1.0), frustum::ALL);
        // Far to the left
        let mask = device.compute_sphere_visibility(Vec3::new(-500.0, 0.0, 0.0), 1.0);
        assert_eq!(mask & frustum::LEFT, 0);
    }

    #[test]
    fn test_textures_and_stages() {
        let mut device = HeadlessDevice::new();
        let data = ImageData { width: 2, height: 2, pixels: vec![255; 16] };
        let tex = device.create_texture(&data, &TextureCreateParams::default()).unwrap();
        assert!(tex.is_valid());
        device.set_texture(0, &tex).unwrap();
        assert_eq!(device.texture(0), tex);
        assert!(device.set_texture(MAX_TEXTURE_STAGES, &tex).is_err());

        device.destroy_texture(&tex);
        assert_eq!(device.texture_count(), 0);
        assert!(!device.texture(0).is_valid());

        let bad = ImageData { width: 2, height: 2, pixels: vec![0; 3] };
        assert!(device.create_texture(&bad, &TextureCreateParams::default()).is_err());
    }

    #[test]
    fn test_draw_counters_and_states() {
        let mut device = HeadlessDevice::new();
        device.begin_scene();
        device.clear();
        device.draw_primitive(PrimitiveType::Triangles, &[Vertex::default(); 6]);
        device.draw_primitive_col(PrimitiveType::Lines, &[VertexCol::default(); 2]);
        device.end_scene();
        assert_eq!(device.frames, 1);
        assert_eq!(device.primitives, 2);
        assert_eq!(device.vertices, 8);

        device.set_render_state(RenderState::Fog, true);
        assert!(device.render_state(RenderState::Fog));
        assert!(!device.render_state(RenderState::Blending));
        device.set_blend_func(BlendFunc::SrcAlpha, BlendFunc::InvSrcAlpha);
        assert_eq!(device.blend_func(), (BlendFunc::SrcAlpha, BlendFunc::InvSrcAlpha));
    }
}
