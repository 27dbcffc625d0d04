//! Device-facing types and the [`GraphicsDevice`] trait.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{Color, Matrix, Point, Vec3};

/// Transform slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformType {
    World,
    View,
    Projection,
}

/// Boolean render states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderState {
    Lighting,
    Blending,
    Fog,
    DepthTest,
    DepthWrite,
    AlphaTest,
    Culling,
}

impl RenderState {
    pub const ALL: [RenderState; 7] = [
        RenderState::Lighting,
        RenderState::Blending,
        RenderState::Fog,
        RenderState::DepthTest,
        RenderState::DepthWrite,
        RenderState::AlphaTest,
        RenderState::Culling,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompFunc {
    Never,
    Less,
    Equal,
    NotEqual,
    LessEqual,
    Greater,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendFunc {
    Zero,
    One,
    SrcColor,
    InvSrcColor,
    DstColor,
    InvDstColor,
    SrcAlpha,
    InvSrcAlpha,
    DstAlpha,
    InvDstAlpha,
    SrcAlphaSaturate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FogMode {
    Linear,
    Exp,
    Exp2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CullMode {
    Cw,
    Ccw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShadeModel {
    Flat,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillMode {
    Point,
    Lines,
    Polygon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

/// Frustum plane bits returned by [`GraphicsDevice::compute_sphere_visibility`]
pub mod frustum {
    pub const LEFT: u32 = 0x01;
    pub const RIGHT: u32 = 0x02;
    pub const TOP: u32 = 0x04;
    pub const BOTTOM: u32 = 0x08;
    pub const FRONT: u32 = 0x10;
    pub const BACK: u32 = 0x20;
    pub const ALL: u32 = LEFT | RIGHT | TOP | BOTTOM | FRONT | BACK;
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Material {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightType {
    Point,
    Spot,
    Directional,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub light_type: LightType,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub position: Vec3,
    pub direction: Vec3,
    /// Constant, linear, quadratic attenuation
    pub attenuation: (f32, f32, f32),
    pub spot_angle: f32,
    pub spot_intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            ambient: Color::BLACK,
            diffuse: Color::WHITE,
            specular: Color::WHITE,
            position: Vec3::ZERO,
            direction: Vec3::new(0.0, 0.0, 1.0),
            attenuation: (1.0, 0.0, 0.0),
            spot_angle: std::f32::consts::FRAC_PI_2,
            spot_intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexImgFormat {
    Rgb,
    Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexFilter {
    Nearest,
    Bilinear,
    Trilinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexWrapMode {
    Clamp,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexMixOperation {
    Default,
    Replace,
    Modulate,
    Add,
    Subtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexMixArgument {
    Texture,
    ComputedColor,
    Src,
    Factor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureCreateParams {
    pub format: TexImgFormat,
    pub mipmap: bool,
    pub filter: TexFilter,
}

impl Default for TextureCreateParams {
    fn default() -> Self {
        Self {
            format: TexImgFormat::Rgba,
            mipmap: false,
            filter: TexFilter::Nearest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureStageParams {
    pub color_operation: TexMixOperation,
    pub color_arg1: TexMixArgument,
    pub color_arg2: TexMixArgument,
    pub alpha_operation: TexMixOperation,
    pub alpha_arg1: TexMixArgument,
    pub alpha_arg2: TexMixArgument,
    pub wrap_s: TexWrapMode,
    pub wrap_t: TexWrapMode,
}

impl Default for TextureStageParams {
    fn default() -> Self {
        Self {
            color_operation: TexMixOperation::Default,
            color_arg1: TexMixArgument::Texture,
            color_arg2: TexMixArgument::ComputedColor,
            alpha_operation: TexMixOperation::Default,
            alpha_arg1: TexMixArgument::Texture,
            alpha_arg2: TexMixArgument::ComputedColor,
            wrap_s: TexWrapMode::Repeat,
            wrap_t: TexWrapMode::Repeat,
        }
    }
}

/// Raw pixel data handed to the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Handle to a device texture. `id == 0` is the invalid texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Texture {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub alpha: bool,
}

impl Texture {
    pub fn is_valid(&self) -> bool {
        self.id != 0
    }
}

/// Vertex with normal and one texture coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub coord: Vec3,
    pub normal: Vec3,
    pub tex_coord: Point,
}

/// Vertex with colours, no lighting
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexCol {
    pub coord: Vec3,
    pub color: Color,
    pub specular: Color,
}

/// Vertex with normal and two texture coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexTex2 {
    pub coord: Vec3,
    pub normal: Vec3,
    pub tex_coord: Point,
    pub tex_coord2: Point,
}

/// Fog configuration as one value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogParams {
    pub mode: FogMode,
    pub color: Color,
    pub start: f32,
    pub end: f32,
    pub density: f32,
}

impl Default for FogParams {
    fn default() -> Self {
        Self {
            mode: FogMode::Linear,
            color: Color::BLACK,
            start: 0.0,
            end: 1.0,
            density: 1.0,
        }
    }
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("device not created")]
    NotCreated,
    #[error("device already created")]
    AlreadyCreated,
    #[error("invalid image data: {0}")]
    InvalidImage(String),
    #[error("index {index} out of range (max {max})")]
    OutOfRange { index: usize, max: usize },
}

/// Everything the runtime needs from a rendering backend
pub trait GraphicsDevice {
    fn create(&mut self) -> Result<(), DeviceError>;
    fn destroy(&mut self);

    fn begin_scene(&mut self);
    fn end_scene(&mut self);
    fn clear(&mut self);

    fn set_transform(&mut self, kind: TransformType, matrix: &Matrix);
    fn transform(&self, kind: TransformType) -> Matrix;
    fn multiply_transform(&mut self, kind: TransformType, matrix: &Matrix);

    fn set_material(&mut self, material: &Material);
    fn material(&self) -> Material;

    fn max_light_count(&self) -> usize;
    fn set_light(&mut self, index: usize, light: &Light) -> Result<(), DeviceError>;
    fn light(&self, index: usize) -> Option<Light>;
    fn set_light_enabled(&mut self, index: usize, enabled: bool) -> Result<(), DeviceError>;
    fn light_enabled(&self, index: usize) -> bool;

    fn create_texture(&mut self, data: &ImageData, params: &TextureCreateParams) -> Result<Texture, DeviceError>;
    fn destroy_texture(&mut self, texture: &Texture);
    fn destroy_all_textures(&mut self);

    fn max_texture_count(&self) -> usize;
    fn set_texture(&mut self, index: usize, texture: &Texture) -> Result<(), DeviceError>;
    fn texture(&self, index: usize) -> Texture;
    fn set_texture_enabled(&mut self, index: usize, enabled: bool) -> Result<(), DeviceError>;
    fn texture_enabled(&self, index: usize) -> bool;
    fn set_texture_stage_params(&mut self, index: usize, params: &TextureStageParams) -> Result<(), DeviceError>;
    fn texture_stage_params(&self, index: usize) -> TextureStageParams;
    fn set_texture_stage_wrap(&mut self, index: usize, wrap_s: TexWrapMode, wrap_t: TexWrapMode) -> Result<(), DeviceError>;
    fn set_texture_factor(&mut self, color: Color);
    fn texture_factor(&self) -> Color;

    fn draw_primitive(&mut self, kind: PrimitiveType, vertices: &[Vertex]);
    fn draw_primitive_col(&mut self, kind: PrimitiveType, vertices: &[VertexCol]);
    fn draw_primitive_tex2(&mut self, kind: PrimitiveType, vertices: &[VertexTex2]);

    /// Bitmask of the [`frustum`] planes whose inner side the sphere reaches.
    /// [`frustum::ALL`] means the sphere is at least partly visible.
    fn compute_sphere_visibility(&self, center: Vec3, radius: f32) -> u32;

    fn set_render_state(&mut self, state: RenderState, enabled: bool);
    fn render_state(&self, state: RenderState) -> bool;

    fn set_depth_test_func(&mut self, func: CompFunc);
    fn depth_test_func(&self) -> CompFunc;
    fn set_depth_bias(&mut self, factor: f32);
    fn depth_bias(&self) -> f32;
    fn set_alpha_test_func(&mut self, func: CompFunc, ref_value: f32);
    fn alpha_test_func(&self) -> (CompFunc, f32);
    fn set_blend_func(&mut self, src: BlendFunc, dst: BlendFunc);
    fn blend_func(&self) -> (BlendFunc, BlendFunc);
    fn set_clear_color(&mut self, color: Color);
    fn clear_color(&self) -> Color;
    fn set_global_ambient(&mut self, color: Color);
    fn global_ambient(&self) -> Color;
    fn set_fog_params(&mut self, params: FogParams);
    fn fog_params(&self) -> FogParams;
    fn set_cull_mode(&mut self, mode: CullMode);
    fn cull_mode(&self) -> CullMode;
    fn set_shade_model(&mut self, model: ShadeModel);
    fn shade_model(&self) -> ShadeModel;
    fn set_fill_mode(&mut self, mode: FillMode);
    fn fill_mode(&self) -> FillMode;
}
