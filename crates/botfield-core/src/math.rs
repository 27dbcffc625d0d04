//! Small math types shared by the runtime: vectors, screen points, colours
//! and 4x4 matrices.

use serde::{Deserialize, Serialize};

/// 3D position/direction vector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0, z: 1.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Distance ignoring the vertical axis
    pub fn distance_2d(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            }
        } else {
            Self::ZERO
        }
    }

    pub fn approx_eq(&self, other: &Self, eps: f32) -> bool {
        (self.x - other.x).abs() <= eps
            && (self.y - other.y).abs() <= eps
            && (self.z - other.z).abs() <= eps
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl std::ops::Div<f32> for Vec3 {
    type Output = Self;
    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

/// 2D point in normalized interface coordinates (0..1 on both axes)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// RGBA colour with float channels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn gray(v: f32) -> Self {
        Self { r: v, g: v, b: v, a: 0.0 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Column-major 4x4 matrix (`m[col * 4 + row]`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Matrix {
    pub m: [f32; 16],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.m[col * 4 + row]
    }

    pub fn set(&mut self, row: usize, col: usize, v: f32) {
        self.m[col * 4 + row] = v;
    }

    /// `self * other`
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        let mut out = Matrix { m: [0.0; 16] };
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.get(row, k) * other.get(k, col);
                }
                out.set(row, col, sum);
            }
        }
        out
    }

    pub fn translation(t: Vec3) -> Matrix {
        let mut out = Self::IDENTITY;
        out.set(0, 3, t.x);
        out.set(1, 3, t.y);
        out.set(2, 3, t.z);
        out
    }

    pub fn scale(s: Vec3) -> Matrix {
        let mut out = Self::IDENTITY;
        out.set(0, 0, s.x);
        out.set(1, 1, s.y);
        out.set(2, 2, s.z);
        out
    }

    pub fn rotation_y(angle: f32) -> Matrix {
        let (sin, cos) = angle.sin_cos();
        let mut out = Self::IDENTITY;
        out.set(0, 0, cos);
        out.set(0, 2, sin);
        out.set(2, 0, -sin);
        out.set(2, 2, cos);
        out
    }

    /// Right-handed view matrix looking from `eye` at `target`
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Matrix {
        let f = (target - eye).normalize();
        let s = f.cross(&up).normalize();
        let u = s.cross(&f);
        let mut out = Self::IDENTITY;
        out.set(0, 0, s.x);
        out.set(0, 1, s.y);
        out.set(0, 2, s.z);
        out.set(1, 0, u.x);
        out.set(1, 1, u.y);
        out.set(1, 2, u.z);
        out.set(2, 0, -f.x);
        out.set(2, 1, -f.y);
        out.set(2, 2, -f.z);
        out.set(0, 3, -s.dot(&eye));
        out.set(1, 3, -u.dot(&eye));
        out.set(2, 3, f.dot(&eye));
        out
    }

    /// OpenGL-style perspective projection (`fov_y` in radians)
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix {
        let f = 1.0 / (fov_y / 2.0).tan();
        let mut out = Matrix { m: [0.0; 16] };
        out.set(0, 0, f / aspect);
        out.set(1, 1, f);
        out.set(2, 2, (far + near) / (near - far));
        out.set(2, 3, 2.0 * far * near / (near - far));
        out.set(3, 2, -1.0);
        out
    }

    /// Transforms a point (w = 1) ignoring the projective divide
    pub fn transform_point(&self, p: Vec3) -> (Vec3, f32) {
        let x = self.get(0, 0) * p.x + self.get(0, 1) * p.y + self.get(0, 2) * p.z + self.get(0, 3);
        let y = self.get(1, 0) * p.x + self.get(1, 1) * p.y + self.get(1, 2) * p.z + self.get(1, 3);
        let z = self.get(2, 0) * p.x + self.get(2, 1) * p.y + self.get(2, 2) * p.z + self.get(2, 3);
        let w = self.get(3, 0) * p.x + self.get(3, 1) * p.y + self.get(3, 2) * p.z + self.get(3, 3);
        (Vec3::new(x, y, z), w)
    }
}
