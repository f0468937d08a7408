//! 3x3 colour matrices for the CSS `saturate()` and `sepia()` filter functions.
//!
//! Coefficients follow the Filter Effects Module definitions so renderings
//! match what the storefront previews with CSS filters.

/// Rec. 709 luma weights used by `saturate()`.
pub const LUMA_R: f32 = 0.213;
pub const LUMA_G: f32 = 0.715;
pub const LUMA_B: f32 = 0.072;

/// Row-major 3x3 matrix applied to normalized linear RGB triples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix([[f32; 3]; 3]);

impl ColorMatrix {
    pub const IDENTITY: ColorMatrix = ColorMatrix([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    pub fn new(rows: [[f32; 3]; 3]) -> Self {
        Self(rows)
    }

    /// `saturate(amount)`, where 1.0 is neutral and 0.0 is greyscale.
    pub fn saturate(amount: f32) -> Self {
        let s = amount.max(0.0);
        Self([
            [LUMA_R + 0.787 * s, LUMA_G - 0.715 * s, LUMA_B - 0.072 * s],
            [LUMA_R - 0.213 * s, LUMA_G + 0.285 * s, LUMA_B - 0.072 * s],
            [LUMA_R - 0.213 * s, LUMA_G - 0.715 * s, LUMA_B + 0.928 * s],
        ])
    }

    /// `sepia(amount)`, with amount capped to 0.0..=1.0.
    pub fn sepia(amount: f32) -> Self {
        let inv = 1.0 - amount.clamp(0.0, 1.0);
        Self([
            [0.393 + 0.607 * inv, 0.769 - 0.769 * inv, 0.189 - 0.189 * inv],
            [0.349 - 0.349 * inv, 0.686 + 0.314 * inv, 0.168 - 0.168 * inv],
            [0.272 - 0.272 * inv, 0.534 - 0.534 * inv, 0.131 + 0.869 * inv],
        ])
    }

    pub fn rows(&self) -> &[[f32; 3]; 3] {
        &self.0
    }

    /// Multiply an RGB triple by the matrix.
    #[inline]
    pub fn apply(&self, r: f32, g: f32, b: f32) -> (f32, f32, f32) {
        let m = &self.0;
        (
            m[0][0] * r + m[0][1] * g + m[0][2] * b,
            m[1][0] * r + m[1][1] * g + m[1][2] * b,
            m[2][0] * r + m[2][1] * g + m[2][2] * b,
        )
    }

    pub fn is_identity(&self) -> bool {
        self.0
            .iter()
            .flatten()
            .zip(Self::IDENTITY.0.iter().flatten())
            .all(|(a, b)| (a - b).abs() < 1e-6)
    }
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}
