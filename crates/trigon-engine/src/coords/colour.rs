/// Linear RGBA colour.
///
/// Values are expected in linear space; the sRGB render target handles encoding.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colour {
    pub const BLACK: Colour = Colour::rgb(0.0, 0.0, 0.0);
    pub const RED: Colour = Colour::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Colour = Colour::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Colour = Colour::rgb(0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from RGB components.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Colour> for wgpu::Color {
    fn from(c: Colour) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_is_opaque() {
        assert_eq!(Colour::rgb(0.2, 0.4, 0.6).a, 1.0);
    }

    #[test]
    fn to_array_keeps_channel_order() {
        assert_eq!(Colour::new(0.1, 0.2, 0.3, 0.4).to_array(), [0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn converts_to_wgpu_color() {
        let c: wgpu::Color = Colour::GREEN.into();
        assert_eq!((c.r, c.g, c.b, c.a), (0.0, 1.0, 0.0, 1.0));
    }
}
