//! Small domain primitives shared by the terrain and lighting crates.
#![forbid(unsafe_code)]

/// Linear RGB color, one `f32` per channel, nominal range `[0, 1]`.
///
/// Light math works channel-wise and saturates only at the byte
/// conversion boundary, so intermediate values may briefly exceed 1.0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Grey color with the same value on every channel.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// Channel-wise maximum. This is the combining operation of the light
    /// map: overlapping contributions never darken each other.
    #[inline]
    pub fn max(self, rhs: Rgb) -> Rgb {
        Rgb {
            r: self.r.max(rhs.r),
            g: self.g.max(rhs.g),
            b: self.b.max(rhs.b),
        }
    }

    #[inline]
    pub fn scale(self, f: f32) -> Rgb {
        Rgb {
            r: self.r * f,
            g: self.g * f,
            b: self.b * f,
        }
    }

    /// Linear blend toward `to`; `t` is clamped to `[0, 1]`.
    #[inline]
    pub fn lerp(self, to: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb {
            r: self.r + (to.r - self.r) * t,
            g: self.g + (to.g - self.g) * t,
            b: self.b + (to.b - self.b) * t,
        }
    }

    /// Brightest channel, used wherever a scalar stand-in is needed.
    #[inline]
    pub fn brightness(self) -> f32 {
        self.r.max(self.g).max(self.b)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 3] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 3]) -> Rgb {
        Rgb {
            r: bytes[0] as f32 / 255.0,
            g: bytes[1] as f32 / 255.0,
            b: bytes[2] as f32 / 255.0,
        }
    }
}

/// Inclusive axis-aligned rectangle in tile coordinates.
///
/// Used to accumulate the region of the world whose lighting must be
/// recomputed; `union` keeps growing one bounding box rather than a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl TileRect {
    #[inline]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle covering the single tile `(x, y)`.
    #[inline]
    pub const fn point(x: i32, y: i32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x,
            y1: y,
        }
    }

    #[inline]
    pub fn union(self, rhs: TileRect) -> TileRect {
        TileRect {
            x0: self.x0.min(rhs.x0),
            y0: self.y0.min(rhs.y0),
            x1: self.x1.max(rhs.x1),
            y1: self.y1.max(rhs.y1),
        }
    }

    /// Grow every side by `n` tiles (`n >= 0`).
    #[inline]
    pub fn pad(self, n: i32) -> TileRect {
        TileRect {
            x0: self.x0 - n,
            y0: self.y0 - n,
            x1: self.x1 + n,
            y1: self.y1 + n,
        }
    }

    /// Intersect with the world extent `[0, w) x [0, h)`. Returns `None`
    /// when the rectangle falls entirely outside.
    pub fn clamp_to(self, w: i32, h: i32) -> Option<TileRect> {
        let r = TileRect {
            x0: self.x0.max(0),
            y0: self.y0.max(0),
            x1: self.x1.min(w - 1),
            y1: self.y1.min(h - 1),
        };
        if r.x0 > r.x1 || r.y0 > r.y1 {
            None
        } else {
            Some(r)
        }
    }

    #[inline]
    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    #[inline]
    pub fn width(self) -> i64 {
        (self.x1 - self.x0) as i64 + 1
    }

    #[inline]
    pub fn height(self) -> i64 {
        (self.y1 - self.y0) as i64 + 1
    }

    #[inline]
    pub fn area(self) -> i64 {
        self.width() * self.height()
    }
}
