use loam_geom::{Rgb, TileRect};

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn rgb_approx_eq(a: Rgb, b: Rgb, eps: f32) -> bool {
    approx_eq(a.r, b.r, eps) && approx_eq(a.g, b.g, eps) && approx_eq(a.b, b.b, eps)
}

#[test]
fn rgb_constants_and_splat() {
    assert!(rgb_approx_eq(Rgb::BLACK, Rgb::new(0.0, 0.0, 0.0), 1e-6));
    assert!(rgb_approx_eq(Rgb::WHITE, Rgb::splat(1.0), 1e-6));
}

#[test]
fn rgb_max_is_channel_wise() {
    let a = Rgb::new(0.8, 0.1, 0.5);
    let b = Rgb::new(0.2, 0.9, 0.5);
    let m = a.max(b);
    assert!(rgb_approx_eq(m, Rgb::new(0.8, 0.9, 0.5), 1e-6));
}

#[test]
fn rgb_lerp_endpoints_and_clamp() {
    let a = Rgb::new(0.1, 0.2, 0.3);
    let b = Rgb::new(0.9, 0.8, 0.7);
    assert!(rgb_approx_eq(a.lerp(b, 0.0), a, 1e-6));
    assert!(rgb_approx_eq(a.lerp(b, 1.0), b, 1e-6));
    // t outside [0,1] clamps rather than extrapolating
    assert!(rgb_approx_eq(a.lerp(b, 2.0), b, 1e-6));
    assert!(rgb_approx_eq(a.lerp(b, -1.0), a, 1e-6));
}

#[test]
fn rgb_byte_conversion_saturates() {
    assert_eq!(Rgb::new(2.0, -1.0, 0.5).to_bytes(), [255, 0, 128]);
    let back = Rgb::from_bytes([255, 0, 128]);
    assert!(approx_eq(back.r, 1.0, 1e-6));
    assert!(approx_eq(back.g, 0.0, 1e-6));
}

#[test]
fn rect_union_and_contains() {
    let a = TileRect::point(4, 7);
    let b = TileRect::point(-2, 9);
    let u = a.union(b);
    assert_eq!(u, TileRect::new(-2, 7, 4, 9));
    assert!(u.contains(0, 8));
    assert!(!u.contains(5, 8));
}

#[test]
fn rect_pad_and_clamp() {
    let r = TileRect::point(0, 0).pad(3);
    assert_eq!(r, TileRect::new(-3, -3, 3, 3));
    let c = r.clamp_to(10, 10).unwrap();
    assert_eq!(c, TileRect::new(0, 0, 3, 3));
    assert_eq!(c.area(), 16);
    // Entirely outside the extent
    assert!(TileRect::new(-5, -5, -1, -1).clamp_to(10, 10).is_none());
}
