use chunk_stage_core::prelude::*;
use chunk_stage_storage::prelude::*;

/// A cube array of `inner_value` inside a centered sphere and `outer_value` outside. Returns the array and the sphere radius.
pub fn sphere_array<T>(array_edge_length: i32, inner_value: T, outer_value: T) -> (Array3<T>, i32)
where
    T: Copy,
{
    let array_radius = array_edge_length / 2;
    let sphere_radius = array_radius - 1;
    let bounds = Bounds3::new(IndexN::fill(-array_radius), IndexN::fill(array_edge_length));
    let ball = Ball {
        center: [0.5; 3],
        radius: sphere_radius as f32,
    };

    let array = ArrayN::fill_with(bounds, |i| {
        let center = i.0.map(|c| c as f32 + 0.5);
        if ball.contains(&center) {
            inner_value
        } else {
            outer_value
        }
    });

    (array, sphere_radius)
}

/// Terrain-like test content: every stage index below a gently rolling height field is solid (1), the rest is air (0).
pub fn rolling_hills(index: Index3) -> u16 {
    let height = ((index.x() as f32 * 0.2).sin() * 4.0 + (index.z() as f32 * 0.15).cos() * 4.0) as i32;

    (index.y() < height) as u16
}
