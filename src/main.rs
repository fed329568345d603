use lagoon::Assets;

/// Generate a tileable water normal map from a sum of sine waves.
///
/// The height field is periodic over the image, so the encoded normals tile
/// seamlessly under the water shader's repeat sampling.
fn procedural_water_normal(size: u32) -> image::RgbaImage {
    use std::f32::consts::TAU;

    // (frequency in cycles per tile, amplitude, direction)
    let waves: [(f32, f32, [f32; 2]); 4] = [
        (2.0, 0.50, [1.0, 0.0]),
        (3.0, 0.35, [0.0, 1.0]),
        (5.0, 0.20, [1.0, 1.0]),
        (8.0, 0.10, [-1.0, 2.0]),
    ];

    image::RgbaImage::from_fn(size, size, |px, py| {
        let u = px as f32 / size as f32;
        let v = py as f32 / size as f32;

        let mut dhdx = 0.0;
        let mut dhdy = 0.0;
        for (freq, amp, dir) in waves {
            let phase = TAU * freq * (u * dir[0] + v * dir[1]);
            dhdx += amp * TAU * freq * dir[0] * phase.cos();
            dhdy += amp * TAU * freq * dir[1] * phase.cos();
        }

        let len = (dhdx * dhdx + 1.0 + dhdy * dhdy).sqrt();
        let normal = [-dhdx / len, 1.0 / len, -dhdy / len];

        let encode = |n: f32| ((n * 0.5 + 0.5) * 255.0).round() as u8;
        // Tangent-space layout: x and z in RG, up in B.
        image::Rgba([encode(normal[0]), encode(normal[2]), encode(normal[1]), 255])
    })
}

fn main() -> Result<(), winit::error::EventLoopError> {
    env_logger::init();

    let mut assets = Assets::new();

    if let Err(err) = assets.load_file("water_normal", "assets/water_normal.png") {
        log::info!("no water normal map on disk ({err}), generating one");
        assets.insert_image("water_normal", procedural_water_normal(256));
    }

    if let Err(err) = assets.load_file("environment", "assets/environment.png") {
        log::info!("no environment map on disk ({err}), the sky will be analytic");
    }

    lagoon::app::run(assets)
}
