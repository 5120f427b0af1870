use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};

use proctor_shield::vision::{BoundingBox, Scene};

pub const FACE: BoundingBox = BoundingBox::new(0, 0, 100, 100);

/// A small solid PNG wrapped as a browser canvas data URL.
pub fn frame_data_url() -> String {
    let img = RgbImage::from_pixel(160, 120, Rgb([200, 180, 160]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

pub fn eye_at(x: u32, y: u32) -> BoundingBox {
    BoundingBox::new(x, y, 20, 20)
}

/// One face at [`FACE`] with eyes at the given x offsets (y = 20).
pub fn face_with_eyes(xs: &[u32]) -> Scene {
    Scene::single_face(FACE, xs.iter().map(|x| eye_at(*x, 20)).collect())
}
