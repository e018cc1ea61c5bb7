use base64::Engine as _;
use image::{DynamicImage, Rgb, RgbImage};
use primshape::tree::Node;
use std::io::Cursor;

pub const PART_ID: &str = "11111111-2222-3333-4444-555555555555";
pub const TEXTURE_ID: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";

/// A minimal valid texture table: just a default entry, no overrides.
pub fn texture_entry_b64() -> String {
    base64::engine::general_purpose::STANDARD.encode([0u8; 16])
}

pub fn vector_node(name: &str, x: f32, y: f32, z: f32) -> Node {
    Node::new(name)
        .child(Node::with_value("X", x.to_string()))
        .child(Node::with_value("Y", y.to_string()))
        .child(Node::with_value("Z", z.to_string()))
}

pub fn rotation_node(x: f32, y: f32, z: f32, w: f32) -> Node {
    Node::new("RotationOffset")
        .child(Node::with_value("X", x.to_string()))
        .child(Node::with_value("Y", y.to_string()))
        .child(Node::with_value("Z", z.to_string()))
        .child(Node::with_value("W", w.to_string()))
}

/// Shape subtree with the required children plus any extra leaf fields.
pub fn shape_node(sculpt_type: &str, fields: &[(&str, &str)]) -> Node {
    let mut shape = Node::new("Shape")
        .child(Node::with_value("SculptType", sculpt_type))
        .child(Node::new("SculptTexture").child(Node::with_value("Guid", TEXTURE_ID)))
        .child(Node::with_value("TextureEntry", texture_entry_b64()));
    for (name, value) in fields {
        shape = shape.child(Node::with_value(*name, *value));
    }
    shape
}

/// Full descriptor tree for one part, valid unless a test breaks it.
pub fn descriptor_tree(sculpt_type: &str, fields: &[(&str, &str)], scale: (f32, f32, f32)) -> Node {
    Node::new("SceneObjectPart")
        .child(Node::new("UUID").child(Node::with_value("Guid", PART_ID)))
        .child(shape_node(sculpt_type, fields))
        .child(vector_node("Scale", scale.0, scale.1, scale.2))
        .child(rotation_node(0.0, 0.0, 0.0, 1.0))
        .child(vector_node("OffsetPosition", 1.0, 2.0, 3.0))
        .child(vector_node("GroupPosition", 10.0, 20.0, 30.0))
}

/// Encode a gradient RGB image as PNG bytes, usable as sculpt data.
pub fn gradient_png(w: u32, h: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("png encode");
    buf
}

/// Encode a single-channel PNG, which no sculpt can be built from.
pub fn grayscale_png(w: u32, h: u32) -> Vec<u8> {
    let img = image::GrayImage::from_fn(w, h, |x, y| image::Luma([(x + y) as u8]));
    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("png encode");
    buf
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
