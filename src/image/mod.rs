//! Raster rendering of card faces: painting with `imageproc` and JPEG capture.

mod paint;
mod raster;

pub use paint::{
    CardFace, CardPainter, CardStyle, FACE_HEIGHT, FACE_WIDTH, GLYPH_HEIGHT, GLYPH_WIDTH,
};
pub use raster::JpegRasterizer;
