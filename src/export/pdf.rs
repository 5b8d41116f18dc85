use std::fs;
use std::path::PathBuf;

use printpdf::{
    ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject, Mm,
    PdfDocument, PdfDocumentReference, PdfLayerReference, Px,
};
use tracing::debug;

use crate::export::config::ExportConfig;
use crate::export::error::DocumentError;
use crate::export::pipeline::{ArtifactHandle, DocumentSink, EncodedImage, Placement};

const MM_PER_INCH: f32 = 25.4;
const LAYER_NAME: &str = "Cards";

/// [`DocumentSink`] that assembles a PDF with `printpdf` and writes it into `output_dir`.
///
/// Placements arrive in millimetres from the top-left corner and are flipped into PDF space
/// (origin bottom-left) here.
pub struct PdfDocumentSink {
    doc: Option<PdfDocumentReference>,
    layer: PdfLayerReference,
    page_width: f32,
    page_height: f32,
    pages: usize,
    output_dir: PathBuf,
}

impl PdfDocumentSink {
    pub fn new(title: &str, config: &ExportConfig, output_dir: impl Into<PathBuf>) -> Self {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(config.page_width),
            Mm(config.page_height),
            LAYER_NAME,
        );
        let layer = doc.get_page(page).get_layer(layer);
        Self {
            doc: Some(doc),
            layer,
            page_width: config.page_width,
            page_height: config.page_height,
            pages: 1,
            output_dir: output_dir.into(),
        }
    }

    pub fn pages(&self) -> usize {
        self.pages
    }
}

fn already_saved() -> DocumentError {
    DocumentError::Assembly("document already saved".to_string())
}

impl DocumentSink for PdfDocumentSink {
    fn add_page(&mut self) -> Result<(), DocumentError> {
        let doc = self.doc.as_ref().ok_or_else(already_saved)?;
        let (page, layer) = doc.add_page(Mm(self.page_width), Mm(self.page_height), LAYER_NAME);
        self.layer = doc.get_page(page).get_layer(layer);
        self.pages += 1;
        Ok(())
    }

    fn add_image(
        &mut self,
        image: &EncodedImage,
        placement: &Placement,
    ) -> Result<(), DocumentError> {
        if self.doc.is_none() {
            return Err(already_saved());
        }
        if image.width == 0 || image.height == 0 {
            return Err(DocumentError::Assembly("image has no pixels".to_string()));
        }
        let xobject = ImageXObject {
            width: Px(image.width as usize),
            height: Px(image.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: image.data.clone(),
            image_filter: Some(ImageFilter::DCT),
            clipping_bbox: None,
            smask: None,
        };

        // dpi fixes the width; scale_y stretches the height to the requested box.
        let dpi = image.width as f32 / (placement.width / MM_PER_INCH);
        let natural_height = image.height as f32 / dpi * MM_PER_INCH;
        let bottom = self.page_height - placement.y - placement.height;
        Image::from(xobject).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(placement.x)),
                translate_y: Some(Mm(bottom)),
                dpi: Some(dpi),
                scale_y: Some(placement.height / natural_height),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn save(&mut self, name: &str) -> Result<ArtifactHandle, DocumentError> {
        let doc = self.doc.take().ok_or_else(already_saved)?;
        let bytes = doc
            .save_to_bytes()
            .map_err(|e| DocumentError::Assembly(e.to_string()))?;
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(name);
        fs::write(&path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote pdf");
        Ok(ArtifactHandle {
            name: name.to_string(),
            path: Some(path),
            pages: self.pages,
            bytes: bytes.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{Rgb, RgbImage};

    fn tiny_jpeg() -> EncodedImage {
        let img = RgbImage::from_pixel(9, 13, Rgb([200, 30, 30]));
        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, 80)
            .encode_image(&img)
            .expect("encode");
        EncodedImage {
            width: 9,
            height: 13,
            data,
        }
    }

    #[test]
    fn writes_multi_page_pdf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ExportConfig::default();
        let mut sink = PdfDocumentSink::new("test", &config, dir.path());
        let image = tiny_jpeg();
        let placement = Placement {
            page: 1,
            x: 10.0,
            y: 10.0,
            width: 90.0,
            height: 130.0,
        };
        sink.add_image(&image, &placement).expect("place");
        sink.add_page().expect("page");
        sink.add_image(&image, &Placement { page: 2, ..placement })
            .expect("place");

        let handle = sink.save("cards.pdf").expect("save");
        assert_eq!(handle.pages, 2);
        let path = handle.path.expect("path");
        let bytes = fs::read(&path).expect("read back");
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(handle.bytes, bytes.len() as u64);

        assert!(sink.add_page().is_err());
        assert!(sink.save("again.pdf").is_err());
    }
}
