//! Cropping change regions out of source images and encoding them for transport.

use std::io::Cursor;

use base64::Engine;
use image::codecs::png::PngEncoder;
use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};

use crate::types::{DiffError, DiffResult, Region};

/// A region cut from one of the source images, ready to send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CroppedRegion {
    /// Index of the source image the crop came from.
    pub source_index: usize,
    pub region: Region,
    /// Base64 (standard alphabet) PNG bytes.
    pub png_base64: String,
}

/// Extract the sub-image covered by `region`.
pub fn crop_region(image: &RgbImage, region: &Region) -> DiffResult<RgbImage> {
    let (w, h) = image.dimensions();
    if !region.fits_within(w, h) {
        return Err(DiffError::RegionOutOfBounds {
            region: *region,
            width: w,
            height: h,
        });
    }
    Ok(imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image())
}

/// Encode an image as PNG.
pub fn encode_png(image: &RgbImage) -> DiffResult<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(Cursor::new(&mut buf));
    image.write_with_encoder(encoder)?;
    Ok(buf)
}

/// Encode an image as base64 PNG text.
pub fn encode_png_base64(image: &RgbImage) -> DiffResult<String> {
    let png = encode_png(image)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(png))
}

/// Crop every region out of every source, sources outermost.
///
/// For sources `[base, test]` and regions `[r1, r2]` the output order is
/// `base/r1, base/r2, test/r1, test/r2`.
pub fn crop_changes(sources: &[&RgbImage], regions: &[Region]) -> DiffResult<Vec<CroppedRegion>> {
    let mut out = Vec::with_capacity(sources.len() * regions.len());
    for (source_index, image) in sources.iter().enumerate() {
        for region in regions {
            let crop = crop_region(image, region)?;
            out.push(CroppedRegion {
                source_index,
                region: *region,
                png_base64: encode_png_base64(&crop)?,
            });
        }
    }
    tracing::debug!("Cropped {} regions from {} sources", regions.len(), sources.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_crop_dimensions_match_region() {
        let img = RgbImage::from_fn(64, 48, |x, y| Rgb([x as u8, y as u8, 0]));
        let region = Region::from_bounds(5, 7, 24, 16);
        let crop = crop_region(&img, &region).unwrap();
        assert_eq!(crop.dimensions(), (region.width, region.height));
        assert_eq!(crop.get_pixel(0, 0).0, [5, 7, 0]);
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let img = RgbImage::new(20, 20);
        let region = Region::from_bounds(10, 10, 25, 15);
        let err = crop_region(&img, &region).unwrap_err();
        assert!(matches!(err, DiffError::RegionOutOfBounds { width: 20, .. }));
    }

    #[test]
    fn test_base64_decodes_to_png() {
        let img = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        let text = encode_png_base64(&img).unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(text)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_crop_changes_order() {
        let base = RgbImage::new(30, 30);
        let test = RgbImage::from_pixel(30, 30, Rgb([255, 255, 255]));
        let regions = [Region::from_bounds(0, 0, 9, 9), Region::from_bounds(10, 10, 19, 24)];
        let crops = crop_changes(&[&base, &test], &regions).unwrap();
        let order: Vec<_> = crops.iter().map(|c| (c.source_index, c.region.y)).collect();
        assert_eq!(order, vec![(0, 0), (0, 10), (1, 0), (1, 10)]);
    }
}
