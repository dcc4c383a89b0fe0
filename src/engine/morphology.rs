//! Binary morphology with elliptical structuring elements
//!
//! imageproc's morphology only offers L1/LInf norm balls, which cannot
//! express anisotropic ellipses such as 4x5 or 20x30, so the max/min filters
//! are implemented here over an explicit element.

use image::{GrayImage, Luma};

use crate::domain::{KernelSize, ParameterError};

/// Structuring element given as offsets relative to its anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    width: u32,
    height: u32,
    offsets: Vec<(i32, i32)>,
}

impl StructuringElement {
    /// Ellipse inscribed in a `width x height` box, anchored at its center
    pub fn ellipse(size: KernelSize) -> Result<Self, ParameterError> {
        let invalid = || ParameterError::InvalidKernel {
            width: size.width,
            height: size.height,
        };
        if !size.is_valid() {
            return Err(invalid());
        }
        let width = i32::try_from(size.width).map_err(|_| invalid())?;
        let height = i32::try_from(size.height).map_err(|_| invalid())?;
        let r = height / 2;
        let c = width / 2;
        let inv_r2 = if r > 0 { 1.0 / (r as f64 * r as f64) } else { 0.0 };

        let mut offsets = Vec::new();
        for i in 0..height {
            let dy = i - r;
            if dy.abs() > r {
                continue;
            }
            let dx = (c as f64 * ((r * r - dy * dy) as f64 * inv_r2).sqrt()).round() as i32;
            let j1 = (c - dx).max(0);
            let j2 = (c + dx + 1).min(width);
            for j in j1..j2 {
                offsets.push((j - c, i - r));
            }
        }

        Ok(StructuringElement {
            width: size.width,
            height: size.height,
            offsets,
        })
    }

    #[cfg(test)]
    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the element covers the cell at `(x, y)` of its bounding box
    #[cfg(test)]
    pub(crate) fn contains(&self, x: u32, y: u32) -> bool {
        let anchor_x = (self.width / 2) as i32;
        let anchor_y = (self.height / 2) as i32;
        self.offsets
            .contains(&(x as i32 - anchor_x, y as i32 - anchor_y))
    }
}

/// Neighbourhood maximum; pixels outside the image are ignored
pub fn dilate(image: &GrayImage, element: &StructuringElement) -> GrayImage {
    filter(image, element, 0, |a, b| a.max(b))
}

/// Neighbourhood minimum; pixels outside the image are ignored
pub fn erode(image: &GrayImage, element: &StructuringElement) -> GrayImage {
    filter(image, element, 255, |a, b| a.min(b))
}

/// Dilation followed by erosion
pub fn close(image: &GrayImage, element: &StructuringElement) -> GrayImage {
    erode(&dilate(image, element), element)
}

fn filter(
    image: &GrayImage,
    element: &StructuringElement,
    identity: u8,
    combine: impl Fn(u8, u8) -> u8,
) -> GrayImage {
    let (width, height) = image.dimensions();

    GrayImage::from_fn(width, height, |x, y| {
        let mut acc = identity;
        for &(dx, dy) in &element.offsets {
            let sx = x as i64 + dx as i64;
            let sy = y as i64 + dy as i64;
            if sx < 0 || sy < 0 || sx >= width as i64 || sy >= height as i64 {
                continue;
            }
            acc = combine(acc, image.get_pixel(sx as u32, sy as u32).0[0]);
        }
        Luma([acc])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(element: &StructuringElement) -> Vec<String> {
        let (w, h) = element.dimensions();
        (0..h)
            .map(|y| {
                (0..w)
                    .map(|x| if element.contains(x, y) { '1' } else { '0' })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_small_ellipse_shape() {
        let element = StructuringElement::ellipse(KernelSize::SMALL).unwrap();
        assert_eq!(
            rows(&element),
            vec!["0010", "1111", "1111", "1111", "0010"]
        );
    }

    #[test]
    fn test_single_cell_element() {
        let element = StructuringElement::ellipse(KernelSize::new(1, 1)).unwrap();
        assert_eq!(rows(&element), vec!["1"]);
    }

    #[test]
    fn test_wide_ellipse_is_symmetric_about_anchor_row() {
        let element = StructuringElement::ellipse(KernelSize::WIDE).unwrap();
        let r = rows(&element);
        assert_eq!(r.len(), 30);
        // anchor row spans the full width
        assert_eq!(r[15], "1".repeat(20));
        for offset in 1..15 {
            assert_eq!(r[15 - offset], r[15 + offset]);
        }
    }

    #[test]
    fn test_oversized_element_rejected() {
        assert!(matches!(
            StructuringElement::ellipse(KernelSize::new(3_000_000_000, 5)),
            Err(ParameterError::InvalidKernel { width: 3_000_000_000, height: 5 })
        ));
        assert!(StructuringElement::ellipse(KernelSize::new(0, 0)).is_err());
    }

    #[test]
    fn test_dilate_grows_single_pixel_into_element() {
        let mut image = GrayImage::new(9, 9);
        image.put_pixel(4, 4, Luma([255]));
        let element = StructuringElement::ellipse(KernelSize::new(3, 3)).unwrap();

        let dilated = dilate(&image, &element);
        let lit: usize = dilated.pixels().filter(|p| p.0[0] == 255).count();
        assert_eq!(lit, element.offsets.len());
        assert_eq!(dilated.get_pixel(4, 4).0[0], 255);
        assert_eq!(dilated.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_erode_removes_isolated_pixel() {
        let mut image = GrayImage::new(9, 9);
        image.put_pixel(4, 4, Luma([255]));
        let element = StructuringElement::ellipse(KernelSize::SMALL).unwrap();
        assert!(erode(&image, &element).pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_erode_keeps_full_image() {
        let image = GrayImage::from_pixel(6, 6, Luma([255]));
        let element = StructuringElement::ellipse(KernelSize::WIDE).unwrap();
        assert_eq!(erode(&image, &element), image);
    }

    #[test]
    fn test_close_fills_small_gap() {
        let mut image = GrayImage::new(11, 7);
        for y in 2..=4 {
            for x in 0..11 {
                if x != 5 {
                    image.put_pixel(x, y, Luma([255]));
                }
            }
        }
        let element = StructuringElement::ellipse(KernelSize::new(3, 3)).unwrap();
        let closed = close(&image, &element);
        assert_eq!(closed.get_pixel(5, 3).0[0], 255);
    }

    #[test]
    fn test_binary_input_stays_binary() {
        let mut image = GrayImage::new(20, 20);
        for (x, y) in [(3, 3), (4, 3), (10, 12), (15, 2), (19, 19)] {
            image.put_pixel(x, y, Luma([255]));
        }
        let element = StructuringElement::ellipse(KernelSize::SMALL).unwrap();
        let out = erode(&close(&dilate(&image, &element), &element), &element);
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }
}
