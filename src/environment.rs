//! The scene backdrop and the environment lighting image.

use glam::Vec2;

/// Side length of the procedural gradient texture.
pub const GRADIENT_SIZE: u32 = 100;

/// Backdrop gradient endpoints (sRGB), red to blue along the diagonal.
pub const GRADIENT_FROM: [u8; 3] = [0xff, 0x00, 0x00];
pub const GRADIENT_TO: [u8; 3] = [0x00, 0x00, 0xff];

/// RGBA8 pixels of a square two-color gradient running from the top-left
/// corner to the bottom-right one.
pub fn gradient_pixels(from: [u8; 3], to: [u8; 3], size: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    let span = (2 * (size - 1)) as f32;

    for y in 0..size {
        for x in 0..size {
            let t = (x + y) as f32 / span;
            for channel in 0..3 {
                let value = from[channel] as f32 + (to[channel] as f32 - from[channel] as f32) * t;
                pixels.push(value.round() as u8);
            }
            pixels.push(0xff);
        }
    }

    pixels
}

/// UV offset/repeat that makes a texture cover the viewport, cropping
/// whichever axis overflows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverPlacement {
    pub offset: Vec2,
    pub repeat: Vec2,
}

impl CoverPlacement {
    pub fn compute(image_aspect: f32, viewport_aspect: f32) -> CoverPlacement {
        let relative = image_aspect / viewport_aspect;

        if relative > 1.0 {
            CoverPlacement {
                offset: Vec2::new((1.0 - 1.0 / relative) * 0.5, 0.0),
                repeat: Vec2::new(1.0 / relative, 1.0),
            }
        } else {
            CoverPlacement {
                offset: Vec2::new(0.0, (1.0 - relative) * 0.5),
                repeat: Vec2::new(1.0, relative),
            }
        }
    }

    pub fn to_uniform(&self) -> [f32; 4] {
        [self.offset.x, self.offset.y, self.repeat.x, self.repeat.y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_endpoints_hit_both_colors() {
        let pixels = gradient_pixels(GRADIENT_FROM, GRADIENT_TO, GRADIENT_SIZE);
        assert_eq!(pixels.len(), (GRADIENT_SIZE * GRADIENT_SIZE * 4) as usize);
        // Top-left pixel is the start color.
        assert_eq!(&pixels[0..4], &[0xff, 0x00, 0x00, 0xff]);
        // Bottom-right pixel is the end color.
        let last = pixels.len() - 4;
        assert_eq!(&pixels[last..], &[0x00, 0x00, 0xff, 0xff]);
    }

    #[test]
    fn matching_aspect_needs_no_crop() {
        let placement = CoverPlacement::compute(1.0, 1.0);
        assert_eq!(placement.offset, Vec2::ZERO);
        assert_eq!(placement.repeat, Vec2::ONE);
    }

    #[test]
    fn wide_viewport_crops_vertically() {
        let placement = CoverPlacement::compute(1.0, 2.0);
        assert_eq!(placement.offset, Vec2::new(0.0, 0.25));
        assert_eq!(placement.repeat, Vec2::new(1.0, 0.5));
    }

    #[test]
    fn tall_viewport_crops_horizontally() {
        let placement = CoverPlacement::compute(1.0, 0.5);
        assert_eq!(placement.offset, Vec2::new(0.25, 0.0));
        assert_eq!(placement.repeat, Vec2::new(0.5, 1.0));
    }
}
