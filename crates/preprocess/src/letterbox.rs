//! Aspect-preserving resize-and-pad mapping between a source image and the
//! square model input, and its inverse.

use crate::error::PreprocessError;

/// Per-frame letterbox geometry.
///
/// Built once per frame by [`Letterbox::compute`] and passed by value to the
/// decoder, so two frames of different resolution never share scale/pad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Uniform scale applied to the source image.
    pub scale: f32,
    /// Left padding in model-input pixels.
    pub pad_x: u32,
    /// Top padding in model-input pixels.
    pub pad_y: u32,
    /// Source size after scaling, `(width, height)`.
    pub resized: (u32, u32),
    pub source: (u32, u32),
    pub target: (u32, u32),
}

impl Letterbox {
    /// Compute the letterbox that fits `source` into `target`.
    ///
    /// The scale is the smaller of the two axis ratios; the resized size is
    /// truncated and the leftover space is split with integer division, so an
    /// odd remainder leaves the extra pixel on the bottom/right.
    pub fn compute(source: (u32, u32), target: (u32, u32)) -> Result<Self, PreprocessError> {
        let (width, height) = source;
        if width == 0 || height == 0 {
            return Err(PreprocessError::InvalidDimensions { width, height });
        }
        if target.0 == 0 || target.1 == 0 {
            return Err(PreprocessError::InvalidDimensions {
                width: target.0,
                height: target.1,
            });
        }

        let scale = (target.0 as f32 / width as f32).min(target.1 as f32 / height as f32);
        let new_width = ((width as f32 * scale) as u32).min(target.0);
        let new_height = ((height as f32 * scale) as u32).min(target.1);

        Ok(Self {
            scale,
            pad_x: (target.0 - new_width) / 2,
            pad_y: (target.1 - new_height) / 2,
            resized: (new_width, new_height),
            source,
            target,
        })
    }

    /// Map a source-image point into model-input space.
    pub fn to_model_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.scale + self.pad_x as f32,
            y * self.scale + self.pad_y as f32,
        )
    }

    /// Map a model-input point back into source-image space.
    pub fn to_image_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_x as f32) / self.scale,
            (y - self.pad_y as f32) / self.scale,
        )
    }

    /// Map a model-input length (box width or height) back into source-image space.
    pub fn to_image_length(&self, length: f32) -> f32 {
        length / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hd_frame_into_square_input() {
        let lb = Letterbox::compute((1280, 720), (640, 640)).unwrap();

        assert_eq!(lb.scale, 0.5);
        assert_eq!(lb.resized, (640, 360));
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 140);
    }

    /// Same aspect ratio as the target: no padding on either axis.
    #[test]
    fn test_matching_aspect_ratio_has_no_padding() {
        for (w, h) in [(640, 640), (320, 320), (1280, 1280), (2000, 2000)] {
            let lb = Letterbox::compute((w, h), (640, 640)).unwrap();
            assert_eq!(lb.pad_x, 0, "pad_x for {}x{}", w, h);
            assert_eq!(lb.pad_y, 0, "pad_y for {}x{}", w, h);
            assert_eq!(lb.resized, (640, 640), "resized for {}x{}", w, h);
        }
    }

    #[test]
    fn test_odd_leftover_biases_top_left() {
        // 302 * 0.5 = 151 wide, 489 leftover -> 244 on the left, 245 on the right.
        let lb = Letterbox::compute((302, 1280), (640, 640)).unwrap();
        assert_eq!(lb.resized, (151, 640));
        assert_eq!(lb.pad_x, 244);
        assert_eq!(lb.pad_y, 0);
        assert_eq!(lb.pad_x * 2 + lb.resized.0, 639);
    }

    #[test]
    fn test_portrait_source_pads_horizontally() {
        let lb = Letterbox::compute((720, 1280), (640, 640)).unwrap();
        assert_eq!(lb.scale, 0.5);
        assert_eq!(lb.pad_x, 140);
        assert_eq!(lb.pad_y, 0);
    }

    #[test]
    fn test_upscaling_small_source() {
        let lb = Letterbox::compute((320, 240), (640, 640)).unwrap();
        assert_eq!(lb.scale, 2.0);
        assert_eq!(lb.resized, (640, 480));
        assert_eq!(lb.pad_y, 80);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            Letterbox::compute((0, 720), (640, 640)),
            Err(PreprocessError::InvalidDimensions { width: 0, height: 720 })
        ));
        assert!(Letterbox::compute((1280, 0), (640, 640)).is_err());
        assert!(Letterbox::compute((1280, 720), (0, 640)).is_err());
    }

    /// Forward then inverse on the source center returns the center.
    #[test]
    fn test_center_point_round_trips() {
        let sizes = [1u32, 7, 33, 100, 479, 640, 721, 1080, 1920, 4096];
        let targets = [(320u32, 320u32), (640, 640), (512, 384), (1024, 576)];

        for &target in &targets {
            for &w in &sizes {
                for &h in &sizes {
                    let lb = Letterbox::compute((w, h), target).unwrap();
                    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
                    let (mx, my) = lb.to_model_point(cx, cy);
                    let (ix, iy) = lb.to_image_point(mx, my);

                    let tol = 1e-3 * (w.max(h) as f32).max(1.0);
                    assert!(
                        (ix - cx).abs() <= tol && (iy - cy).abs() <= tol,
                        "{}x{} -> {:?}: got ({}, {}), expected ({}, {})",
                        w,
                        h,
                        target,
                        ix,
                        iy,
                        cx,
                        cy
                    );
                }
            }
        }
    }

    #[test]
    fn test_scaled_content_fits_target() {
        for (w, h) in [(1, 10_000), (10_000, 1), (641, 639), (1920, 1080), (3, 2)] {
            let lb = Letterbox::compute((w, h), (640, 640)).unwrap();
            assert!(lb.scale > 0.0);
            assert!(lb.pad_x * 2 + lb.resized.0 <= 640);
            assert!(lb.pad_y * 2 + lb.resized.1 <= 640);
        }
    }

    #[test]
    fn test_length_inverse() {
        let lb = Letterbox::compute((1280, 720), (640, 640)).unwrap();
        assert_eq!(lb.to_image_length(100.0), 200.0);
        assert_eq!(lb.to_image_point(320.0, 320.0), (640.0, 360.0));
    }
}
