use crate::boxes::{filter_boxes, jitter_boxes, warp_boxes, BBox, DEFAULT_FILTER_MARGINS};
use crate::error::WarpError;
use crate::matrix::{
    centering_matrix, flip_matrix, perspective_matrix, resize_matrix, rotation_matrix,
    scale_matrix, shear_matrix, stretch_matrix, translate_matrix, Transform2D,
};
use crate::occlusion::inject_occlusion;
use crate::raster::{warp_image, warp_mask};
use log::debug;
use ndarray::{Array2, Array3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Destination size that preserves the source aspect ratio.
///
/// Picks the binding-axis fit ratio (height when the source is taller than
/// the target aspect, width otherwise), scales both source dimensions,
/// truncates to integers, and finally rounds each dimension up to the next
/// multiple of `divisible` (with a floor of one multiple) when the
/// constraint is positive.
pub fn minimum_dst_shape(src_shape: (u32, u32), dst_shape: (u32, u32), divisible: u32) -> (u32, u32) {
    let (src_w, src_h) = src_shape;
    let (dst_w, dst_h) = dst_shape;

    let ratio = if (src_w as f32 / src_h as f32) < (dst_w as f32 / dst_h as f32) {
        dst_h as f32 / src_h as f32
    } else {
        dst_w as f32 / src_w as f32
    };

    let mut out_w = (ratio * src_w as f32) as u32;
    let mut out_h = (ratio * src_h as f32) as u32;

    if divisible > 0 {
        out_w = ((out_w + divisible - 1) / divisible * divisible).max(divisible);
        out_h = ((out_h + divisible - 1) / divisible * divisible).max(divisible);
    }
    (out_w, out_h)
}

/// Configuration for one shape-transform augmentation stage.
///
/// Every randomized range is a closed interval sampled uniformly; fixing a
/// range to a point value makes the corresponding primitive deterministic.
/// Missing fields deserialize to the neutral defaults below, so training
/// configs only need to name the knobs they change.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Whether to keep the source aspect ratio when resizing.
    pub keep_ratio: bool,
    /// Round kept-ratio output dimensions up to a multiple of this stride.
    pub divisible: u32,
    /// Random perspective factor.
    pub perspective: f32,
    /// Random uniform scale ratio range.
    pub scale: (f32, f32),
    /// Width and height stretch ratio ranges.
    pub stretch: ((f32, f32), (f32, f32)),
    /// Random rotation range in degrees.
    pub rotation: f32,
    /// Random shear range in degrees.
    pub shear: f32,
    /// Random translate ratio.
    pub translate: f32,
    /// Horizontal flip probability.
    pub flip: f32,
    /// Random per-edge box jitter ratio.
    pub jitter_box: f32,
    /// Probability of hard-positive occlusion injection.
    pub hard_pos: f32,
    /// Box grow ratio used by occlusion injection.
    pub hard_pos_ratio: f32,
}

impl Default for WarpConfig {
    fn default() -> Self {
        WarpConfig {
            keep_ratio: false,
            divisible: 0,
            perspective: 0.0,
            scale: (1.0, 1.0),
            stretch: ((1.0, 1.0), (1.0, 1.0)),
            rotation: 0.0,
            shear: 0.0,
            translate: 0.0,
            flip: 0.0,
            jitter_box: 0.0,
            hard_pos: 0.0,
            hard_pos_ratio: 0.0,
        }
    }
}

/// Per-image state passed through the augmentation pipeline.
///
/// Boxes and labels are index-aligned; masks, when present, are aligned 1:1
/// with boxes. `warp_matrix` records the transform actually applied (the
/// identity when the fallback fired).
#[derive(Clone, Debug)]
pub struct Sample {
    /// Image raster, HWC layout.
    pub image: Array3<u8>,
    pub boxes: Option<Vec<BBox>>,
    pub labels: Option<Vec<u32>>,
    pub masks: Option<Vec<Array2<u8>>>,
    pub warp_matrix: Transform2D,
}

impl Sample {
    pub fn new(image: Array3<u8>) -> Self {
        Sample {
            image,
            boxes: None,
            labels: None,
            masks: None,
            warp_matrix: Transform2D::identity(),
        }
    }
}

/// Composite shape transform: resize plus random perspective, scale,
/// stretch, rotation, shear, translate, and flip, applied consistently to
/// the image, its bounding boxes, and its instance masks.
pub struct ShapeTransform {
    config: WarpConfig,
}

impl ShapeTransform {
    pub fn new(config: WarpConfig) -> Self {
        ShapeTransform { config }
    }

    pub fn config(&self) -> &WarpConfig {
        &self.config
    }

    /// Warp one sample into `dst_shape` (width, height), writing back the
    /// new image, surviving boxes/labels, warped masks, and the applied
    /// matrix.
    ///
    /// When every box is filtered out after warping, the sample reverts to
    /// its original image, boxes, and labels with the identity matrix, and
    /// masks are left untouched so all three stay mutually consistent.
    pub fn apply<R: Rng>(
        &self,
        sample: &mut Sample,
        dst_shape: (u32, u32),
        rng: &mut R,
    ) -> Result<(), WarpError> {
        validate(sample)?;

        let (height, width) = {
            let shape = sample.image.shape();
            (shape[0] as u32, shape[1] as u32)
        };

        // Fixed composition order; each primitive premultiplies the running
        // composite so it acts on already-centered coordinates.
        let mut m = centering_matrix(width as f32, height as f32);
        m = perspective_matrix(self.config.perspective, rng) * m;
        m = scale_matrix(self.config.scale, rng) * m;
        m = stretch_matrix(self.config.stretch.0, self.config.stretch.1, rng) * m;
        m = rotation_matrix(self.config.rotation, rng) * m;
        m = shear_matrix(self.config.shear, rng) * m;
        m = flip_matrix(self.config.flip, rng) * m;
        m = translate_matrix(self.config.translate, width as f32, height as f32, rng) * m;

        let dst_shape = if self.config.keep_ratio {
            minimum_dst_shape((width, height), dst_shape, self.config.divisible)
        } else {
            dst_shape
        };
        m = resize_matrix((width, height), dst_shape, self.config.keep_ratio) * m;

        if !m.is_finite() {
            return Err(WarpError::NonFiniteTransform);
        }

        let mut image = warp_image(&sample.image, &m, dst_shape)?;
        let mut applied = m;
        let mut reverted = false;
        let mut annotation_update: Option<(Vec<BBox>, Vec<u32>)> = None;

        if let (Some(boxes), Some(labels)) = (&sample.boxes, &sample.labels) {
            let jittered = jitter_boxes(boxes, self.config.jitter_box, true, rng);
            let warped = warp_boxes(&jittered, &m, dst_shape.0 as f32, dst_shape.1 as f32)?;
            let (kept, kept_labels) = filter_boxes(
                &warped,
                labels,
                (dst_shape.0 as f32, dst_shape.1 as f32),
                DEFAULT_FILTER_MARGINS,
            )?;
            if kept.is_empty() {
                // A sample with no supervision signal is worse than an
                // unaugmented one.
                debug!("all boxes fell outside the destination frame, reverting to identity");
                image = sample.image.clone();
                applied = Transform2D::identity();
                reverted = true;
                annotation_update = Some((boxes.clone(), labels.clone()));
            } else {
                if rng.gen::<f32>() < self.config.hard_pos {
                    debug!("injecting occlusion around {} boxes", kept.len());
                    inject_occlusion(&mut image, &kept, self.config.hard_pos_ratio, rng);
                }
                annotation_update = Some((kept, kept_labels));
            }
        }

        if let Some((boxes, labels)) = annotation_update {
            sample.boxes = Some(boxes);
            sample.labels = Some(labels);
        }

        if !reverted {
            if let Some(masks) = &mut sample.masks {
                for mask in masks.iter_mut() {
                    *mask = warp_mask(mask, &applied, dst_shape)?;
                }
            }
        }

        sample.image = image;
        sample.warp_matrix = applied;
        Ok(())
    }
}

fn validate(sample: &Sample) -> Result<(), WarpError> {
    let shape = sample.image.shape();
    let (height, width) = (shape[0], shape[1]);
    if height == 0 || width == 0 {
        return Err(WarpError::EmptyImage { height, width });
    }
    let box_count = sample.boxes.as_ref().map_or(0, Vec::len);
    let label_count = sample.labels.as_ref().map_or(0, Vec::len);
    if sample.boxes.is_some() != sample.labels.is_some() || box_count != label_count {
        return Err(WarpError::MismatchedAnnotations {
            boxes: box_count,
            labels: label_count,
        });
    }
    if let (Some(masks), Some(boxes)) = (&sample.masks, &sample.boxes) {
        if masks.len() != boxes.len() {
            return Err(WarpError::MismatchedMasks {
                masks: masks.len(),
                boxes: boxes.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient_image(height: usize, width: usize) -> Array3<u8> {
        Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
            ((x * 5 + y * 3 + c) % 256) as u8
        })
    }

    #[test]
    fn test_minimum_dst_shape_binding_axis() {
        // Wide source into a square target: width binds, no constraint.
        assert_eq!(minimum_dst_shape((100, 50), (60, 60), 0), (60, 30));
        // Tall source: height binds.
        assert_eq!(minimum_dst_shape((50, 100), (60, 60), 0), (30, 60));
    }

    #[test]
    fn test_minimum_dst_shape_divisible_rounds_up() {
        let (w, h) = minimum_dst_shape((100, 50), (60, 60), 32);
        assert_eq!((w, h), (64, 32));
        assert_eq!(w % 32, 0);
        assert_eq!(h % 32, 0);
        // The floor is one divisible unit.
        assert_eq!(minimum_dst_shape((1000, 10), (64, 64), 32), (64, 32));
    }

    #[test]
    fn test_config_default_is_neutral() {
        let config = WarpConfig::default();
        assert_eq!(config.scale, (1.0, 1.0));
        assert_eq!(config.stretch, ((1.0, 1.0), (1.0, 1.0)));
        assert_eq!(config.flip, 0.0);
        assert!(!config.keep_ratio);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: WarpConfig =
            serde_json::from_str(r#"{"keep_ratio": true, "rotation": 10.0}"#).unwrap();
        assert!(config.keep_ratio);
        assert_eq!(config.rotation, 10.0);
        assert_eq!(config.scale, (1.0, 1.0));
        assert_eq!(config.divisible, 0);
    }

    #[test]
    fn test_empty_image_rejected() {
        let transform = ShapeTransform::new(WarpConfig::default());
        let mut sample = Sample::new(Array3::zeros((0, 10, 3)));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            transform.apply(&mut sample, (10, 10), &mut rng),
            Err(WarpError::EmptyImage { .. })
        ));
    }

    #[test]
    fn test_mismatched_annotations_rejected() {
        let transform = ShapeTransform::new(WarpConfig::default());
        let mut sample = Sample::new(gradient_image(10, 10));
        sample.boxes = Some(vec![(1.0, 1.0, 5.0, 5.0)]);
        sample.labels = Some(vec![0, 1]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            transform.apply(&mut sample, (10, 10), &mut rng),
            Err(WarpError::MismatchedAnnotations { boxes: 1, labels: 2 })
        ));
    }

    #[test]
    fn test_boxes_without_labels_rejected() {
        let transform = ShapeTransform::new(WarpConfig::default());
        let mut sample = Sample::new(gradient_image(10, 10));
        sample.boxes = Some(vec![(1.0, 1.0, 5.0, 5.0)]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            transform.apply(&mut sample, (10, 10), &mut rng),
            Err(WarpError::MismatchedAnnotations { .. })
        ));
    }

    #[test]
    fn test_mismatched_masks_rejected() {
        let transform = ShapeTransform::new(WarpConfig::default());
        let mut sample = Sample::new(gradient_image(10, 10));
        sample.boxes = Some(vec![(1.0, 1.0, 5.0, 5.0)]);
        sample.labels = Some(vec![0]);
        sample.masks = Some(vec![]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            transform.apply(&mut sample, (10, 10), &mut rng),
            Err(WarpError::MismatchedMasks { masks: 0, boxes: 1 })
        ));
    }

    #[test]
    fn test_keep_ratio_reshapes_output() {
        let config = WarpConfig {
            keep_ratio: true,
            divisible: 32,
            ..WarpConfig::default()
        };
        let transform = ShapeTransform::new(config);
        let mut sample = Sample::new(gradient_image(50, 100));
        let mut rng = StdRng::seed_from_u64(5);
        transform.apply(&mut sample, (60, 60), &mut rng).unwrap();
        assert_eq!(sample.image.shape(), &[32, 64, 3]);
        assert!(sample.warp_matrix.is_finite());
    }
}
