//! Shape-transform augmentation for training object detectors.
//!
//! The pipeline composes independent randomized 2D projective primitives
//! (perspective, scale, stretch, rotation, shear, flip, translate, resize)
//! into a single homography and applies it consistently to the image raster,
//! the bounding boxes, and the instance masks of one sample:
//!
//! ```
//! use ndarray::Array3;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use shape_warp::{Sample, ShapeTransform, WarpConfig};
//!
//! let config = WarpConfig {
//!     scale: (0.8, 1.2),
//!     rotation: 15.0,
//!     flip: 0.5,
//!     ..WarpConfig::default()
//! };
//! let transform = ShapeTransform::new(config);
//!
//! let mut sample = Sample::new(Array3::zeros((480, 640, 3)));
//! sample.boxes = Some(vec![(100.0, 100.0, 300.0, 250.0)]);
//! sample.labels = Some(vec![0]);
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! transform.apply(&mut sample, (320, 320), &mut rng).unwrap();
//! assert_eq!(&sample.image.shape()[..2], &[320, 320]);
//! ```
//!
//! Randomness is threaded through an explicit caller-supplied [`rand::Rng`],
//! so seeded runs are reproducible and independent samples can be processed
//! from parallel workers without shared state.

pub mod boxes;
pub mod error;
pub mod matrix;
pub mod occlusion;
pub mod raster;
pub mod transform;

#[cfg(feature = "python")]
mod python;

pub use crate::boxes::{
    clip_bbox, filter_boxes, jitter_boxes, warp_boxes, BBox, DEFAULT_FILTER_MARGINS,
};
pub use crate::error::WarpError;
pub use crate::matrix::{Transform2D, PROJECTIVE_EPS};
pub use crate::occlusion::inject_occlusion;
pub use crate::raster::{warp_image, warp_mask};
pub use crate::transform::{minimum_dst_shape, Sample, ShapeTransform, WarpConfig};
