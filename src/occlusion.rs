use crate::boxes::{clip_bbox, jitter_boxes, BBox};
use ndarray::{s, Array2, Array3};
use rand::Rng;

/// Hard-positive occlusion injection: zero every pixel not covered by an
/// enlarged ground-truth box, forcing the detector to rely on near-object
/// context.
///
/// Each box is grown by [`jitter_boxes`] with shrinking disabled, clipped to
/// the image bounds, and rasterized into a keep-mask; the image is then
/// multiplied by that mask in place.
pub fn inject_occlusion<R: Rng>(
    image: &mut Array3<u8>,
    boxes: &[BBox],
    grow_ratio: f32,
    rng: &mut R,
) {
    let (height, width) = {
        let shape = image.shape();
        (shape[0], shape[1])
    };
    let mut keep = Array2::<u8>::zeros((height, width));
    for bbox in jitter_boxes(boxes, grow_ratio, false, rng) {
        let (x1, y1, x2, y2) = clip_bbox(bbox, width as f32, height as f32);
        let (x1, y1) = (x1 as usize, y1 as usize);
        let (x2, y2) = (x2 as usize, y2 as usize);
        if x2 > x1 && y2 > y1 {
            keep.slice_mut(s![y1..y2, x1..x2]).fill(1);
        }
    }
    for ((y, x, _), value) in image.indexed_iter_mut() {
        if keep[[y, x]] == 0 {
            *value = 0;
        }
    }
}
