use crate::error::WarpError;
use crate::matrix::Transform2D;
use rand::Rng;

/// Bounding box represented as (x_min, y_min, x_max, y_max)
pub type BBox = (f32, f32, f32, f32);

/// Per-side margins used by [`filter_boxes`], as
/// `[min_x, min_y, max_x, max_y]` tolerances in pixels.
pub const DEFAULT_FILTER_MARGINS: [f32; 4] = [10.0, 10.0, 10.0, 10.0];

/// Clip bounding box coordinates to `[0, width] x [0, height]`.
pub fn clip_bbox(bbox: BBox, width: f32, height: f32) -> BBox {
    let (x_min, y_min, x_max, y_max) = bbox;
    (
        x_min.clamp(0.0, width),
        y_min.clamp(0.0, height),
        x_max.clamp(0.0, width),
        y_max.clamp(0.0, height),
    )
}

/// Perturb each box edge independently by a multiplicative factor
/// `1 + U(lower, ratio)` where `lower` is `-ratio` when `allow_shrink` is
/// set and `0` otherwise, so boxes can always grow but only shrink on
/// request. Centers are unchanged; box order (and therefore the box/label
/// index alignment) is preserved.
pub fn jitter_boxes<R: Rng>(
    boxes: &[BBox],
    ratio: f32,
    allow_shrink: bool,
    rng: &mut R,
) -> Vec<BBox> {
    if ratio == 0.0 {
        return boxes.to_vec();
    }
    let lower = if allow_shrink { -ratio } else { 0.0 };
    boxes
        .iter()
        .map(|&(x_min, y_min, x_max, y_max)| {
            let width = x_max - x_min;
            let height = y_max - y_min;
            let x_center = x_min + width / 2.0;
            let y_center = y_min + height / 2.0;
            // One factor per edge: top, left, bottom, right.
            let top = 1.0 + rng.gen_range(lower..=ratio);
            let left = 1.0 + rng.gen_range(lower..=ratio);
            let bottom = 1.0 + rng.gen_range(lower..=ratio);
            let right = 1.0 + rng.gen_range(lower..=ratio);
            (
                x_center - width * left / 2.0,
                y_center - height * top / 2.0,
                x_center + width * right / 2.0,
                y_center + height * bottom / 2.0,
            )
        })
        .collect()
}

/// Warp axis-aligned boxes through a homography.
///
/// Each box contributes its four corners in the order
/// `(x1,y1), (x2,y2), (x1,y2), (x2,y1)`; the corners go through the
/// transform and the projective divide, and the new box is the axis-aligned
/// hull of the results, clipped to `[0, width] x [0, height]`. Rotation,
/// shear, and perspective turn an axis-aligned box into a general
/// quadrilateral, so the 4-corner hull is the conservative enclosure; a
/// 2-point transform would under-cover.
///
/// An empty slice is a no-op. A degenerate projective divide at any corner
/// fails the whole call.
pub fn warp_boxes(
    boxes: &[BBox],
    transform: &Transform2D,
    width: f32,
    height: f32,
) -> Result<Vec<BBox>, WarpError> {
    let mut warped = Vec::with_capacity(boxes.len());
    for &(x1, y1, x2, y2) in boxes {
        let corners = [(x1, y1), (x2, y2), (x1, y2), (x2, y1)];
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for (cx, cy) in corners {
            let (px, py) = transform
                .transform_point(cx, cy)
                .ok_or(WarpError::DegenerateProjection { x: cx, y: cy })?;
            min_x = min_x.min(px);
            min_y = min_y.min(py);
            max_x = max_x.max(px);
            max_y = max_y.max(py);
        }
        warped.push(clip_bbox((min_x, min_y, max_x, max_y), width, height));
    }
    Ok(warped)
}

/// Drop boxes pushed entirely (within the margin tolerances) outside the
/// destination frame, together with their labels.
///
/// A box survives unless its near edge has crossed past the far frame border
/// minus the margin, or its far edge falls short of the margin. Survivors
/// keep their relative order and box/label alignment.
pub fn filter_boxes(
    boxes: &[BBox],
    labels: &[u32],
    dst_shape: (f32, f32),
    margins: [f32; 4],
) -> Result<(Vec<BBox>, Vec<u32>), WarpError> {
    if boxes.len() != labels.len() {
        return Err(WarpError::MismatchedAnnotations {
            boxes: boxes.len(),
            labels: labels.len(),
        });
    }
    let [min_x, min_y, margin_x, margin_y] = margins;
    let max_x = dst_shape.0 - margin_x;
    let max_y = dst_shape.1 - margin_y;

    let mut kept_boxes = Vec::with_capacity(boxes.len());
    let mut kept_labels = Vec::with_capacity(labels.len());
    for (&bbox, &label) in boxes.iter().zip(labels) {
        let (x1, y1, x2, y2) = bbox;
        if x1 > max_x || y1 > max_y || x2 < min_x || y2 < min_y {
            continue;
        }
        kept_boxes.push(bbox);
        kept_labels.push(label);
    }
    Ok((kept_boxes, kept_labels))
}
