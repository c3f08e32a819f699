//! Common test utilities for integration tests
//! Provides helpers for generating synthetic samples with aligned boxes,
//! labels, and masks.

use ndarray::{s, Array2, Array3};
use shape_warp::{BBox, Sample};

/// Distinct BGR fill colors, cycled per object.
const COLORS: [(u8, u8, u8); 6] = [
    (255, 0, 0),
    (0, 255, 0),
    (0, 0, 255),
    (255, 255, 0),
    (255, 0, 255),
    (0, 255, 255),
];

/// Generate a synthetic sample with `num_objects` filled rectangles on a
/// gray background, each with an aligned box, label, and instance mask.
///
/// Objects sit on a grid, inset by a quarter cell on every side, so they
/// stay clear of the 10 px filter margins for images of 64 px and up.
pub fn sample_with_objects(num_objects: usize, width: usize, height: usize) -> Sample {
    let mut image = Array3::from_elem((height, width, 3), 128u8);
    let mut boxes: Vec<BBox> = Vec::new();
    let mut labels: Vec<u32> = Vec::new();
    let mut masks: Vec<Array2<u8>> = Vec::new();

    let cols = num_objects.clamp(1, 3);
    let rows = num_objects.div_ceil(cols).max(1);
    let cell_w = width / cols;
    let cell_h = height / rows;

    for i in 0..num_objects {
        let col = i % cols;
        let row = i / cols;
        let x1 = col * cell_w + cell_w / 4;
        let y1 = row * cell_h + cell_h / 4;
        let x2 = x1 + cell_w / 2;
        let y2 = y1 + cell_h / 2;

        let (b, g, r) = COLORS[i % COLORS.len()];
        image.slice_mut(s![y1..y2, x1..x2, 0]).fill(b);
        image.slice_mut(s![y1..y2, x1..x2, 1]).fill(g);
        image.slice_mut(s![y1..y2, x1..x2, 2]).fill(r);

        let mut mask = Array2::<u8>::zeros((height, width));
        mask.slice_mut(s![y1..y2, x1..x2]).fill(255);

        boxes.push((x1 as f32, y1 as f32, x2 as f32, y2 as f32));
        labels.push(i as u32);
        masks.push(mask);
    }

    let mut sample = Sample::new(image);
    sample.boxes = Some(boxes);
    sample.labels = Some(labels);
    sample.masks = Some(masks);
    sample
}

/// Plain gray image sample with no annotations.
pub fn plain_sample(width: usize, height: usize) -> Sample {
    Sample::new(Array3::from_elem((height, width, 3), 128u8))
}
