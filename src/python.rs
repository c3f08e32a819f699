//! Python bindings exposing the shape transform over numpy arrays.
//!
//! Built only with the `python` cargo feature.

use crate::boxes::BBox;
use crate::transform::{Sample, ShapeTransform, WarpConfig};
use ndarray::Array2;
use numpy::{
    IntoPyArray, PyArray1, PyArray2, PyArray3, PyReadonlyArray1, PyReadonlyArray2,
    PyReadonlyArray3, PyUntypedArrayMethods,
};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use rand::thread_rng;

/// Python module for shape-transform augmentation
#[pymodule]
fn shape_warp(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ShapeTransformPy>()?;
    Ok(())
}

type ApplyOutput = (
    Py<PyArray3<u8>>,
    Option<Py<PyArray2<f32>>>,
    Option<Py<PyArray1<u32>>>,
    Option<Vec<Py<PyArray2<u8>>>>,
    Py<PyArray2<f32>>,
);

/// Composite random shape transform over one training sample.
#[pyclass(name = "ShapeTransform")]
pub struct ShapeTransformPy {
    inner: ShapeTransform,
}

#[pymethods]
impl ShapeTransformPy {
    #[new]
    #[allow(clippy::too_many_arguments)]
    #[pyo3(signature = (
        keep_ratio,
        divisible = 0,
        perspective = 0.0,
        scale = (1.0, 1.0),
        stretch = ((1.0, 1.0), (1.0, 1.0)),
        rotation = 0.0,
        shear = 0.0,
        translate = 0.0,
        flip = 0.0,
        jitter_box = 0.0,
        hard_pos = 0.0,
        hard_pos_ratio = 0.0,
    ))]
    fn new(
        keep_ratio: bool,
        divisible: u32,
        perspective: f32,
        scale: (f32, f32),
        stretch: ((f32, f32), (f32, f32)),
        rotation: f32,
        shear: f32,
        translate: f32,
        flip: f32,
        jitter_box: f32,
        hard_pos: f32,
        hard_pos_ratio: f32,
    ) -> Self {
        ShapeTransformPy {
            inner: ShapeTransform::new(WarpConfig {
                keep_ratio,
                divisible,
                perspective,
                scale,
                stretch,
                rotation,
                shear,
                translate,
                flip,
                jitter_box,
                hard_pos,
                hard_pos_ratio,
            }),
        }
    }

    /// Warp one sample into (dst_width, dst_height).
    ///
    /// `image` is HWC uint8, `boxes` is an N x 4 float32 array of
    /// (x_min, y_min, x_max, y_max), `labels` an N-element uint32 array, and
    /// `masks` a list of HW uint8 arrays aligned with `boxes`. Returns the
    /// warped image, surviving boxes/labels, warped masks, and the 3x3
    /// matrix actually applied.
    #[allow(clippy::needless_pass_by_value)]
    #[pyo3(signature = (image, dst_width, dst_height, boxes=None, labels=None, masks=None))]
    fn apply(
        &self,
        py: Python<'_>,
        image: PyReadonlyArray3<u8>,
        dst_width: u32,
        dst_height: u32,
        boxes: Option<PyReadonlyArray2<f32>>,
        labels: Option<PyReadonlyArray1<u32>>,
        masks: Option<Vec<PyReadonlyArray2<u8>>>,
    ) -> PyResult<ApplyOutput> {
        let mut sample = Sample::new(image.as_array().to_owned());

        if let Some(boxes) = &boxes {
            let shape = boxes.shape();
            if shape[1] != 4 {
                return Err(PyValueError::new_err(format!(
                    "boxes must have shape (N, 4), got (N, {})",
                    shape[1]
                )));
            }
            let array = boxes.as_array();
            let parsed: Vec<BBox> = array
                .outer_iter()
                .map(|row| (row[0], row[1], row[2], row[3]))
                .collect();
            sample.boxes = Some(parsed);
        }
        if let Some(labels) = &labels {
            sample.labels = Some(labels.as_array().to_vec());
        }
        if let Some(masks) = &masks {
            sample.masks = Some(masks.iter().map(|m| m.as_array().to_owned()).collect());
        }

        let transform = &self.inner;
        let sample = py.allow_threads(move || {
            let mut rng = thread_rng();
            transform
                .apply(&mut sample, (dst_width, dst_height), &mut rng)
                .map(|()| sample)
        });
        let sample = sample.map_err(|e| PyValueError::new_err(e.to_string()))?;

        let out_boxes = match &sample.boxes {
            Some(boxes) => {
                let flat: Vec<f32> = boxes
                    .iter()
                    .flat_map(|&(x1, y1, x2, y2)| [x1, y1, x2, y2])
                    .collect();
                let array = Array2::from_shape_vec((boxes.len(), 4), flat)
                    .map_err(|e| PyValueError::new_err(e.to_string()))?;
                Some(array.into_pyarray_bound(py).unbind())
            }
            None => None,
        };
        let out_labels = sample
            .labels
            .as_ref()
            .map(|labels| PyArray1::from_slice_bound(py, labels).unbind());
        let out_masks = sample.masks.map(|masks| {
            masks
                .into_iter()
                .map(|m| m.into_pyarray_bound(py).unbind())
                .collect()
        });

        let m = sample.warp_matrix.matrix();
        let matrix = Array2::from_shape_fn((3, 3), |(i, j)| m[(i, j)]);

        Ok((
            sample.image.into_pyarray_bound(py).unbind(),
            out_boxes,
            out_labels,
            out_masks,
            matrix.into_pyarray_bound(py).unbind(),
        ))
    }
}
