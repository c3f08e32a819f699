use thiserror::Error;

/// Errors raised while warping a sample.
///
/// The one data-dependent failure mode of the pipeline (every box filtered
/// out after warping) is not an error; it is handled by the identity
/// fallback in [`crate::ShapeTransform::apply`].
#[derive(Debug, Error)]
pub enum WarpError {
    /// Image raster has a zero dimension.
    #[error("image must be non-empty, got {height}x{width}")]
    EmptyImage { height: usize, width: usize },

    /// Box and label collections are not index-aligned.
    #[error("box/label counts differ: {boxes} boxes vs {labels} labels")]
    MismatchedAnnotations { boxes: usize, labels: usize },

    /// Mask collection is not aligned 1:1 with the box collection.
    #[error("mask count {masks} does not match box count {boxes}")]
    MismatchedMasks { masks: usize, boxes: usize },

    /// A composed transform picked up a NaN or infinite entry.
    #[error("composite transform contains non-finite entries")]
    NonFiniteTransform,

    /// The composite transform cannot be inverted for raster warping.
    #[error("composite transform is not invertible")]
    NonInvertibleTransform,

    /// The projective divide degenerated while warping a box corner.
    #[error("projective divide degenerated at point ({x}, {y})")]
    DegenerateProjection { x: f32, y: f32 },
}
