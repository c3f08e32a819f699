use crate::error::WarpError;
use crate::matrix::Transform2D;
use ndarray::{Array2, Array3};

/// Projective warp of an HWC `u8` image into a `(width, height)` destination.
///
/// Destination pixels are mapped back through the inverse transform and
/// bilinearly sampled from the source; anything falling outside the source
/// (or hitting a degenerate projective divide) stays at the zero border.
pub fn warp_image(
    src: &Array3<u8>,
    transform: &Transform2D,
    dst_shape: (u32, u32),
) -> Result<Array3<u8>, WarpError> {
    let inverse = transform
        .invert()
        .ok_or(WarpError::NonInvertibleTransform)?;
    let (src_h, src_w, channels) = {
        let s = src.shape();
        (s[0] as isize, s[1] as isize, s[2])
    };
    let (dst_w, dst_h) = (dst_shape.0 as usize, dst_shape.1 as usize);
    let mut dst = Array3::<u8>::zeros((dst_h, dst_w, channels));

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let Some((sx, sy)) = inverse.transform_point(dx as f32, dy as f32) else {
                continue;
            };
            if sx <= -1.0 || sy <= -1.0 || sx >= src_w as f32 || sy >= src_h as f32 {
                continue;
            }
            let x0 = sx.floor();
            let y0 = sy.floor();
            let fx = sx - x0;
            let fy = sy - y0;
            let (x0, y0) = (x0 as isize, y0 as isize);
            for c in 0..channels {
                let fetch = |yy: isize, xx: isize| -> f32 {
                    if yy >= 0 && yy < src_h && xx >= 0 && xx < src_w {
                        src[[yy as usize, xx as usize, c]] as f32
                    } else {
                        0.0
                    }
                };
                let value = (1.0 - fx) * (1.0 - fy) * fetch(y0, x0)
                    + fx * (1.0 - fy) * fetch(y0, x0 + 1)
                    + (1.0 - fx) * fy * fetch(y0 + 1, x0)
                    + fx * fy * fetch(y0 + 1, x0 + 1);
                dst[[dy, dx, c]] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(dst)
}

/// Projective warp of a single-channel mask, same mapping as [`warp_image`].
pub fn warp_mask(
    src: &Array2<u8>,
    transform: &Transform2D,
    dst_shape: (u32, u32),
) -> Result<Array2<u8>, WarpError> {
    let inverse = transform
        .invert()
        .ok_or(WarpError::NonInvertibleTransform)?;
    let (src_h, src_w) = {
        let s = src.shape();
        (s[0] as isize, s[1] as isize)
    };
    let (dst_w, dst_h) = (dst_shape.0 as usize, dst_shape.1 as usize);
    let mut dst = Array2::<u8>::zeros((dst_h, dst_w));

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let Some((sx, sy)) = inverse.transform_point(dx as f32, dy as f32) else {
                continue;
            };
            if sx <= -1.0 || sy <= -1.0 || sx >= src_w as f32 || sy >= src_h as f32 {
                continue;
            }
            let x0 = sx.floor();
            let y0 = sy.floor();
            let fx = sx - x0;
            let fy = sy - y0;
            let (x0, y0) = (x0 as isize, y0 as isize);
            let fetch = |yy: isize, xx: isize| -> f32 {
                if yy >= 0 && yy < src_h && xx >= 0 && xx < src_w {
                    src[[yy as usize, xx as usize]] as f32
                } else {
                    0.0
                }
            };
            let value = (1.0 - fx) * (1.0 - fy) * fetch(y0, x0)
                + fx * (1.0 - fy) * fetch(y0, x0 + 1)
                + (1.0 - fx) * fy * fetch(y0 + 1, x0)
                + fx * fy * fetch(y0 + 1, x0 + 1);
            dst[[dy, dx]] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(dst)
}
