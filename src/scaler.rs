use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Nearest source column/row for every destination pixel
pub struct StretchLut {
    dst_w: usize,
    dst_h: usize,
    src_w: usize,
    cols: Vec<usize>,
    rows: Vec<usize>,
}

impl StretchLut {
    pub fn new(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> Self {
        Self {
            dst_w,
            dst_h,
            src_w,
            cols: nearest(dst_w, src_w),
            rows: nearest(dst_h, src_h),
        }
    }

    pub fn matches(&self, dst_w: usize, dst_h: usize) -> bool {
        self.dst_w == dst_w && self.dst_h == dst_h
    }
}

fn nearest(dst: usize, src: usize) -> Vec<usize> {
    if src == 0 {
        return vec![0; dst];
    }
    // Sample at pixel centres
    let step = src as f32 / dst as f32;
    (0..dst)
        .map(|d| (((d as f32 + 0.5) * step) as usize).min(src - 1))
        .collect()
}

/// Stretch `src` over the whole of `dst`, rows in parallel
pub fn blit_stretch(dst: &mut [u32], src: &[u32], lut: &StretchLut) {
    let sw = lut.src_w;
    if lut.dst_w == 0 {
        return;
    }
    dst.par_chunks_mut(lut.dst_w)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let Some(&sy) = lut.rows.get(y) else {
                return;
            };
            let src_row = &src[sy * sw..(sy + 1) * sw];
            for (d, &sx) in dst_row.iter_mut().zip(&lut.cols) {
                *d = src_row[sx];
            }
        });
}
