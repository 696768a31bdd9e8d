//! Planar to pixel-interleaved sample rearrangement.
//!
//! Channel data comes out of storage planar (`[channel][z][y][x]`); TIFF
//! pages want every channel of a pixel adjacent (`[z][y][x][channel]`).
//! The buffers here own their samples and compute offsets through checked
//! accessors instead of bare pointer walking.

use crate::convert_pipeline::ims::types::VolumeDims;

/// Channel-major sample storage for one timepoint: all samples of one
/// channel contiguous, channel blocks concatenated.
pub struct PlanarVolume {
    dims: VolumeDims,
    channels: usize,
    data: Vec<u16>,
}

impl PlanarVolume {
    pub fn new(dims: VolumeDims, channels: usize) -> Self {
        Self {
            dims,
            channels,
            data: vec![0; dims.voxels() * channels],
        }
    }

    pub fn dims(&self) -> VolumeDims {
        self.dims
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// One channel's `[z][y][x]` block, for the reader to fill.
    pub fn channel_mut(&mut self, channel: usize) -> &mut [u16] {
        debug_assert!(channel < self.channels);
        let len = self.dims.voxels();
        &mut self.data[channel * len..(channel + 1) * len]
    }

    pub fn samples(&self) -> &[u16] {
        &self.data
    }
}

/// Pixel-interleaved sample storage: `[z][y][x][channel]`, one raster page
/// per depth index.
pub struct InterleavedBlock {
    xs: usize,
    ys: usize,
    depth: usize,
    channels: usize,
    data: Vec<u16>,
}

impl InterleavedBlock {
    pub fn new(xs: usize, ys: usize, depth: usize, channels: usize) -> Self {
        Self {
            xs,
            ys,
            depth,
            channels,
            data: vec![0; xs * ys * depth * channels],
        }
    }

    fn from_raw(xs: usize, ys: usize, depth: usize, channels: usize, data: Vec<u16>) -> Self {
        debug_assert_eq!(data.len(), xs * ys * depth * channels);
        Self {
            xs,
            ys,
            depth,
            channels,
            data,
        }
    }

    #[inline]
    fn index(&self, z: usize, y: usize, x: usize, c: usize) -> usize {
        debug_assert!(z < self.depth && y < self.ys && x < self.xs && c < self.channels);
        ((z * self.ys + y) * self.xs + x) * self.channels + c
    }

    #[inline]
    pub fn at(&self, z: usize, y: usize, x: usize, c: usize) -> u16 {
        self.data[self.index(z, y, x, c)]
    }

    #[inline]
    pub fn set(&mut self, z: usize, y: usize, x: usize, c: usize, value: u16) {
        let i = self.index(z, y, x, c);
        self.data[i] = value;
    }

    /// One finished `[y][x][channel]` page.
    pub fn page(&self, z: usize) -> &[u16] {
        let len = self.xs * self.ys * self.channels;
        &self.data[z * len..(z + 1) * len]
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Rearranges a whole planar volume into pixel-interleaved order.
///
/// For every depth, pixel, and channel, the sample at planar offset
/// `c*(xs*ys*zs) + z*(xs*ys) + y*xs + x` lands at interleaved offset
/// `z*(xs*ys*C) + (y*xs + x)*C + c`. A full gather with no shortcuts; the
/// three-channel case takes an unrolled path.
pub fn interleave(planar: &PlanarVolume) -> InterleavedBlock {
    let dims = planar.dims();
    let channels = planar.channels();
    if channels == 3 {
        return interleave_3chan(planar);
    }

    let chan_len = dims.voxels();
    let plane = dims.plane();
    let src = planar.samples();

    let mut data = Vec::with_capacity(chan_len * channels);
    for z in 0..dims.z {
        let slice_base = z * plane;
        for i in 0..plane {
            for c in 0..channels {
                data.push(src[c * chan_len + slice_base + i]);
            }
        }
    }

    InterleavedBlock::from_raw(dims.x, dims.y, dims.z, channels, data)
}

/// Unrolled copy for the RGB-shaped case.
fn interleave_3chan(planar: &PlanarVolume) -> InterleavedBlock {
    let dims = planar.dims();
    debug_assert_eq!(planar.channels(), 3);

    let chan_len = dims.voxels();
    let plane = dims.plane();
    let src = planar.samples();
    let (red, rest) = src.split_at(chan_len);
    let (green, blue) = rest.split_at(chan_len);

    let mut data = Vec::with_capacity(chan_len * 3);
    for z in 0..dims.z {
        let slice_base = z * plane;
        for i in 0..plane {
            data.push(red[slice_base + i]);
            data.push(green[slice_base + i]);
            data.push(blue[slice_base + i]);
        }
    }

    InterleavedBlock::from_raw(dims.x, dims.y, dims.z, 3, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_planar(dims: VolumeDims, channels: usize) -> PlanarVolume {
        let mut planar = PlanarVolume::new(dims, channels);
        // Small multiplicative hash keeps neighboring samples distinct.
        for (i, sample) in planar.data.iter_mut().enumerate() {
            *sample = (i.wrapping_mul(2654435761) >> 16) as u16;
        }
        planar
    }

    fn planar_at(planar: &PlanarVolume, z: usize, y: usize, x: usize, c: usize) -> u16 {
        let dims = planar.dims();
        planar.samples()[c * dims.voxels() + z * dims.plane() + y * dims.x + x]
    }

    #[test]
    fn matches_offset_formula_for_varied_shapes() {
        for (x, y, z, channels) in [
            (1, 1, 1, 1),
            (3, 2, 4, 2),
            (5, 3, 2, 4),
            (4, 4, 2, 3),
            (7, 1, 3, 5),
        ] {
            let dims = VolumeDims::new(x, y, z);
            let planar = filled_planar(dims, channels);
            let block = interleave(&planar);

            for z in 0..dims.z {
                for y in 0..dims.y {
                    for x in 0..dims.x {
                        for c in 0..channels {
                            assert_eq!(
                                block.at(z, y, x, c),
                                planar_at(&planar, z, y, x, c),
                                "mismatch at ({x},{y},{z},{c}) for {channels} channels"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn two_channel_pages_follow_source_pattern() {
        let dims = VolumeDims::new(4, 4, 2);
        let mut planar = PlanarVolume::new(dims, 2);
        for z in 0..2 {
            for y in 0..4 {
                for x in 0..4 {
                    let value = (10 * z + 4 * y + x) as u16;
                    planar.channel_mut(0)[z * 16 + y * 4 + x] = value;
                    planar.channel_mut(1)[z * 16 + y * 4 + x] = 1000 + value;
                }
            }
        }

        let block = interleave(&planar);

        // First page, pixel (1,1).
        assert_eq!(block.at(0, 1, 1, 0), 5);
        assert_eq!(block.at(0, 1, 1, 1), 1005);
        // Second page, pixel (0,0).
        assert_eq!(block.at(1, 0, 0, 0), 10);
        assert_eq!(block.at(1, 0, 0, 1), 1010);

        // Page slices expose the same samples in `[y][x][channel]` order.
        let page = block.page(1);
        assert_eq!(page[0], 10);
        assert_eq!(page[1], 1010);
    }

    #[test]
    fn page_slices_are_channel_minor() {
        let dims = VolumeDims::new(2, 2, 2);
        let planar = filled_planar(dims, 4);
        let block = interleave(&planar);

        for z in 0..2 {
            let page = block.page(z);
            for y in 0..2 {
                for x in 0..2 {
                    for c in 0..4 {
                        assert_eq!(page[(y * 2 + x) * 4 + c], block.at(z, y, x, c));
                    }
                }
            }
        }
    }
}
