//! RGB rasters with channel values in `[0, 1]`.

/// Row-major interleaved RGB raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbRaster {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl RgbRaster {
    /// Create a black raster.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, [0.0, 0.0, 0.0])
    }

    /// Create a raster with every pixel set to `rgb`.
    pub fn filled(width: usize, height: usize, rgb: [f64; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Pure white square tile, used in place of tiles that failed to load.
    pub fn white(tile_size: usize) -> Self {
        Self::filled(tile_size, tile_size, [1.0, 1.0, 1.0])
    }

    /// Wrap existing interleaved RGB data.
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != width * height * 3 {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Convert 8-bit RGB bytes to a `[0, 1]` raster.
    pub fn from_rgb8(width: usize, height: usize, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != width * height * 3 {
            return None;
        }
        let data = bytes.iter().map(|&b| b as f64 / 255.0).collect();
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// (width, height)
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> [f64; 3] {
        let idx = (row * self.width + col) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    #[inline]
    pub fn set_pixel(&mut self, row: usize, col: usize, rgb: [f64; 3]) {
        let idx = (row * self.width + col) * 3;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    /// Copy `src` into this raster with its top-left corner at (`row`, `col`).
    ///
    /// Parts of `src` falling outside this raster are dropped.
    pub fn blit(&mut self, src: &RgbRaster, row: usize, col: usize) {
        if row >= self.height || col >= self.width {
            return;
        }
        let copy_w = src.width.min(self.width - col);
        let copy_h = src.height.min(self.height - row);

        for r in 0..copy_h {
            let src_start = r * src.width * 3;
            let dst_start = ((row + r) * self.width + col) * 3;
            self.data[dst_start..dst_start + copy_w * 3]
                .copy_from_slice(&src.data[src_start..src_start + copy_w * 3]);
        }
    }

    /// Extract a sub-raster. The region must lie inside this raster.
    pub fn crop(&self, row: usize, col: usize, width: usize, height: usize) -> RgbRaster {
        let mut out = RgbRaster::new(width, height);
        for r in 0..height {
            let src_start = ((row + r) * self.width + col) * 3;
            let dst_start = r * width * 3;
            out.data[dst_start..dst_start + width * 3]
                .copy_from_slice(&self.data[src_start..src_start + width * 3]);
        }
        out
    }

    /// Quantize to 8-bit RGB, clamping out-of-range values.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }
}
