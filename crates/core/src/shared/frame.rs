use ndarray::{ArrayView3, ArrayViewMut3};

/// A single captured video frame: contiguous pixel bytes in row-major order.
///
/// Capture adapters convert to RGB at the I/O boundary; the pipeline never
/// sees device pixel formats.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Solid-color RGB frame.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 3)
            .collect();
        Self::new(data, width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Returns an independent copy resampled to `width` × `height`.
    ///
    /// RGB frames use a triangle filter; other layouts fall back to
    /// nearest-neighbor sampling over the raw channels.
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width && height == self.height {
            return self.clone();
        }

        if self.channels == 3 {
            if let Some(img) =
                image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            {
                let out = image::imageops::resize(
                    &img,
                    width,
                    height,
                    image::imageops::FilterType::Triangle,
                );
                return Frame::new(out.into_raw(), width, height, 3, self.index);
            }
        }

        let src = self.as_ndarray();
        let channels = self.channels as usize;
        let sx = self.width as f64 / width as f64;
        let sy = self.height as f64 / height as f64;
        let mut data = Vec::with_capacity(width as usize * height as usize * channels);
        for y in 0..height as usize {
            let src_y = ((y as f64 * sy) as usize).min(self.height as usize - 1);
            for x in 0..width as usize {
                let src_x = ((x as f64 * sx) as usize).min(self.width as usize - 1);
                for c in 0..channels {
                    data.push(src[[src_y, src_x, c]]);
                }
            }
        }
        Frame::new(data, width, height, self.channels, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
