/// Chroma subsampling of a planar YUV frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chroma {
    C420,
    C422,
    C444,
    Mono,
}

impl Chroma {
    /// The `C` tag used in YUV4MPEG2 headers.
    pub fn tag(&self) -> &'static str {
        match self {
            Chroma::C420 => "420jpeg",
            Chroma::C422 => "422",
            Chroma::C444 => "444",
            Chroma::Mono => "mono",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let chroma = match tag {
            "420" | "420jpeg" | "420paldv" | "420mpeg2" => Chroma::C420,
            "422" => Chroma::C422,
            "444" => Chroma::C444,
            "mono" => Chroma::Mono,
            _ => return None,
        };
        Some(chroma)
    }

    /// Number of bytes of one frame with the given dimensions, or
    /// `None` if it does not fit in `usize`.
    pub fn frame_size(&self, width: usize, height: usize) -> Option<usize> {
        let luma = width.checked_mul(height)?;
        let half_w = width.div_ceil(2);
        let half_h = height.div_ceil(2);

        match self {
            Chroma::C420 => luma.checked_add(half_w.checked_mul(half_h)?.checked_mul(2)?),
            Chroma::C422 => luma.checked_add(half_w.checked_mul(height)?.checked_mul(2)?),
            Chroma::C444 => luma.checked_mul(3),
            Chroma::Mono => Some(luma),
        }
    }
}

/// A decoded frame in planar layout, luma plane first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub chroma: Chroma,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: usize, height: usize, chroma: Chroma, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            chroma,
            data,
        }
    }

    /// A mid-gray frame, handy for synthetic sources. Dimensions whose
    /// size overflows give an empty buffer.
    pub fn blank(width: usize, height: usize, chroma: Chroma) -> Self {
        let data = vec![128; chroma.frame_size(width, height).unwrap_or_default()];
        Self::new(width, height, chroma, data)
    }

    pub fn luma(&self) -> &[u8] {
        let len = self.width.saturating_mul(self.height).min(self.data.len());
        &self.data[..len]
    }

    /// Burns the stale marker into the luma plane: a filled white
    /// block near the top-left corner, clipped to the frame.
    pub fn burn_stale_marker(&mut self) {
        const MARGIN: usize = 8;
        const LUMA_MAX: u8 = 235;

        let block_w = (self.width / 8).max(1);
        let block_h = (self.height / 16).max(1);
        let x_end = (MARGIN + block_w).min(self.width);
        let y_end = (MARGIN + block_h).min(self.height);
        let luma_len = self.width.saturating_mul(self.height).min(self.data.len());

        for y in MARGIN.min(y_end)..y_end {
            let row = y.saturating_mul(self.width);
            for x in MARGIN.min(x_end)..x_end {
                let idx = row.saturating_add(x);
                if idx < luma_len {
                    self.data[idx] = LUMA_MAX;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_sizes_follow_subsampling() {
        assert_eq!(Chroma::C420.frame_size(4, 4), Some(24));
        assert_eq!(Chroma::C420.frame_size(3, 3), Some(9 + 2 * 4));
        assert_eq!(Chroma::C422.frame_size(4, 2), Some(8 + 2 * 4));
        assert_eq!(Chroma::C444.frame_size(2, 2), Some(12));
        assert_eq!(Chroma::Mono.frame_size(5, 5), Some(25));
    }

    #[test]
    fn oversized_frames_have_no_size() {
        assert_eq!(Chroma::Mono.frame_size(usize::MAX, 2), None);
        assert_eq!(Chroma::C444.frame_size(usize::MAX / 2, 1), None);
        assert_eq!(Chroma::C420.frame_size(usize::MAX, 1), None);
    }

    #[test]
    fn marker_only_touches_luma() {
        let mut frame = Frame::blank(64, 64, Chroma::C420);
        frame.burn_stale_marker();

        assert_eq!(frame.luma()[8 * 64 + 8], 235);
        assert_eq!(frame.luma()[0], 128);
        assert!(frame.data[64 * 64..].iter().all(|&b| b == 128));
    }

    #[test]
    fn marker_is_clipped_on_tiny_frames() {
        let mut frame = Frame::blank(4, 4, Chroma::Mono);
        frame.burn_stale_marker();
        assert!(frame.data.iter().all(|&b| b == 128));
    }
}
