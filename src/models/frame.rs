use image::RgbaImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Intermediate denoising result paired with the masked conditioning
    /// image, for live progress display.
    Progress,
    /// The single terminal pair: original source on the left, composited and
    /// stamped output on the right.
    Final,
}

/// One element of the generation stream, rendered by consumers as a
/// left/right comparison pair.
#[derive(Debug, Clone)]
pub struct FramePair {
    pub left: RgbaImage,
    pub right: RgbaImage,
    pub kind: FrameKind,
}

impl FramePair {
    pub fn progress(intermediate: RgbaImage, conditioning: RgbaImage) -> Self {
        FramePair {
            left: intermediate,
            right: conditioning,
            kind: FrameKind::Progress,
        }
    }

    pub fn terminal(source: RgbaImage, output: RgbaImage) -> Self {
        FramePair {
            left: source,
            right: output,
            kind: FrameKind::Final,
        }
    }

    pub fn is_final(&self) -> bool {
        self.kind == FrameKind::Final
    }
}
