use thiserror::Error;

/// Which per-corner attribute a face index points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Position,
    Normal,
    TexCoord,
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Attribute::Position => "position",
            Attribute::Normal => "normal",
            Attribute::TexCoord => "texture coordinate",
        };
        return f.write_str(name);
    }
}

/// Errors of the rendering core and its mesh/presentation collaborators.
///
/// Integration errors (malformed buffers, bad face indices) are raised at setup.
/// Numerical edge cases are never errors, they are skipped inside the pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("vertex buffer holds {len} entries, which is not a multiple of 3 (position, normal, texcoord)")]
    MalformedVertexBuffer { len: usize },

    #[error("vertex buffer holds {corners} corners, which can't be grouped into triangles")]
    PartialTriangle { corners: usize },

    #[error("transformed vertex stream holds {len} vertices, which can't be grouped into triangles")]
    PartialPrimitive { len: usize },

    #[error("face {face} references {attribute} index {index}, but only {len} are available")]
    IndexOutOfRange {
        face: usize,
        attribute: Attribute,
        index: usize,
        len: usize,
    },

    #[error("framebuffer must have a non-zero size, got {width}x{height}")]
    EmptyFramebuffer { width: u32, height: u32 },

    #[error("{len} bytes of rgb8 data do not fit a {width}x{height} image")]
    ImageSize { width: u32, height: u32, len: usize },

    #[error("failed to parse obj file: {0}")]
    Obj(#[from] obj::ObjError),

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
