//! CPU-side vertex attribute streams produced by the OBJ parser.

/// Normal given to vertices that have none.
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];
/// Texture coordinate given to vertices that have none.
pub const DEFAULT_TEXCOORD: [f32; 2] = [0.0, 0.0];

/// Parallel flat attribute arrays of one geometry, in non-indexed
/// triangle-list order. Empty arrays mean the attribute is absent; a
/// non-empty `normal` or `texcoord` stream covers every vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexStreams {
    /// `[x, y, z, ...]`
    pub position: Vec<f32>,
    /// `[nx, ny, nz, ...]`
    pub normal: Vec<f32>,
    /// `[u, v, ...]`
    pub texcoord: Vec<f32>,
    /// `[r, g, b, ...]`
    pub color: Vec<f32>,
}

impl VertexStreams {
    pub fn vertex_count(&self) -> usize {
        self.position.len() / 3
    }

    /// True when every vertex carries its own colour.
    pub fn has_vertex_colors(&self) -> bool {
        !self.color.is_empty() && self.color.len() == self.position.len()
    }
}

/// Where a part's colour attribute comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorSource {
    /// `components` floats per vertex, one entry per position.
    PerVertex { components: usize, data: Vec<f32> },
    /// One RGBA value applied to every vertex.
    Constant([f32; 4]),
}

impl ColorSource {
    /// RGBA of vertex `i`. Missing alpha reads as 1.
    pub fn rgba(&self, i: usize) -> [f32; 4] {
        match self {
            ColorSource::Constant(c) => *c,
            ColorSource::PerVertex { components, data } => {
                let base = i * components;
                let c = &data[base..base + components];
                [c[0], c[1], c[2], c.get(3).copied().unwrap_or(1.0)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_colors_require_matching_length() {
        let mut s = VertexStreams {
            position: vec![0.0; 9],
            color: vec![1.0; 6],
            ..Default::default()
        };
        assert_eq!(s.vertex_count(), 3);
        assert!(!s.has_vertex_colors());
        s.color.extend([0.5; 3]);
        assert!(s.has_vertex_colors());
    }

    #[test]
    fn color_source_rgba() {
        let per_vertex = ColorSource::PerVertex {
            components: 3,
            data: vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        };
        assert_eq!(per_vertex.rgba(1), [0.0, 1.0, 0.0, 1.0]);
        let constant = ColorSource::Constant([0.2, 0.3, 0.4, 1.0]);
        assert_eq!(constant.rgba(42), [0.2, 0.3, 0.4, 1.0]);
    }
}
