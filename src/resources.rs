//! GPU-resident buffers of the pipeline and how they are created.
//!
//! Everything here is allocated once at startup and never reallocated. The two
//! cell buffers only swap *roles* from frame to frame; see [`crate::sim::Parity`].

use wgpu::{Buffer, BufferDescriptor, BufferUsages, Device};

use crate::{
    config::{LifeConfig, Variant},
    sim::{Grid, Pair, SeedPattern, Slot},
};

/// Quad covering the whole viewport, three floats per vertex.
pub const QUAD_POSITIONS: [f32; 12] = [
    1.0, -1.0, 0.0, //
    -1.0, -1.0, 0.0, //
    -1.0, 1.0, 0.0, //
    1.0, 1.0, 0.0, //
];

/// Triangle-strip order for [`QUAD_POSITIONS`].
pub const QUAD_INDICES: [u16; 4] = [0, 3, 1, 2];

/// Upload payloads accepted by [`create_buffer`].
#[derive(Clone, Copy, Debug)]
pub enum BufferData<'a> {
    F32(&'a [f32]),
    U32(&'a [u32]),
    U16(&'a [u16]),
}

impl BufferData<'_> {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            BufferData::F32(v) => bytemuck::cast_slice(v),
            BufferData::U32(v) => bytemuck::cast_slice(v),
            BufferData::U16(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Rounds a byte length up to the 4-byte granularity mapped buffers require.
pub fn aligned_size(byte_len: u64) -> u64 {
    (byte_len + 3) & !3
}

/// Allocates a buffer mapped at creation, writes `data` and unmaps it.
///
/// The returned buffer is never left mapped.
pub fn create_buffer(
    device: &Device,
    label: &str,
    data: BufferData<'_>,
    usage: BufferUsages,
) -> Buffer {
    let bytes = data.as_bytes();
    let buffer = device.create_buffer(&BufferDescriptor {
        label: Some(label),
        size: aligned_size(bytes.len() as u64),
        usage,
        mapped_at_creation: true,
    });
    {
        let mut view = buffer.slice(..).get_mapped_range_mut();
        view[..bytes.len()].copy_from_slice(bytes);
    }
    buffer.unmap();
    buffer
}

/// Cell storage for one pipeline configuration.
pub enum CellBuffers {
    /// Render-only: the one generation that is ever displayed.
    Single(Buffer),
    /// Ping-pong pair; both start from the same generation.
    Double(Pair<Buffer>),
}

impl CellBuffers {
    /// The buffer read as the current generation when `slot` is the source.
    pub fn get(&self, slot: Slot) -> &Buffer {
        match self {
            CellBuffers::Single(buffer) => buffer,
            CellBuffers::Double(pair) => pair.get(slot),
        }
    }
}

const CELL_USAGE: BufferUsages = BufferUsages::STORAGE.union(BufferUsages::COPY_SRC);

/// Seeds a `width`² grid and uploads it once per buffer the variant needs.
pub fn initialize_cell_buffers(
    device: &Device,
    width: u32,
    seed: &SeedPattern,
    variant: Variant,
) -> CellBuffers {
    let grid = Grid::seeded(width, seed);
    log::debug!(
        "seeded {width}x{width} grid with {} live cells",
        grid.live_count()
    );
    let upload = |label: &str| {
        create_buffer(device, label, BufferData::U32(grid.cells()), CELL_USAGE)
    };
    match variant {
        Variant::Static => CellBuffers::Single(upload("cells buffer")),
        Variant::Simulated => CellBuffers::Double(Pair::from_fn(|slot| match slot {
            Slot::A => upload("cells buffer A"),
            Slot::B => upload("cells buffer B"),
        })),
    }
}

/// Owns every buffer the pipeline binds.
pub struct Resources {
    cells: CellBuffers,
    /// Holds the grid width as a single `u32`.
    uniform: Buffer,
    positions: Buffer,
    indices: Buffer,
    grid_width: u32,
}

impl Resources {
    pub fn new(device: &Device, config: &LifeConfig) -> Self {
        let cells =
            initialize_cell_buffers(device, config.grid_width, &config.seed, config.variant);
        let uniform = create_buffer(
            device,
            "grid width uniform",
            BufferData::U32(&[config.grid_width]),
            BufferUsages::UNIFORM,
        );
        let positions = create_buffer(
            device,
            "quad positions",
            BufferData::F32(&QUAD_POSITIONS),
            BufferUsages::VERTEX,
        );
        let indices = create_buffer(
            device,
            "quad indices",
            BufferData::U16(&QUAD_INDICES),
            BufferUsages::INDEX,
        );
        Self {
            cells,
            uniform,
            positions,
            indices,
            grid_width: config.grid_width,
        }
    }

    pub fn cells(&self) -> &CellBuffers {
        &self.cells
    }

    pub fn uniform(&self) -> &Buffer {
        &self.uniform
    }

    pub fn positions(&self) -> &Buffer {
        &self.positions
    }

    pub fn indices(&self) -> &Buffer {
        &self.indices
    }

    pub fn grid_width(&self) -> u32 {
        self.grid_width
    }

    /// Size in bytes of one generation.
    pub fn cells_size(&self) -> u64 {
        self.grid_width as u64 * self.grid_width as u64 * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_round_up_to_four() {
        assert_eq!(aligned_size(0), 0);
        assert_eq!(aligned_size(1), 4);
        assert_eq!(aligned_size(4), 4);
        assert_eq!(aligned_size(6), 8);
        assert_eq!(aligned_size(4097), 4100);
    }

    #[test]
    fn index_payload_needs_padding_only_when_odd() {
        let bytes = BufferData::U16(&QUAD_INDICES).as_bytes().len() as u64;
        assert_eq!(bytes, 8);
        assert_eq!(aligned_size(bytes), 8);
        let three = BufferData::U16(&[1, 2, 3]).as_bytes().len() as u64;
        assert_eq!(aligned_size(three), 8);
    }

    #[test]
    fn payload_bytes_follow_element_type() {
        assert_eq!(BufferData::F32(&QUAD_POSITIONS).as_bytes().len(), 48);
        assert_eq!(BufferData::U32(&[64]).as_bytes(), &64u32.to_ne_bytes());
    }

    #[test]
    fn strip_covers_both_triangles_of_the_quad() {
        // Strip [0, 3, 1, 2] yields triangles (0, 3, 1) and (3, 1, 2).
        let corners: Vec<(f32, f32)> = QUAD_INDICES
            .iter()
            .map(|&i| {
                let v = i as usize * 3;
                (QUAD_POSITIONS[v], QUAD_POSITIONS[v + 1])
            })
            .collect();
        assert_eq!(corners, [(1.0, -1.0), (1.0, 1.0), (-1.0, -1.0), (-1.0, 1.0)]);
    }
}
