//! 非零系数个数 (total_coeff) 存储与 nC 推导.
//!
//! 每个分量以 4x4 块为单位记录 total_coeff, 并记录每个宏块所属切片,
//! 相邻宏块只有在同一切片且已解码时才可用.

use crate::config::{ChromaFormat, Plane};

/// I_PCM 宏块的 4x4 块按 16 个非零系数计
pub const PCM_NZ_COUNT: u8 = 16;

/// 图像级非零系数个数网格
#[derive(Debug, Clone)]
pub struct NzCountGrid {
    mb_width: usize,
    mb_height: usize,
    /// 每个分量每宏块的 4x4 块列数/行数
    blocks_per_mb: [(usize, usize); 3],
    counts: [Vec<u8>; 3],
    /// 宏块所属切片, None 表示尚未解码
    slice_of_mb: Vec<Option<u32>>,
}

impl NzCountGrid {
    /// 创建图像网格
    pub fn new(mb_width: usize, mb_height: usize, chroma_format: ChromaFormat) -> Self {
        let chroma = match chroma_format {
            ChromaFormat::Monochrome => (0, 0),
            ChromaFormat::Yuv420 => (2, 2),
            ChromaFormat::Yuv422 => (2, 4),
            ChromaFormat::Yuv444 => (4, 4),
        };
        let blocks_per_mb = [(4, 4), chroma, chroma];
        let mb_count = mb_width * mb_height;
        let counts = blocks_per_mb.map(|(bw, bh)| vec![0u8; mb_count * bw * bh]);
        Self {
            mb_width,
            mb_height,
            blocks_per_mb,
            counts,
            slice_of_mb: vec![None; mb_count],
        }
    }

    /// 图像宽度 (宏块)
    pub fn mb_width(&self) -> usize {
        self.mb_width
    }

    /// 图像高度 (宏块)
    pub fn mb_height(&self) -> usize {
        self.mb_height
    }

    /// 清空所有记录 (新图像)
    pub fn reset(&mut self) {
        for plane in &mut self.counts {
            plane.fill(0);
        }
        self.slice_of_mb.fill(None);
    }

    /// 开始解码宏块: 记录其所属切片并清零计数
    pub fn begin_macroblock(&mut self, mb_addr: usize, slice_id: u32) {
        if let Some(owner) = self.slice_of_mb.get_mut(mb_addr) {
            *owner = Some(slice_id);
        }
        self.fill_macroblock(mb_addr, 0);
    }

    /// P_Skip / B_Skip 宏块: 所有块计为 0
    pub fn mark_skip(&mut self, mb_addr: usize, slice_id: u32) {
        self.begin_macroblock(mb_addr, slice_id);
    }

    /// I_PCM 宏块: 所有块计为 16
    pub fn mark_pcm(&mut self, mb_addr: usize, slice_id: u32) {
        self.begin_macroblock(mb_addr, slice_id);
        self.fill_macroblock(mb_addr, PCM_NZ_COUNT);
    }

    fn fill_macroblock(&mut self, mb_addr: usize, value: u8) {
        for (plane, &(bw, bh)) in self.counts.iter_mut().zip(self.blocks_per_mb.iter()) {
            let per_mb = bw * bh;
            let start = mb_addr * per_mb;
            if let Some(slots) = plane.get_mut(start..start + per_mb) {
                slots.fill(value);
            }
        }
    }

    fn index(&self, plane: Plane, mb_addr: usize, blk_x: usize, blk_y: usize) -> Option<usize> {
        let (bw, bh) = self.blocks_per_mb[plane.index()];
        if blk_x >= bw || blk_y >= bh || mb_addr >= self.slice_of_mb.len() {
            return None;
        }
        Some(mb_addr * bw * bh + blk_y * bw + blk_x)
    }

    /// 记录一个 4x4 块的 total_coeff
    pub fn set(&mut self, plane: Plane, mb_addr: usize, blk_x: usize, blk_y: usize, count: u8) {
        if let Some(idx) = self.index(plane, mb_addr, blk_x, blk_y) {
            self.counts[plane.index()][idx] = count;
        }
    }

    /// 读取一个 4x4 块的 total_coeff
    pub fn get(&self, plane: Plane, mb_addr: usize, blk_x: usize, blk_y: usize) -> u8 {
        self.index(plane, mb_addr, blk_x, blk_y)
            .map_or(0, |idx| self.counts[plane.index()][idx])
    }

    /// 邻居宏块是否可用 (存在, 已解码, 同一切片)
    fn neighbor_available(&self, neighbor: Option<usize>, current: usize) -> Option<usize> {
        let addr = neighbor?;
        let owner = (*self.slice_of_mb.get(addr)?)?;
        let current_owner = (*self.slice_of_mb.get(current)?)?;
        (owner == current_owner).then_some(addr)
    }

    /// 推导块 (blk_x, blk_y) 的 nC
    ///
    /// 左右邻居都可用时取 `(nA + nB + 1) >> 1`, 只有一个可用时取该值, 都不可用为 0.
    pub fn predict_nc(&self, plane: Plane, mb_addr: usize, blk_x: usize, blk_y: usize) -> i32 {
        let (bw, bh) = self.blocks_per_mb[plane.index()];
        if bw == 0 || bh == 0 {
            return 0;
        }
        let mb_x = mb_addr % self.mb_width.max(1);

        let left = if blk_x > 0 {
            Some(self.get(plane, mb_addr, blk_x - 1, blk_y))
        } else {
            let addr = (mb_x > 0).then(|| mb_addr - 1);
            self.neighbor_available(addr, mb_addr)
                .map(|a| self.get(plane, a, bw - 1, blk_y))
        };
        let top = if blk_y > 0 {
            Some(self.get(plane, mb_addr, blk_x, blk_y - 1))
        } else {
            let addr = mb_addr.checked_sub(self.mb_width);
            self.neighbor_available(addr, mb_addr)
                .map(|a| self.get(plane, a, blk_x, bh - 1))
        };

        match (left, top) {
            (Some(a), Some(b)) => (i32::from(a) + i32::from(b) + 1) >> 1,
            (Some(a), None) => i32::from(a),
            (None, Some(b)) => i32::from(b),
            (None, None) => 0,
        }
    }
}
