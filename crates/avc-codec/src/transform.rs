//! 反变换.
//!
//! 所有块为 `[[i32; N]; N]`, 按 `[row][col]` 访问, 中间结果保持 i32.
//! 宏块级变换方式由 [`BlockFlags`] 一次性选出为 [`TransformKind`].

use bitflags::bitflags;

/// 4x4 系数 / 残差块
pub type Block4x4 = [[i32; 4]; 4];
/// 8x8 系数 / 残差块
pub type Block8x8 = [[i32; 8]; 8];

bitflags! {
    /// 影响变换方式选择的宏块标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BlockFlags: u8 {
        /// transform_size_8x8_flag
        const TRANSFORM_8X8 = 1 << 0;
        /// Intra16x16 预测 (亮度 DC 单独 Hadamard)
        const INTRA_16X16 = 1 << 1;
        /// TransformBypassModeFlag 且 QP'Y == 0
        const LOSSLESS = 1 << 2;
        /// SP / SI 切片中的宏块
        const SWITCHING = 1 << 3;
    }
}

/// 宏块的残差变换方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// 4x4 整数反变换
    Core4x4,
    /// 8x8 整数反变换
    Core8x8,
    /// 亮度 DC 先做 4x4 Hadamard, 再逐块 4x4 反变换
    Hadamard16,
    /// 变换旁路, 残差即系数 (水平/垂直帧内预测时做 DPCM)
    LosslessDpcm,
    /// SP / SI 切换图像的变换域重建
    RateSwitching,
}

impl TransformKind {
    /// 由宏块标志选择变换方式 (无损优先, 其次 SP/SI)
    pub fn select(flags: BlockFlags) -> Self {
        if flags.contains(BlockFlags::LOSSLESS) {
            Self::LosslessDpcm
        } else if flags.contains(BlockFlags::SWITCHING) {
            Self::RateSwitching
        } else if flags.contains(BlockFlags::INTRA_16X16) {
            Self::Hadamard16
        } else if flags.contains(BlockFlags::TRANSFORM_8X8) {
            Self::Core8x8
        } else {
            Self::Core4x4
        }
    }
}

// ============================================================
// 整数反变换
// ============================================================

/// 4x4 一维反变换蝶形
#[inline]
fn butterfly_4(s: [i32; 4]) -> [i32; 4] {
    let e0 = s[0] + s[2];
    let e1 = s[0] - s[2];
    let e2 = (s[1] >> 1) - s[3];
    let e3 = s[1] + (s[3] >> 1);
    [e0 + e3, e1 + e2, e1 - e2, e0 - e3]
}

/// 4x4 整数反变换 (含 `(x + 32) >> 6` 归一化)
pub fn inverse_core_4x4(coeffs: &Block4x4) -> Block4x4 {
    let mut temp = [[0i32; 4]; 4];
    // 行变换
    for (dst, src) in temp.iter_mut().zip(coeffs.iter()) {
        *dst = butterfly_4(*src);
    }
    // 列变换
    let mut out = [[0i32; 4]; 4];
    for j in 0..4 {
        let col = butterfly_4([temp[0][j], temp[1][j], temp[2][j], temp[3][j]]);
        for i in 0..4 {
            out[i][j] = (col[i] + 32) >> 6;
        }
    }
    out
}

/// 8x8 一维反变换蝶形
#[inline]
fn butterfly_8(d: [i32; 8]) -> [i32; 8] {
    let a0 = d[0] + d[4];
    let a4 = d[0] - d[4];
    let a2 = (d[2] >> 1) - d[6];
    let a6 = d[2] + (d[6] >> 1);

    let b0 = a0 + a6;
    let b2 = a4 + a2;
    let b4 = a4 - a2;
    let b6 = a0 - a6;

    let a1 = -d[3] + d[5] - d[7] - (d[7] >> 1);
    let a3 = d[1] + d[7] - d[3] - (d[3] >> 1);
    let a5 = -d[1] + d[7] + d[5] + (d[5] >> 1);
    let a7 = d[3] + d[5] + d[1] + (d[1] >> 1);

    let b1 = a1 + (a7 >> 2);
    let b7 = a7 - (a1 >> 2);
    let b3 = a3 + (a5 >> 2);
    let b5 = (a3 >> 2) - a5;

    [
        b0 + b7,
        b2 + b5,
        b4 + b3,
        b6 + b1,
        b6 - b1,
        b4 - b3,
        b2 - b5,
        b0 - b7,
    ]
}

/// 8x8 整数反变换 (含 `(x + 32) >> 6` 归一化)
pub fn inverse_core_8x8(coeffs: &Block8x8) -> Block8x8 {
    let mut temp = [[0i32; 8]; 8];
    for (dst, src) in temp.iter_mut().zip(coeffs.iter()) {
        *dst = butterfly_8(*src);
    }
    let mut out = [[0i32; 8]; 8];
    for j in 0..8 {
        let mut col = [0i32; 8];
        for (i, v) in col.iter_mut().enumerate() {
            *v = temp[i][j];
        }
        let col = butterfly_8(col);
        for i in 0..8 {
            out[i][j] = (col[i] + 32) >> 6;
        }
    }
    out
}

/// 4x4 整数正变换 (SP/SI 对预测块做变换时使用, 无归一化)
pub fn forward_core_4x4(samples: &Block4x4) -> Block4x4 {
    let fwd = |s: [i32; 4]| {
        let p0 = s[0] + s[3];
        let p1 = s[1] + s[2];
        let p2 = s[1] - s[2];
        let p3 = s[0] - s[3];
        [p0 + p1, (p3 << 1) + p2, p0 - p1, p3 - (p2 << 1)]
    };
    let mut temp = [[0i32; 4]; 4];
    for (dst, src) in temp.iter_mut().zip(samples.iter()) {
        *dst = fwd(*src);
    }
    let mut out = [[0i32; 4]; 4];
    for j in 0..4 {
        let col = fwd([temp[0][j], temp[1][j], temp[2][j], temp[3][j]]);
        for i in 0..4 {
            out[i][j] = col[i];
        }
    }
    out
}

// ============================================================
// DC Hadamard 变换
// ============================================================

/// 4x4 亮度 DC 反 Hadamard 变换 (Intra16x16)
pub fn inverse_hadamard_4x4(block: &mut Block4x4) {
    let had = |s: [i32; 4]| {
        let a = s[0] + s[2];
        let b = s[0] - s[2];
        let c = s[1] - s[3];
        let d = s[1] + s[3];
        [a + d, b + c, b - c, a - d]
    };
    for row in block.iter_mut() {
        *row = had(*row);
    }
    for j in 0..4 {
        let col = had([block[0][j], block[1][j], block[2][j], block[3][j]]);
        for i in 0..4 {
            block[i][j] = col[i];
        }
    }
}

/// 2x2 色度 DC 反 Hadamard 变换 (4:2:0)
pub fn inverse_hadamard_2x2(block: &mut [[i32; 2]; 2]) {
    let a = block[0][0] + block[0][1];
    let b = block[0][0] - block[0][1];
    let c = block[1][0] + block[1][1];
    let d = block[1][0] - block[1][1];
    block[0][0] = a + c;
    block[0][1] = b + d;
    block[1][0] = a - c;
    block[1][1] = b - d;
}

/// 2x4 色度 DC 反变换 (4:2:2, 4 行 2 列)
///
/// 行方向 (4 点) 使用 `[[1,1,1,1],[1,1,-1,-1],[1,-1,-1,1],[1,-1,1,-1]]`, 列方向为 2 点 Hadamard.
pub fn inverse_chroma_dc_422(block: &mut [[i32; 2]; 4]) {
    const A: [[i32; 4]; 4] = [[1, 1, 1, 1], [1, 1, -1, -1], [1, -1, -1, 1], [1, -1, 1, -1]];
    let mut temp = [[0i32; 2]; 4];
    for (i, row) in temp.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = (0..4).map(|k| A[i][k] * block[k][j]).sum();
        }
    }
    for (dst, src) in block.iter_mut().zip(temp.iter()) {
        dst[0] = src[0] + src[1];
        dst[1] = src[0] - src[1];
    }
}

// ============================================================
// 无损 DPCM
// ============================================================

/// 变换旁路时的 DPCM 方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpcmDirection {
    /// 垂直预测: 沿列向下累加
    Vertical,
    /// 水平预测: 沿行向右累加
    Horizontal,
}

impl DpcmDirection {
    /// 亮度 Intra4x4/8x8/16x16 预测模式: 0 垂直, 1 水平
    pub fn from_luma_mode(mode: u8) -> Option<Self> {
        match mode {
            0 => Some(Self::Vertical),
            1 => Some(Self::Horizontal),
            _ => None,
        }
    }

    /// 色度帧内预测模式: 1 水平, 2 垂直
    pub fn from_chroma_mode(mode: u8) -> Option<Self> {
        match mode {
            1 => Some(Self::Horizontal),
            2 => Some(Self::Vertical),
            _ => None,
        }
    }
}

/// 对宽 W 高 H 的残差块原地做 DPCM 累加
pub fn lossless_dpcm<const W: usize, const H: usize>(
    block: &mut [[i32; W]; H],
    direction: DpcmDirection,
) {
    match direction {
        DpcmDirection::Vertical => {
            for i in 1..H {
                for j in 0..W {
                    block[i][j] += block[i - 1][j];
                }
            }
        }
        DpcmDirection::Horizontal => {
            for row in block.iter_mut() {
                for j in 1..W {
                    row[j] += row[j - 1];
                }
            }
        }
    }
}
