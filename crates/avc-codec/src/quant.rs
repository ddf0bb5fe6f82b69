//! 反量化.
//!
//! LevelScale(m, i, j) = weightScale(i, j) * normAdjust(m, i, j), `m = qP % 6`.
//! 4x4 / 8x8 各有独立的表, DC 系数 (Intra16x16 亮度与色度) 在 Hadamard 之后单独缩放.

use avc_core::{AvcError, AvcResult};

use crate::config::{DecoderConfig, Plane};
use crate::transform::{Block4x4, Block8x8};

/// QP 上限 (不含位深偏移)
pub const MAX_QP: i32 = 51;
/// 14 位位深时的最大 QpBdOffset
pub const MAX_QP_BD_OFFSET: i32 = 36;
/// 反量化后系数的幅度上限 `2^(7 + 14)`
pub const MAX_COEFF_MAGNITUDE: i64 = 1 << 21;

/// 4x4 normAdjust: [qP % 6][位置类别]
#[rustfmt::skip]
const NORM_ADJUST_4X4: [[i32; 3]; 6] = [
    [10, 13, 16],
    [11, 14, 18],
    [13, 16, 20],
    [14, 18, 23],
    [16, 20, 25],
    [18, 23, 29],
];

/// 8x8 normAdjust: [qP % 6][位置类别]
#[rustfmt::skip]
const NORM_ADJUST_8X8: [[i32; 6]; 6] = [
    [20, 18, 32, 19, 25, 24],
    [22, 19, 35, 21, 28, 26],
    [26, 23, 42, 24, 33, 31],
    [28, 25, 45, 26, 35, 33],
    [32, 28, 51, 30, 40, 38],
    [36, 32, 58, 34, 46, 43],
];

/// 色度 QP 映射 (qPI >= 30 部分, 表 8-15)
#[rustfmt::skip]
const CHROMA_QP_TABLE: [i32; 52] = [
     0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15,
    16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 29, 30,
    31, 32, 32, 33, 34, 34, 35, 35, 36, 36, 37, 37, 37, 38, 38, 38,
    39, 39, 39, 39,
];

/// 4x4 位置类别: 偶偶 0, 奇奇 2, 其余 1
pub(crate) fn class_4x4(i: usize, j: usize) -> usize {
    match (i & 1, j & 1) {
        (0, 0) => 0,
        (1, 1) => 2,
        _ => 1,
    }
}

/// 8x8 位置类别
fn class_8x8(i: usize, j: usize) -> usize {
    if i % 4 == 0 && j % 4 == 0 {
        0
    } else if i % 2 == 1 && j % 2 == 1 {
        1
    } else if i % 4 == 2 && j % 4 == 2 {
        2
    } else if (i % 4 == 0 && j % 2 == 1) || (i % 2 == 1 && j % 4 == 0) {
        3
    } else if (i % 4 == 0 && j % 4 == 2) || (i % 4 == 2 && j % 4 == 0) {
        4
    } else {
        5
    }
}

/// 4x4 位置的 normAdjust (SP/SI 的 dequant_coef)
pub(crate) fn norm_adjust_4x4(qp_mod_6: usize, i: usize, j: usize) -> i32 {
    NORM_ADJUST_4X4[qp_mod_6][class_4x4(i, j)]
}

// ============================================================
// QP 上下文
// ============================================================

/// 单个块的量化参数 (已含位深偏移的 qP)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantContext {
    pub qp: i32,
    pub qp_div_6: i32,
    pub qp_mod_6: usize,
}

impl QuantContext {
    /// 由 qP (0..=51 + QpBdOffset) 构造
    pub fn new(qp: i32) -> AvcResult<Self> {
        if !(0..=MAX_QP + MAX_QP_BD_OFFSET).contains(&qp) {
            return Err(AvcError::InvalidQp(qp));
        }
        Ok(Self::unchecked(qp))
    }

    fn unchecked(qp: i32) -> Self {
        Self {
            qp,
            qp_div_6: qp / 6,
            qp_mod_6: (qp % 6) as usize,
        }
    }

    /// 亮度 (或 4:4:4 下按亮度方式编码的分量) 的 qP
    ///
    /// `qp_y` 为 QPY (-QpBdOffsetY..=51). 4:4:4 的 Cb/Cr 使用色度 QP 映射.
    pub fn for_plane(qp_y: i32, plane: Plane, config: &DecoderConfig) -> AvcResult<Self> {
        let bd_y = config.qp_bd_offset(Plane::Luma);
        if !(-bd_y..=MAX_QP).contains(&qp_y) {
            return Err(AvcError::InvalidQp(qp_y));
        }
        match plane {
            Plane::Luma => Self::new(qp_y + bd_y),
            _ => Self::new(chroma_qp(
                qp_y,
                config.chroma_qp_offset(plane),
                config.qp_bd_offset(plane),
            )),
        }
    }

    /// 4:2:2 色度 DC 使用 qP + 3
    pub fn chroma_dc_422(&self) -> Self {
        Self::unchecked(self.qp + 3)
    }
}

/// 由 QPY 与色度偏移计算 QP'C
pub fn chroma_qp(qp_y: i32, offset: i32, qp_bd_offset_c: i32) -> i32 {
    let qpi = (qp_y + offset).clamp(-qp_bd_offset_c, MAX_QP);
    let qpc = if qpi < 0 {
        qpi
    } else {
        CHROMA_QP_TABLE[qpi as usize]
    };
    qpc + qp_bd_offset_c
}

// ============================================================
// 反量化表
// ============================================================

/// 4x4 缩放表序号: Y/Cb/Cr 帧内, Y/Cb/Cr 帧间
pub fn list_index_4x4(plane: Plane, intra: bool) -> usize {
    plane.index() + if intra { 0 } else { 3 }
}

/// 8x8 缩放表序号: Y 帧内, Y 帧间, Cb 帧内, Cb 帧间, Cr 帧内, Cr 帧间
pub fn list_index_8x8(plane: Plane, intra: bool) -> usize {
    plane.index() * 2 + if intra { 0 } else { 1 }
}

/// 预计算的 LevelScale 表
#[derive(Debug, Clone)]
pub struct DequantTables {
    /// [表][qP % 6][i][j]
    level_scale_4x4: [[Block4x4; 6]; 6],
    /// [表][qP % 6][i][j]
    level_scale_8x8: Box<[[Block8x8; 6]; 6]>,
}

impl Default for DequantTables {
    fn default() -> Self {
        Self::flat()
    }
}

impl DequantTables {
    /// 平坦缩放矩阵 (全部权重为 16)
    pub fn flat() -> Self {
        let flat_4x4 = [[16u8; 16]; 6];
        let flat_8x8 = [[16u8; 64]; 6];
        Self::from_weights(&flat_4x4, &flat_8x8)
    }

    /// 由光栅顺序的权重表构造
    pub fn from_weights(weights_4x4: &[[u8; 16]; 6], weights_8x8: &[[u8; 64]; 6]) -> Self {
        let mut level_scale_4x4 = [[[[0i32; 4]; 4]; 6]; 6];
        for (list, weights) in level_scale_4x4.iter_mut().zip(weights_4x4.iter()) {
            for (m, table) in list.iter_mut().enumerate() {
                for (i, row) in table.iter_mut().enumerate() {
                    for (j, v) in row.iter_mut().enumerate() {
                        *v = i32::from(weights[i * 4 + j]) * NORM_ADJUST_4X4[m][class_4x4(i, j)];
                    }
                }
            }
        }
        let mut level_scale_8x8 = Box::new([[[[0i32; 8]; 8]; 6]; 6]);
        for (list, weights) in level_scale_8x8.iter_mut().zip(weights_8x8.iter()) {
            for (m, table) in list.iter_mut().enumerate() {
                for (i, row) in table.iter_mut().enumerate() {
                    for (j, v) in row.iter_mut().enumerate() {
                        *v = i32::from(weights[i * 8 + j]) * NORM_ADJUST_8X8[m][class_8x8(i, j)];
                    }
                }
            }
        }
        Self {
            level_scale_4x4,
            level_scale_8x8,
        }
    }

    /// 由解码配置构造 (未给出缩放矩阵时为平坦)
    pub fn from_config(config: &DecoderConfig) -> AvcResult<Self> {
        let Some(matrix) = &config.scaling_matrix else {
            return Ok(Self::flat());
        };
        matrix.validate()?;
        let mut weights_4x4 = [[16u8; 16]; 6];
        for (dst, src) in weights_4x4.iter_mut().zip(matrix.lists_4x4.iter()) {
            dst.copy_from_slice(src);
        }
        let mut weights_8x8 = [[16u8; 64]; 6];
        for (dst, src) in weights_8x8.iter_mut().zip(matrix.lists_8x8.iter()) {
            dst.copy_from_slice(src);
        }
        Ok(Self::from_weights(&weights_4x4, &weights_8x8))
    }

    /// LevelScale4x4 单项
    pub fn level_scale_4x4(&self, list: usize, qp_mod_6: usize, i: usize, j: usize) -> i32 {
        self.level_scale_4x4[list][qp_mod_6][i][j]
    }

    /// 4x4 块反量化
    ///
    /// `skip_dc` 为真时 (0,0) 位置保持不变, 其值由 DC 路径单独给出.
    pub fn dequant_4x4(
        &self,
        block: &mut Block4x4,
        qc: &QuantContext,
        list: usize,
        skip_dc: bool,
    ) -> AvcResult<()> {
        let scale = &self.level_scale_4x4[list][qc.qp_mod_6];
        let per = qc.qp_div_6;
        for (i, row) in block.iter_mut().enumerate() {
            for (j, c) in row.iter_mut().enumerate() {
                if (skip_dc && i == 0 && j == 0) || *c == 0 {
                    continue;
                }
                let v = i64::from(*c) * i64::from(scale[i][j]);
                *c = checked_coeff(if per >= 4 {
                    v << (per - 4)
                } else {
                    (v + (1 << (3 - per))) >> (4 - per)
                })?;
            }
        }
        Ok(())
    }

    /// 8x8 块反量化
    pub fn dequant_8x8(&self, block: &mut Block8x8, qc: &QuantContext, list: usize) -> AvcResult<()> {
        let scale = &self.level_scale_8x8[list][qc.qp_mod_6];
        let per = qc.qp_div_6;
        for (i, row) in block.iter_mut().enumerate() {
            for (j, c) in row.iter_mut().enumerate() {
                if *c == 0 {
                    continue;
                }
                let v = i64::from(*c) * i64::from(scale[i][j]);
                *c = checked_coeff(if per >= 6 {
                    v << (per - 6)
                } else {
                    (v + (1 << (5 - per))) >> (6 - per)
                })?;
            }
        }
        Ok(())
    }

    /// Intra16x16 亮度 DC 缩放 (Hadamard 之后)
    pub fn dequant_luma_dc(&self, dc: &mut Block4x4, qc: &QuantContext, list: usize) -> AvcResult<()> {
        let scale = self.level_scale_4x4[list][qc.qp_mod_6][0][0];
        for c in dc.iter_mut().flatten() {
            *c = scale_dc(*c, scale, qc)?;
        }
        Ok(())
    }

    /// 4:2:0 色度 DC 缩放 (Hadamard 之后)
    pub fn dequant_chroma_dc_420(
        &self,
        dc: &mut [[i32; 2]; 2],
        qc: &QuantContext,
        list: usize,
    ) -> AvcResult<()> {
        let scale = i64::from(self.level_scale_4x4[list][qc.qp_mod_6][0][0]);
        for c in dc.iter_mut().flatten() {
            *c = checked_coeff(((i64::from(*c) * scale) << qc.qp_div_6) >> 5)?;
        }
        Ok(())
    }

    /// 4:2:2 色度 DC 缩放 (反变换之后, 使用 qP + 3)
    pub fn dequant_chroma_dc_422(
        &self,
        dc: &mut [[i32; 2]; 4],
        qc: &QuantContext,
        list: usize,
    ) -> AvcResult<()> {
        let qc_dc = qc.chroma_dc_422();
        let scale = self.level_scale_4x4[list][qc_dc.qp_mod_6][0][0];
        for c in dc.iter_mut().flatten() {
            *c = scale_dc(*c, scale, &qc_dc)?;
        }
        Ok(())
    }
}

/// 反量化系数范围检查, 超出 `±2^21` (14 位位深的上限) 视为损坏码流
pub(crate) fn checked_coeff(value: i64) -> AvcResult<i32> {
    if !(-MAX_COEFF_MAGNITUDE..MAX_COEFF_MAGNITUDE).contains(&value) {
        return Err(AvcError::InvalidData(format!("反量化系数溢出: {}", value)));
    }
    Ok(value as i32)
}

/// DC 缩放: qP >= 36 时左移, 否则带舍入右移
fn scale_dc(c: i32, scale: i32, qc: &QuantContext) -> AvcResult<i32> {
    let v = i64::from(c) * i64::from(scale);
    checked_coeff(if qc.qp >= 36 {
        v << (qc.qp_div_6 - 6)
    } else {
        (v + (1 << (5 - qc.qp_div_6))) >> (6 - qc.qp_div_6)
    })
}

/// 由平坦矩阵下的反量化结果恢复电平: `(d >> (qP / 6)) / normAdjust`
///
/// SP/SI 重建在变换域重新组合电平, 需要撤销已做的反量化.
pub fn recover_level(dequantized: i32, qc: &QuantContext, i: usize, j: usize) -> i32 {
    (dequantized >> qc.qp_div_6) / norm_adjust_4x4(qc.qp_mod_6, i, j)
}
