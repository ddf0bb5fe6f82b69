//! 宏块样本重建.
//!
//! 调用方提供已写入预测样本的图像缓冲区, 本模块完成反量化、
//! 按 [`TransformKind`] 分派的反变换, 以及 `clip(pred + res)` 写回.

use avc_core::{AvcError, AvcResult};

use crate::config::{ChromaFormat, DecoderConfig, Plane};
use crate::macroblock::{LumaCoeffs, MacroblockCoeffs, MbKind, MbResidualParams, luma_blk_xy};
use crate::quant::{DequantTables, QuantContext, list_index_4x4, list_index_8x8};
use crate::sp::{SwitchingMode, reconstruct_sp_chroma_420, reconstruct_sp_luma_4x4};
use crate::transform::{
    Block4x4, BlockFlags, DpcmDirection, TransformKind, inverse_chroma_dc_422, inverse_core_4x4,
    inverse_core_8x8, inverse_hadamard_2x2, inverse_hadamard_4x4, lossless_dpcm,
};

/// SP / SI 宏块参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchingParams {
    pub mode: SwitchingMode,
    /// QSY
    pub qs_y: i32,
}

/// 重建所需的预测侧信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictionInfo {
    /// 无损模式下亮度 DPCM 方向.
    /// Intra16x16 只用第 0 项 (整宏块); 8x8 变换按 8x8 块序号; 否则按 luma4x4BlkIdx.
    pub luma_dpcm: [Option<DpcmDirection>; 16],
    /// 无损模式下色度 DPCM 方向 (整个色度宏块)
    pub chroma_dpcm: Option<DpcmDirection>,
    /// SP / SI 宏块
    pub switching: Option<SwitchingParams>,
}

/// 图像分量样本缓冲区中的一个宏块区域
#[derive(Debug)]
pub struct PlaneRegion<'a> {
    pub samples: &'a mut [u16],
    pub stride: usize,
    /// 区域左上角
    pub x: usize,
    pub y: usize,
}

impl PlaneRegion<'_> {
    fn check(&self, width: usize, height: usize) -> AvcResult<()> {
        let last = (self.y + height - 1) * self.stride + self.x + width;
        if self.x + width > self.stride || last > self.samples.len() {
            return Err(AvcError::InvalidArgument(format!(
                "样本缓冲区过小: 需要 {} 个样本, 实际 {}",
                last,
                self.samples.len()
            )));
        }
        Ok(())
    }

    fn offset(&self, bx: usize, by: usize) -> usize {
        (self.y + by) * self.stride + self.x + bx
    }

    fn read<const W: usize, const H: usize>(&self, bx: usize, by: usize) -> [[i32; W]; H] {
        let mut out = [[0i32; W]; H];
        for (r, row) in out.iter_mut().enumerate() {
            let start = self.offset(bx, by + r);
            for (v, &s) in row.iter_mut().zip(&self.samples[start..start + W]) {
                *v = i32::from(s);
            }
        }
        out
    }

    /// 预测 + 残差并裁剪到 `[0, max]`
    fn add<const W: usize>(&mut self, bx: usize, by: usize, residual: &[[i32; W]], max: i32) {
        for (r, row) in residual.iter().enumerate() {
            let start = self.offset(bx, by + r);
            add_residual_clipped(&mut self.samples[start..start + W], row, max);
        }
    }

    /// 直接写入 (裁剪到 `[0, max]`)
    fn store<const W: usize>(&mut self, bx: usize, by: usize, values: &[[i32; W]], max: i32) {
        for (r, row) in values.iter().enumerate() {
            let start = self.offset(bx, by + r);
            for (dst, &v) in self.samples[start..start + W].iter_mut().zip(row) {
                *dst = v.clamp(0, max) as u16;
            }
        }
    }
}

/// 一行样本: `dst = clip(dst + residual, 0, max)`
pub fn add_residual_clipped(dst: &mut [u16], residual: &[i32], max: i32) {
    for (d, &r) in dst.iter_mut().zip(residual) {
        *d = (i32::from(*d) + r).clamp(0, max) as u16;
    }
}

/// 宏块级变换方式
pub fn transform_kind(
    params: &MbResidualParams,
    config: &DecoderConfig,
    info: &PredictionInfo,
) -> TransformKind {
    let mut flags = BlockFlags::empty();
    flags.set(BlockFlags::TRANSFORM_8X8, params.transform_8x8);
    flags.set(BlockFlags::INTRA_16X16, params.intra16x16);
    flags.set(
        BlockFlags::LOSSLESS,
        config.transform_bypass && params.qp_y + config.qp_bd_offset(Plane::Luma) == 0,
    );
    flags.set(BlockFlags::SWITCHING, info.switching.is_some());
    TransformKind::select(flags)
}

// ============================================================
// 亮度
// ============================================================

/// 重建一个亮度类分量 (Y, 或 4:4:4 下的 Cb / Cr) 的 16x16 宏块
pub fn reconstruct_luma(
    mb: &MacroblockCoeffs,
    params: &MbResidualParams,
    plane: Plane,
    config: &DecoderConfig,
    tables: &DequantTables,
    info: &PredictionInfo,
    dst: &mut PlaneRegion,
) -> AvcResult<()> {
    dst.check(16, 16)?;
    if mb.kind != MbKind::Coded {
        return Ok(());
    }
    let coeffs = &mb.luma[plane.index()];
    let qc = QuantContext::for_plane(params.qp_y, plane, config)?;
    let max = config.max_sample_value(plane);
    let list = list_index_4x4(plane, params.intra);

    match transform_kind(params, config, info) {
        TransformKind::Core4x4 => {
            for (blk, block) in coeffs.blocks.iter().enumerate() {
                if coeffs.nz[blk] == 0 {
                    continue;
                }
                let mut block = *block;
                tables.dequant_4x4(&mut block, &qc, list, false)?;
                let (bx, by) = luma_blk_xy(blk);
                dst.add(bx * 4, by * 4, &inverse_core_4x4(&block), max);
            }
        }
        TransformKind::Core8x8 => {
            let list = list_index_8x8(plane, params.intra);
            for (blk8, block) in coeffs.blocks_8x8.iter().enumerate() {
                if coeffs.nz[blk8 * 4..blk8 * 4 + 4].iter().all(|&n| n == 0) {
                    continue;
                }
                let mut block = *block;
                tables.dequant_8x8(&mut block, &qc, list)?;
                dst.add((blk8 % 2) * 8, (blk8 / 2) * 8, &inverse_core_8x8(&block), max);
            }
        }
        TransformKind::Hadamard16 => {
            let mut dc = coeffs.dc;
            inverse_hadamard_4x4(&mut dc);
            tables.dequant_luma_dc(&mut dc, &qc, list)?;
            for (blk, block) in coeffs.blocks.iter().enumerate() {
                let (bx, by) = luma_blk_xy(blk);
                let mut block = *block;
                tables.dequant_4x4(&mut block, &qc, list, true)?;
                block[0][0] = dc[by][bx];
                dst.add(bx * 4, by * 4, &inverse_core_4x4(&block), max);
            }
        }
        TransformKind::LosslessDpcm => {
            let residual = lossless_luma_residual(coeffs, params, info);
            dst.add(0, 0, &residual, max);
        }
        TransformKind::RateSwitching => {
            let Some(sp) = info.switching else {
                return Err(AvcError::InvalidArgument("缺少 SP/SI 参数".into()));
            };
            if params.intra16x16 || params.transform_8x8 {
                return Err(AvcError::InvalidArgument(
                    "SP/SI 宏块只支持 4x4 变换".into(),
                ));
            }
            let qs = QuantContext::for_plane(sp.qs_y, plane, config)?;
            for (blk, block) in coeffs.blocks.iter().enumerate() {
                let (bx, by) = luma_blk_xy(blk);
                let pred: Block4x4 = dst.read(bx * 4, by * 4);
                let mut block = *block;
                tables.dequant_4x4(&mut block, &qc, list, false)?;
                let samples = reconstruct_sp_luma_4x4(&pred, &block, &qc, &qs, sp.mode)?;
                dst.store(bx * 4, by * 4, &samples, max);
            }
        }
    }
    Ok(())
}

/// 变换旁路: 系数即残差, 水平/垂直预测时做 DPCM
fn lossless_luma_residual(
    coeffs: &LumaCoeffs,
    params: &MbResidualParams,
    info: &PredictionInfo,
) -> [[i32; 16]; 16] {
    let mut residual = [[0i32; 16]; 16];
    if params.transform_8x8 {
        for (blk8, block) in coeffs.blocks_8x8.iter().enumerate() {
            let mut block = *block;
            if let Some(dir) = info.luma_dpcm[blk8] {
                lossless_dpcm(&mut block, dir);
            }
            let (ox, oy) = ((blk8 % 2) * 8, (blk8 / 2) * 8);
            for (r, row) in block.iter().enumerate() {
                residual[oy + r][ox..ox + 8].copy_from_slice(row);
            }
        }
        return residual;
    }

    for (blk, block) in coeffs.blocks.iter().enumerate() {
        let (bx, by) = luma_blk_xy(blk);
        let mut block = *block;
        if params.intra16x16 {
            block[0][0] = coeffs.dc[by][bx];
        } else if let Some(dir) = info.luma_dpcm[blk] {
            lossless_dpcm(&mut block, dir);
        }
        for (r, row) in block.iter().enumerate() {
            residual[by * 4 + r][bx * 4..bx * 4 + 4].copy_from_slice(row);
        }
    }
    if params.intra16x16 {
        if let Some(dir) = info.luma_dpcm[0] {
            lossless_dpcm(&mut residual, dir);
        }
    }
    residual
}

// ============================================================
// 色度
// ============================================================

/// 重建一个 4:2:0 / 4:2:2 色度分量
pub fn reconstruct_chroma(
    mb: &MacroblockCoeffs,
    params: &MbResidualParams,
    plane: Plane,
    config: &DecoderConfig,
    tables: &DequantTables,
    info: &PredictionInfo,
    dst: &mut PlaneRegion,
) -> AvcResult<()> {
    let chroma_format = config.chroma_format;
    if !chroma_format.has_chroma_dc() || plane == Plane::Luma {
        return Err(AvcError::InvalidArgument(format!(
            "{:?} 下的 {:?} 不按色度方式重建",
            chroma_format, plane
        )));
    }
    let (width, height) = chroma_format.mb_chroma_size();
    dst.check(width, height)?;
    if mb.kind != MbKind::Coded {
        return Ok(());
    }
    let coeffs = &mb.chroma[plane.index() - 1];
    let block_count = chroma_format.chroma_dc_count();
    let qc = QuantContext::for_plane(params.qp_y, plane, config)?;
    let max = config.max_sample_value(plane);
    let list = list_index_4x4(plane, params.intra);
    let kind = transform_kind(params, config, info);

    if kind == TransformKind::RateSwitching {
        let Some(sp) = info.switching else {
            return Err(AvcError::InvalidArgument("缺少 SP/SI 参数".into()));
        };
        if chroma_format != ChromaFormat::Yuv420 {
            return Err(AvcError::InvalidArgument("SP/SI 只支持 4:2:0".into()));
        }
        let qs = QuantContext::for_plane(sp.qs_y, plane, config)?;
        let pred: [[i32; 8]; 8] = dst.read(0, 0);
        let dc_levels = [coeffs.dc[0], coeffs.dc[1]];
        let mut ac = [[[0i32; 4]; 4]; 4];
        for (dst_block, src) in ac.iter_mut().zip(coeffs.ac.iter()) {
            *dst_block = *src;
            tables.dequant_4x4(dst_block, &qc, list, true)?;
        }
        let samples = reconstruct_sp_chroma_420(&pred, &dc_levels, &ac, &qc, &qs, sp.mode)?;
        dst.store(0, 0, &samples, max);
        return Ok(());
    }

    let lossless = kind == TransformKind::LosslessDpcm;
    let mut dc = coeffs.dc;
    if !lossless {
        if chroma_format == ChromaFormat::Yuv422 {
            inverse_chroma_dc_422(&mut dc);
            tables.dequant_chroma_dc_422(&mut dc, &qc, list)?;
        } else {
            let mut dc2 = [dc[0], dc[1]];
            inverse_hadamard_2x2(&mut dc2);
            tables.dequant_chroma_dc_420(&mut dc2, &qc, list)?;
            dc[0] = dc2[0];
            dc[1] = dc2[1];
        }
    }

    // 4:2:2 时 16 行, 4:2:0 只用前 8 行
    let mut residual = [[0i32; 8]; 16];
    for (blk, block) in coeffs.ac.iter().take(block_count).enumerate() {
        let (bx, by) = (blk % 2, blk / 2);
        let mut block = *block;
        if !lossless {
            tables.dequant_4x4(&mut block, &qc, list, true)?;
        }
        block[0][0] = dc[by][bx];
        let block = if lossless { block } else { inverse_core_4x4(&block) };
        for (r, row) in block.iter().enumerate() {
            residual[by * 4 + r][bx * 4..bx * 4 + 4].copy_from_slice(row);
        }
    }
    if let (true, Some(dir)) = (lossless, info.chroma_dpcm) {
        lossless_dpcm(&mut residual, dir);
    }
    dst.add(0, 0, &residual[..height], max);
    Ok(())
}
