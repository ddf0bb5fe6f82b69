//! 宏块残差遍历.
//!
//! 按 CBP 与变换尺寸依次解码一个宏块的全部残差块, 系数以光栅顺序保存,
//! 非零系数个数同时写入 [`NzCountGrid`] 供后续块推导 nC.

use avc_core::{AvcError, AvcResult, BitReader};
use serde::{Deserialize, Serialize};

use crate::config::{ChromaFormat, DecoderConfig, Plane};
use crate::neighbors::NzCountGrid;
use crate::residual::{BlockCategory, BlockKind, CoefficientRun, decode_residual_block};
use crate::scan::{CHROMA_DC_420_SCAN, CHROMA_DC_422_SCAN, ScanOrder};
use crate::transform::{Block4x4, Block8x8};

/// 宏块残差形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MbKind {
    /// 带残差语法的普通宏块
    #[default]
    Coded,
    /// P_Skip / B_Skip, 无残差
    Skip,
    /// I_PCM, 样本直接传输
    Pcm,
}

/// 宏块层已解析的残差控制参数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MbResidualParams {
    /// 宏块地址 (光栅顺序)
    pub mb_addr: usize,
    pub kind: MbKind,
    /// 帧内宏块 (选择帧内缩放矩阵)
    pub intra: bool,
    /// Intra16x16 预测, 亮度 DC 单独编码
    pub intra16x16: bool,
    /// coded_block_pattern 亮度部分 (每 8x8 一位)
    pub cbp_luma: u8,
    /// coded_block_pattern 色度部分 (0..=2)
    pub cbp_chroma: u8,
    /// transform_size_8x8_flag
    pub transform_8x8: bool,
    /// 场图像或场宏块, 使用场扫描
    pub field_scan: bool,
    /// QPY (已累加 mb_qp_delta)
    pub qp_y: i32,
}

impl MbResidualParams {
    fn validate(&self) -> AvcResult<()> {
        if self.cbp_luma > 15 || self.cbp_chroma > 2 {
            return Err(AvcError::InvalidArgument(format!(
                "宏块 {} CBP 越界: luma={} chroma={}",
                self.mb_addr, self.cbp_luma, self.cbp_chroma
            )));
        }
        if self.intra16x16 && self.transform_8x8 {
            return Err(AvcError::InvalidArgument(format!(
                "宏块 {} Intra16x16 不能使用 8x8 变换",
                self.mb_addr
            )));
        }
        Ok(())
    }
}

// ============================================================
// 系数容器
// ============================================================

/// 一个亮度类分量的系数 (电平, 尚未反量化)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaCoeffs {
    /// Intra16x16 DC, `dc[by][bx]` 对应 4x4 块 (bx, by)
    pub dc: Block4x4,
    /// 按 luma4x4BlkIdx 排列的 4x4 块
    pub blocks: [Block4x4; 16],
    /// 按 8x8 块序号排列的 8x8 块
    pub blocks_8x8: [Block8x8; 4],
    /// 每个 4x4 块的 total_coeff
    pub nz: [u8; 16],
}

impl Default for LumaCoeffs {
    fn default() -> Self {
        Self {
            dc: [[0; 4]; 4],
            blocks: [[[0; 4]; 4]; 16],
            blocks_8x8: [[[0; 8]; 8]; 4],
            nz: [0; 16],
        }
    }
}

/// 一个色度分量的系数 (4:2:0 / 4:2:2)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromaCoeffs {
    /// DC 矩阵, 2 列; 4:2:0 只使用前两行
    pub dc: [[i32; 2]; 4],
    /// AC 块, 按 2 列光栅顺序; 4:2:0 只使用前 4 个
    pub ac: [Block4x4; 8],
    pub nz: [u8; 8],
}

/// 一个宏块的全部残差系数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroblockCoeffs {
    pub mb_addr: usize,
    pub kind: MbKind,
    /// Y, 以及 4:4:4 下的 Cb / Cr
    pub luma: [LumaCoeffs; 3],
    /// 4:2:0 / 4:2:2 的 Cb / Cr
    pub chroma: [ChromaCoeffs; 2],
}

impl MacroblockCoeffs {
    /// 是否没有任何非零系数
    pub fn is_empty(&self) -> bool {
        let luma_empty = self.luma.iter().all(|l| {
            l.dc.iter().flatten().all(|&c| c == 0) && l.nz.iter().all(|&n| n == 0)
        });
        let chroma_empty = self.chroma.iter().all(|c| {
            c.dc.iter().flatten().all(|&v| v == 0) && c.nz.iter().all(|&n| n == 0)
        });
        luma_empty && chroma_empty
    }
}

/// luma4x4BlkIdx 对应的 4x4 块坐标 (bx, by)
pub fn luma_blk_xy(blk: usize) -> (usize, usize) {
    let bx = ((blk >> 2) & 1) * 2 + (blk & 1);
    let by = (blk >> 3) * 2 + ((blk >> 1) & 1);
    (bx, by)
}

// ============================================================
// 宏块解码
// ============================================================

/// 解码一个宏块的残差语法
///
/// 调用前比特读取器应位于该宏块残差语法的起点; `slice_id` 用于判定邻居可用性.
pub fn decode_macroblock_residual(
    br: &mut BitReader,
    params: &MbResidualParams,
    config: &DecoderConfig,
    grid: &mut NzCountGrid,
    slice_id: u32,
) -> AvcResult<MacroblockCoeffs> {
    params.validate()?;
    let mut out = MacroblockCoeffs {
        mb_addr: params.mb_addr,
        kind: params.kind,
        ..MacroblockCoeffs::default()
    };
    match params.kind {
        MbKind::Skip => {
            grid.mark_skip(params.mb_addr, slice_id);
            return Ok(out);
        }
        MbKind::Pcm => {
            grid.mark_pcm(params.mb_addr, slice_id);
            return Ok(out);
        }
        MbKind::Coded => grid.begin_macroblock(params.mb_addr, slice_id),
    }

    let scan = ScanOrder::from_field(params.field_scan);
    for &plane in config.luma_like_planes() {
        let coeffs = &mut out.luma[plane.index()];
        decode_luma_plane(br, params, config, plane, scan, grid, coeffs)?;
    }

    if config.chroma_format.has_chroma_dc() {
        decode_chroma(br, params, config, scan, grid, &mut out.chroma)?;
    }
    Ok(out)
}

fn decode_luma_plane(
    br: &mut BitReader,
    params: &MbResidualParams,
    config: &DecoderConfig,
    plane: Plane,
    scan: ScanOrder,
    grid: &mut NzCountGrid,
    coeffs: &mut LumaCoeffs,
) -> AvcResult<()> {
    let mb_addr = params.mb_addr;
    let table_4x4 = scan.table_4x4();
    let category_of = |kind| {
        BlockCategory::new(kind, plane, config.chroma_format)
            .map(|c| c.with_bit_depth(config.bit_depth(plane)))
    };

    if params.intra16x16 {
        let category = category_of(BlockKind::Intra16x16Dc)?;
        let nc = grid.predict_nc(plane, mb_addr, 0, 0);
        let run = decode_residual_block(br, &category, nc)?;
        run.scatter(table_4x4, 0, coeffs.dc.as_flattened_mut())?;
    }

    for blk8 in 0..4 {
        if params.cbp_luma & (1 << blk8) == 0 {
            continue;
        }
        if params.transform_8x8 {
            let category = category_of(BlockKind::Luma8x8)?;
            decode_luma_8x8(br, &category, scan, mb_addr, blk8, grid, coeffs)?;
            continue;
        }
        let (kind, start) = if params.intra16x16 {
            (BlockKind::Intra16x16Ac, 1)
        } else {
            (BlockKind::Luma4x4, 0)
        };
        let category = category_of(kind)?;
        for blk in blk8 * 4..blk8 * 4 + 4 {
            let (bx, by) = luma_blk_xy(blk);
            let nc = grid.predict_nc(plane, mb_addr, bx, by);
            let run = decode_residual_block(br, &category, nc)?;
            run.scatter(table_4x4, start, coeffs.blocks[blk].as_flattened_mut())?;
            store_count(grid, plane, mb_addr, bx, by, &run, &mut coeffs.nz[blk]);
        }
    }
    Ok(())
}

/// CAVLC 下的 8x8 块: 4 个交织的 4x4 子块, 子块 k 的第 i 个系数位于 8x8 扫描位置 4i + k
fn decode_luma_8x8(
    br: &mut BitReader,
    category: &BlockCategory,
    scan: ScanOrder,
    mb_addr: usize,
    blk8: usize,
    grid: &mut NzCountGrid,
    coeffs: &mut LumaCoeffs,
) -> AvcResult<()> {
    let plane = category.plane;
    let table_8x8 = scan.table_8x8();
    for sub in 0..4 {
        let blk = blk8 * 4 + sub;
        let (bx, by) = luma_blk_xy(blk);
        let nc = grid.predict_nc(plane, mb_addr, bx, by);
        let run = decode_residual_block(br, category, nc)?;
        let block = coeffs.blocks_8x8[blk8].as_flattened_mut();
        for (coded_idx, level) in run.positions() {
            let raster = table_8x8[4 * coded_idx + sub] as usize;
            block[raster] = level;
        }
        store_count(grid, plane, mb_addr, bx, by, &run, &mut coeffs.nz[blk]);
    }
    Ok(())
}

fn decode_chroma(
    br: &mut BitReader,
    params: &MbResidualParams,
    config: &DecoderConfig,
    scan: ScanOrder,
    grid: &mut NzCountGrid,
    chroma: &mut [ChromaCoeffs; 2],
) -> AvcResult<()> {
    let mb_addr = params.mb_addr;
    let chroma_format = config.chroma_format;
    let bit_depth = config.bit_depth_chroma;
    let dc_scan: &[u8] = match chroma_format {
        ChromaFormat::Yuv422 => &CHROMA_DC_422_SCAN,
        _ => &CHROMA_DC_420_SCAN,
    };

    if params.cbp_chroma & 3 != 0 {
        for (plane, coeffs) in [Plane::Cb, Plane::Cr].into_iter().zip(chroma.iter_mut()) {
            let category = BlockCategory::new(BlockKind::ChromaDc, plane, chroma_format)?
                .with_bit_depth(bit_depth);
            let run = decode_residual_block(br, &category, 0)?;
            run.scatter(dc_scan, 0, coeffs.dc.as_flattened_mut())?;
        }
    }

    if params.cbp_chroma & 2 != 0 {
        let block_count = chroma_format.chroma_dc_count();
        let table_4x4 = scan.table_4x4();
        for (plane, coeffs) in [Plane::Cb, Plane::Cr].into_iter().zip(chroma.iter_mut()) {
            let category = BlockCategory::new(BlockKind::ChromaAc, plane, chroma_format)?
                .with_bit_depth(bit_depth);
            for blk in 0..block_count {
                let (bx, by) = (blk % 2, blk / 2);
                let nc = grid.predict_nc(plane, mb_addr, bx, by);
                let run = decode_residual_block(br, &category, nc)?;
                run.scatter(table_4x4, 1, coeffs.ac[blk].as_flattened_mut())?;
                store_count(grid, plane, mb_addr, bx, by, &run, &mut coeffs.nz[blk]);
            }
        }
    }
    Ok(())
}

fn store_count(
    grid: &mut NzCountGrid,
    plane: Plane,
    mb_addr: usize,
    bx: usize,
    by: usize,
    run: &CoefficientRun,
    slot: &mut u8,
) {
    let count = run.total_coeff as u8;
    *slot = count;
    grid.set(plane, mb_addr, bx, by, count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cavlc::TotalZerosTable;
    use crate::cavlc::writer::write_residual_block;
    use crate::neighbors::PCM_NZ_COUNT;
    use avc_core::BitWriter;

    fn coded(values: &[i32], len: usize) -> Vec<i32> {
        let mut v = vec![0; len];
        v[..values.len()].copy_from_slice(values);
        v
    }

    fn empty_4x4(bw: &mut BitWriter, len: usize) {
        write_residual_block(bw, &vec![0; len], 0, TotalZerosTable::Block4x4).unwrap();
    }

    #[test]
    fn test_luma_blk_xy() {
        assert_eq!(luma_blk_xy(0), (0, 0));
        assert_eq!(luma_blk_xy(3), (1, 1));
        assert_eq!(luma_blk_xy(5), (3, 0));
        assert_eq!(luma_blk_xy(10), (0, 3));
        assert_eq!(luma_blk_xy(15), (3, 3));
    }

    #[test]
    fn test_intra16x16_dc_and_ac() {
        let mut bw = BitWriter::new();
        write_residual_block(&mut bw, &coded(&[5, -1], 16), 0, TotalZerosTable::Block4x4).unwrap();
        for _ in 0..15 {
            empty_4x4(&mut bw, 15);
        }
        write_residual_block(&mut bw, &coded(&[0, 0, 3], 15), 0, TotalZerosTable::Block4x4)
            .unwrap();
        let bits = bw.bits_written();
        let data = bw.finish();

        let config = DecoderConfig::default();
        let mut grid = NzCountGrid::new(1, 1, config.chroma_format);
        let params = MbResidualParams {
            intra: true,
            intra16x16: true,
            cbp_luma: 15,
            ..MbResidualParams::default()
        };
        let mut br = BitReader::new(&data);
        let mb = decode_macroblock_residual(&mut br, &params, &config, &mut grid, 0).unwrap();
        assert_eq!(br.position(), bits, "应恰好消耗整个宏块残差");
        assert_eq!(mb.luma[0].dc[0][0], 5);
        assert_eq!(mb.luma[0].dc[0][1], -1);
        // 扫描位置 1 + 2 = 3 -> 光栅 8
        assert_eq!(mb.luma[0].blocks[15][2][0], 3);
        assert_eq!(mb.luma[0].nz[15], 1);
        assert_eq!(grid.get(Plane::Luma, 0, 3, 3), 1);
        assert!(!mb.is_empty());
    }

    #[test]
    fn test_8x8_interleaved_sub_blocks() {
        let mut bw = BitWriter::new();
        let table = TotalZerosTable::Block4x4;
        write_residual_block(&mut bw, &coded(&[7], 16), 0, table).unwrap();
        write_residual_block(&mut bw, &coded(&[0, -2], 16), 1, table).unwrap();
        write_residual_block(&mut bw, &coded(&[], 16), 1, table).unwrap();
        write_residual_block(&mut bw, &coded(&[], 16), 1, table).unwrap();
        let bits = bw.bits_written();
        let data = bw.finish();

        let config = DecoderConfig::default();
        let mut grid = NzCountGrid::new(1, 1, config.chroma_format);
        let params = MbResidualParams {
            cbp_luma: 0b0001,
            transform_8x8: true,
            ..MbResidualParams::default()
        };
        let mut br = BitReader::new(&data);
        let mb = decode_macroblock_residual(&mut br, &params, &config, &mut grid, 0).unwrap();
        assert_eq!(br.position(), bits);
        let block = &mb.luma[0].blocks_8x8[0];
        assert_eq!(block[0][0], 7);
        // 子块 1 的系数 1 -> 8x8 扫描位置 5 -> 光栅 2
        assert_eq!(block[0][2], -2);
        assert_eq!(&mb.luma[0].nz[..4], &[1, 1, 0, 0]);
        assert_eq!(grid.get(Plane::Luma, 0, 1, 0), 1);
    }

    #[test]
    fn test_chroma_422_dc_and_ac() {
        let mut bw = BitWriter::new();
        write_residual_block(&mut bw, &coded(&[0, 3], 8), -2, TotalZerosTable::ChromaDc422)
            .unwrap();
        write_residual_block(&mut bw, &coded(&[], 8), -2, TotalZerosTable::ChromaDc422).unwrap();
        for blk in 0..8 {
            if blk == 5 {
                write_residual_block(&mut bw, &coded(&[4], 15), 0, TotalZerosTable::Block4x4)
                    .unwrap();
            } else {
                empty_4x4(&mut bw, 15);
            }
        }
        for _ in 0..8 {
            empty_4x4(&mut bw, 15);
        }
        let bits = bw.bits_written();
        let data = bw.finish();

        let config = DecoderConfig {
            chroma_format: ChromaFormat::Yuv422,
            ..DecoderConfig::default()
        };
        let mut grid = NzCountGrid::new(1, 1, config.chroma_format);
        let params = MbResidualParams {
            cbp_chroma: 2,
            ..MbResidualParams::default()
        };
        let mut br = BitReader::new(&data);
        let mb = decode_macroblock_residual(&mut br, &params, &config, &mut grid, 0).unwrap();
        assert_eq!(br.position(), bits);
        assert_eq!(mb.chroma[0].dc[1][0], 3, "4:2:2 DC 扫描位置 1 对应第 1 行第 0 列");
        assert_eq!(mb.chroma[0].ac[5][0][1], 4);
        assert_eq!(mb.chroma[0].nz[5], 1);
        assert_eq!(grid.get(Plane::Cb, 0, 1, 2), 1);
        assert_eq!(grid.get(Plane::Cr, 0, 1, 2), 0);
    }

    #[test]
    fn test_444_codes_chroma_as_luma() {
        let mut bw = BitWriter::new();
        for _ in 0..3 {
            write_residual_block(&mut bw, &coded(&[1], 16), 0, TotalZerosTable::Block4x4).unwrap();
            for _ in 1..4 {
                empty_4x4(&mut bw, 16);
            }
        }
        let bits = bw.bits_written();
        let data = bw.finish();

        let config = DecoderConfig {
            chroma_format: ChromaFormat::Yuv444,
            ..DecoderConfig::default()
        };
        let mut grid = NzCountGrid::new(1, 1, config.chroma_format);
        let params = MbResidualParams {
            cbp_luma: 1,
            cbp_chroma: 0,
            ..MbResidualParams::default()
        };
        let mut br = BitReader::new(&data);
        let mb = decode_macroblock_residual(&mut br, &params, &config, &mut grid, 0).unwrap();
        assert_eq!(br.position(), bits);
        for plane in Plane::ALL {
            assert_eq!(mb.luma[plane.index()].blocks[0][0][0], 1, "{:?}", plane);
            assert_eq!(grid.get(plane, 0, 0, 0), 1);
        }
    }

    #[test]
    fn test_skip_and_pcm_macroblocks() {
        let config = DecoderConfig::default();
        let mut grid = NzCountGrid::new(2, 1, config.chroma_format);
        let data = [];
        let mut br = BitReader::new(&data);

        let pcm = MbResidualParams {
            kind: MbKind::Pcm,
            ..MbResidualParams::default()
        };
        let mb = decode_macroblock_residual(&mut br, &pcm, &config, &mut grid, 0).unwrap();
        assert!(mb.is_empty());
        assert_eq!(grid.get(Plane::Cb, 0, 1, 1), PCM_NZ_COUNT);

        let skip = MbResidualParams {
            mb_addr: 1,
            kind: MbKind::Skip,
            ..MbResidualParams::default()
        };
        decode_macroblock_residual(&mut br, &skip, &config, &mut grid, 0).unwrap();
        assert_eq!(grid.get(Plane::Luma, 1, 0, 0), 0);
        // 右侧宏块左邻居为 PCM
        assert_eq!(grid.predict_nc(Plane::Luma, 1, 0, 0), 16);
        assert_eq!(br.position(), 0);
    }

    #[test]
    fn test_rejects_invalid_params() {
        let config = DecoderConfig::default();
        let mut grid = NzCountGrid::new(1, 1, config.chroma_format);
        let data = [0xFF];
        let mut br = BitReader::new(&data);
        let params = MbResidualParams {
            intra16x16: true,
            transform_8x8: true,
            ..MbResidualParams::default()
        };
        assert!(matches!(
            decode_macroblock_residual(&mut br, &params, &config, &mut grid, 0),
            Err(AvcError::InvalidArgument(_))
        ));
        let params = MbResidualParams {
            cbp_chroma: 3,
            ..MbResidualParams::default()
        };
        assert!(decode_macroblock_residual(&mut br, &params, &config, &mut grid, 0).is_err());
    }

    #[test]
    fn test_truncated_residual_is_out_of_data() {
        let config = DecoderConfig::default();
        let mut grid = NzCountGrid::new(1, 1, config.chroma_format);
        let data = [];
        let mut br = BitReader::new(&data);
        let params = MbResidualParams {
            cbp_luma: 1,
            ..MbResidualParams::default()
        };
        assert_eq!(
            decode_macroblock_residual(&mut br, &params, &config, &mut grid, 0),
            Err(AvcError::OutOfData)
        );
    }
}
