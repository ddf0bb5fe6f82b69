//! 单个残差块的 CAVLC 解码.
//!
//! 解码顺序: coeff_token -> trailing_ones 符号 -> 其余电平 -> total_zeros -> run_before,
//! 结果为按频率从高到低排列的 `(level, run_before)` 序列, 再按扫描表展开到块内位置.

use avc_core::{AvcError, AvcResult, BitReader};

use crate::cavlc::{
    LevelSuffixState, TotalZerosTable, read_coeff_token, read_run_before, read_total_zeros,
};
use crate::config::{ChromaFormat, Plane};

// ============================================================
// 块类别定义
// ============================================================

/// 残差块种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Intra16x16 DC (16 个系数)
    Intra16x16Dc,
    /// Intra16x16 AC (15 个系数, 跳过 DC)
    Intra16x16Ac,
    /// 普通 4x4 块
    Luma4x4,
    /// 8x8 块 (CAVLC 下拆成 4 个交织的 4x4 块编码)
    Luma8x8,
    /// 色度 DC (4:2:0 为 4 个, 4:2:2 为 8 个)
    ChromaDc,
    /// 色度 AC (15 个系数)
    ChromaAc,
}

/// 残差块类别: 种类 + 所属分量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCategory {
    pub kind: BlockKind,
    pub plane: Plane,
    chroma_format: ChromaFormat,
    /// 分量位深, 决定电平的合法范围
    bit_depth: u8,
}

impl BlockCategory {
    /// 构造块类别并校验其在当前色度格式下是否存在
    pub fn new(kind: BlockKind, plane: Plane, chroma_format: ChromaFormat) -> AvcResult<Self> {
        let valid = match kind {
            BlockKind::ChromaDc | BlockKind::ChromaAc => {
                plane != Plane::Luma && chroma_format.has_chroma_dc()
            }
            _ => plane == Plane::Luma || chroma_format == ChromaFormat::Yuv444,
        };
        if !valid {
            return Err(AvcError::InvalidBlockCategory(format!(
                "{:?}/{:?} 在 {:?} 下不存在",
                kind, plane, chroma_format
            )));
        }
        Ok(Self {
            kind,
            plane,
            chroma_format,
            bit_depth: 8,
        })
    }

    /// 指定分量位深 (默认 8)
    pub fn with_bit_depth(mut self, bit_depth: u8) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    /// 单次 CAVLC 解码的系数容量
    pub fn max_coeff(&self) -> usize {
        match self.kind {
            BlockKind::Intra16x16Dc | BlockKind::Luma4x4 | BlockKind::Luma8x8 => 16,
            BlockKind::Intra16x16Ac | BlockKind::ChromaAc => 15,
            BlockKind::ChromaDc => self.chroma_format.chroma_dc_count(),
        }
    }

    /// 色度 DC 使用固定的 nC (-1 / -2), 其余类别返回 None
    pub fn fixed_nc(&self) -> Option<i32> {
        match (self.kind, self.chroma_format) {
            (BlockKind::ChromaDc, ChromaFormat::Yuv422) => Some(-2),
            (BlockKind::ChromaDc, _) => Some(-1),
            _ => None,
        }
    }

    fn total_zeros_table(&self) -> TotalZerosTable {
        match (self.kind, self.chroma_format) {
            (BlockKind::ChromaDc, ChromaFormat::Yuv422) => TotalZerosTable::ChromaDc422,
            (BlockKind::ChromaDc, _) => TotalZerosTable::ChromaDc420,
            _ => TotalZerosTable::Block4x4,
        }
    }
}

// ============================================================
// 系数序列
// ============================================================

/// 一个块解码得到的 `(level, run_before)` 序列, 高频在前
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoefficientRun {
    /// 非零系数个数
    pub total_coeff: usize,
    /// 末尾 ±1 个数
    pub trailing_ones: usize,
    /// 最后一个非零系数之前的零个数
    pub total_zeros: usize,
    levels: [i32; 16],
    runs: [u8; 16],
}

impl CoefficientRun {
    /// 电平 (高频在前)
    pub fn levels(&self) -> &[i32] {
        &self.levels[..self.total_coeff]
    }

    /// 每个电平之前 (更低频方向) 的零个数, 最后一项为剩余零个数
    pub fn runs(&self) -> &[u8] {
        &self.runs[..self.total_coeff]
    }

    /// 是否为全零块
    pub fn is_empty(&self) -> bool {
        self.total_coeff == 0
    }

    /// 按编码顺序 (扫描位置) 依次给出 `(coded_idx, level)`, 低频在前
    pub fn positions(&self) -> impl Iterator<Item = (usize, i32)> + '_ {
        let mut idx = 0usize;
        (0..self.total_coeff).rev().map(move |i| {
            idx += self.runs[i] as usize;
            let item = (idx, self.levels[i]);
            idx += 1;
            item
        })
    }

    /// 按扫描表展开到块内光栅位置
    ///
    /// `start` 为第一个编码系数对应的扫描位置 (AC 块为 1).
    pub fn scatter(&self, scan: &[u8], start: usize, block: &mut [i32]) -> AvcResult<()> {
        for (coded_idx, level) in self.positions() {
            let scan_pos = start + coded_idx;
            let raster = *scan.get(scan_pos).ok_or_else(|| {
                AvcError::InvalidData(format!("系数位置 {} 超出扫描表", scan_pos))
            })? as usize;
            let slot = block.get_mut(raster).ok_or_else(|| {
                AvcError::InvalidData(format!("光栅位置 {} 超出块大小", raster))
            })?;
            *slot = level;
        }
        Ok(())
    }
}

// ============================================================
// 块解码
// ============================================================

/// 解码一个残差块
///
/// `nc` 为由相邻块推导的预测非零系数个数, 色度 DC 时忽略 (固定为 -1 / -2).
pub fn decode_residual_block(
    br: &mut BitReader,
    category: &BlockCategory,
    nc: i32,
) -> AvcResult<CoefficientRun> {
    let max_coeff = category.max_coeff();
    let nc = category.fixed_nc().unwrap_or(nc);
    let token = read_coeff_token(br, nc)?;
    let total_coeff = token.value1 as usize;
    let trailing_ones = token.value2 as usize;

    let mut run = CoefficientRun {
        total_coeff,
        trailing_ones,
        ..CoefficientRun::default()
    };
    if total_coeff == 0 {
        return Ok(run);
    }
    if total_coeff > max_coeff {
        return Err(AvcError::InvalidData(format!(
            "total_coeff {} 超过块容量 {}",
            total_coeff, max_coeff
        )));
    }

    // trailing ones: 每个 1 位, 1 表示负
    for i in 0..trailing_ones {
        run.levels[i] = if br.read_flag()? { -1 } else { 1 };
    }

    let mut suffix = LevelSuffixState::new(total_coeff, trailing_ones, category.bit_depth);
    for i in trailing_ones..total_coeff {
        let bump = i == trailing_ones && trailing_ones < 3;
        run.levels[i] = suffix.decode_level(br, bump)?;
    }

    let mut zeros_left = if total_coeff < max_coeff {
        read_total_zeros(br, category.total_zeros_table(), total_coeff)?.value1 as usize
    } else {
        0
    };
    if total_coeff + zeros_left > max_coeff {
        return Err(AvcError::InvalidData(format!(
            "total_zeros {} + total_coeff {} 超过块容量 {}",
            zeros_left, total_coeff, max_coeff
        )));
    }
    run.total_zeros = zeros_left;

    for i in 0..total_coeff - 1 {
        if zeros_left == 0 {
            break;
        }
        let run_before = read_run_before(br, zeros_left)?.value1 as usize;
        if run_before > zeros_left {
            return Err(AvcError::InvalidData(format!(
                "run_before {} 超过剩余零个数 {}",
                run_before, zeros_left
            )));
        }
        run.runs[i] = run_before as u8;
        zeros_left -= run_before;
    }
    run.runs[total_coeff - 1] = zeros_left as u8;

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use avc_core::BitWriter;

    fn luma4x4() -> BlockCategory {
        BlockCategory::new(BlockKind::Luma4x4, Plane::Luma, ChromaFormat::Yuv420).unwrap()
    }

    fn encode(coeffs: &[i32]) -> (Vec<u8>, usize) {
        let mut bw = BitWriter::new();
        crate::cavlc::writer::write_residual_block(&mut bw, coeffs, 0, TotalZerosTable::Block4x4)
            .unwrap();
        let bits = bw.bits_written();
        (bw.finish(), bits)
    }

    fn decode_raster(data: &[u8], category: &BlockCategory) -> AvcResult<(Vec<i32>, usize)> {
        let mut br = BitReader::new(data);
        let run = decode_residual_block(&mut br, category, 0)?;
        let scan: Vec<u8> = (0..16).collect();
        let mut out = vec![0i32; 16];
        run.scatter(&scan, 0, &mut out)?;
        Ok((out, br.position()))
    }

    #[test]
    fn test_escape_levels_from_suffix_length_zero() {
        // 单系数块: 首个电平从 suffixLength 0 开始, prefix 14 / 15 / 16+ 转义
        let cases = [9, -8, 20, -17, 3000, -5000, 32_767];
        for level in cases {
            let mut coeffs = [0i32; 16];
            coeffs[0] = level;
            let (data, bits) = encode(&coeffs);
            let (decoded, consumed) = decode_raster(&data, &luma4x4()).unwrap();
            assert_eq!(decoded, coeffs.to_vec(), "电平 {}", level);
            assert_eq!(consumed, bits, "电平 {} 的码字长度不符", level);
        }
    }

    #[test]
    fn test_escape_levels_from_suffix_length_one() {
        // 11 个系数且 trailing_ones = 0: suffixLength 从 1 开始, 首个 (最高频) 电平即走转义
        let cases: [[i32; 11]; 3] = [
            [7, -9, 4, 2, 2, 2, 2, 2, 2, -300, 4000],
            [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, -32_768],
            [-2, 3, -4, 5, -6, 7, -8, 9, 120, -1500, 16],
        ];
        for case in cases {
            let mut coeffs = [0i32; 16];
            coeffs[..11].copy_from_slice(&case);
            let (data, bits) = encode(&coeffs);
            let (decoded, consumed) = decode_raster(&data, &luma4x4()).unwrap();
            assert_eq!(decoded, coeffs.to_vec(), "块 {:?}", case);
            assert_eq!(consumed, bits);
        }
    }

    #[test]
    fn test_oversized_level_rejected() {
        let mut coeffs = [0i32; 16];
        coeffs[0] = 40_000;
        let (data, _) = encode(&coeffs);
        assert!(matches!(
            decode_raster(&data, &luma4x4()),
            Err(AvcError::InvalidData(_))
        ));
        let category = luma4x4().with_bit_depth(10);
        let (decoded, _) = decode_raster(&data, &category).unwrap();
        assert_eq!(decoded[0], 40_000, "10 位位深下该电平合法");
    }

    #[test]
    fn test_zero_block_consumes_only_token() {
        let data = [0b1000_0000];
        let mut br = BitReader::new(&data);
        let run = decode_residual_block(&mut br, &luma4x4(), 0).unwrap();
        assert!(run.is_empty());
        assert_eq!(br.position(), 1, "total_coeff=0 时不应读取 total_zeros/run_before");
    }

    #[test]
    fn test_standard_example_block() {
        // 块 (zigzag 顺序): 0 3 0 1 -1 -1 0 1 0 ...
        // coeff_token (tc=5, t1=3, nC=0): 0000 100
        // T1 符号: 0 1 1 (+1, -1, -1)
        // level: +1 (prefix 1, 首个非 T1 不加一因为 t1 == 3) -> "1"
        // level: +3 -> suffixLength 1, levelCode 4 -> "001 0"
        // total_zeros=3 (tc=5): "111"
        // run_before: zl=3 "10"(1), zl=2 "1"(0), zl=2 "1"(0), zl=2 "01"(1)
        let mut bw = BitWriter::new();
        bw.write_bits(0b0000100, 7);
        bw.write_bits(0b011, 3);
        bw.write_bits(0b1, 1);
        bw.write_bits(0b0010, 4);
        bw.write_bits(0b111, 3);
        bw.write_bits(0b10, 2);
        bw.write_bits(0b1, 1);
        bw.write_bits(0b1, 1);
        bw.write_bits(0b01, 2);
        let total_bits = bw.bits_written();
        let data = bw.finish();

        let mut br = BitReader::new(&data);
        let run = decode_residual_block(&mut br, &luma4x4(), 0).unwrap();
        assert_eq!(br.position(), total_bits);
        assert_eq!(run.total_coeff, 5);
        assert_eq!(run.trailing_ones, 3);
        assert_eq!(run.total_zeros, 3);
        assert_eq!(run.levels(), &[1, -1, -1, 1, 3]);
        assert_eq!(run.runs(), &[1, 0, 0, 1, 1]);

        let sum: usize = run.runs().iter().map(|&r| r as usize).sum();
        assert_eq!(sum, run.total_zeros, "run_before 之和应等于 total_zeros");

        let mut coded = [0i32; 16];
        let scan: Vec<u8> = (0..16).collect();
        run.scatter(&scan, 0, &mut coded).unwrap();
        assert_eq!(&coded[..8], &[0, 3, 0, 1, -1, -1, 0, 1]);
    }

    #[test]
    fn test_full_block_skips_total_zeros() {
        // tc=16 t1=0 (nC>=8 定长码 111100), suffixLength 从 1 开始
        let mut bw = BitWriter::new();
        bw.write_bits(0b111100, 6);
        // 首个电平: suffixLength 1, bump: levelCode 0 + 2 -> +2; 码字 "1" + "0"
        bw.write_bits(0b10, 2);
        // 其余 15 个电平: suffixLength 保持 1, 电平 +1 -> "10"
        for _ in 0..15 {
            bw.write_bits(0b10, 2);
        }
        let total_bits = bw.bits_written();
        bw.write_bits(0xFF, 8);
        let data = bw.finish();
        let mut br = BitReader::new(&data);
        let run = decode_residual_block(&mut br, &luma4x4(), 8).unwrap();
        assert_eq!(run.total_coeff, 16);
        assert_eq!(run.total_zeros, 0);
        assert_eq!(run.levels()[0], 2);
        assert!(run.levels()[1..].iter().all(|&l| l == 1));
        assert_eq!(br.position(), total_bits);
    }

    #[test]
    fn test_ac_block_rejects_sixteen_coeffs() {
        let cat =
            BlockCategory::new(BlockKind::ChromaAc, Plane::Cb, ChromaFormat::Yuv420).unwrap();
        let data = [0b1111_0000, 0];
        let mut br = BitReader::new(&data);
        assert!(matches!(
            decode_residual_block(&mut br, &cat, 8),
            Err(AvcError::InvalidData(_))
        ));
    }

    #[test]
    fn test_chroma_dc_uses_fixed_nc() {
        let cat =
            BlockCategory::new(BlockKind::ChromaDc, Plane::Cr, ChromaFormat::Yuv420).unwrap();
        assert_eq!(cat.max_coeff(), 4);
        // "1" -> tc 1 t1 1; 符号 "1" -> -1; total_zeros (tc=1) "000" -> 3
        let data = [0b1100_0000];
        let mut br = BitReader::new(&data);
        let run = decode_residual_block(&mut br, &cat, 5).unwrap();
        assert_eq!(run.levels(), &[-1]);
        assert_eq!(run.total_zeros, 3);
        let mut dc = [0i32; 4];
        run.scatter(&crate::scan::CHROMA_DC_420_SCAN, 0, &mut dc).unwrap();
        assert_eq!(dc, [0, 0, 0, -1]);
    }

    #[test]
    fn test_invalid_categories() {
        assert!(matches!(
            BlockCategory::new(BlockKind::ChromaDc, Plane::Cb, ChromaFormat::Yuv444),
            Err(AvcError::InvalidBlockCategory(_))
        ));
        assert!(BlockCategory::new(BlockKind::ChromaAc, Plane::Luma, ChromaFormat::Yuv420).is_err());
        assert!(BlockCategory::new(BlockKind::Luma4x4, Plane::Cb, ChromaFormat::Yuv420).is_err());
        assert!(BlockCategory::new(BlockKind::ChromaDc, Plane::Cb, ChromaFormat::Monochrome).is_err());
        assert!(BlockCategory::new(BlockKind::Luma8x8, Plane::Cr, ChromaFormat::Yuv444).is_ok());
    }
}
