//! CAVLC 表驱动变长码解码.
//!
//! coeff_token / total_zeros / run_before 都以 `(码长, 码字)` 二维表描述,
//! 解码时线性扫描表项, 第一个与比特流前缀相同的表项即为结果.
//! 电平 (level) 使用前缀 + 后缀的转义编码, 见 [`level`].

pub mod level;
#[cfg(any(test, feature = "test-util"))]
pub mod writer;
pub(crate) mod tables;

use avc_core::{AvcError, AvcResult, BitReader, SyntaxElement};

use tables::*;

pub use level::{LevelSuffixState, level_from_code, read_level_code};

// ============================================================
// 表族选择
// ============================================================

/// coeff_token 码表族
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoeffTokenTable {
    /// 0 <= nC < 2
    Nc0To1,
    /// 2 <= nC < 4
    Nc2To3,
    /// 4 <= nC < 8
    Nc4To7,
    /// nC >= 8, 6 位定长码
    Nc8Plus,
    /// nC == -1, 4:2:0 色度 DC
    ChromaDc420,
    /// nC == -2, 4:2:2 色度 DC
    ChromaDc422,
}

impl CoeffTokenTable {
    /// 由 nC 选择码表族
    pub fn from_nc(nc: i32) -> AvcResult<Self> {
        match nc {
            -2 => Ok(Self::ChromaDc422),
            -1 => Ok(Self::ChromaDc420),
            0..=1 => Ok(Self::Nc0To1),
            2..=3 => Ok(Self::Nc2To3),
            4..=7 => Ok(Self::Nc4To7),
            n if n >= 8 => Ok(Self::Nc8Plus),
            _ => {
                log::debug!("AVC: coeff_token 码表选择失败, nC={}", nc);
                Err(AvcError::InvalidArgument(format!("无效 nC: {}", nc)))
            }
        }
    }
}

/// total_zeros 码表族
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalZerosTable {
    /// 4x4 块 (含 15 系数的 AC 块)
    Block4x4,
    /// 4:2:0 色度 DC
    ChromaDc420,
    /// 4:2:2 色度 DC
    ChromaDc422,
}

// ============================================================
// 通用二维表匹配
// ============================================================

/// 在 `[primary][secondary]` 排列的码表中查找与比特流前缀匹配的表项
///
/// 返回 `(primary, secondary, len)` 并消耗 `len` 位. 剩余位数不足以覆盖
/// 最长码字且无匹配时报告 `OutOfData`, 否则报告 `NoTableMatch`.
fn match_vlc_2d<const W: usize>(
    br: &mut BitReader,
    lens: &[[u8; W]],
    codes: &[[u8; W]],
    max_len: u32,
    table: &'static str,
) -> AvcResult<(usize, usize, u32)> {
    let avail = max_len.min(br.bits_left() as u32);
    let window = br.peek_bits(avail)?;
    for (i, (len_row, code_row)) in lens.iter().zip(codes.iter()).enumerate() {
        for (j, (&len, &code)) in len_row.iter().zip(code_row.iter()).enumerate() {
            let len = u32::from(len);
            if len == 0 || len > avail {
                continue;
            }
            if window >> (avail - len) == u32::from(code) {
                br.skip_bits(len as usize)?;
                return Ok((i, j, len));
            }
        }
    }
    if avail < max_len {
        Err(AvcError::OutOfData)
    } else {
        Err(AvcError::NoTableMatch { table })
    }
}

// ============================================================
// coeff_token
// ============================================================

/// 解码 coeff_token
///
/// 返回的语法元素中 `value1` 为 total_coeff, `value2` 为 trailing_ones.
pub fn read_coeff_token(br: &mut BitReader, nc: i32) -> AvcResult<SyntaxElement> {
    let table = CoeffTokenTable::from_nc(nc)?;
    let (t1, tc, len) = match table {
        CoeffTokenTable::Nc0To1 => {
            match_vlc_2d(br, &COEFF_TOKEN_LEN[0], &COEFF_TOKEN_CODE[0], 16, "coeff_token")?
        }
        CoeffTokenTable::Nc2To3 => {
            match_vlc_2d(br, &COEFF_TOKEN_LEN[1], &COEFF_TOKEN_CODE[1], 14, "coeff_token")?
        }
        CoeffTokenTable::Nc4To7 => {
            match_vlc_2d(br, &COEFF_TOKEN_LEN[2], &COEFF_TOKEN_CODE[2], 10, "coeff_token")?
        }
        CoeffTokenTable::Nc8Plus => return read_coeff_token_flc(br),
        CoeffTokenTable::ChromaDc420 => match_vlc_2d(
            br,
            &CHROMA_DC_420_COEFF_TOKEN_LEN,
            &CHROMA_DC_420_COEFF_TOKEN_CODE,
            8,
            "coeff_token_chroma_dc_420",
        )?,
        CoeffTokenTable::ChromaDc422 => match_vlc_2d(
            br,
            &CHROMA_DC_422_COEFF_TOKEN_LEN,
            &CHROMA_DC_422_COEFF_TOKEN_CODE,
            13,
            "coeff_token_chroma_dc_422",
        )?,
    };
    Ok(SyntaxElement {
        len,
        inf: 0,
        value1: tc as i32,
        value2: t1 as i32,
    })
}

/// nC >= 8 时的 6 位定长 coeff_token: `xxxxyy`, `xxxx = total_coeff - 1`, `yy = trailing_ones`
///
/// `000011` 表示 total_coeff = 0.
fn read_coeff_token_flc(br: &mut BitReader) -> AvcResult<SyntaxElement> {
    let code = br.read_bits(6)?;
    let (tc, t1) = if code == 3 {
        (0, 0)
    } else {
        ((code >> 2) + 1, code & 3)
    };
    if t1 > tc {
        return Err(AvcError::NoTableMatch {
            table: "coeff_token_flc",
        });
    }
    Ok(SyntaxElement {
        len: 6,
        inf: code,
        value1: tc as i32,
        value2: t1 as i32,
    })
}

// ============================================================
// total_zeros / run_before
// ============================================================

/// 解码 total_zeros, 调用方保证 `1 <= total_coeff < 块容量`
pub fn read_total_zeros(
    br: &mut BitReader,
    table: TotalZerosTable,
    total_coeff: usize,
) -> AvcResult<SyntaxElement> {
    let row = total_coeff
        .checked_sub(1)
        .ok_or_else(|| AvcError::InvalidArgument("total_zeros 需要 total_coeff >= 1".into()))?;
    let (_, tz, len) = match table {
        TotalZerosTable::Block4x4 if row < TOTAL_ZEROS_LEN.len() => match_vlc_2d(
            br,
            &TOTAL_ZEROS_LEN[row..=row],
            &TOTAL_ZEROS_CODE[row..=row],
            9,
            "total_zeros",
        )?,
        TotalZerosTable::ChromaDc420 if row < CHROMA_DC_420_TOTAL_ZEROS_LEN.len() => {
            match_vlc_2d(
                br,
                &CHROMA_DC_420_TOTAL_ZEROS_LEN[row..=row],
                &CHROMA_DC_420_TOTAL_ZEROS_CODE[row..=row],
                3,
                "total_zeros_chroma_dc_420",
            )?
        }
        TotalZerosTable::ChromaDc422 if row < CHROMA_DC_422_TOTAL_ZEROS_LEN.len() => {
            match_vlc_2d(
                br,
                &CHROMA_DC_422_TOTAL_ZEROS_LEN[row..=row],
                &CHROMA_DC_422_TOTAL_ZEROS_CODE[row..=row],
                5,
                "total_zeros_chroma_dc_422",
            )?
        }
        _ => {
            return Err(AvcError::InvalidArgument(format!(
                "total_coeff={} 超出 {:?} 码表范围",
                total_coeff, table
            )));
        }
    };
    Ok(SyntaxElement::single(len, 0, tz as i32))
}

/// 解码 run_before, 调用方保证 `zeros_left >= 1`
pub fn read_run_before(br: &mut BitReader, zeros_left: usize) -> AvcResult<SyntaxElement> {
    if zeros_left == 0 {
        return Err(AvcError::InvalidArgument("run_before 需要 zeros_left >= 1".into()));
    }
    let row = zeros_left.min(7) - 1;
    let (_, run, len) = match_vlc_2d(
        br,
        &RUN_BEFORE_LEN[row..=row],
        &RUN_BEFORE_CODE[row..=row],
        11,
        "run_before",
    )?;
    Ok(SyntaxElement::single(len, 0, run as i32))
}
