//! CAVLC 残差块写入.
//!
//! 解码的逆过程, 只用于构造测试与基准所需的码流, 不做码率相关的决策.

use avc_core::{AvcError, AvcResult, BitWriter};

use super::level::MAX_LEVEL_PREFIX;
use super::tables::*;
use super::{CoeffTokenTable, TotalZerosTable};

/// 写入 coeff_token
pub fn write_coeff_token(
    bw: &mut BitWriter,
    nc: i32,
    total_coeff: usize,
    trailing_ones: usize,
) -> AvcResult<()> {
    let entry = match CoeffTokenTable::from_nc(nc)? {
        CoeffTokenTable::Nc0To1 => {
            lookup(&COEFF_TOKEN_LEN[0], &COEFF_TOKEN_CODE[0], trailing_ones, total_coeff)
        }
        CoeffTokenTable::Nc2To3 => {
            lookup(&COEFF_TOKEN_LEN[1], &COEFF_TOKEN_CODE[1], trailing_ones, total_coeff)
        }
        CoeffTokenTable::Nc4To7 => {
            lookup(&COEFF_TOKEN_LEN[2], &COEFF_TOKEN_CODE[2], trailing_ones, total_coeff)
        }
        CoeffTokenTable::Nc8Plus => {
            if total_coeff == 0 {
                Some((6, 3))
            } else if total_coeff <= 16 && trailing_ones <= total_coeff.min(3) {
                Some((6, (((total_coeff - 1) << 2) | trailing_ones) as u32))
            } else {
                None
            }
        }
        CoeffTokenTable::ChromaDc420 => lookup(
            &CHROMA_DC_420_COEFF_TOKEN_LEN,
            &CHROMA_DC_420_COEFF_TOKEN_CODE,
            trailing_ones,
            total_coeff,
        ),
        CoeffTokenTable::ChromaDc422 => lookup(
            &CHROMA_DC_422_COEFF_TOKEN_LEN,
            &CHROMA_DC_422_COEFF_TOKEN_CODE,
            trailing_ones,
            total_coeff,
        ),
    };
    let (len, code) = entry.ok_or_else(|| {
        AvcError::InvalidArgument(format!(
            "coeff_token 不存在: nC={} total_coeff={} trailing_ones={}",
            nc, total_coeff, trailing_ones
        ))
    })?;
    bw.write_bits(code, len);
    Ok(())
}

fn lookup<const W: usize>(
    lens: &[[u8; W]],
    codes: &[[u8; W]],
    row: usize,
    col: usize,
) -> Option<(u32, u32)> {
    let len = *lens.get(row)?.get(col)?;
    if len == 0 {
        return None;
    }
    Some((u32::from(len), u32::from(codes[row][col])))
}

/// 写入一个带符号电平 (levelCode 已包含首个非 T1 电平的 -2 修正)
pub(crate) fn write_level_code(
    bw: &mut BitWriter,
    code: u32,
    suffix_length: u32,
) -> AvcResult<()> {
    let write_prefix = |bw: &mut BitWriter, prefix: u32| {
        for _ in 0..prefix {
            bw.write_bit(0);
        }
        bw.write_bit(1);
    };

    if suffix_length == 0 {
        if code < 14 {
            write_prefix(bw, code);
            return Ok(());
        }
        if code < 30 {
            write_prefix(bw, 14);
            bw.write_bits(code - 14, 4);
            return Ok(());
        }
    } else if (code >> suffix_length) < 15 {
        write_prefix(bw, code >> suffix_length);
        bw.write_bits(code & ((1 << suffix_length) - 1), suffix_length);
        return Ok(());
    }

    // 转义: prefix >= 15, 后缀 prefix - 3 位
    let base = (15u32 << suffix_length) + if suffix_length == 0 { 15 } else { 0 };
    for prefix in 15..=MAX_LEVEL_PREFIX as u32 {
        let start = if prefix >= 16 {
            base + (1u32 << (prefix - 3)) - 4096
        } else {
            base
        };
        if code >= start && code - start < (1u32 << (prefix - 3)) {
            write_prefix(bw, prefix);
            bw.write_bits(code - start, prefix - 3);
            return Ok(());
        }
    }
    Err(AvcError::InvalidArgument(format!("电平码 {} 超出可编码范围", code)))
}

/// 写入一个残差块
///
/// `coeffs` 为按扫描顺序 (低频在前) 排列的系数, 长度即块容量.
pub fn write_residual_block(
    bw: &mut BitWriter,
    coeffs: &[i32],
    nc: i32,
    total_zeros_table: TotalZerosTable,
) -> AvcResult<()> {
    let max_coeff = coeffs.len();
    // 非零系数位置, 高频在前
    let positions: Vec<usize> = (0..max_coeff).rev().filter(|&i| coeffs[i] != 0).collect();
    let total_coeff = positions.len();
    let mut trailing_ones = 0;
    for &pos in &positions {
        if trailing_ones == 3 || coeffs[pos].abs() != 1 {
            break;
        }
        trailing_ones += 1;
    }

    write_coeff_token(bw, nc, total_coeff, trailing_ones)?;
    if total_coeff == 0 {
        return Ok(());
    }

    for &pos in &positions[..trailing_ones] {
        bw.write_flag(coeffs[pos] < 0);
    }

    let mut suffix_length: u32 = if total_coeff > 10 && trailing_ones < 3 { 1 } else { 0 };
    for (i, &pos) in positions.iter().enumerate().skip(trailing_ones) {
        let level = coeffs[pos];
        let mut code = if level > 0 {
            2 * level.unsigned_abs() - 2
        } else {
            2 * level.unsigned_abs() - 1
        };
        if i == trailing_ones && trailing_ones < 3 {
            code -= 2;
        }
        write_level_code(bw, code, suffix_length)?;
        if suffix_length == 0 {
            suffix_length = 1;
        }
        if level.unsigned_abs() > (3 << (suffix_length - 1)) && suffix_length < 6 {
            suffix_length += 1;
        }
    }

    let total_zeros = positions[0] + 1 - total_coeff;
    if total_coeff < max_coeff {
        let row = total_coeff - 1;
        let entry = match total_zeros_table {
            TotalZerosTable::Block4x4 => {
                lookup(&TOTAL_ZEROS_LEN, &TOTAL_ZEROS_CODE, row, total_zeros)
            }
            TotalZerosTable::ChromaDc420 => lookup(
                &CHROMA_DC_420_TOTAL_ZEROS_LEN,
                &CHROMA_DC_420_TOTAL_ZEROS_CODE,
                row,
                total_zeros,
            ),
            TotalZerosTable::ChromaDc422 => lookup(
                &CHROMA_DC_422_TOTAL_ZEROS_LEN,
                &CHROMA_DC_422_TOTAL_ZEROS_CODE,
                row,
                total_zeros,
            ),
        };
        let (len, code) = entry.ok_or_else(|| {
            AvcError::InvalidArgument(format!(
                "total_zeros 不存在: total_coeff={} total_zeros={}",
                total_coeff, total_zeros
            ))
        })?;
        bw.write_bits(code, len);
    }

    let mut zeros_left = total_zeros;
    for pair in positions.windows(2) {
        if zeros_left == 0 {
            break;
        }
        let run = pair[0] - pair[1] - 1;
        let row = zeros_left.min(7) - 1;
        let (len, code) = lookup(&RUN_BEFORE_LEN, &RUN_BEFORE_CODE, row, run).ok_or_else(|| {
            AvcError::InvalidArgument(format!("run_before 不存在: {}", run))
        })?;
        bw.write_bits(code, len);
        zeros_left -= run;
    }
    Ok(())
}
