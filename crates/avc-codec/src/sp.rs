//! SP / SI 宏块的变换域重建.
//!
//! 预测块先做正向 4x4 变换, 与残差电平在变换域组合后按 QS 重新量化,
//! 反量化并反变换的结果即为重建样本 (未裁剪), 不再与预测相加.

use avc_core::AvcResult;

use crate::quant::{QuantContext, checked_coeff, class_4x4, norm_adjust_4x4, recover_level};
use crate::transform::{Block4x4, forward_core_4x4, inverse_core_4x4};

/// 量化系数 [qP % 6][位置类别]
#[rustfmt::skip]
const QUANT_COEF: [[i64; 3]; 6] = [
    [13107, 8066, 5243],
    [11916, 7490, 4660],
    [10082, 6554, 4194],
    [ 9362, 5825, 3647],
    [ 8192, 5243, 3355],
    [ 7282, 4559, 2893],
];

/// 正向变换归一化因子 [位置类别]
const A_BY_CLASS: [i64; 3] = [16, 20, 25];

const Q_BITS: i32 = 15;

/// SP 解码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchingMode {
    /// 主 SP 片: 预测与残差在变换域合并后用 QS 量化
    #[default]
    Primary,
    /// 切换 SP 片或 SI 片: 预测先用 QS 量化, 再在量化域加上电平
    Switching,
}

fn rshift_rnd(x: i64, bits: i32) -> i64 {
    (x + (1 << (bits - 1))) >> bits
}

/// 按 QS 量化 `value` (带符号, 四舍五入)
fn quantize(value: i64, qs: &QuantContext, class: usize, extra_shift: i32) -> i64 {
    let bits = Q_BITS + qs.qp_div_6 + extra_shift;
    let magnitude = rshift_rnd(value.abs() * QUANT_COEF[qs.qp_mod_6][class], bits);
    if value < 0 { -magnitude } else { magnitude }
}

/// 单个变换系数的 SP 组合: 返回按 QS 反量化后的系数
fn combine(
    predicted: i32,
    level: i32,
    qp: &QuantContext,
    qs: &QuantContext,
    i: usize,
    j: usize,
    mode: SwitchingMode,
) -> AvcResult<i32> {
    let class = class_4x4(i, j);
    let (predicted, level) = (i64::from(predicted), i64::from(level));
    let ilev = match mode {
        SwitchingMode::Switching => quantize(predicted, qs, class, 0) + level,
        SwitchingMode::Primary => {
            let dq = i64::from(norm_adjust_4x4(qp.qp_mod_6, i, j));
            let combined = predicted + (((level * dq * A_BY_CLASS[class]) << qp.qp_div_6) >> 6);
            quantize(combined, qs, class, 0)
        }
    };
    checked_coeff((ilev * i64::from(norm_adjust_4x4(qs.qp_mod_6, i, j))) << qs.qp_div_6)
}

/// 重建一个 SP/SI 亮度 4x4 块
///
/// `coeffs` 为按 `qp` 平坦反量化后的系数, 其中的电平会先被恢复.
pub fn reconstruct_sp_luma_4x4(
    pred: &Block4x4,
    coeffs: &Block4x4,
    qp: &QuantContext,
    qs: &QuantContext,
    mode: SwitchingMode,
) -> AvcResult<Block4x4> {
    let transformed = forward_core_4x4(pred);
    let mut out = [[0i32; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            let level = recover_level(coeffs[i][j], qp, i, j);
            out[i][j] = combine(transformed[i][j], level, qp, qs, i, j, mode)?;
        }
    }
    Ok(inverse_core_4x4(&out))
}

/// 重建一个 SP/SI 4:2:0 色度分量 (8x8)
///
/// `dc_levels` 为 2x2 色度 DC 电平 (未反量化, `[行][列]`),
/// `ac` 为按光栅顺序的 4 个 4x4 块, 已按 `qp` 平坦反量化, DC 位置忽略.
pub fn reconstruct_sp_chroma_420(
    pred: &[[i32; 8]; 8],
    dc_levels: &[[i32; 2]; 2],
    ac: &[Block4x4; 4],
    qp: &QuantContext,
    qs: &QuantContext,
    mode: SwitchingMode,
) -> AvcResult<[[i32; 8]; 8]> {
    let mut transformed = [[[0i32; 4]; 4]; 4];
    for (blk, t) in transformed.iter_mut().enumerate() {
        let (ox, oy) = ((blk % 2) * 4, (blk / 2) * 4);
        let mut block = [[0i32; 4]; 4];
        for (y, row) in block.iter_mut().enumerate() {
            row.copy_from_slice(&pred[oy + y][ox..ox + 4]);
        }
        *t = forward_core_4x4(&block);
    }

    // 预测 DC 的 2x2 变换: m0 总和, m1 上减下, m2 左减右, m3 对角
    let (tl, tr, bl, br) = (
        transformed[0][0][0],
        transformed[1][0][0],
        transformed[2][0][0],
        transformed[3][0][0],
    );
    let mut mp = [tl + bl + tr + br, tl - bl + tr - br, tl + bl - tr - br, tl - bl - tr + br];

    let dq00 = i64::from(norm_adjust_4x4(qs.qp_mod_6, 0, 0));
    for (n, m) in mp.iter_mut().enumerate() {
        let level = i64::from(dc_levels[n & 1][n >> 1]);
        let predicted = i64::from(*m);
        let ilev = match mode {
            SwitchingMode::Switching => quantize(predicted, qs, 0, 1) + level,
            SwitchingMode::Primary => {
                let dq = i64::from(norm_adjust_4x4(qp.qp_mod_6, 0, 0));
                let combined = (((level * dq * A_BY_CLASS[0]) << qp.qp_div_6) >> 5) + predicted;
                quantize(combined, qs, 0, 1)
            }
        };
        *m = checked_coeff((ilev * dq00) << qs.qp_div_6)?;
    }
    let dc = [
        (mp[0] + mp[1] + mp[2] + mp[3]) >> 1,
        (mp[0] + mp[1] - mp[2] - mp[3]) >> 1,
        (mp[0] - mp[1] + mp[2] - mp[3]) >> 1,
        (mp[0] - mp[1] - mp[2] + mp[3]) >> 1,
    ];

    let mut out = [[0i32; 8]; 8];
    for (blk, t) in transformed.iter().enumerate() {
        let mut coef = [[0i32; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                if i == 0 && j == 0 {
                    continue;
                }
                let level = recover_level(ac[blk][i][j], qp, i, j);
                coef[i][j] = combine(t[i][j], level, qp, qs, i, j, mode)?;
            }
        }
        coef[0][0] = dc[blk];
        let samples = inverse_core_4x4(&coef);
        let (ox, oy) = ((blk % 2) * 4, (blk / 2) * 4);
        for (y, row) in samples.iter().enumerate() {
            out[oy + y][ox..ox + 4].copy_from_slice(row);
        }
    }
    Ok(out)
}
