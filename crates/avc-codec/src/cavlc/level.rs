//! CAVLC 电平解码.
//!
//! 电平由 level_prefix (一元前导零) 与 level_suffix 组成, levelCode 的最低位为符号.
//! suffixLength 随已解码电平的幅度递增, 阈值为 `0, 3, 6, 12, 24, 48`.

use avc_core::{AvcError, AvcResult, BitReader};

/// 允许的最大 level_prefix (14 位位深下合法电平所需的上限)
pub(crate) const MAX_LEVEL_PREFIX: usize = 28;

/// suffixLength 递增阈值, 下标为当前 suffixLength
const SUFFIX_INC_THRESHOLD: [u32; 7] = [0, 3, 6, 12, 24, 48, u32::MAX];

/// 读取一个 levelCode (不含首个非 T1 电平的 +2 修正)
pub fn read_level_code(br: &mut BitReader, suffix_length: u32) -> AvcResult<u32> {
    let zeros = br.count_leading_zeros();
    if zeros >= br.bits_left() {
        return Err(AvcError::OutOfData);
    }
    if zeros > MAX_LEVEL_PREFIX {
        return Err(AvcError::InvalidData(format!("level_prefix 过大: {}", zeros)));
    }
    br.skip_bits(zeros + 1)?;
    let prefix = zeros as u32;

    let suffix_size = if prefix == 14 && suffix_length == 0 {
        4
    } else if prefix >= 15 {
        prefix - 3
    } else {
        suffix_length
    };
    let suffix = br.read_bits(suffix_size)?;

    let mut code = (prefix.min(15) << suffix_length) + suffix;
    if prefix >= 15 && suffix_length == 0 {
        code += 15;
    }
    if prefix >= 16 {
        code += (1 << (prefix - 3)) - 4096;
    }
    Ok(code)
}

/// levelCode -> 带符号电平 (偶数为正)
pub fn level_from_code(code: u32) -> i32 {
    let code = i64::from(code);
    if code & 1 == 0 {
        ((code + 2) >> 1) as i32
    } else {
        (-((code + 1) >> 1)) as i32
    }
}

/// 单个残差块内 suffixLength 的状态机
#[derive(Debug, Clone, Copy)]
pub struct LevelSuffixState {
    suffix_length: u32,
    /// 电平取值范围 `[-2^(7+bitDepth), 2^(7+bitDepth) - 1]`
    min_level: i32,
    max_level: i32,
}

impl LevelSuffixState {
    /// total_coeff > 10 且 trailing_ones < 3 时从 1 开始, 否则从 0 开始
    pub fn new(total_coeff: usize, trailing_ones: usize, bit_depth: u8) -> Self {
        let suffix_length = if total_coeff > 10 && trailing_ones < 3 {
            1
        } else {
            0
        };
        let bound = 1i32 << (7 + u32::from(bit_depth.clamp(8, 14)));
        Self {
            suffix_length,
            min_level: -bound,
            max_level: bound - 1,
        }
    }

    /// 当前 suffixLength
    pub fn suffix_length(&self) -> u32 {
        self.suffix_length
    }

    /// 解码一个非 T1 电平并更新 suffixLength
    ///
    /// `bump` 为真时 (首个非 T1 电平且 trailing_ones < 3) 幅度加一,
    /// 因为此时 ±1 已不可能出现.
    pub fn decode_level(&mut self, br: &mut BitReader, bump: bool) -> AvcResult<i32> {
        let mut code = read_level_code(br, self.suffix_length)?;
        if bump {
            code += 2;
        }
        let level = level_from_code(code);
        if !(self.min_level..=self.max_level).contains(&level) {
            return Err(AvcError::InvalidData(format!(
                "电平 {} 超出范围 [{}, {}]",
                level, self.min_level, self.max_level
            )));
        }

        if self.suffix_length == 0 {
            self.suffix_length = 1;
        }
        if level.unsigned_abs() > SUFFIX_INC_THRESHOLD[self.suffix_length as usize] {
            self.suffix_length += 1;
        }
        Ok(level)
    }
}
