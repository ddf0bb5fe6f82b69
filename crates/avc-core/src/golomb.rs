//! Exp-Golomb 编码.
//!
//! `ue(v)`: 前导零个数 `lz`, 随后的 `1`, 再读取 `lz` 位后缀, 值为 `2^lz - 1 + suffix`.
//! `se(v)`: 将 `ue` 码号 `k` 映射为 `(-1)^(k+1) * ceil(k / 2)`.

use crate::{AvcError, AvcResult, BitReader, SyntaxElement};

/// `ue(v)` 允许的最大前导零个数 (32 位取值范围)
const MAX_LEADING_ZEROS: usize = 31;

/// 读取无符号 Exp-Golomb 码, 同时返回消耗位数与信息位
pub fn read_ue_element(br: &mut BitReader) -> AvcResult<SyntaxElement> {
    let zeros = br.count_leading_zeros();
    if zeros >= br.bits_left() {
        return Err(AvcError::OutOfData);
    }
    if zeros > MAX_LEADING_ZEROS {
        log::debug!("ue(v) 在位置 {} 处前导零过多: {}", br.position(), zeros);
        return Err(AvcError::InvalidData(format!(
            "Exp-Golomb 前导零过多: {}",
            zeros
        )));
    }
    // 前导零与终止位 1 在读取后缀前必须全部可用
    br.skip_bits(zeros + 1)?;
    let suffix = br.read_bits(zeros as u32)?;
    let code = (1u64 << zeros) - 1 + u64::from(suffix);
    let value1 = i32::try_from(code)
        .map_err(|_| AvcError::InvalidData(format!("ue(v) 码号 {} 超出 i32 范围", code)))?;
    Ok(SyntaxElement::single((2 * zeros + 1) as u32, suffix, value1))
}

/// 读取无符号 Exp-Golomb
pub fn read_ue(br: &mut BitReader) -> AvcResult<u32> {
    let zeros = br.count_leading_zeros();
    if zeros >= br.bits_left() {
        return Err(AvcError::OutOfData);
    }
    if zeros > MAX_LEADING_ZEROS {
        return Err(AvcError::InvalidData(format!(
            "Exp-Golomb 前导零过多: {}",
            zeros
        )));
    }
    br.skip_bits(zeros + 1)?;
    if zeros == 0 {
        return Ok(0);
    }
    let suffix = br.read_bits(zeros as u32)?;
    Ok(((1u64 << zeros) - 1 + u64::from(suffix)) as u32)
}

/// 读取有符号 Exp-Golomb
pub fn read_se(br: &mut BitReader) -> AvcResult<i32> {
    let code = read_ue(br)?;
    Ok(map_se(code))
}

/// 读取截断 Exp-Golomb `te(v)`
///
/// `max_value` 为语法元素允许的最大值; 取值范围为 `0..=1` 时退化为单个取反位.
pub fn read_te(br: &mut BitReader, max_value: u32) -> AvcResult<u32> {
    match max_value {
        0 => Ok(0),
        1 => Ok(1 - br.read_bit()?),
        _ => read_ue(br),
    }
}

/// 将 `ue` 码号映射为有符号值
pub fn map_se(code: u32) -> i32 {
    let value = code.div_ceil(2) as i64;
    if code & 1 == 0 {
        (-value) as i32
    } else {
        value as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BitWriter;

    #[test]
    fn test_ue_known_codes() {
        // "1" -> 0, "010" -> 1, "011" -> 2, "00100" -> 3
        let data = [0b1010_0110, 0b0100_0000];
        let mut br = BitReader::new(&data);
        assert_eq!(read_ue(&mut br).unwrap(), 0);
        assert_eq!(read_ue(&mut br).unwrap(), 1);
        assert_eq!(read_ue(&mut br).unwrap(), 2);
        assert_eq!(read_ue(&mut br).unwrap(), 3);
        assert_eq!(br.position(), 12);
    }

    #[test]
    fn test_se_mapping() {
        let expected = [0, 1, -1, 2, -2, 3, -3];
        for (code, value) in expected.iter().enumerate() {
            assert_eq!(map_se(code as u32), *value, "码号 {} 映射错误", code);
        }
        assert_eq!(map_se(u32::MAX - 1), -(i32::MAX));
    }

    #[test]
    fn test_ue_se_round_trip() {
        let mut bw = BitWriter::new();
        let ue_values: Vec<u32> = (0..2000)
            .chain([65_535, 1 << 20, u32::MAX - 1])
            .collect();
        let se_values: Vec<i32> = (-1000..1000).chain([i32::MAX, -i32::MAX]).collect();
        for &v in &ue_values {
            bw.write_ue(v);
        }
        for &v in &se_values {
            bw.write_se(v);
        }
        let data = bw.finish();
        let mut br = BitReader::new(&data);
        for &v in &ue_values {
            assert_eq!(read_ue(&mut br).unwrap(), v, "ue 往返失败");
        }
        for &v in &se_values {
            assert_eq!(read_se(&mut br).unwrap(), v, "se 往返失败");
        }
    }

    #[test]
    fn test_ue_full_20bit_range() {
        let mut bw = BitWriter::new();
        for v in 0..(1u32 << 20) {
            bw.write_ue(v);
        }
        let total_bits = bw.bits_written();
        let data = bw.finish();
        let mut br = BitReader::new(&data);
        for v in 0..(1u32 << 20) {
            assert_eq!(read_ue(&mut br).unwrap(), v, "ue 往返失败: {}", v);
        }
        assert_eq!(br.position(), total_bits);
    }

    #[test]
    fn test_se_full_20bit_range() {
        let range = -(1i32 << 19) + 1..(1i32 << 19);
        let mut bw = BitWriter::new();
        for v in range.clone() {
            bw.write_se(v);
        }
        let total_bits = bw.bits_written();
        let data = bw.finish();
        let mut br = BitReader::new(&data);
        for v in range {
            assert_eq!(read_se(&mut br).unwrap(), v, "se 往返失败: {}", v);
        }
        assert_eq!(br.position(), total_bits);
    }

    #[test]
    fn test_ue_element_reports_length() {
        let data = [0b0001_0110];
        let mut br = BitReader::new(&data);
        let se = read_ue_element(&mut br).unwrap();
        assert_eq!(se.len, 7);
        assert_eq!(se.inf, 0b011);
        assert_eq!(se.value1, 10);
    }

    #[test]
    fn test_ue_element_rejects_code_beyond_i32() {
        let mut bw = BitWriter::new();
        bw.write_ue(i32::MAX as u32);
        bw.write_ue(1 << 31);
        let data = bw.finish();
        let mut br = BitReader::new(&data);
        assert_eq!(read_ue_element(&mut br).unwrap().value1, i32::MAX);
        assert!(
            matches!(read_ue_element(&mut br), Err(AvcError::InvalidData(_))),
            "码号 2^31 不应被截断为负数"
        );
    }

    #[test]
    fn test_ue_truncated() {
        // 前导零一直到末尾
        let data = [0x00];
        let mut br = BitReader::new(&data);
        assert_eq!(read_ue(&mut br), Err(AvcError::OutOfData));
        // 后缀不完整
        let data = [0b0000_0001];
        let mut br = BitReader::new(&data);
        assert_eq!(read_ue(&mut br), Err(AvcError::OutOfData));
    }

    #[test]
    fn test_ue_too_many_zeros() {
        let data = [0u8, 0, 0, 0, 0x80, 0, 0, 0, 0];
        let mut br = BitReader::new(&data);
        assert!(matches!(read_ue(&mut br), Err(AvcError::InvalidData(_))));
    }

    #[test]
    fn test_te_single_bit() {
        let data = [0b0100_0000];
        let mut br = BitReader::new(&data);
        assert_eq!(read_te(&mut br, 1).unwrap(), 1);
        assert_eq!(read_te(&mut br, 1).unwrap(), 0);
        assert_eq!(read_te(&mut br, 0).unwrap(), 0);
        assert_eq!(br.position(), 2);
    }
}
