//! 比特流游标.
//!
//! 在去除防竞争字节后的切片载荷上按位前进, 是 Exp-Golomb 与 CAVLC
//! 变长码解码的基础. 按大端位序读取 (MSB first), 只能向前移动.

use crate::{AvcError, AvcResult};

/// 比特流读取器
///
/// 借用字节缓冲区, 维护位偏移 `0 <= pos <= 8 * len`.
///
/// # 示例
/// ```
/// use avc_core::bitreader::BitReader;
///
/// let data = [0b10110001, 0b01010101];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.read_bits(4).unwrap(), 0b1011);
/// assert_eq!(br.peek_bits(4).unwrap(), 0b0001);
/// assert_eq!(br.read_bits(12).unwrap(), 0b0001_0101_0101);
/// ```
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// 源数据
    data: &'a [u8],
    /// 当前位偏移 (从缓冲区首字节最高位起算)
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 从指定位偏移开始读取 (切片数据通常不在字节边界开始)
    pub fn with_offset(data: &'a [u8], bit_offset: usize) -> AvcResult<Self> {
        if bit_offset > data.len() * 8 {
            return Err(AvcError::InvalidArgument(format!(
                "起始位偏移 {} 超过缓冲区长度 {} 位",
                bit_offset,
                data.len() * 8,
            )));
        }
        Ok(Self {
            data,
            pos: bit_offset,
        })
    }

    /// 获取当前位偏移
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 获取剩余可读位数
    pub fn bits_left(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// 是否已到达末尾
    pub fn is_eof(&self) -> bool {
        self.bits_left() == 0
    }

    /// 当前是否位于字节边界
    pub fn is_byte_aligned(&self) -> bool {
        self.pos % 8 == 0
    }

    /// 窥视 N 个位 (最多 32 位), 不移动位置
    pub fn peek_bits(&self, n: u32) -> AvcResult<u32> {
        if n == 0 {
            return Ok(0);
        }
        if n > 32 {
            return Err(AvcError::InvalidArgument(format!(
                "peek_bits: n={} 超过 32 位",
                n,
            )));
        }
        if n as usize > self.bits_left() {
            return Err(AvcError::OutOfData);
        }

        let mut result: u64 = 0;
        let mut byte_pos = self.pos / 8;
        let bit_pos = (self.pos % 8) as u32;
        // 需要覆盖的字节数: 起始位内偏移 + n 位
        let nbytes = (bit_pos + n).div_ceil(8);
        for _ in 0..nbytes {
            result = (result << 8) | u64::from(self.data[byte_pos]);
            byte_pos += 1;
        }
        let tail = nbytes * 8 - bit_pos - n;
        Ok(((result >> tail) & ((1u64 << n) - 1)) as u32)
    }

    /// 读取 N 个位 (最多 32 位)
    ///
    /// 按大端位序读取, 返回值的低 N 位有效.
    pub fn read_bits(&mut self, n: u32) -> AvcResult<u32> {
        let value = self.peek_bits(n)?;
        self.pos += n as usize;
        Ok(value)
    }

    /// 读取 1 个位
    pub fn read_bit(&mut self) -> AvcResult<u32> {
        self.read_bits(1)
    }

    /// 读取 1 位标志
    pub fn read_flag(&mut self) -> AvcResult<bool> {
        Ok(self.read_bit()? == 1)
    }

    /// 跳过 N 个位
    pub fn skip_bits(&mut self, n: usize) -> AvcResult<()> {
        if n > self.bits_left() {
            return Err(AvcError::OutOfData);
        }
        self.pos += n;
        Ok(())
    }

    /// 统计当前位置起连续 0 的个数 (不移动位置)
    ///
    /// 遇到缓冲区末尾时返回已统计的个数.
    pub fn count_leading_zeros(&self) -> usize {
        let mut count = 0usize;
        let mut pos = self.pos;
        while pos < self.data.len() * 8 {
            let bit = (self.data[pos / 8] >> (7 - pos % 8)) & 1;
            if bit == 1 {
                break;
            }
            count += 1;
            pos += 1;
        }
        count
    }

    /// 对齐到下一个字节边界
    ///
    /// 如果当前已在字节边界, 则不做任何事.
    pub fn align_to_byte(&mut self) {
        self.pos = self.pos.div_ceil(8) * 8;
    }
}
