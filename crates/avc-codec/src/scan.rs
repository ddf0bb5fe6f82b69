//! 反扫描顺序表.
//!
//! 所有表均为 `扫描位置 -> 光栅索引` 映射, 光栅索引为 `row * width + col`.

/// 扫描方式: 帧宏块使用 zigzag, 场图像或场宏块使用场扫描
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
    #[default]
    Frame,
    Field,
}

/// 4x4 zigzag 扫描 (帧编码)
#[rustfmt::skip]
pub const ZIGZAG_4X4: [u8; 16] = [
    0, 1, 4, 8, 5, 2, 3, 6, 9, 12, 13, 10, 7, 11, 14, 15,
];

/// 4x4 场扫描
#[rustfmt::skip]
pub const FIELD_SCAN_4X4: [u8; 16] = [
    0, 4, 1, 8, 12, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15,
];

/// 8x8 zigzag 扫描 (帧编码)
#[rustfmt::skip]
pub const ZIGZAG_8X8: [u8; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10, 17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34, 27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// 8x8 场扫描
#[rustfmt::skip]
pub const FIELD_SCAN_8X8: [u8; 64] = [
     0,  8, 16,  1,  9, 24, 32, 17,  2, 25, 40, 48, 56, 33, 10,  3,
    18, 41, 49, 57, 26, 11,  4, 19, 34, 42, 50, 58, 27, 12,  5, 20,
    35, 43, 51, 59, 28, 13,  6, 21, 36, 44, 52, 60, 29, 14, 22, 37,
    45, 53, 61, 30,  7, 15, 38, 46, 54, 62, 23, 31, 39, 47, 55, 63,
];

/// 4:2:0 色度 DC (2x2) 扫描
pub const CHROMA_DC_420_SCAN: [u8; 4] = [0, 1, 2, 3];

/// 4:2:2 色度 DC (2 列 x 4 行) 扫描
pub const CHROMA_DC_422_SCAN: [u8; 8] = [0, 2, 1, 4, 6, 3, 5, 7];

impl ScanOrder {
    /// 根据场图像 / 场宏块标志选择扫描方式
    pub fn from_field(field: bool) -> Self {
        if field { Self::Field } else { Self::Frame }
    }

    /// 4x4 扫描表
    pub fn table_4x4(self) -> &'static [u8; 16] {
        match self {
            Self::Frame => &ZIGZAG_4X4,
            Self::Field => &FIELD_SCAN_4X4,
        }
    }

    /// 8x8 扫描表
    pub fn table_8x8(self) -> &'static [u8; 64] {
        match self {
            Self::Frame => &ZIGZAG_8X8,
            Self::Field => &FIELD_SCAN_8X8,
        }
    }
}
