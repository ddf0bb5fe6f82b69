//! CAVLC 变长码表 (H.264 表 9-5, 9-7, 9-8, 9-9, 9-10).
//!
//! 每张表拆成码长与码字两部分, 码长为 0 的位置表示不存在的组合.

/// coeff_token 码长: [nC 区间][trailing_ones][total_coeff]
#[rustfmt::skip]
pub(crate) const COEFF_TOKEN_LEN: [[[u8; 17]; 4]; 3] = [
    [
        [ 1,  6,  8,  9, 10, 11, 13, 13, 13, 14, 14, 15, 15, 16, 16, 16, 16],
        [ 0,  2,  6,  8,  9, 10, 11, 13, 13, 14, 14, 15, 15, 15, 16, 16, 16],
        [ 0,  0,  3,  7,  8,  9, 10, 11, 13, 13, 14, 14, 15, 15, 16, 16, 16],
        [ 0,  0,  0,  5,  6,  7,  8,  9, 10, 11, 13, 14, 14, 15, 15, 16, 16],
    ],
    [
        [ 2,  6,  6,  7,  8,  8,  9, 11, 11, 12, 12, 12, 13, 13, 13, 14, 14],
        [ 0,  2,  5,  6,  6,  7,  8,  9, 11, 11, 12, 12, 13, 13, 14, 14, 14],
        [ 0,  0,  3,  6,  6,  7,  8,  9, 11, 11, 12, 12, 13, 13, 13, 14, 14],
        [ 0,  0,  0,  4,  4,  5,  6,  6,  7,  9, 11, 11, 12, 13, 13, 13, 14],
    ],
    [
        [ 4,  6,  6,  6,  7,  7,  7,  7,  8,  8,  9,  9,  9, 10, 10, 10, 10],
        [ 0,  4,  5,  5,  5,  5,  6,  6,  7,  8,  8,  9,  9,  9, 10, 10, 10],
        [ 0,  0,  4,  5,  5,  5,  6,  6,  7,  7,  8,  8,  9,  9, 10, 10, 10],
        [ 0,  0,  0,  4,  4,  4,  4,  4,  5,  6,  7,  8,  8,  9, 10, 10, 10],
    ],
];

/// coeff_token 码字: [nC 区间][trailing_ones][total_coeff]
#[rustfmt::skip]
pub(crate) const COEFF_TOKEN_CODE: [[[u8; 17]; 4]; 3] = [
    [
        [ 1,  5,  7,  7,  7,  7, 15, 11,  8, 15, 11, 15, 11, 15, 11,  7,  4],
        [ 0,  1,  4,  6,  6,  6,  6, 14, 10, 14, 10, 14, 10,  1, 14, 10,  6],
        [ 0,  0,  1,  5,  5,  5,  5,  5, 13,  9, 13,  9, 13,  9, 13,  9,  5],
        [ 0,  0,  0,  3,  3,  4,  4,  4,  4,  4, 12, 12,  8, 12,  8, 12,  8],
    ],
    [
        [ 3, 11,  7,  7,  7,  4,  7, 15, 11, 15, 11,  8, 15, 11,  7,  9,  7],
        [ 0,  2,  7, 10,  6,  6,  6,  6, 14, 10, 14, 10, 14, 10, 11,  8,  6],
        [ 0,  0,  3,  9,  5,  5,  5,  5, 13,  9, 13,  9, 13,  9,  6, 10,  5],
        [ 0,  0,  0,  5,  4,  6,  8,  4,  4,  4, 12,  8, 12, 12,  8,  1,  4],
    ],
    [
        [15, 15, 11,  8, 15, 11,  9,  8, 15, 11, 15, 11,  8, 13,  9,  5,  1],
        [ 0, 14, 15, 12, 10,  8, 14, 10, 14, 14, 10, 14, 10,  7, 12,  8,  4],
        [ 0,  0, 13, 14, 11,  9, 13,  9, 13, 10, 13,  9, 13,  9, 11,  7,  3],
        [ 0,  0,  0, 12, 11, 10,  9,  8, 13, 12, 12, 12,  8, 12, 10,  6,  2],
    ],
];

/// 4:2:0 色度 DC coeff_token 码长: [trailing_ones][total_coeff]
#[rustfmt::skip]
pub(crate) const CHROMA_DC_420_COEFF_TOKEN_LEN: [[u8; 5]; 4] = [
    [ 2,  6,  6,  6,  6],
    [ 0,  1,  6,  7,  8],
    [ 0,  0,  3,  7,  8],
    [ 0,  0,  0,  6,  7],
];

/// 4:2:0 色度 DC coeff_token 码字
#[rustfmt::skip]
pub(crate) const CHROMA_DC_420_COEFF_TOKEN_CODE: [[u8; 5]; 4] = [
    [ 1,  7,  4,  3,  2],
    [ 0,  1,  6,  3,  3],
    [ 0,  0,  1,  2,  2],
    [ 0,  0,  0,  5,  0],
];

/// 4:2:2 色度 DC coeff_token 码长: [trailing_ones][total_coeff]
#[rustfmt::skip]
pub(crate) const CHROMA_DC_422_COEFF_TOKEN_LEN: [[u8; 9]; 4] = [
    [ 1,  7,  7,  9,  9, 10, 11, 12, 13],
    [ 0,  2,  7,  7,  9, 10, 11, 12, 12],
    [ 0,  0,  3,  7,  7,  9, 10, 11, 12],
    [ 0,  0,  0,  5,  6,  7,  7, 10, 11],
];

/// 4:2:2 色度 DC coeff_token 码字
#[rustfmt::skip]
pub(crate) const CHROMA_DC_422_COEFF_TOKEN_CODE: [[u8; 9]; 4] = [
    [ 1, 15, 14,  7,  6,  7,  7,  7,  7],
    [ 0,  1, 13, 12,  5,  6,  6,  6,  5],
    [ 0,  0,  1, 11, 10,  4,  5,  5,  4],
    [ 0,  0,  0,  1,  1,  9,  8,  4,  4],
];

/// total_zeros 码长: [total_coeff - 1][total_zeros]
#[rustfmt::skip]
pub(crate) const TOTAL_ZEROS_LEN: [[u8; 16]; 15] = [
    [ 1,  3,  3,  4,  4,  5,  5,  6,  6,  7,  7,  8,  8,  9,  9,  9],
    [ 3,  3,  3,  3,  3,  4,  4,  4,  4,  5,  5,  6,  6,  6,  6,  0],
    [ 4,  3,  3,  3,  4,  4,  3,  3,  4,  5,  5,  6,  5,  6,  0,  0],
    [ 5,  3,  4,  4,  3,  3,  3,  4,  3,  4,  5,  5,  5,  0,  0,  0],
    [ 4,  4,  4,  3,  3,  3,  3,  3,  4,  5,  4,  5,  0,  0,  0,  0],
    [ 6,  5,  3,  3,  3,  3,  3,  3,  4,  3,  6,  0,  0,  0,  0,  0],
    [ 6,  5,  3,  3,  3,  2,  3,  4,  3,  6,  0,  0,  0,  0,  0,  0],
    [ 6,  4,  5,  3,  2,  2,  3,  3,  6,  0,  0,  0,  0,  0,  0,  0],
    [ 6,  6,  4,  2,  2,  3,  2,  5,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 5,  5,  3,  2,  2,  2,  4,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 4,  4,  3,  3,  1,  3,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 4,  4,  2,  1,  3,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 3,  3,  1,  2,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 2,  2,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 1,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
];

/// total_zeros 码字
#[rustfmt::skip]
pub(crate) const TOTAL_ZEROS_CODE: [[u8; 16]; 15] = [
    [ 1,  3,  2,  3,  2,  3,  2,  3,  2,  3,  2,  3,  2,  3,  2,  1],
    [ 7,  6,  5,  4,  3,  5,  4,  3,  2,  3,  2,  3,  2,  1,  0,  0],
    [ 5,  7,  6,  5,  4,  3,  4,  3,  2,  3,  2,  1,  1,  0,  0,  0],
    [ 3,  7,  5,  4,  6,  5,  4,  3,  3,  2,  2,  1,  0,  0,  0,  0],
    [ 5,  4,  3,  7,  6,  5,  4,  3,  2,  1,  1,  0,  0,  0,  0,  0],
    [ 1,  1,  7,  6,  5,  4,  3,  2,  1,  1,  0,  0,  0,  0,  0,  0],
    [ 1,  1,  5,  4,  3,  3,  2,  1,  1,  0,  0,  0,  0,  0,  0,  0],
    [ 1,  1,  1,  3,  3,  2,  2,  1,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 1,  0,  1,  3,  2,  1,  1,  1,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 1,  0,  1,  3,  2,  1,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  1,  1,  2,  1,  3,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  1,  1,  1,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  1,  1,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  1,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
];

/// 4:2:0 色度 DC total_zeros 码长: [total_coeff - 1][total_zeros]
#[rustfmt::skip]
pub(crate) const CHROMA_DC_420_TOTAL_ZEROS_LEN: [[u8; 4]; 3] = [
    [ 1,  2,  3,  3],
    [ 1,  2,  2,  0],
    [ 1,  1,  0,  0],
];

/// 4:2:0 色度 DC total_zeros 码字
#[rustfmt::skip]
pub(crate) const CHROMA_DC_420_TOTAL_ZEROS_CODE: [[u8; 4]; 3] = [
    [ 1,  1,  1,  0],
    [ 1,  1,  0,  0],
    [ 1,  0,  0,  0],
];

/// 4:2:2 色度 DC total_zeros 码长: [total_coeff - 1][total_zeros]
#[rustfmt::skip]
pub(crate) const CHROMA_DC_422_TOTAL_ZEROS_LEN: [[u8; 8]; 7] = [
    [ 1,  3,  3,  4,  4,  4,  5,  5],
    [ 3,  2,  3,  3,  3,  3,  3,  0],
    [ 3,  3,  2,  2,  3,  3,  0,  0],
    [ 3,  2,  2,  2,  3,  0,  0,  0],
    [ 2,  2,  2,  2,  0,  0,  0,  0],
    [ 2,  2,  1,  0,  0,  0,  0,  0],
    [ 1,  1,  0,  0,  0,  0,  0,  0],
];

/// 4:2:2 色度 DC total_zeros 码字
#[rustfmt::skip]
pub(crate) const CHROMA_DC_422_TOTAL_ZEROS_CODE: [[u8; 8]; 7] = [
    [ 1,  2,  3,  2,  3,  1,  1,  0],
    [ 0,  1,  1,  4,  5,  6,  7,  0],
    [ 0,  1,  1,  2,  6,  7,  0,  0],
    [ 6,  0,  1,  2,  7,  0,  0,  0],
    [ 0,  1,  2,  3,  0,  0,  0,  0],
    [ 0,  1,  1,  0,  0,  0,  0,  0],
    [ 0,  1,  0,  0,  0,  0,  0,  0],
];

/// run_before 码长: [min(zeros_left, 7) - 1][run_before]
#[rustfmt::skip]
pub(crate) const RUN_BEFORE_LEN: [[u8; 15]; 7] = [
    [ 1,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 1,  2,  2,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 2,  2,  2,  2,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 2,  2,  2,  3,  3,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 2,  2,  3,  3,  3,  3,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 2,  3,  3,  3,  3,  3,  3,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 3,  3,  3,  3,  3,  3,  3,  4,  5,  6,  7,  8,  9, 10, 11],
];

/// run_before 码字
#[rustfmt::skip]
pub(crate) const RUN_BEFORE_CODE: [[u8; 15]; 7] = [
    [ 1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 1,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 3,  2,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 3,  2,  1,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 3,  2,  3,  2,  1,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 3,  0,  1,  3,  2,  5,  4,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 7,  6,  5,  4,  3,  2,  1,  1,  1,  1,  1,  1,  1,  1,  1],
];
