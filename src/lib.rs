//! # avc
//!
//! 纯 Rust 实现的 H.264/AVC 宏块残差重建核心.
//!
//! 覆盖 CAVLC 残差熵解码、反量化、整数反变换、样本重建与运动矢量预测,
//! 以切片为单位串行解码, 独立切片可并行.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use avc::codec::{DecoderConfig, SliceJob, decode_slice};
//!
//! let config = DecoderConfig::default();
//! let job = SliceJob {
//!     index: 0,
//!     payload: bytes::Bytes::from_static(&[0x80]),
//!     bit_offset: 0,
//!     macroblocks: Vec::new(),
//! };
//! let output = decode_slice(&job, &config, 1, 1);
//! println!("{:?}", output.map(|o| o.bits_consumed));
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `avc-core` | 错误类型, 比特读写, Exp-Golomb |
//! | `avc-codec` | CAVLC, 反量化, 反变换, 重建, 运动矢量预测, 切片解码 |

pub mod logging;

/// 错误类型与比特流基础工具
pub use avc_core as core;

/// 残差重建流水线
pub use avc_codec as codec;

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
