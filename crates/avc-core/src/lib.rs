//! # avc-core
//!
//! H.264/AVC 残差重建核心的底层基础设施.
//!
//! 提供统一错误类型、按位读取的比特流游标、Exp-Golomb 编解码以及
//! 单次语法元素解码结果的描述. 比特流写入器只在 `test-util` 特性下提供.

pub mod bitreader;
#[cfg(any(test, feature = "test-util"))]
pub mod bitwriter;
pub mod error;
pub mod golomb;
pub mod syntax;

// 重导出常用类型
pub use bitreader::BitReader;
#[cfg(any(test, feature = "test-util"))]
pub use bitwriter::BitWriter;
pub use error::{AvcError, AvcResult};
pub use syntax::SyntaxElement;
