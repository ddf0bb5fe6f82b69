//! 统一错误类型定义.
//!
//! 所有 avc crate 共用的错误类型. 错误一律立即向上传播,
//! 由切片级调用方决定是否放弃当前切片.

use thiserror::Error;

/// 残差重建核心统一错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvcError {
    /// 读取越过了比特流末尾
    #[error("数据不足, 读取越过比特流末尾")]
    OutOfData,

    /// 比特流前缀不匹配变长码表中的任何码字
    #[error("变长码表 {table} 中无匹配码字")]
    NoTableMatch {
        /// 码表名称
        table: &'static str,
    },

    /// QP 超出合法范围
    #[error("无效 QP: {0}")]
    InvalidQp(i32),

    /// 当前色度格式下不存在该块类别
    #[error("无效块类别: {0}")]
    InvalidBlockCategory(String),

    /// 无效参数 (调用方传入了不合法的配置或尺寸)
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 无效数据 (语法元素取值超出标准允许范围)
    #[error("无效数据: {0}")]
    InvalidData(String),
}

/// 统一 Result 类型
pub type AvcResult<T> = Result<T, AvcError>;
