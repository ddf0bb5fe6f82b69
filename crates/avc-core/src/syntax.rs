//! 单次语法元素解码结果.

/// 一次变长码解码调用产生的语法元素
///
/// `len` 为消耗的位数, `inf` 为码字去掉前缀后的信息位,
/// `value1`/`value2` 为解释后的取值 (含义随语法元素而定,
/// 例如 coeff_token 中分别为 total_coeff 与 trailing_ones).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyntaxElement {
    /// 消耗的位数
    pub len: u32,
    /// 信息位
    pub inf: u32,
    /// 第一个解释值
    pub value1: i32,
    /// 第二个解释值
    pub value2: i32,
}

impl SyntaxElement {
    /// 构造只有单个取值的语法元素
    pub fn single(len: u32, inf: u32, value: i32) -> Self {
        Self {
            len,
            inf,
            value1: value,
            value2: 0,
        }
    }
}
