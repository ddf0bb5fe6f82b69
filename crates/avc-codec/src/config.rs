//! 解码配置.
//!
//! 汇总参数集 (SPS/PPS) 中与残差重建相关的取值. 参数集本身由外部解析,
//! 这里只保存结果, 可从 JSON 反序列化以便测试与工具复用.

use avc_core::{AvcError, AvcResult};
use serde::{Deserialize, Serialize};

/// 色度采样格式 (chroma_format_idc)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChromaFormat {
    /// 仅亮度
    Monochrome,
    /// 4:2:0
    #[default]
    Yuv420,
    /// 4:2:2
    Yuv422,
    /// 4:4:4 (非独立平面)
    Yuv444,
}

impl ChromaFormat {
    /// ChromaArrayType
    pub fn chroma_array_type(self) -> u8 {
        match self {
            Self::Monochrome => 0,
            Self::Yuv420 => 1,
            Self::Yuv422 => 2,
            Self::Yuv444 => 3,
        }
    }

    /// 宏块色度样本尺寸 (宽, 高)
    pub fn mb_chroma_size(self) -> (usize, usize) {
        match self {
            Self::Monochrome => (0, 0),
            Self::Yuv420 => (8, 8),
            Self::Yuv422 => (8, 16),
            Self::Yuv444 => (16, 16),
        }
    }

    /// 每个色度分量的 DC 系数个数 (4:2:0 与 4:2:2 之外为 0)
    pub fn chroma_dc_count(self) -> usize {
        match self {
            Self::Yuv420 => 4,
            Self::Yuv422 => 8,
            _ => 0,
        }
    }

    /// 色度是否按独立 DC/AC 方式编码
    pub fn has_chroma_dc(self) -> bool {
        self.chroma_dc_count() != 0
    }
}

/// 颜色分量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    Luma,
    Cb,
    Cr,
}

impl Plane {
    /// 分量序号 (Y=0, Cb=1, Cr=2)
    pub fn index(self) -> usize {
        match self {
            Self::Luma => 0,
            Self::Cb => 1,
            Self::Cr => 2,
        }
    }

    /// 全部分量
    pub const ALL: [Plane; 3] = [Plane::Luma, Plane::Cb, Plane::Cr];
}

/// 缩放矩阵 (权重已按光栅顺序展开)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingMatrix {
    /// 六个 4x4 权重表: Y/Cb/Cr 帧内, Y/Cb/Cr 帧间
    pub lists_4x4: Vec<Vec<u8>>,
    /// 8x8 权重表: Y 帧内, Y 帧间, Cb 帧内, Cb 帧间, Cr 帧内, Cr 帧间.
    /// 可以只给出前两个 (非 4:4:4), 缺省为平坦 16.
    #[serde(default)]
    pub lists_8x8: Vec<Vec<u8>>,
}

impl ScalingMatrix {
    /// 校验表数量、长度与取值
    pub fn validate(&self) -> AvcResult<()> {
        if self.lists_4x4.len() != 6 {
            return Err(AvcError::InvalidArgument(format!(
                "4x4 缩放表数量应为 6, 实际 {}",
                self.lists_4x4.len()
            )));
        }
        if !matches!(self.lists_8x8.len(), 0 | 2 | 6) {
            return Err(AvcError::InvalidArgument(format!(
                "8x8 缩放表数量应为 0/2/6, 实际 {}",
                self.lists_8x8.len()
            )));
        }
        let lists = self
            .lists_4x4
            .iter()
            .map(|l| (l, 16))
            .chain(self.lists_8x8.iter().map(|l| (l, 64)));
        for (list, expected) in lists {
            if list.len() != expected {
                return Err(AvcError::InvalidArgument(format!(
                    "缩放表长度应为 {}, 实际 {}",
                    expected,
                    list.len()
                )));
            }
            if list.contains(&0) {
                return Err(AvcError::InvalidArgument("缩放表权重不能为 0".into()));
            }
        }
        Ok(())
    }
}

fn default_bit_depth() -> u8 {
    8
}

/// 残差重建所需的参数集取值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    #[serde(default)]
    pub chroma_format: ChromaFormat,
    #[serde(default = "default_bit_depth")]
    pub bit_depth_luma: u8,
    #[serde(default = "default_bit_depth")]
    pub bit_depth_chroma: u8,
    /// qpprime_y_zero_transform_bypass_flag
    #[serde(default)]
    pub transform_bypass: bool,
    /// Cb 色度 QP 偏移
    #[serde(default)]
    pub chroma_qp_index_offset: i32,
    /// Cr 色度 QP 偏移
    #[serde(default)]
    pub second_chroma_qp_index_offset: i32,
    #[serde(default)]
    pub scaling_matrix: Option<ScalingMatrix>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            chroma_format: ChromaFormat::Yuv420,
            bit_depth_luma: 8,
            bit_depth_chroma: 8,
            transform_bypass: false,
            chroma_qp_index_offset: 0,
            second_chroma_qp_index_offset: 0,
            scaling_matrix: None,
        }
    }
}

impl DecoderConfig {
    /// 从 JSON 文本解析并校验
    pub fn from_json(text: &str) -> AvcResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| AvcError::InvalidArgument(format!("解码配置解析失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围
    pub fn validate(&self) -> AvcResult<()> {
        for (name, depth) in [
            ("bit_depth_luma", self.bit_depth_luma),
            ("bit_depth_chroma", self.bit_depth_chroma),
        ] {
            if !(8..=14).contains(&depth) {
                return Err(AvcError::InvalidArgument(format!(
                    "{} 超出范围 8..=14: {}",
                    name, depth
                )));
            }
        }
        for (name, offset) in [
            ("chroma_qp_index_offset", self.chroma_qp_index_offset),
            (
                "second_chroma_qp_index_offset",
                self.second_chroma_qp_index_offset,
            ),
        ] {
            if !(-12..=12).contains(&offset) {
                return Err(AvcError::InvalidArgument(format!(
                    "{} 超出范围 -12..=12: {}",
                    name, offset
                )));
            }
        }
        if let Some(matrix) = &self.scaling_matrix {
            matrix.validate()?;
        }
        Ok(())
    }

    /// 分量位深
    pub fn bit_depth(&self, plane: Plane) -> u8 {
        match plane {
            Plane::Luma => self.bit_depth_luma,
            _ => self.bit_depth_chroma,
        }
    }

    /// QpBdOffset = 6 * (bit_depth - 8)
    pub fn qp_bd_offset(&self, plane: Plane) -> i32 {
        6 * (i32::from(self.bit_depth(plane)) - 8)
    }

    /// 分量最大样本值
    pub fn max_sample_value(&self, plane: Plane) -> i32 {
        (1 << self.bit_depth(plane)) - 1
    }

    /// 色度 QP 偏移 (亮度为 0)
    pub fn chroma_qp_offset(&self, plane: Plane) -> i32 {
        match plane {
            Plane::Luma => 0,
            Plane::Cb => self.chroma_qp_index_offset,
            Plane::Cr => self.second_chroma_qp_index_offset,
        }
    }

    /// 按亮度方式编码的分量 (4:4:4 时 Cb/Cr 也使用亮度语法)
    pub fn luma_like_planes(&self) -> &'static [Plane] {
        static ALL: [Plane; 3] = Plane::ALL;
        static LUMA_ONLY: [Plane; 1] = [Plane::Luma];
        if self.chroma_format == ChromaFormat::Yuv444 {
            &ALL
        } else {
            &LUMA_ONLY
        }
    }
}
