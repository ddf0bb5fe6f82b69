//! # avc-codec
//!
//! H.264/AVC 宏块残差重建流水线与运动矢量预测.
//!
//! 流水线各阶段:
//! - **CAVLC 残差语法**: coeff_token / 电平 / total_zeros / run_before ([`cavlc`], [`residual`])
//! - **宏块残差遍历**: 按 CBP 与变换尺寸解码整宏块系数 ([`macroblock`], [`neighbors`])
//! - **反量化**: 4x4 / 8x8 / DC 缩放, 缩放矩阵, 色度 QP 映射 ([`quant`])
//! - **反变换**: 整数 4x4 / 8x8, Hadamard DC, 无损 DPCM, SP/SI ([`transform`], [`sp`])
//! - **样本重建**: 预测 + 残差并裁剪 ([`reconstruct`])
//! - **运动矢量预测**: 中值预测, 分区方向覆盖, MBAFF 缩放 ([`mvpred`])
//!
//! [`context_init`] 仅提供 CABAC 上下文初始化表, 供外部算术解码器使用.
//!
//! NAL 拆分、参数集解析、参考帧管理与去块滤波不在本 crate 范围内,
//! 其结果以 [`DecoderConfig`] 与逐宏块参数的形式传入.

pub mod cavlc;
pub mod config;
pub mod context_init;
pub mod macroblock;
pub mod mvpred;
pub mod neighbors;
pub mod quant;
pub mod reconstruct;
pub mod residual;
pub mod scan;
pub mod slice;
pub mod sp;
pub mod transform;

pub use config::{ChromaFormat, DecoderConfig, Plane, ScalingMatrix};
pub use context_init::{ContextState, init_context_state, init_context_states};
pub use macroblock::{MacroblockCoeffs, MbKind, MbResidualParams, decode_macroblock_residual};
pub use mvpred::{
    MotionVector, MvCandidate, MvNeighbors, MvPredContext, PartitionShape, predict_mv,
    predict_p_skip_mv,
};
pub use neighbors::NzCountGrid;
pub use quant::{DequantTables, QuantContext};
pub use reconstruct::{
    PlaneRegion, PredictionInfo, SwitchingParams, reconstruct_chroma, reconstruct_luma,
};
pub use residual::{BlockCategory, BlockKind, CoefficientRun, decode_residual_block};
pub use scan::ScanOrder;
pub use slice::{SliceError, SliceJob, SliceOutput, decode_slice, decode_slices};
pub use sp::SwitchingMode;
pub use transform::{BlockFlags, TransformKind};
