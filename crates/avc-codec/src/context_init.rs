//! CABAC 上下文初始化数据.
//!
//! 本模块只提供初始化表与状态计算, 不含算术解码引擎;
//! 本 crate 的残差路径只走 CAVLC, 这里的状态由外部 CABAC 解码器在片开始时取用.
//!
//! 每个上下文由 `(m, n)` 初始化对给出:
//! `preCtxState = clip(1, 126, ((m * clip(0, 51, SliceQPY)) >> 4) + n)`,
//! `preCtxState <= 63` 时 `pStateIdx = 63 - preCtxState, valMPS = 0`,
//! 否则 `pStateIdx = preCtxState - 64, valMPS = 1`.

/// `(m, n)` 初始化对
pub type InitPair = (i32, i32);

/// ctxIdx 0..=10: mb_type (SI 前缀 0..=2, I 片 3..=10)
#[rustfmt::skip]
pub const MB_TYPE_I_INIT: [InitPair; 11] = [
    (20, -15), (2, 54), (3, 74),
    (20, -15), (2, 54), (3, 74), (-28, 127), (-23, 104), (-6, 53), (-1, 54), (7, 51),
];

/// ctxIdx 60..=63: mb_qp_delta (所有片类型共用)
pub const MB_QP_DELTA_INIT: [InitPair; 4] = [(0, 41), (0, 63), (0, 63), (0, 63)];

/// ctxIdx 64..=67: intra_chroma_pred_mode
pub const INTRA_CHROMA_PRED_MODE_INIT: [InitPair; 4] = [(-9, 83), (4, 86), (0, 97), (-7, 72)];

/// ctxIdx 68..=69: prev_intra4x4_pred_mode_flag / rem_intra4x4_pred_mode
pub const INTRA_LUMA_PRED_MODE_INIT: [InitPair; 2] = [(13, 41), (3, 62)];

/// 单个上下文的概率状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextState {
    /// pStateIdx (0..=63)
    pub state_idx: u8,
    /// valMPS
    pub val_mps: u8,
}

/// 由初始化对计算上下文状态
pub fn init_context_state((m, n): InitPair, slice_qp: i32) -> ContextState {
    let qp = slice_qp.clamp(0, 51);
    let pre = (((m * qp) >> 4) + n).clamp(1, 126);
    if pre <= 63 {
        ContextState {
            state_idx: (63 - pre) as u8,
            val_mps: 0,
        }
    } else {
        ContextState {
            state_idx: (pre - 64) as u8,
            val_mps: 1,
        }
    }
}

/// 批量初始化一组连续上下文
pub fn init_context_states(pairs: &[InitPair], slice_qp: i32) -> Vec<ContextState> {
    pairs
        .iter()
        .map(|&pair| init_context_state(pair, slice_qp))
        .collect()
}

/// 帧内相关上下文 (ctxIdx 0..=10 与 60..=69) 的起始序号与初始化表
pub const INTRA_CONTEXT_RANGES: [(usize, &[InitPair]); 4] = [
    (0, &MB_TYPE_I_INIT),
    (60, &MB_QP_DELTA_INIT),
    (64, &INTRA_CHROMA_PRED_MODE_INIT),
    (68, &INTRA_LUMA_PRED_MODE_INIT),
];

/// 初始化帧内相关上下文, 返回 `(ctxIdx, 状态)` 列表
pub fn init_intra_contexts(slice_qp: i32) -> Vec<(usize, ContextState)> {
    INTRA_CONTEXT_RANGES
        .iter()
        .flat_map(|&(start, pairs)| {
            init_context_states(pairs, slice_qp)
                .into_iter()
                .enumerate()
                .map(move |(i, state)| (start + i, state))
        })
        .collect()
}
