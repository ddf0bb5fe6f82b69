//! 运动矢量预测.
//!
//! 邻居 A (左), B (上), C (右上), D (左上) 以分区为单位给出,
//! 预测顺序: MBAFF 场/帧缩放, C 不可用时以 D 代替, 16x8 / 8x16 方向覆盖, 中值预测.

/// 运动矢量 (1/4 像素单位)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct MotionVector {
    pub x: i32,
    pub y: i32,
}

impl MotionVector {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

/// 一个邻居分区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MvCandidate {
    pub mv: MotionVector,
    /// 参考索引, 帧内或未使用该参考列表时为 -1
    pub ref_idx: i32,
    /// 邻居存在且位于同一切片
    pub available: bool,
    /// 邻居为场宏块 (MBAFF)
    pub is_field: bool,
}

impl Default for MvCandidate {
    fn default() -> Self {
        Self::unavailable()
    }
}

impl MvCandidate {
    /// 不可用邻居: 参考索引 -1, 零矢量
    pub const fn unavailable() -> Self {
        Self {
            mv: MotionVector::ZERO,
            ref_idx: -1,
            available: false,
            is_field: false,
        }
    }

    /// 可用的帧间邻居
    pub const fn inter(mv: MotionVector, ref_idx: i32) -> Self {
        Self {
            mv,
            ref_idx,
            available: true,
            is_field: false,
        }
    }

    /// 可用但为帧内编码的邻居
    pub const fn intra() -> Self {
        Self {
            mv: MotionVector::ZERO,
            ref_idx: -1,
            available: true,
            is_field: false,
        }
    }

    /// 标记为场宏块
    pub const fn field(mut self) -> Self {
        self.is_field = true;
        self
    }

    /// MBAFF: 按当前宏块的场/帧属性缩放邻居的垂直分量与参考索引
    fn rescaled_for(self, current_is_field: bool) -> Self {
        if !self.available || self.ref_idx < 0 || self.is_field == current_is_field {
            return self;
        }
        let mut out = self;
        if current_is_field {
            out.mv.y /= 2;
            out.ref_idx *= 2;
        } else {
            out.mv.y *= 2;
            out.ref_idx >>= 1;
        }
        out
    }
}

/// 当前分区的 A/B/C/D 邻居
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MvNeighbors {
    pub a: MvCandidate,
    pub b: MvCandidate,
    pub c: MvCandidate,
    pub d: MvCandidate,
}

impl MvNeighbors {
    /// C 不可用时使用 D
    pub fn with_top_left_fallback(self) -> Self {
        if self.c.available {
            self
        } else {
            Self { c: self.d, ..self }
        }
    }

    fn rescaled_for(self, current_is_field: bool) -> Self {
        Self {
            a: self.a.rescaled_for(current_is_field),
            b: self.b.rescaled_for(current_is_field),
            c: self.c.rescaled_for(current_is_field),
            d: self.d.rescaled_for(current_is_field),
        }
    }
}

/// 分区形状 (决定方向覆盖规则)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionShape {
    /// 16x16, 8x8 及更小分区: 只做中值预测
    #[default]
    Square,
    /// 16x8 上分区: 优先 B
    Upper16x8,
    /// 16x8 下分区: 优先 A
    Lower16x8,
    /// 8x16 左分区: 优先 A
    Left8x16,
    /// 8x16 右分区: 优先 C
    Right8x16,
}

/// 宏块自适应帧场信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MvPredContext {
    /// MbaffFrameFlag
    pub mbaff: bool,
    /// 当前宏块为场宏块
    pub field_mb: bool,
}

/// 三者中值
pub fn median3(a: i32, b: i32, c: i32) -> i32 {
    a + b + c - a.min(b).min(c) - a.max(b).max(c)
}

fn prepare(neighbors: &MvNeighbors, ctx: &MvPredContext) -> MvNeighbors {
    let neighbors = if ctx.mbaff {
        neighbors.rescaled_for(ctx.field_mb)
    } else {
        *neighbors
    };
    neighbors.with_top_left_fallback()
}

/// 预测当前分区的运动矢量
pub fn predict_mv(
    neighbors: &MvNeighbors,
    ref_idx: i32,
    shape: PartitionShape,
    ctx: &MvPredContext,
) -> MotionVector {
    let n = prepare(neighbors, ctx);
    directional(&n, ref_idx, shape).unwrap_or_else(|| median_prediction(&n, ref_idx))
}

fn directional(n: &MvNeighbors, ref_idx: i32, shape: PartitionShape) -> Option<MotionVector> {
    let preferred = match shape {
        PartitionShape::Square => return None,
        PartitionShape::Upper16x8 => &n.b,
        PartitionShape::Lower16x8 | PartitionShape::Left8x16 => &n.a,
        PartitionShape::Right8x16 => &n.c,
    };
    (preferred.ref_idx == ref_idx).then_some(preferred.mv)
}

fn median_prediction(n: &MvNeighbors, ref_idx: i32) -> MotionVector {
    let (a, mut b, mut c) = (n.a, n.b, n.c);
    if !b.available && !c.available && a.available {
        b = a;
        c = a;
    }

    let matches = [a, b, c].map(|cand| cand.ref_idx == ref_idx);
    match matches {
        [true, false, false] => a.mv,
        [false, true, false] => b.mv,
        [false, false, true] => c.mv,
        _ => MotionVector::new(
            median3(a.mv.x, b.mv.x, c.mv.x),
            median3(a.mv.y, b.mv.y, c.mv.y),
        ),
    }
}

/// P_Skip 宏块的运动矢量 (参考索引固定为 0)
///
/// A 或 B 不可用, 或其中之一参考 0 且为零矢量时返回零矢量.
pub fn predict_p_skip_mv(neighbors: &MvNeighbors, ctx: &MvPredContext) -> MotionVector {
    let n = prepare(neighbors, ctx);
    if !n.a.available || !n.b.available {
        return MotionVector::ZERO;
    }
    let zero_ref0 = |cand: &MvCandidate| cand.ref_idx == 0 && cand.mv.is_zero();
    if zero_ref0(&n.a) || zero_ref0(&n.b) {
        return MotionVector::ZERO;
    }
    median_prediction(&n, 0)
}
