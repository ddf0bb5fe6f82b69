//! 切片级残差解码.
//!
//! 切片内按宏块顺序串行解码, 每个切片拥有独立的比特游标与邻居网格,
//! 因此相互独立的切片可以用 rayon 并行展开.

use avc_core::{AvcError, BitReader};
use bytes::Bytes;
use log::{debug, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::config::DecoderConfig;
use crate::macroblock::{MacroblockCoeffs, MbResidualParams, decode_macroblock_residual};
use crate::neighbors::NzCountGrid;

/// 一个待解码切片
#[derive(Debug, Clone)]
pub struct SliceJob {
    /// 切片序号 (同时作为邻居可用性判定的切片标识)
    pub index: u32,
    /// 已去除防竞争字节的切片数据
    pub payload: Bytes,
    /// 第一个宏块残差语法在 payload 中的比特偏移
    pub bit_offset: usize,
    /// 切片内宏块的残差控制参数 (解码顺序)
    pub macroblocks: Vec<MbResidualParams>,
}

/// 切片解码结果
#[derive(Debug, Clone)]
pub struct SliceOutput {
    pub index: u32,
    pub coeffs: Vec<MacroblockCoeffs>,
    /// 从 bit_offset 起消耗的比特数
    pub bits_consumed: usize,
}

/// 切片解码失败: 切片在第 `mb_index` 个宏块处中止
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("切片 {slice_index} 在第 {mb_index} 个宏块处解码失败: {source}")]
pub struct SliceError {
    pub slice_index: u32,
    pub mb_index: usize,
    #[source]
    pub source: AvcError,
}

/// 解码一个切片的全部宏块残差
pub fn decode_slice(
    job: &SliceJob,
    config: &DecoderConfig,
    mb_width: usize,
    mb_height: usize,
) -> Result<SliceOutput, SliceError> {
    let fail = |mb_index: usize, source: AvcError| {
        warn!(
            "AVC: 放弃切片 {}, 宏块序号 {}, 原因: {}",
            job.index, mb_index, source
        );
        SliceError {
            slice_index: job.index,
            mb_index,
            source,
        }
    };

    config.validate().map_err(|e| fail(0, e))?;
    let mut br = BitReader::with_offset(&job.payload, job.bit_offset).map_err(|e| fail(0, e))?;
    let mut grid = NzCountGrid::new(mb_width, mb_height, config.chroma_format);
    let mb_count = mb_width * mb_height;

    debug!(
        "AVC: 开始切片 {}, 宏块数={}, 比特偏移={}",
        job.index,
        job.macroblocks.len(),
        job.bit_offset
    );

    let mut coeffs = Vec::with_capacity(job.macroblocks.len());
    for (mb_index, params) in job.macroblocks.iter().enumerate() {
        if params.mb_addr >= mb_count {
            return Err(fail(
                mb_index,
                AvcError::InvalidArgument(format!(
                    "宏块地址 {} 超出图像 ({} 个宏块)",
                    params.mb_addr, mb_count
                )),
            ));
        }
        let mb = decode_macroblock_residual(&mut br, params, config, &mut grid, job.index)
            .map_err(|e| fail(mb_index, e))?;
        coeffs.push(mb);
    }

    let bits_consumed = br.position() - job.bit_offset;
    debug!(
        "AVC: 完成切片 {}, 消耗 {} 比特, 剩余 {} 比特",
        job.index,
        bits_consumed,
        br.bits_left()
    );
    Ok(SliceOutput {
        index: job.index,
        coeffs,
        bits_consumed,
    })
}

/// 并行解码多个相互独立的切片, 结果顺序与输入一致
pub fn decode_slices(
    jobs: &[SliceJob],
    config: &DecoderConfig,
    mb_width: usize,
    mb_height: usize,
) -> Vec<Result<SliceOutput, SliceError>> {
    jobs.par_iter()
        .map(|job| decode_slice(job, config, mb_width, mb_height))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cavlc::TotalZerosTable;
    use crate::cavlc::writer::write_residual_block;
    use crate::macroblock::MbKind;
    use avc_core::BitWriter;
    use std::error::Error as _;

    fn coded_mb(mb_addr: usize) -> MbResidualParams {
        MbResidualParams {
            mb_addr,
            cbp_luma: 1,
            qp_y: 26,
            ..MbResidualParams::default()
        }
    }

    /// 3 个填充比特后接一个宏块: 8x8 块 0 的 4 个 4x4 块, 第一个块 DC 为 `dc`
    fn payload_with_prefix(dc: i32) -> (Bytes, usize) {
        let mut bw = BitWriter::new();
        bw.write_bits(0b101, 3);
        let mut first = vec![0; 16];
        first[0] = dc;
        write_residual_block(&mut bw, &first, 0, TotalZerosTable::Block4x4).unwrap();
        for nc in [1, 1, 0] {
            write_residual_block(&mut bw, &[0; 16], nc, TotalZerosTable::Block4x4).unwrap();
        }
        let bits = bw.bits_written() - 3;
        (Bytes::from(bw.finish()), bits)
    }

    #[test]
    fn test_decode_single_slice_with_offset() {
        let (payload, bits) = payload_with_prefix(9);
        let job = SliceJob {
            index: 0,
            payload,
            bit_offset: 3,
            macroblocks: vec![coded_mb(0)],
        };
        let out = decode_slice(&job, &DecoderConfig::default(), 2, 1).unwrap();
        assert_eq!(out.bits_consumed, bits);
        assert_eq!(out.coeffs.len(), 1);
        assert_eq!(out.coeffs[0].luma[0].blocks[0][0][0], 9);
    }

    #[test]
    fn test_failure_reports_macroblock_index() {
        let (payload, _) = payload_with_prefix(1);
        let job = SliceJob {
            index: 7,
            payload,
            bit_offset: 3,
            macroblocks: vec![
                coded_mb(0),
                MbResidualParams {
                    mb_addr: 1,
                    kind: MbKind::Skip,
                    ..MbResidualParams::default()
                },
                coded_mb(1),
            ],
        };
        let err = decode_slice(&job, &DecoderConfig::default(), 2, 1).unwrap_err();
        assert_eq!(err.slice_index, 7);
        assert_eq!(err.mb_index, 2);
        assert!(err.source().is_some(), "应保留底层错误");
        assert!(err.to_string().contains("切片 7"));
    }

    #[test]
    fn test_rejects_out_of_picture_address() {
        let job = SliceJob {
            index: 1,
            payload: Bytes::from_static(&[0xFF]),
            bit_offset: 0,
            macroblocks: vec![coded_mb(4)],
        };
        let err = decode_slice(&job, &DecoderConfig::default(), 2, 2).unwrap_err();
        assert!(matches!(err.source, AvcError::InvalidArgument(_)));

        let job = SliceJob {
            bit_offset: 9,
            ..job
        };
        assert!(decode_slice(&job, &DecoderConfig::default(), 2, 2).is_err());
    }

    #[test]
    fn test_parallel_slices_keep_order() {
        let jobs: Vec<SliceJob> = (0..8)
            .map(|i| {
                let (payload, _) = payload_with_prefix(i as i32 + 1);
                SliceJob {
                    index: i,
                    payload,
                    bit_offset: 3,
                    macroblocks: vec![coded_mb(i as usize)],
                }
            })
            .collect();
        let results = decode_slices(&jobs, &DecoderConfig::default(), 4, 2);
        assert_eq!(results.len(), 8);
        for (i, result) in results.into_iter().enumerate() {
            let out = result.unwrap();
            assert_eq!(out.index as usize, i);
            assert_eq!(out.coeffs[0].luma[0].blocks[0][0][0], i as i32 + 1);
        }
    }
}
