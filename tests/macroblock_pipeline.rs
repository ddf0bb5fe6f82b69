//! 宏块重建流水.
//!
//! 用 CAVLC 写入器构造切片残差, 经切片解码、反量化、反变换、重建后检查样本.

use avc::codec::cavlc::TotalZerosTable;
use avc::codec::cavlc::writer::write_residual_block;
use avc::codec::{
    ChromaFormat, DecoderConfig, DequantTables, MbResidualParams, Plane, PlaneRegion,
    PredictionInfo, SliceJob, decode_slice, reconstruct_chroma, reconstruct_luma,
};
use avc::core::{AvcError, BitWriter};
use bytes::Bytes;

fn coded(values: &[i32], len: usize) -> Vec<i32> {
    let mut v = vec![0; len];
    v[..values.len()].copy_from_slice(values);
    v
}

/// 两个宏块: MB0 为帧间 4x4 (块 0 DC 电平 1), MB1 为 Intra16x16 (DC 电平 4)
fn two_macroblock_slice() -> (SliceJob, usize) {
    let mut bw = BitWriter::new();
    let table = TotalZerosTable::Block4x4;
    write_residual_block(&mut bw, &coded(&[1], 16), 0, table).unwrap();
    for nc in [1, 1, 0] {
        write_residual_block(&mut bw, &coded(&[], 16), nc, table).unwrap();
    }
    write_residual_block(&mut bw, &coded(&[4], 16), 0, table).unwrap();
    let bits = bw.bits_written();

    let job = SliceJob {
        index: 0,
        payload: Bytes::from(bw.finish()),
        bit_offset: 0,
        macroblocks: vec![
            MbResidualParams {
                mb_addr: 0,
                cbp_luma: 1,
                qp_y: 28,
                ..MbResidualParams::default()
            },
            MbResidualParams {
                mb_addr: 1,
                intra: true,
                intra16x16: true,
                qp_y: 28,
                ..MbResidualParams::default()
            },
        ],
    };
    (job, bits)
}

#[test]
fn test_slice_to_samples() {
    let config = DecoderConfig::default();
    let tables = DequantTables::from_config(&config).unwrap();
    let (job, bits) = two_macroblock_slice();
    let out = decode_slice(&job, &config, 2, 1).unwrap();
    assert_eq!(out.bits_consumed, bits, "切片残差应被完整消耗");

    let stride = 32;
    let mut luma = vec![100u16; stride * 16];
    let mut cb = vec![128u16; 16 * 8];
    for (params, mb) in job.macroblocks.iter().zip(&out.coeffs) {
        let mut region = PlaneRegion {
            samples: &mut luma,
            stride,
            x: params.mb_addr * 16,
            y: 0,
        };
        reconstruct_luma(mb, params, Plane::Luma, &config, &tables, &PredictionInfo::default(), &mut region)
            .unwrap();
        let mut region = PlaneRegion {
            samples: &mut cb,
            stride: 16,
            x: params.mb_addr * 8,
            y: 0,
        };
        reconstruct_chroma(mb, params, Plane::Cb, &config, &tables, &PredictionInfo::default(), &mut region)
            .unwrap();
    }

    for y in 0..16 {
        for x in 0..32 {
            let expected = if x >= 16 || (x < 4 && y < 4) { 104 } else { 100 };
            assert_eq!(luma[y * stride + x], expected, "样本 ({}, {}) 不符", x, y);
        }
    }
    assert!(cb.iter().all(|&s| s == 128), "无色度残差时预测应保持不变");
}

#[test]
fn test_422_chroma_slice() {
    let config = DecoderConfig {
        chroma_format: ChromaFormat::Yuv422,
        chroma_qp_index_offset: 2,
        ..DecoderConfig::default()
    };
    let tables = DequantTables::from_config(&config).unwrap();

    let mut bw = BitWriter::new();
    write_residual_block(&mut bw, &coded(&[2], 8), -2, TotalZerosTable::ChromaDc422).unwrap();
    write_residual_block(&mut bw, &coded(&[], 8), -2, TotalZerosTable::ChromaDc422).unwrap();
    let params = MbResidualParams {
        cbp_chroma: 1,
        qp_y: 26,
        ..MbResidualParams::default()
    };
    let job = SliceJob {
        index: 3,
        payload: Bytes::from(bw.finish()),
        bit_offset: 0,
        macroblocks: vec![params.clone()],
    };
    let out = decode_slice(&job, &config, 1, 1).unwrap();
    assert_eq!(out.coeffs[0].chroma[0].dc[0][0], 2);

    let mut cb = vec![64u16; 8 * 16];
    let mut region = PlaneRegion {
        samples: &mut cb,
        stride: 8,
        x: 0,
        y: 0,
    };
    reconstruct_chroma(&out.coeffs[0], &params, Plane::Cb, &config, &tables, &PredictionInfo::default(), &mut region)
        .unwrap();
    // 纯 DC 输入经 2x4 变换后各块 DC 相同, 整个 8x16 分量被同样抬高
    let first = cb[0];
    assert!(first > 64, "DC 残差应抬高样本");
    assert!(cb.iter().all(|&s| s == first));

    let mut cr = vec![64u16; 8 * 16];
    let mut region = PlaneRegion {
        samples: &mut cr,
        stride: 8,
        x: 0,
        y: 0,
    };
    reconstruct_chroma(&out.coeffs[0], &params, Plane::Cr, &config, &tables, &PredictionInfo::default(), &mut region)
        .unwrap();
    assert!(cr.iter().all(|&s| s == 64));
}

#[test]
fn test_high_bit_depth_clipping() {
    let config = DecoderConfig {
        bit_depth_luma: 10,
        ..DecoderConfig::default()
    };
    let tables = DequantTables::flat();
    let mut bw = BitWriter::new();
    write_residual_block(&mut bw, &coded(&[60], 16), 0, TotalZerosTable::Block4x4).unwrap();
    for nc in [1, 1, 0] {
        write_residual_block(&mut bw, &coded(&[], 16), nc, TotalZerosTable::Block4x4).unwrap();
    }
    let params = MbResidualParams {
        cbp_luma: 1,
        qp_y: 30,
        ..MbResidualParams::default()
    };
    let job = SliceJob {
        index: 0,
        payload: Bytes::from(bw.finish()),
        bit_offset: 0,
        macroblocks: vec![params.clone()],
    };
    let out = decode_slice(&job, &config, 1, 1).unwrap();

    let mut luma = vec![1000u16; 16 * 16];
    let mut region = PlaneRegion {
        samples: &mut luma,
        stride: 16,
        x: 0,
        y: 0,
    };
    reconstruct_luma(&out.coeffs[0], &params, Plane::Luma, &config, &tables, &PredictionInfo::default(), &mut region)
        .unwrap();
    assert_eq!(luma[0], 1023, "10 位样本应裁剪到 1023");
    assert_eq!(luma[4], 1000);
}

/// 单宏块切片: 块 0 的 DC 电平为 `level`, 其余 3 个 4x4 块为空
fn single_level_job(level: i32, qp_y: i32) -> SliceJob {
    let mut bw = BitWriter::new();
    write_residual_block(&mut bw, &coded(&[level], 16), 0, TotalZerosTable::Block4x4).unwrap();
    for nc in [1, 1, 0] {
        write_residual_block(&mut bw, &coded(&[], 16), nc, TotalZerosTable::Block4x4).unwrap();
    }
    SliceJob {
        index: 7,
        payload: Bytes::from(bw.finish()),
        bit_offset: 0,
        macroblocks: vec![MbResidualParams {
            cbp_luma: 1,
            qp_y,
            ..MbResidualParams::default()
        }],
    }
}

#[test]
fn test_oversized_level_rejected_by_bit_depth() {
    // (位深, 电平, 是否接受)
    let cases = [
        (8u8, 32_767, true),
        (8, 1 << 20, false),
        (10, 1 << 17, false),
        (14, (1 << 21) - 1, true),
    ];
    for (bit_depth, level, accepted) in cases {
        let config = DecoderConfig {
            bit_depth_luma: bit_depth,
            ..DecoderConfig::default()
        };
        let job = single_level_job(level, 28);
        let result = decode_slice(&job, &config, 1, 1);
        if accepted {
            let out = result.unwrap();
            assert_eq!(out.coeffs[0].luma[0].blocks[0][0][0], level, "位深 {}", bit_depth);
        } else {
            let err = result.unwrap_err();
            assert_eq!(err.slice_index, 7);
            assert_eq!(err.mb_index, 0);
            assert!(
                matches!(err.source, AvcError::InvalidData(_)),
                "位深 {} 电平 {} 应被拒绝: {:?}",
                bit_depth,
                level,
                err.source
            );
        }
    }
}

#[test]
fn test_dequant_overflow_returns_error() {
    // 14 位下电平合法, 但 qP = 87 时反量化结果超出系数范围
    let config = DecoderConfig {
        bit_depth_luma: 14,
        ..DecoderConfig::default()
    };
    let tables = DequantTables::flat();
    let job = single_level_job((1 << 21) - 1, 51);
    let out = decode_slice(&job, &config, 1, 1).unwrap();

    let mut luma = vec![0u16; 16 * 16];
    let mut region = PlaneRegion {
        samples: &mut luma,
        stride: 16,
        x: 0,
        y: 0,
    };
    let result = reconstruct_luma(
        &out.coeffs[0],
        &job.macroblocks[0],
        Plane::Luma,
        &config,
        &tables,
        &PredictionInfo::default(),
        &mut region,
    );
    assert!(matches!(result, Err(AvcError::InvalidData(_))), "反量化溢出应返回错误");
}
