// Tensor decoding — TensorDescriptor → TensorValue
//
// A TensorProto can carry its elements in a typed repeated field
// (float_data, int64_data, ...) or packed little-endian in raw_data. Which
// one wins depends on the dtype:
//
//   dtype   first          second        raw width   nothing present
//   BOOL    int32_data     raw_data      8           NoDataFound
//   FLOAT   raw_data       float_data    4           empty tensor
//   DOUBLE  double_data    raw_data      8           NoDataFound
//   INT64   raw_data       int64_data    8           NoDataFound
//   INT32   raw_data       int32_data    4           NoDataFound
//
// Raw BOOL elements are 8 bytes wide, not 1 as in stock ONNX. An element is
// true when the last byte of its chunk is 1.

use marmot_core::{DType, Error, Result, Shape, TensorData, TensorValue};

use super::descriptor::{DataType, TensorDescriptor};

/// Where the elements of a decoded tensor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Typed,
    Raw,
    Nothing,
}

/// Decode a serialized tensor descriptor into an owned tensor.
///
/// Fails with [`Error::UnsupportedFeature`] for segmented tensors and dtypes
/// without a decoder, [`Error::UndefinedDType`] for the UNDEFINED tag,
/// [`Error::CorruptedData`] when `raw_data` is not a whole number of
/// elements and [`Error::NoDataFound`] when no data field is populated
/// (except FLOAT, which decodes to an unpopulated tensor).
pub fn decode(desc: &TensorDescriptor) -> Result<TensorValue> {
    if let Some(segment) = desc.segment {
        return Err(Error::UnsupportedFeature(format!(
            "tensor '{}' is segmented ({}..{})",
            desc.name, segment.begin, segment.end
        )));
    }
    let data_type = DataType::from_code(desc.data_type).ok_or_else(|| {
        Error::UnsupportedFeature(format!("unknown tensor data type code {}", desc.data_type))
    })?;
    let dtype = data_type.to_dtype()?;
    let shape = Shape::from_i64(&desc.dims).ok_or_else(|| {
        Error::CorruptedData(format!(
            "tensor '{}' has negative dims {:?}",
            desc.name, desc.dims
        ))
    })?;
    if shape.checked_elem_count().is_none() {
        return Err(Error::CorruptedData(format!(
            "tensor '{}' dims {:?} overflow the element count",
            desc.name, desc.dims
        )));
    }

    let (data, source) = match dtype {
        DType::Bool => decode_bool(desc)?,
        DType::F32 => decode_f32(desc)?,
        DType::F64 => decode_f64(desc)?,
        DType::I64 => decode_i64(desc)?,
        DType::I32 => decode_i32(desc)?,
    };
    log::debug!(
        "decoded tensor '{}': {} {} from {:?} ({} elements)",
        desc.name,
        dtype,
        shape,
        source,
        data.len()
    );

    if data.is_empty() {
        return Ok(TensorValue::unpopulated(shape, dtype));
    }
    TensorValue::new(shape, data)
}

impl TensorDescriptor {
    /// Decode this descriptor. See [`decode`].
    pub fn decode(&self) -> Result<TensorValue> {
        decode(self)
    }
}

fn decode_bool(desc: &TensorDescriptor) -> Result<(TensorData, Source)> {
    if !desc.int32_data.is_empty() {
        let v = desc.int32_data.iter().map(|&x| x == 1).collect();
        Ok((TensorData::Bool(v), Source::Typed))
    } else if !desc.raw_data.is_empty() {
        let v = read_le::<bool, 8>(&desc.raw_data, |c| c[7] == 1)?;
        Ok((TensorData::Bool(v), Source::Raw))
    } else {
        Err(Error::NoDataFound { dtype: DType::Bool })
    }
}

fn decode_f32(desc: &TensorDescriptor) -> Result<(TensorData, Source)> {
    if !desc.raw_data.is_empty() {
        let v = read_le::<f32, 4>(&desc.raw_data, f32::from_le_bytes)?;
        Ok((TensorData::F32(v), Source::Raw))
    } else if !desc.float_data.is_empty() {
        Ok((TensorData::F32(desc.float_data.clone()), Source::Typed))
    } else {
        Ok((TensorData::F32(Vec::new()), Source::Nothing))
    }
}

fn decode_f64(desc: &TensorDescriptor) -> Result<(TensorData, Source)> {
    if !desc.double_data.is_empty() {
        Ok((TensorData::F64(desc.double_data.clone()), Source::Typed))
    } else if !desc.raw_data.is_empty() {
        let v = read_le::<f64, 8>(&desc.raw_data, f64::from_le_bytes)?;
        Ok((TensorData::F64(v), Source::Raw))
    } else {
        Err(Error::NoDataFound { dtype: DType::F64 })
    }
}

fn decode_i64(desc: &TensorDescriptor) -> Result<(TensorData, Source)> {
    if !desc.raw_data.is_empty() {
        let v = read_le::<i64, 8>(&desc.raw_data, i64::from_le_bytes)?;
        Ok((TensorData::I64(v), Source::Raw))
    } else if !desc.int64_data.is_empty() {
        Ok((TensorData::I64(desc.int64_data.clone()), Source::Typed))
    } else {
        Err(Error::NoDataFound { dtype: DType::I64 })
    }
}

fn decode_i32(desc: &TensorDescriptor) -> Result<(TensorData, Source)> {
    if !desc.raw_data.is_empty() {
        let v = read_le::<i32, 4>(&desc.raw_data, i32::from_le_bytes)?;
        Ok((TensorData::I32(v), Source::Raw))
    } else if !desc.int32_data.is_empty() {
        Ok((TensorData::I32(desc.int32_data.clone()), Source::Typed))
    } else {
        Err(Error::NoDataFound { dtype: DType::I32 })
    }
}

/// Split `bytes` into `W`-byte little-endian chunks and convert each one.
///
/// A trailing partial chunk is an error, never silently dropped.
pub(crate) fn read_le<T, const W: usize>(
    bytes: &[u8],
    convert: fn([u8; W]) -> T,
) -> Result<Vec<T>> {
    let chunks = bytes.chunks_exact(W);
    if !chunks.remainder().is_empty() {
        return Err(Error::CorruptedData(format!(
            "{} bytes is not a whole number of {}-byte elements",
            bytes.len(),
            W
        )));
    }
    Ok(chunks
        .map(|c| {
            let mut element = [0u8; W];
            element.copy_from_slice(c);
            convert(element)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_bytes<const W: usize>(values: impl IntoIterator<Item = [u8; W]>) -> Vec<u8> {
        values.into_iter().flatten().collect()
    }

    #[test]
    fn test_read_le_rejects_partial_chunk() {
        let err = read_le::<i32, 4>(&[1, 0, 0, 0, 2, 0], i32::from_le_bytes).unwrap_err();
        assert!(matches!(err, Error::CorruptedData(_)));
    }

    #[test]
    fn test_read_le_in_chunk_order() {
        let raw = le_bytes([7i32.to_le_bytes(), (-3i32).to_le_bytes()]);
        assert_eq!(read_le::<i32, 4>(&raw, i32::from_le_bytes).unwrap(), vec![7, -3]);
    }

    #[test]
    fn test_segmented_is_unsupported() {
        let d = TensorDescriptor::new("seg", DataType::Float, &[1])
            .with_float_data(vec![1.0])
            .with_segment(0, 1);
        assert!(matches!(decode(&d), Err(Error::UnsupportedFeature(_))));
    }

    #[test]
    fn test_segment_checked_before_dtype() {
        let d = TensorDescriptor::new("seg", DataType::Undefined, &[]).with_segment(0, 1);
        assert!(matches!(decode(&d), Err(Error::UnsupportedFeature(_))));
    }

    #[test]
    fn test_undefined_dtype() {
        let d = TensorDescriptor::new("u", DataType::Undefined, &[1]).with_float_data(vec![1.0]);
        assert!(matches!(decode(&d), Err(Error::UndefinedDType)));
    }

    #[test]
    fn test_unknown_code_is_unsupported() {
        let mut d = TensorDescriptor::new("x", DataType::Float, &[1]);
        d.data_type = 99;
        assert!(matches!(decode(&d), Err(Error::UnsupportedFeature(_))));
    }

    #[test]
    fn test_float32_raw_wins_over_typed() {
        let raw = le_bytes([1.5f32.to_le_bytes(), (-2.0f32).to_le_bytes()]);
        let d = TensorDescriptor::new("f", DataType::Float, &[2])
            .with_raw_data(raw)
            .with_float_data(vec![9.0, 9.0]);
        let t = decode(&d).unwrap();
        assert_eq!(t.data(), &TensorData::F32(vec![1.5, -2.0]));
    }

    #[test]
    fn test_float64_typed_wins_over_raw() {
        let raw = le_bytes([1.0f64.to_le_bytes()]);
        let d = TensorDescriptor::new("d", DataType::Double, &[1])
            .with_raw_data(raw)
            .with_double_data(vec![4.25]);
        let t = decode(&d).unwrap();
        assert_eq!(t.data(), &TensorData::F64(vec![4.25]));
    }

    #[test]
    fn test_bool_typed_wins_over_raw() {
        let d = TensorDescriptor::new("b", DataType::Bool, &[3])
            .with_int32_data(vec![1, 0, 2])
            .with_raw_data(vec![0; 24]);
        let t = decode(&d).unwrap();
        assert_eq!(t.data(), &TensorData::Bool(vec![true, false, false]));
    }

    #[test]
    fn test_bool_raw_reads_last_byte() {
        let mut raw = vec![0u8; 16];
        raw[7] = 1;
        raw[8] = 1;
        let d = TensorDescriptor::new("b", DataType::Bool, &[2]).with_raw_data(raw);
        let t = decode(&d).unwrap();
        assert_eq!(t.data(), &TensorData::Bool(vec![true, false]));
    }

    #[test]
    fn test_negative_dims_are_corrupted() {
        let d = TensorDescriptor::new("n", DataType::Int64, &[-1]).with_int64_data(vec![1]);
        assert!(matches!(decode(&d), Err(Error::CorruptedData(_))));
    }

    #[test]
    fn test_overflowing_dims_are_corrupted() {
        let d = TensorDescriptor::new("x", DataType::Int64, &[1 << 32, 1 << 32, 2])
            .with_int64_data(vec![1]);
        assert!(matches!(decode(&d), Err(Error::CorruptedData(_))));

        // Wraps to 4 under unchecked multiplication
        let d = TensorDescriptor::new("x", DataType::Int64, &[(1 << 62) + 1, 4])
            .with_int64_data(vec![1, 2, 3, 4]);
        assert!(matches!(decode(&d), Err(Error::CorruptedData(_))));

        let d = TensorDescriptor::new("x", DataType::Float, &[i64::MAX, i64::MAX]);
        assert!(matches!(decode(&d), Err(Error::CorruptedData(_))));
    }

    #[test]
    fn test_length_must_match_dims() {
        let d = TensorDescriptor::new("m", DataType::Int64, &[2, 2]).with_int64_data(vec![1, 2, 3]);
        assert!(matches!(
            decode(&d),
            Err(Error::ElementCountMismatch { expected: 4, got: 3, .. })
        ));
    }
}
