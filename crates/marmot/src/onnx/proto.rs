// TensorProto wire decoding
//
// ONNX test data (`test_data_set_*/input_0.pb`) and detached initializers
// are stored as a single serialized TensorProto. This module decodes such a
// message into a TensorDescriptor; it does not touch ModelProto/GraphProto.
//
// Fields handled (everything else is skipped):
//
//   1  dims          repeated int64   (packed or unpacked)
//   2  data_type     int32
//   3  segment       message { 1: begin, 2: end }
//   4  float_data    repeated float   (packed or fixed32)
//   5  int32_data    repeated int32   (packed or varint)
//   7  int64_data    repeated int64   (packed or varint)
//   8  name          string
//   9  raw_data      bytes
//   10 double_data   repeated double  (packed or fixed64)
//
// REFERENCE:
//   https://github.com/onnx/onnx/blob/main/onnx/onnx.proto
//   https://protobuf.dev/programming-guides/encoding/

use marmot_core::{Error, Result};

use super::decode::read_le;
use super::descriptor::{Segment, TensorDescriptor};

const WIRE_VARINT: u32 = 0;
const WIRE_FIXED64: u32 = 1;
const WIRE_LEN: u32 = 2;
const WIRE_FIXED32: u32 = 5;

fn corrupted(what: &str) -> Error {
    Error::CorruptedData(format!("protobuf: {what}"))
}

// Minimal protobuf decoder

/// A minimal protobuf wire-format decoder.
struct PbDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PbDecoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_varint(&mut self) -> Result<u64> {
        let mut result: u64 = 0;
        let mut shift = 0;
        loop {
            if self.pos >= self.data.len() {
                return Err(corrupted("unexpected end of data"));
            }
            let byte = self.data[self.pos];
            self.pos += 1;
            result |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift > 63 {
                return Err(corrupted("varint too long"));
            }
        }
        Ok(result)
    }

    fn read_tag(&mut self) -> Result<(u32, u32)> {
        let val = self.read_varint()?;
        let field = (val >> 3) as u32;
        let wire_type = (val & 0x7) as u32;
        Ok((field, wire_type))
    }

    fn read_fixed(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(corrupted("fixed-width field exceeds data"));
        }
        let result = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(result)
    }

    fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = usize::try_from(self.read_varint()?)
            .map_err(|_| corrupted("length prefix overflows usize"))?;
        self.read_fixed(len)
            .map_err(|_| corrupted("bytes field exceeds data"))
    }

    fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| corrupted("invalid UTF-8 string"))
    }

    fn skip_field(&mut self, wire_type: u32) -> Result<()> {
        match wire_type {
            WIRE_VARINT => {
                self.read_varint()?;
            }
            WIRE_FIXED64 => {
                self.read_fixed(8)?;
            }
            WIRE_LEN => {
                self.read_bytes()?;
            }
            WIRE_FIXED32 => {
                self.read_fixed(4)?;
            }
            _ => return Err(corrupted(&format!("unsupported wire type {wire_type}"))),
        }
        Ok(())
    }

    /// Read a repeated varint field, in either packed or unpacked form.
    fn read_varints(&mut self, wire_type: u32, out: &mut Vec<u64>) -> Result<()> {
        match wire_type {
            WIRE_VARINT => out.push(self.read_varint()?),
            WIRE_LEN => {
                let mut sub = PbDecoder::new(self.read_bytes()?);
                while sub.remaining() > 0 {
                    out.push(sub.read_varint()?);
                }
            }
            _ => return Err(corrupted(&format!("wire type {wire_type} for varint list"))),
        }
        Ok(())
    }
}

fn decode_segment(data: &[u8]) -> Result<Segment> {
    let mut dec = PbDecoder::new(data);
    let mut segment = Segment::default();
    while dec.remaining() > 0 {
        let (field, wire_type) = dec.read_tag()?;
        match (field, wire_type) {
            (1, WIRE_VARINT) => segment.begin = dec.read_varint()? as i64,
            (2, WIRE_VARINT) => segment.end = dec.read_varint()? as i64,
            _ => dec.skip_field(wire_type)?,
        }
    }
    Ok(segment)
}

impl TensorDescriptor {
    /// Decode one serialized TensorProto message.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut dec = PbDecoder::new(data);
        let mut desc = TensorDescriptor::default();
        let mut ints = Vec::new();
        while dec.remaining() > 0 {
            let (field, wire_type) = dec.read_tag()?;
            match (field, wire_type) {
                (1, _) => {
                    ints.clear();
                    dec.read_varints(wire_type, &mut ints)?;
                    desc.dims.extend(ints.iter().map(|&v| v as i64));
                }
                (2, WIRE_VARINT) => desc.data_type = dec.read_varint()? as i32,
                (3, WIRE_LEN) => desc.segment = Some(decode_segment(dec.read_bytes()?)?),
                (4, WIRE_LEN) => {
                    let packed = read_le::<f32, 4>(dec.read_bytes()?, f32::from_le_bytes)?;
                    desc.float_data.extend(packed);
                }
                (4, WIRE_FIXED32) => {
                    let v = read_le::<f32, 4>(dec.read_fixed(4)?, f32::from_le_bytes)?;
                    desc.float_data.extend(v);
                }
                (5, _) => {
                    ints.clear();
                    dec.read_varints(wire_type, &mut ints)?;
                    desc.int32_data.extend(ints.iter().map(|&v| v as i32));
                }
                (7, _) => {
                    ints.clear();
                    dec.read_varints(wire_type, &mut ints)?;
                    desc.int64_data.extend(ints.iter().map(|&v| v as i64));
                }
                (8, WIRE_LEN) => desc.name = dec.read_string()?,
                (9, WIRE_LEN) => desc.raw_data = dec.read_bytes()?.to_vec(),
                (10, WIRE_LEN) => {
                    let packed = read_le::<f64, 8>(dec.read_bytes()?, f64::from_le_bytes)?;
                    desc.double_data.extend(packed);
                }
                (10, WIRE_FIXED64) => {
                    let v = read_le::<f64, 8>(dec.read_fixed(8)?, f64::from_le_bytes)?;
                    desc.double_data.extend(v);
                }
                _ => dec.skip_field(wire_type)?,
            }
        }
        log::trace!(
            "parsed TensorProto '{}' (data_type {}, dims {:?}, {} raw bytes)",
            desc.name,
            desc.data_type,
            desc.dims,
            desc.raw_data.len()
        );
        Ok(desc)
    }
}

// Tests
