use marmot_core::{DType, Error, Result};

// ONNX TensorProto data types
// See https://onnx.ai/onnx/repo-docs/IR.html#tensor-data-types

/// The `TensorProto.DataType` code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Undefined,
    Float,
    Uint8,
    Int8,
    Uint16,
    Int16,
    Int32,
    Int64,
    String,
    Bool,
    Float16,
    Double,
    Uint32,
    Uint64,
    Complex64,
    Complex128,
    Bfloat16,
}

impl DataType {
    /// Look up a wire code. Returns `None` for codes outside the table.
    pub fn from_code(code: i32) -> Option<Self> {
        let dt = match code {
            0 => DataType::Undefined,
            1 => DataType::Float,
            2 => DataType::Uint8,
            3 => DataType::Int8,
            4 => DataType::Uint16,
            5 => DataType::Int16,
            6 => DataType::Int32,
            7 => DataType::Int64,
            8 => DataType::String,
            9 => DataType::Bool,
            10 => DataType::Float16,
            11 => DataType::Double,
            12 => DataType::Uint32,
            13 => DataType::Uint64,
            14 => DataType::Complex64,
            15 => DataType::Complex128,
            16 => DataType::Bfloat16,
            _ => return None,
        };
        Some(dt)
    }

    pub fn code(self) -> i32 {
        match self {
            DataType::Undefined => 0,
            DataType::Float => 1,
            DataType::Uint8 => 2,
            DataType::Int8 => 3,
            DataType::Uint16 => 4,
            DataType::Int16 => 5,
            DataType::Int32 => 6,
            DataType::Int64 => 7,
            DataType::String => 8,
            DataType::Bool => 9,
            DataType::Float16 => 10,
            DataType::Double => 11,
            DataType::Uint32 => 12,
            DataType::Uint64 => 13,
            DataType::Complex64 => 14,
            DataType::Complex128 => 15,
            DataType::Bfloat16 => 16,
        }
    }

    /// Map onto the element type the decoder materialises.
    pub fn to_dtype(self) -> Result<DType> {
        match self {
            DataType::Undefined => Err(Error::UndefinedDType),
            DataType::Bool => Ok(DType::Bool),
            DataType::Float => Ok(DType::F32),
            DataType::Double => Ok(DType::F64),
            DataType::Int64 => Ok(DType::I64),
            DataType::Int32 => Ok(DType::I32),
            other => Err(Error::UnsupportedFeature(format!(
                "tensor data type {other:?} has no decoder"
            ))),
        }
    }
}

impl From<DType> for DataType {
    fn from(dtype: DType) -> Self {
        match dtype {
            DType::Bool => DataType::Bool,
            DType::F32 => DataType::Float,
            DType::F64 => DataType::Double,
            DType::I64 => DataType::Int64,
            DType::I32 => DataType::Int32,
        }
    }
}

/// Marks a tensor as one chunk of a larger tensor split across protos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Segment {
    pub begin: i64,
    pub end: i64,
}

/// A serialized tensor as the model parser hands it over: dims, a dtype
/// tag, and whichever data-carrying fields the exporter filled in.
///
/// Empty repeated fields and an empty `raw_data` are indistinguishable from
/// absent ones on the wire, so "present" means "non-empty" here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorDescriptor {
    /// Tensor name (may be empty).
    pub name: String,
    /// Shape dimensions.
    pub dims: Vec<i64>,
    /// `TensorProto.DataType` code.
    pub data_type: i32,
    /// Set when the tensor is one segment of a larger tensor.
    pub segment: Option<Segment>,
    pub float_data: Vec<f32>,
    /// Also carries BOOL values (1 = true).
    pub int32_data: Vec<i32>,
    pub int64_data: Vec<i64>,
    pub double_data: Vec<f64>,
    /// Little-endian packed elements.
    pub raw_data: Vec<u8>,
}

impl TensorDescriptor {
    /// An empty descriptor with the given name, dtype and dims.
    pub fn new(name: &str, data_type: DataType, dims: &[i64]) -> Self {
        Self {
            name: name.to_string(),
            dims: dims.to_vec(),
            data_type: data_type.code(),
            ..Self::default()
        }
    }

    pub fn with_raw_data(mut self, raw: Vec<u8>) -> Self {
        self.raw_data = raw;
        self
    }

    pub fn with_float_data(mut self, data: Vec<f32>) -> Self {
        self.float_data = data;
        self
    }

    pub fn with_double_data(mut self, data: Vec<f64>) -> Self {
        self.double_data = data;
        self
    }

    pub fn with_int32_data(mut self, data: Vec<i32>) -> Self {
        self.int32_data = data;
        self
    }

    pub fn with_int64_data(mut self, data: Vec<i64>) -> Self {
        self.int64_data = data;
        self
    }

    pub fn with_segment(mut self, begin: i64, end: i64) -> Self {
        self.segment = Some(Segment { begin, end });
        self
    }
}
