//! # Canonical tensors
//!
//! Every framework tensor is converted into a [`TensorProto`]: a name, a shape, an element
//! [`DataType`] and a little-endian `raw_data` buffer (strings go to `string_data`).
//!
//! [`TensorData`] decodes a canonical tensor into an `ndarray` array with the matching element type.
use ndarray::{ArrayD, IxDyn};

use crate::error::{ImportError, Result};

/// Element types of the canonical IR. The tags follow the ONNX numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DataType {
    Undefined = 0,
    Float = 1,
    Uint8 = 2,
    Int8 = 3,
    Uint16 = 4,
    Int16 = 5,
    Int32 = 6,
    Int64 = 7,
    String = 8,
    Bool = 9,
    Float16 = 10,
    Double = 11,
    Uint32 = 12,
    Uint64 = 13,
    Bfloat16 = 16,
}

impl DataType {
    /// Size in bytes of one element, `None` for strings and undefined.
    pub fn element_size(&self) -> Option<usize> {
        match self {
            DataType::Uint8 | DataType::Int8 | DataType::Bool => Some(1),
            DataType::Uint16 | DataType::Int16 | DataType::Float16 | DataType::Bfloat16 => Some(2),
            DataType::Float | DataType::Int32 | DataType::Uint32 => Some(4),
            DataType::Int64 | DataType::Double | DataType::Uint64 => Some(8),
            DataType::String | DataType::Undefined => None,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int64, repeated, tag = "2")]
    pub dims: Vec<i64>,
    #[prost(enumeration = "DataType", tag = "3")]
    pub data_type: i32,
    #[prost(bytes = "vec", tag = "4")]
    pub raw_data: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "5")]
    pub string_data: Vec<Vec<u8>>,
}

impl TensorProto {
    /// Builds a numeric tensor from its raw little-endian buffer.
    ///
    /// Fails if the buffer length doesn't match the shape and the element size.
    pub fn from_raw(
        name: impl Into<String>,
        dims: Vec<i64>,
        data_type: DataType,
        raw_data: Vec<u8>,
    ) -> Result<Self> {
        let element_size = data_type.element_size().ok_or_else(|| {
            ImportError::MalformedTensor(format!("{:?} tensors have no raw layout", data_type))
        })?;
        let expected = raw_size(element_count(&dims)?, element_size)?;
        if raw_data.len() != expected {
            return Err(ImportError::MalformedTensor(format!(
                "expected {} bytes for shape {:?} of {:?}, found {}",
                expected,
                dims,
                data_type,
                raw_data.len()
            )));
        }

        Ok(TensorProto {
            name: name.into(),
            dims,
            data_type: data_type as i32,
            raw_data,
            string_data: Vec::new(),
        })
    }

    pub fn from_strings(
        name: impl Into<String>,
        dims: Vec<i64>,
        string_data: Vec<Vec<u8>>,
    ) -> Result<Self> {
        let count = element_count(&dims)?;
        if string_data.len() != count {
            return Err(ImportError::MalformedTensor(format!(
                "expected {} strings for shape {:?}, found {}",
                count,
                dims,
                string_data.len()
            )));
        }

        Ok(TensorProto {
            name: name.into(),
            dims,
            data_type: DataType::String as i32,
            raw_data: Vec::new(),
            string_data,
        })
    }

    pub fn dtype(&self) -> Result<DataType> {
        DataType::try_from(self.data_type).map_err(|_| {
            ImportError::MalformedTensor(format!("unknown data type tag {}", self.data_type))
        })
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dims.iter().map(|d| *d as usize).collect()
    }

    /// Zero when the shape is invalid.
    pub fn element_count(&self) -> usize {
        element_count(&self.dims).unwrap_or_default()
    }
}

/// Number of elements described by `dims`. A scalar (no dims) holds one element.
pub fn element_count(dims: &[i64]) -> Result<usize> {
    dims.iter().try_fold(1usize, |acc, dim| {
        if *dim < 0 {
            return Err(ImportError::MalformedTensor(format!(
                "negative dimension {} in shape {:?}",
                dim, dims
            )));
        }
        acc.checked_mul(*dim as usize).ok_or_else(|| {
            ImportError::MalformedTensor(format!("shape {:?} has too many elements", dims))
        })
    })
}

/// Bytes needed by `count` elements of `element_size` bytes, bounded by what a buffer can hold.
pub fn raw_size(count: usize, element_size: usize) -> Result<usize> {
    count
        .checked_mul(element_size)
        .filter(|size| *size <= isize::MAX as usize)
        .ok_or_else(|| {
            ImportError::MalformedTensor(format!(
                "{} elements of {} bytes don't fit in a buffer",
                count, element_size
            ))
        })
}

/// Little-endian encoding of a numeric element.
pub trait LeBytes: Copy {
    fn extend_le(self, buffer: &mut Vec<u8>);
}

macro_rules! impl_le_bytes {
    ($($type_:ty),+) => {
        $(
            impl LeBytes for $type_ {
                fn extend_le(self, buffer: &mut Vec<u8>) {
                    buffer.extend_from_slice(&self.to_le_bytes());
                }
            }
        )+
    };
}

impl_le_bytes!(f32, f64, u8, i8, u16, i16, i32, i64, u32, u64);

impl LeBytes for bool {
    fn extend_le(self, buffer: &mut Vec<u8>) {
        buffer.push(self as u8);
    }
}

/// Encodes typed values into a raw buffer.
pub fn to_le_buffer<T: LeBytes>(values: &[T]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(values.len() * std::mem::size_of::<T>());
    values.iter().for_each(|v| v.extend_le(&mut buffer));
    buffer
}

/// Decoded view of a canonical tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Float(ArrayD<f32>),
    Uint8(ArrayD<u8>),
    Int8(ArrayD<i8>),
    Uint16(ArrayD<u16>),
    Int16(ArrayD<i16>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    String(ArrayD<String>),
    Bool(ArrayD<bool>),
    /// IEEE half precision, kept as raw bits
    Float16(ArrayD<u16>),
    Double(ArrayD<f64>),
    Uint32(ArrayD<u32>),
    Uint64(ArrayD<u64>),
    /// bfloat16, kept as raw bits
    Bfloat16(ArrayD<u16>),
}

macro_rules! decode_chunks {
    ($raw:expr, $type_:ty) => {
        $raw.chunks_exact(std::mem::size_of::<$type_>())
            .map(|x| <$type_>::from_le_bytes(x.try_into().unwrap_or_default()))
            .collect::<Vec<$type_>>()
    };
}

impl TensorData {
    pub fn shape(&self) -> &[usize] {
        match self {
            TensorData::Float(a) => a.shape(),
            TensorData::Uint8(a) => a.shape(),
            TensorData::Int8(a) => a.shape(),
            TensorData::Uint16(a) | TensorData::Float16(a) | TensorData::Bfloat16(a) => a.shape(),
            TensorData::Int16(a) => a.shape(),
            TensorData::Int32(a) => a.shape(),
            TensorData::Int64(a) => a.shape(),
            TensorData::String(a) => a.shape(),
            TensorData::Bool(a) => a.shape(),
            TensorData::Double(a) => a.shape(),
            TensorData::Uint32(a) => a.shape(),
            TensorData::Uint64(a) => a.shape(),
        }
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TryFrom<&TensorProto> for TensorData {
    type Error = ImportError;

    fn try_from(proto: &TensorProto) -> Result<Self> {
        let dtype = proto.dtype()?;
        let dimensions = IxDyn(&proto.shape());
        let raw = proto.raw_data.as_slice();

        let shape_error = |e: ndarray::ShapeError| {
            ImportError::MalformedTensor(format!("{} does not fit {:?}: {}", proto.name, proto.dims, e))
        };

        let data = match dtype {
            DataType::Float => TensorData::Float(
                ArrayD::from_shape_vec(dimensions, decode_chunks!(raw, f32)).map_err(shape_error)?,
            ),
            DataType::Double => TensorData::Double(
                ArrayD::from_shape_vec(dimensions, decode_chunks!(raw, f64)).map_err(shape_error)?,
            ),
            DataType::Uint8 => TensorData::Uint8(
                ArrayD::from_shape_vec(dimensions, raw.to_vec()).map_err(shape_error)?,
            ),
            DataType::Int8 => TensorData::Int8(
                ArrayD::from_shape_vec(dimensions, raw.iter().map(|x| *x as i8).collect())
                    .map_err(shape_error)?,
            ),
            DataType::Bool => TensorData::Bool(
                ArrayD::from_shape_vec(dimensions, raw.iter().map(|x| *x != 0).collect())
                    .map_err(shape_error)?,
            ),
            DataType::Uint16 => TensorData::Uint16(
                ArrayD::from_shape_vec(dimensions, decode_chunks!(raw, u16)).map_err(shape_error)?,
            ),
            DataType::Float16 => TensorData::Float16(
                ArrayD::from_shape_vec(dimensions, decode_chunks!(raw, u16)).map_err(shape_error)?,
            ),
            DataType::Bfloat16 => TensorData::Bfloat16(
                ArrayD::from_shape_vec(dimensions, decode_chunks!(raw, u16)).map_err(shape_error)?,
            ),
            DataType::Int16 => TensorData::Int16(
                ArrayD::from_shape_vec(dimensions, decode_chunks!(raw, i16)).map_err(shape_error)?,
            ),
            DataType::Int32 => TensorData::Int32(
                ArrayD::from_shape_vec(dimensions, decode_chunks!(raw, i32)).map_err(shape_error)?,
            ),
            DataType::Int64 => TensorData::Int64(
                ArrayD::from_shape_vec(dimensions, decode_chunks!(raw, i64)).map_err(shape_error)?,
            ),
            DataType::Uint32 => TensorData::Uint32(
                ArrayD::from_shape_vec(dimensions, decode_chunks!(raw, u32)).map_err(shape_error)?,
            ),
            DataType::Uint64 => TensorData::Uint64(
                ArrayD::from_shape_vec(dimensions, decode_chunks!(raw, u64)).map_err(shape_error)?,
            ),
            DataType::String => {
                let data = proto
                    .string_data
                    .iter()
                    .map(|x| {
                        String::from_utf8(x.clone()).map_err(|_| {
                            ImportError::MalformedTensor(format!(
                                "{} contains an invalid UTF-8 string",
                                proto.name
                            ))
                        })
                    })
                    .collect::<Result<Vec<String>>>()?;
                TensorData::String(ArrayD::from_shape_vec(dimensions, data).map_err(shape_error)?)
            }
            DataType::Undefined => {
                return Err(ImportError::MalformedTensor(format!(
                    "{} has an undefined data type",
                    proto.name
                )))
            }
        };

        Ok(data)
    }
}
