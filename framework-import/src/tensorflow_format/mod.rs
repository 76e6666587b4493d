///
/// # TensorFlow Format
///
/// The subset of the TensorFlow protobuf schema consumed by the importer:
/// graph and node definitions, op definitions, attribute values and tensors.
///
/// Field tags match `tensorflow/core/framework/*.proto`, so prost can decode files written by TensorFlow.
///
mod tensorflow_proto;

pub use tensorflow_proto::*;
