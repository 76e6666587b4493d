use criterion::{black_box, criterion_group, Criterion};
use framework_import::{
    framework::{Framework, Onnx, Tensorflow},
    ir::TensorData,
    onnx_format,
    tensorflow_format::{tensor_shape_proto::Dim, DataType, TensorProto, TensorShapeProto},
};

fn tf_tensor(dims: &[i64], float_val: Vec<f32>) -> TensorProto {
    TensorProto {
        dtype: DataType::DtFloat as i32,
        tensor_shape: Some(TensorShapeProto {
            dim: dims
                .iter()
                .map(|size| Dim {
                    size: *size,
                    ..Default::default()
                })
                .collect(),
            unknown_rank: false,
        }),
        float_val,
        ..Default::default()
    }
}

fn bench_tensorflow(c: &mut Criterion) {
    let dims = [1, 64, 56, 56];
    let count = dims.iter().product::<i64>() as usize;
    let dense = tf_tensor(&dims, (0..count).map(|x| x as f32).collect());
    let filled = tf_tensor(&dims, vec![0.5]);

    let mut group = c.benchmark_group("TensorflowConversion");
    group.sample_size(20);
    group.bench_function("Dense", |b| {
        b.iter(|| Tensorflow::convert_tensor(black_box(&dense)).unwrap())
    });
    group.bench_function("Filled", |b| {
        b.iter(|| Tensorflow::convert_tensor(black_box(&filled)).unwrap())
    });
    group.bench_function("DenseDecoded", |b| {
        b.iter(|| {
            let converted = Tensorflow::convert_tensor(black_box(&dense)).unwrap();
            TensorData::try_from(&converted).unwrap()
        })
    });
    group.finish();
}

fn bench_onnx(c: &mut Criterion) {
    let dims = vec![256, 256, 3, 3];
    let count = dims.iter().product::<i64>() as usize;
    let raw = onnx_format::TensorProto {
        dims: dims.clone(),
        data_type: Some(1),
        raw_data: Some(vec![0; count * 4]),
        name: Some(String::from("weights")),
        ..Default::default()
    };

    let mut group = c.benchmark_group("OnnxConversion");
    group.sample_size(20);
    group.bench_function("Raw", |b| b.iter(|| Onnx::convert_tensor(black_box(&raw)).unwrap()));
    group.finish();
}

criterion_group!(conversions, bench_tensorflow, bench_onnx);
