use std::{collections::HashMap, sync::Arc};

use criterion::{criterion_group, Criterion};
use framework_import::{
    framework::Tensorflow,
    graph::{Config, GraphImporter},
    ir::{ArgDescriptor, ArgType, OpDescriptor, OpDescriptorList},
    opdefs::{OpDescriptorRegistry, TensorflowOpDescriptorLoader},
    process::{OpMapping, OpMappingRegistry},
    rule::TensorflowNDArrayMappingRule,
    tensorflow_format::{
        attr_value::Value, op_def::ArgDef, AttrValue, DataType, GraphDef, NodeDef, OpDef, OpList,
        TensorProto,
    },
};

fn registry() -> Arc<OpDescriptorRegistry> {
    let arg = |name: &str| ArgDef {
        name: String::from(name),
        ..Default::default()
    };
    let op_list = OpList {
        op: vec![
            OpDef {
                name: String::from("Add"),
                input_arg: vec![arg("x"), arg("y")],
                output_arg: vec![arg("z")],
                ..Default::default()
            },
            OpDef {
                name: String::from("Const"),
                output_arg: vec![arg("output")],
                ..Default::default()
            },
        ],
    };
    let nd4j_ops = OpDescriptorList::new(vec![OpDescriptor::new(
        "add",
        vec![
            ArgDescriptor::new("input", ArgType::InputTensor, 0),
            ArgDescriptor::new("y", ArgType::InputTensor, 1),
            ArgDescriptor::new("output", ArgType::OutputTensor, 0),
        ],
    )]);

    let registry = OpDescriptorRegistry::new();
    registry
        .register_loader(TensorflowOpDescriptorLoader::new(op_list, nd4j_ops))
        .unwrap();
    registry.freeze();
    Arc::new(registry)
}

/// `len` additions, each one over two neighbouring constants.
fn chain(len: usize) -> GraphDef {
    let constant = |name: String| NodeDef {
        name,
        op: String::from("Const"),
        attr: HashMap::from([(
            String::from("value"),
            AttrValue {
                value: Some(Value::Tensor(TensorProto {
                    dtype: DataType::DtFloat as i32,
                    float_val: vec![1.0],
                    ..Default::default()
                })),
            },
        )]),
        ..Default::default()
    };

    let mut node = vec![constant(String::from("c0"))];
    for i in 1..=len {
        node.push(constant(format!("c{}", i)));
        node.push(NodeDef {
            name: format!("c{}_sum", i),
            op: String::from("Add"),
            input: vec![format!("c{}", i - 1), format!("c{}", i)],
            ..Default::default()
        });
    }
    GraphDef { node }
}

fn bench_chain(c: &mut Criterion) {
    let graph = chain(500);
    let mut group = c.benchmark_group("GraphImport");
    group.sample_size(10);

    for num_threads in [1, 4] {
        let mappings = OpMappingRegistry::<Tensorflow>::new().with(
            OpMapping::new("Add", "add")
                .rule(|| TensorflowNDArrayMappingRule::new([("x", "input"), ("y", "y")])),
        );
        let importer =
            GraphImporter::with_config(registry(), mappings, Config { num_threads }).unwrap();
        group.bench_function(format!("Chain500Threads{}", num_threads), |b| {
            b.iter(|| importer.import(&graph).unwrap())
        });
    }
    group.finish();
}

criterion_group!(imports, bench_chain);
