mod common;

use std::collections::HashMap;

use common::*;
use framework_import::{
    framework::{Onnx, Tensorflow},
    ir::{arg_descriptor::Value, ArgDescriptor, ArgType, DataType, TensorData},
    process::MappingProcess,
    rule::{
        AttributeValue, ListNumberToListNumber, MappingContext, MappingRule, OnnxNDArrayMappingRule,
        RuleCategory, TensorflowNDArrayMappingRule, ValueMappingRule,
    },
    ImportError, NotFoundKind,
};

fn bound_add_rule() -> TensorflowNDArrayMappingRule {
    let mut rule = TensorflowNDArrayMappingRule::new([("x", "input"), ("y", "y")]);
    rule.bind(MappingProcess::new(tf_registry(), "tensorflow", "Add", "add"))
        .unwrap();
    rule
}

#[test]
fn classifies_tensor_names() {
    let rule = bound_add_rule();

    assert!(rule.is_input_tensor_name("x").unwrap());
    assert!(rule.is_input_tensor_name("y").unwrap());
    assert!(!rule.is_input_tensor_name("z").unwrap());

    assert!(rule.is_output_tensor_name("input").unwrap());
    assert!(!rule.is_output_tensor_name("output").unwrap());
    assert!(!rule.is_output_tensor_name("inPlace").unwrap());
}

#[test]
fn unbound_rule_refuses_queries() {
    let rule = TensorflowNDArrayMappingRule::new([("x", "input")]);

    assert!(matches!(
        rule.is_input_tensor_name("x"),
        Err(ImportError::UnboundRule { .. })
    ));
    assert!(matches!(
        rule.is_output_tensor_name("input"),
        Err(ImportError::UnboundRule { .. })
    ));
    assert!(matches!(
        rule.mapping_process(),
        Err(ImportError::UnboundRule { .. })
    ));
    assert!(matches!(
        rule.convert(&MappingContext::new("add")),
        Err(ImportError::UnboundRule { .. })
    ));
}

#[test]
fn rule_binds_only_once() {
    let mut rule = bound_add_rule();
    let result = rule.bind(MappingProcess::new(tf_registry(), "tensorflow", "Relu", "relu"));

    assert!(matches!(result, Err(ImportError::Configuration(_))));
    assert_eq!(rule.mapping_process().unwrap().op_name(), "add");
}

#[test]
fn duplicate_targets_fail_at_bind() {
    let mut rule = TensorflowNDArrayMappingRule::new([("x", "input"), ("y", "input")]);
    let result = rule.bind(MappingProcess::new(tf_registry(), "tensorflow", "Add", "add"));

    assert!(matches!(result, Err(ImportError::Configuration(_))));
    assert!(!rule.state().is_bound());
}

#[test]
fn process_of_another_framework_is_refused() {
    let mut rule = OnnxNDArrayMappingRule::new([("A", "input")]);
    let result = rule.bind(MappingProcess::new(full_registry(), "tensorflow", "Add", "add"));

    assert!(matches!(result, Err(ImportError::Configuration(_))));
}

#[test]
fn unknown_source_op_is_not_found() {
    let mut rule = TensorflowNDArrayMappingRule::new([("x", "input")]);
    rule.bind(MappingProcess::new(tf_registry(), "tensorflow", "MatMul", "add"))
        .unwrap();

    match rule.is_input_tensor_name("x") {
        Err(ImportError::NotFound { kind, key }) => {
            assert_eq!(kind, NotFoundKind::Op);
            assert_eq!(key, "MatMul");
        }
        other => panic!("unexpected result {:?}", other),
    }
    // output names only depend on the canonical op
    assert!(rule.is_output_tensor_name("input").unwrap());
}

#[test]
fn unknown_canonical_op_is_not_found() {
    let mut rule = TensorflowNDArrayMappingRule::new([("x", "input")]);
    rule.bind(MappingProcess::new(tf_registry(), "tensorflow", "Add", "matmul"))
        .unwrap();

    match rule.is_output_tensor_name("input") {
        Err(ImportError::NotFound { kind, key }) => {
            assert_eq!(kind, NotFoundKind::CanonicalOp);
            assert_eq!(key, "matmul");
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert!(rule.is_input_tensor_name("x").unwrap());
}

#[test]
fn tensor_rule_emits_canonical_inputs() {
    let rule = bound_add_rule();
    let context = MappingContext::new("add_1")
        .with_tensor("x", tf_float_tensor(&[2, 2], &[1.0, 2.0, 3.0, 4.0]))
        .with_tensor("y", tf_float_tensor(&[2, 2], &[0.5]));

    let args = rule.convert(&context).unwrap();
    assert_eq!(args.len(), 2);

    assert_eq!(args[0].name, "input");
    assert_eq!(args[0].arg_index, 0);
    assert!(args[0].is_kind(ArgType::InputTensor));
    assert_eq!(args[1].name, "y");
    assert_eq!(args[1].arg_index, 1);

    let Some(Value::InputValue(tensor)) = &args[1].value else {
        panic!("expected a tensor value");
    };
    assert_eq!(tensor.name, "y");
    assert_eq!(tensor.dims, vec![2, 2]);
    let TensorData::Float(data) = TensorData::try_from(tensor).unwrap() else {
        panic!("expected float data");
    };
    assert_eq!(data.iter().copied().collect::<Vec<_>>(), vec![0.5; 4]);
}

#[test]
fn tensor_rule_reports_missing_tensor() {
    let rule = bound_add_rule();
    let context = MappingContext::new("add_1").with_tensor("x", tf_float_tensor(&[1], &[1.0]));

    match rule.convert(&context) {
        Err(ImportError::NotFound { kind, key }) => {
            assert_eq!(kind, NotFoundKind::Tensor);
            assert_eq!(key, "add_1/y");
        }
        other => panic!("unexpected result {:?}", other.map(|a| a.len())),
    }
}

#[test]
fn tensor_rule_reports_missing_canonical_argument() {
    let mut rule = TensorflowNDArrayMappingRule::new([("x", "weights")]);
    rule.bind(MappingProcess::new(tf_registry(), "tensorflow", "Add", "add"))
        .unwrap();
    let context = MappingContext::new("add_1").with_tensor("x", tf_float_tensor(&[1], &[1.0]));

    assert!(matches!(
        rule.convert(&context),
        Err(ImportError::NotFound {
            kind: NotFoundKind::Argument,
            ..
        })
    ));
}

#[test]
fn transformer_args_replace_copied_values() {
    let synthesized = ArgDescriptor::new("y", ArgType::InputTensor, 1);
    let in_place = ArgDescriptor::new("inPlace", ArgType::Bool, 0).with_value(Value::BoolValue(true));
    let mut rule = TensorflowNDArrayMappingRule::new([("x", "input"), ("y", "y")])
        .with_transformer_args(HashMap::from([
            (String::from("y"), vec![synthesized.clone()]),
            (String::from("inPlace"), vec![in_place.clone()]),
        ]));
    rule.bind(MappingProcess::new(tf_registry(), "tensorflow", "Add", "add"))
        .unwrap();

    let context = MappingContext::new("add_1").with_tensor("x", tf_float_tensor(&[1], &[1.0]));
    let args = rule.convert(&context).unwrap();

    assert_eq!(args.len(), 3);
    assert_eq!(args[0].name, "input");
    assert_eq!(args[1], synthesized);
    assert_eq!(args[2], in_place);
    assert_eq!(rule.transformer_args().len(), 2);
}

#[test]
fn onnx_tensor_rule_keeps_tensor_names() {
    let mut rule = OnnxNDArrayMappingRule::new([("A", "input")]);
    rule.bind(MappingProcess::new(full_registry(), "onnx", "Add", "add"))
        .unwrap();
    assert!(rule.is_input_tensor_name("A").unwrap());
    assert!(!rule.is_input_tensor_name("x").unwrap());

    let context = MappingContext::new("add_1")
        .with_tensor("A", onnx_float_tensor("weights", &[3], &[1.0, 2.0, 3.0]));
    let args = rule.convert(&context).unwrap();

    let Some(Value::InputValue(tensor)) = &args[0].value else {
        panic!("expected a tensor value");
    };
    assert_eq!(tensor.name, "weights");
    assert_eq!(tensor.element_count(), 3);
}

#[test]
fn value_rule_coerces_per_canonical_type() {
    let mut rule = ValueMappingRule::<Tensorflow>::new([("alpha", "cutoff")]);
    rule.bind(MappingProcess::new(tf_registry(), "tensorflow", "Relu", "relu"))
        .unwrap();
    assert_eq!(rule.category(), RuleCategory::Attribute);
    assert_eq!(rule.name(), "valuemapping");

    let context = MappingContext::new("relu").with_attribute("alpha", AttributeValue::Int(2));
    let args = rule.convert(&context).unwrap();

    assert_eq!(args.len(), 1);
    assert_eq!(args[0].name, "cutoff");
    assert!(args[0].is_kind(ArgType::Double));
    assert_eq!(args[0].value, Some(Value::DoubleValue(2.0)));
}

#[test]
fn value_rule_converts_bools_to_ints() {
    let mut rule = ValueMappingRule::<Tensorflow>::new([("T", "dataType"), ("keep", "permuteDims")]);
    rule.bind(MappingProcess::new(tf_registry(), "tensorflow", "Transpose", "permute"))
        .unwrap();

    let context = MappingContext::new("transpose")
        .with_attribute("T", AttributeValue::DataType(DataType::Float))
        .with_attribute("keep", AttributeValue::Bool(true))
        .with_tensor("perm", tf_float_tensor(&[1], &[0.0]));
    let args = rule.convert(&context).unwrap();

    assert_eq!(args[0].value, Some(Value::DataTypeValue(DataType::Float as i32)));
    assert_eq!(args[1].value, Some(Value::Int64Value(1)));
    assert!(args[1].convert_bool_to_int);
}

#[test]
fn value_rule_rejects_incompatible_values() {
    let mut rule = ValueMappingRule::<Tensorflow>::new([("alpha", "cutoff")]);
    rule.bind(MappingProcess::new(tf_registry(), "tensorflow", "Relu", "relu"))
        .unwrap();
    let context = MappingContext::new("relu")
        .with_attribute("alpha", AttributeValue::String(String::from("fast")))
        .with_tensor("features", tf_float_tensor(&[1], &[0.0]));

    match rule.convert(&context) {
        Err(ImportError::AttributeTypeMismatch {
            attribute, actual, ..
        }) => {
            assert_eq!(attribute, "alpha");
            assert_eq!(actual, "String");
        }
        other => panic!("unexpected result {:?}", other.map(|a| a.len())),
    }
}

#[test]
fn value_rule_reports_missing_attribute() {
    let mut rule = ValueMappingRule::<Tensorflow>::new([("alpha", "cutoff")]);
    rule.bind(MappingProcess::new(tf_registry(), "tensorflow", "Relu", "relu"))
        .unwrap();
    let context = MappingContext::new("relu").with_tensor("features", tf_float_tensor(&[1], &[0.0]));

    assert!(matches!(
        rule.convert(&context),
        Err(ImportError::NotFound {
            kind: NotFoundKind::Attribute,
            ..
        })
    ));
}

#[test]
fn list_rule_expands_elements() {
    let mut rule = ListNumberToListNumber::<Onnx>::new([("perm", "permuteDims")]);
    let registry = full_registry();
    rule.bind(MappingProcess::new(registry, "onnx", "Relu", "permute"))
        .unwrap();

    let context = MappingContext::new("transpose")
        .with_attribute("perm", AttributeValue::Ints(vec![0, 2, 1]))
        .with_tensor("X", onnx_float_tensor("x", &[1], &[0.0]));
    let args = rule.convert(&context).unwrap();

    assert_eq!(args.len(), 3);
    for (i, arg) in args.iter().enumerate() {
        assert_eq!(arg.name, "permuteDims");
        assert_eq!(arg.arg_index, i as i32);
        assert!(arg.is_kind(ArgType::Int64));
    }
    assert_eq!(args[2].value, Some(Value::Int64Value(1)));
}

#[test]
fn list_rule_rejects_scalars() {
    let mut rule = ListNumberToListNumber::<Onnx>::new([("perm", "permuteDims")]);
    rule.bind(MappingProcess::new(full_registry(), "onnx", "Relu", "permute"))
        .unwrap();
    let context = MappingContext::new("transpose")
        .with_attribute("perm", AttributeValue::Int(1))
        .with_tensor("X", onnx_float_tensor("x", &[1], &[0.0]));

    assert!(matches!(
        rule.convert(&context),
        Err(ImportError::AttributeTypeMismatch { .. })
    ));
}
