use std::sync::Arc;

use clap::Parser;
use framework_import::{
    framework::{Framework, Onnx, Tensorflow},
    ir::TensorData,
    opdefs::{builtin_loaders, read_proto, LoaderConfig, OpDescriptorRegistry},
    process::MappingProcess,
    rule::{MappingRule, NDArrayMappingRule},
    ImportError,
};
use log::info;

mod cli;
use cli::{Args, FrameworkName, OpPair};
use thiserror::Error;

#[derive(Debug, Error)]
enum AppError {
    #[error("Nothing to do: pass --list, --mapping or --tensor")]
    NothingToDo,
    #[error("Unable to load op descriptors -> {0}")]
    InvalidDescriptors(ImportError),
    #[error("Import failure -> {0}")]
    ImportFailure(#[from] ImportError),
}

fn main() {
    if let Err(e) = exec_program() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn exec_program() -> Result<(), AppError> {
    env_logger::init();

    let args = Args::parse();

    info!("Framework: {}", args.framework);
    info!("Canonical descriptors: {:?}", args.descriptors);
    info!("Framework op definitions: {:?}", args.op_defs);

    if !args.list && args.mapping.is_none() && args.tensor.is_none() {
        return Err(AppError::NothingToDo);
    }

    let config = LoaderConfig::default().nd4j_op_descriptors(&args.descriptors);
    let config = match args.framework {
        FrameworkName::Tensorflow => config.tensorflow_op_defs(&args.op_defs),
        FrameworkName::Onnx => config.onnx_op_defs(&args.op_defs),
    };

    let registry = Arc::new(OpDescriptorRegistry::new());
    let canonical = builtin_loaders(&config)
        .and_then(|loaders| registry.bootstrap(loaders))
        .map_err(AppError::InvalidDescriptors)?;

    info!("Registry ready with {} canonical ops", canonical.len());

    match args.framework {
        FrameworkName::Tensorflow => run::<Tensorflow>(&args, registry),
        FrameworkName::Onnx => run::<Onnx>(&args, registry),
    }
}

fn run<F: Framework>(args: &Args, registry: Arc<OpDescriptorRegistry>) -> Result<(), AppError>
where
    F::Tensor: prost::Message + Default,
{
    if args.list {
        let catalog = registry.catalog_for(F::NAME)?;
        println!("{} ops known to {}:", catalog.len(), F::NAME);
        for name in catalog.op_names() {
            println!("  {}", name);
        }
    }

    if let Some(mapping) = &args.mapping {
        print_classification::<F>(mapping, &args.name, registry)?;
    }

    if let Some(path) = &args.tensor {
        let tensor: F::Tensor = read_proto(path)?;
        let converted = F::convert_tensor(&tensor)?;
        let data = TensorData::try_from(&converted)?;
        println!(
            "Tensor {:?}: dtype {:?}, shape {:?}, {} elements",
            path,
            converted.dtype()?,
            data.shape(),
            data.len()
        );
    }

    Ok(())
}

fn print_classification<F: Framework>(
    mapping: &OpPair,
    names: &[String],
    registry: Arc<OpDescriptorRegistry>,
) -> Result<(), AppError> {
    let mut rule = NDArrayMappingRule::<F>::new(Vec::<(String, String)>::new());
    rule.bind(MappingProcess::new(
        registry,
        F::NAME,
        mapping.source.clone(),
        mapping.canonical.clone(),
    ))?;

    println!("{}:{} -> {}", F::NAME, mapping.source, mapping.canonical);
    for name in names {
        println!(
            "  {}: input tensor name {}, output tensor name {}",
            name,
            rule.is_input_tensor_name(name)?,
            rule.is_output_tensor_name(name)?
        );
    }
    Ok(())
}
