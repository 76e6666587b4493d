use super::{DataType, TensorProto};

/// Kind of a canonical op argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ArgType {
    Float = 0,
    Double = 1,
    Int32 = 2,
    Int64 = 3,
    Bool = 4,
    DataType = 5,
    InputTensor = 6,
    OutputTensor = 7,
    String = 8,
}

impl ArgType {
    pub fn is_tensor(&self) -> bool {
        matches!(self, ArgType::InputTensor | ArgType::OutputTensor)
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArgDescriptor {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(enumeration = "ArgType", tag = "2")]
    pub arg_type: i32,
    #[prost(int32, tag = "3")]
    pub arg_index: i32,
    #[prost(oneof = "arg_descriptor::Value", tags = "4, 5, 6, 7, 8, 9, 10")]
    pub value: Option<arg_descriptor::Value>,
    #[prost(bool, tag = "11")]
    pub convert_bool_to_int: bool,
}

pub mod arg_descriptor {
    /// Payload carried by an argument once an op has been mapped.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(int64, tag = "4")]
        Int64Value(i64),
        #[prost(double, tag = "5")]
        DoubleValue(f64),
        #[prost(bool, tag = "6")]
        BoolValue(bool),
        #[prost(string, tag = "7")]
        StringValue(String),
        #[prost(message, tag = "8")]
        InputValue(super::TensorProto),
        #[prost(message, tag = "9")]
        OutputValue(super::TensorProto),
        #[prost(enumeration = "super::DataType", tag = "10")]
        DataTypeValue(i32),
    }
}

impl ArgDescriptor {
    /// Creates a descriptor without a value, as found in op catalogs.
    pub fn new(name: impl Into<String>, arg_type: ArgType, arg_index: i32) -> Self {
        ArgDescriptor {
            name: name.into(),
            arg_type: arg_type as i32,
            arg_index,
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: arg_descriptor::Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn input_tensor(name: impl Into<String>, arg_index: i32, tensor: TensorProto) -> Self {
        Self::new(name, ArgType::InputTensor, arg_index)
            .with_value(arg_descriptor::Value::InputValue(tensor))
    }

    pub fn data_type(name: impl Into<String>, arg_index: i32, data_type: DataType) -> Self {
        Self::new(name, ArgType::DataType, arg_index)
            .with_value(arg_descriptor::Value::DataTypeValue(data_type as i32))
    }

    /// The argument kind, or `None` when the stored tag is unknown.
    pub fn kind(&self) -> Option<ArgType> {
        ArgType::try_from(self.arg_type).ok()
    }

    pub fn is_kind(&self, arg_type: ArgType) -> bool {
        self.kind() == Some(arg_type)
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OpDescriptor {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub arg_descriptor: Vec<ArgDescriptor>,
}

impl OpDescriptor {
    pub fn new(name: impl Into<String>, arg_descriptor: Vec<ArgDescriptor>) -> Self {
        OpDescriptor {
            name: name.into(),
            arg_descriptor,
        }
    }

    /// Arguments of the given kind, in declaration order.
    pub fn args_of_kind(&self, arg_type: ArgType) -> impl Iterator<Item = &ArgDescriptor> {
        self.arg_descriptor
            .iter()
            .filter(move |arg| arg.is_kind(arg_type))
    }

    pub fn arg_names_of_kind(&self, arg_type: ArgType) -> Vec<&str> {
        self.args_of_kind(arg_type)
            .map(|arg| arg.name.as_str())
            .collect()
    }

    /// Finds the first argument called `name` whose kind satisfies `accept`.
    pub fn find_arg<P>(&self, name: &str, accept: P) -> Option<&ArgDescriptor>
    where
        P: Fn(ArgType) -> bool,
    {
        self.arg_descriptor
            .iter()
            .find(|arg| arg.name == name && arg.kind().is_some_and(&accept))
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OpDescriptorList {
    #[prost(message, repeated, tag = "1")]
    pub op_list: Vec<OpDescriptor>,
}

impl OpDescriptorList {
    pub fn new(op_list: Vec<OpDescriptor>) -> Self {
        OpDescriptorList { op_list }
    }
}
