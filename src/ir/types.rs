//! Type system for values flowing through initializer functions.

/// Element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F16,
    F32,
    F64,
    I8,
    I32,
    I64,
    Bool,
    /// Variable-length byte string (checkpoint paths, tensor names).
    Str,
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DType::F16 => "f16",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::I8 => "i8",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::Bool => "bool",
            DType::Str => "str",
        };
        f.write_str(s)
    }
}

/// A single tensor dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dim {
    Fixed(u64),
    Symbolic(String),
    /// Unknown at compile time; printed as `?`.
    Dynamic,
}

impl std::fmt::Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dim::Fixed(n) => write!(f, "{}", n),
            Dim::Symbolic(s) => f.write_str(s),
            Dim::Dynamic => f.write_str("?"),
        }
    }
}

/// Ordered list of dimensions. An empty shape is a scalar (rank 0).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(pub Vec<Dim>);

impl Shape {
    pub fn scalar() -> Self {
        Shape(Vec::new())
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total element count, if every dimension is fixed.
    pub fn num_elements(&self) -> Option<u64> {
        self.0.iter().try_fold(1u64, |acc, d| match d {
            Dim::Fixed(n) => Some(acc * n),
            _ => None,
        })
    }
}

/// The type of an SSA value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Tensor { dtype: DType, shape: Shape },
    /// Handle to a mutable variable holding a value of the inner type.
    Resource(Box<IrType>),
}

impl IrType {
    /// A rank-0 tensor of `dtype`.
    pub fn scalar(dtype: DType) -> Self {
        IrType::Tensor {
            dtype,
            shape: Shape::scalar(),
        }
    }

    /// A 1-D tensor of `len` elements.
    pub fn vector(dtype: DType, len: u64) -> Self {
        IrType::Tensor {
            dtype,
            shape: Shape(vec![Dim::Fixed(len)]),
        }
    }

    pub fn tensor(dtype: DType, dims: &[u64]) -> Self {
        IrType::Tensor {
            dtype,
            shape: Shape(dims.iter().map(|&d| Dim::Fixed(d)).collect()),
        }
    }

    pub fn resource(content: IrType) -> Self {
        IrType::Resource(Box::new(content))
    }

    /// For `resource<T>`, returns `T`.
    pub fn resource_subtype(&self) -> Option<&IrType> {
        match self {
            IrType::Resource(inner) => Some(inner),
            IrType::Tensor { .. } => None,
        }
    }

    pub fn dtype(&self) -> Option<DType> {
        match self {
            IrType::Tensor { dtype, .. } => Some(*dtype),
            IrType::Resource(_) => None,
        }
    }

    pub fn shape(&self) -> Option<&Shape> {
        match self {
            IrType::Tensor { shape, .. } => Some(shape),
            IrType::Resource(_) => None,
        }
    }
}

impl std::fmt::Display for IrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrType::Tensor { dtype, shape } => {
                write!(f, "tensor<")?;
                for dim in &shape.0 {
                    write!(f, "{}x", dim)?;
                }
                write!(f, "{}>", dtype)
            }
            IrType::Resource(inner) => write!(f, "resource<{}>", inner),
        }
    }
}
