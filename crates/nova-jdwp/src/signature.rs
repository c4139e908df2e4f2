//! JVM type descriptors (`I`, `Ljava/lang/String;`, `[J`).

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            b'Z' => Self::Boolean,
            b'B' => Self::Byte,
            b'C' => Self::Char,
            b'S' => Self::Short,
            b'I' => Self::Int,
            b'J' => Self::Long,
            b'F' => Self::Float,
            b'D' => Self::Double,
            _ => return None,
        })
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "char" => Self::Char,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            _ => return None,
        })
    }

    pub fn tag(self) -> char {
        match self {
            Self::Boolean => 'Z',
            Self::Byte => 'B',
            Self::Char => 'C',
            Self::Short => 'S',
            Self::Int => 'I',
            Self::Long => 'J',
            Self::Float => 'F',
            Self::Double => 'D',
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// `java.lang` wrapper class used when the value is boxed.
    pub fn boxed_type_name(self) -> &'static str {
        match self {
            Self::Boolean => "java.lang.Boolean",
            Self::Byte => "java.lang.Byte",
            Self::Char => "java.lang.Character",
            Self::Short => "java.lang.Short",
            Self::Int => "java.lang.Integer",
            Self::Long => "java.lang.Long",
            Self::Float => "java.lang.Float",
            Self::Double => "java.lang.Double",
        }
    }

    pub fn from_boxed_type_name(type_name: &str) -> Option<Self> {
        Some(match type_name {
            "java.lang.Boolean" => Self::Boolean,
            "java.lang.Byte" => Self::Byte,
            "java.lang.Character" => Self::Char,
            "java.lang.Short" => Self::Short,
            "java.lang.Integer" => Self::Int,
            "java.lang.Long" => Self::Long,
            "java.lang.Float" => Self::Float,
            "java.lang.Double" => Self::Double,
            _ => return None,
        })
    }
}

/// A JVM field type, as written in descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JvmType {
    Void,
    Primitive(PrimitiveType),
    /// Binary class name with dots (`java.lang.String`, `Foo$Bar`).
    Object(String),
    Array(Box<JvmType>),
}

impl JvmType {
    pub const OBJECT_TYPE_NAME: &'static str = "java.lang.Object";

    pub fn object(type_name: impl Into<String>) -> Self {
        Self::Object(type_name.into())
    }

    pub fn java_object() -> Self {
        Self::Object(Self::OBJECT_TYPE_NAME.to_string())
    }

    /// Parses a single field descriptor. Returns `None` for malformed input or trailing garbage.
    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        let (ty, rest) = Self::parse_prefix(descriptor)?;
        rest.is_empty().then_some(ty)
    }

    fn parse_prefix(descriptor: &str) -> Option<(Self, &str)> {
        let mut chars = descriptor.chars();
        let first = chars.next()?;
        let rest = chars.as_str();
        match first {
            'V' => Some((Self::Void, rest)),
            '[' => {
                let (element, rest) = Self::parse_prefix(rest)?;
                Some((Self::Array(Box::new(element)), rest))
            }
            'L' => {
                let end = rest.find(';')?;
                let class = &rest[..end];
                if class.is_empty() {
                    return None;
                }
                Some((Self::Object(class.replace('/', ".")), &rest[end + 1..]))
            }
            tag => u8::try_from(tag)
                .ok()
                .and_then(PrimitiveType::from_tag)
                .map(|p| (Self::Primitive(p), rest)),
        }
    }

    /// Parses a Java type name (`int`, `java.lang.String`, `int[][]`).
    pub fn from_type_name(type_name: &str) -> Self {
        if let Some(element) = type_name.strip_suffix("[]") {
            return Self::Array(Box::new(Self::from_type_name(element)));
        }
        if type_name == "void" {
            return Self::Void;
        }
        match PrimitiveType::from_keyword(type_name) {
            Some(p) => Self::Primitive(p),
            None => Self::Object(type_name.to_string()),
        }
    }

    pub fn descriptor(&self) -> String {
        match self {
            Self::Void => "V".to_string(),
            Self::Primitive(p) => p.tag().to_string(),
            Self::Object(name) => format!("L{};", name.replace('.', "/")),
            Self::Array(element) => format!("[{}", element.descriptor()),
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Self::Void => "void".to_string(),
            Self::Primitive(p) => p.keyword().to_string(),
            Self::Object(name) => name.clone(),
            Self::Array(element) => format!("{}[]", element.type_name()),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Array(_))
    }

    pub fn is_java_object(&self) -> bool {
        matches!(self, Self::Object(name) if name == Self::OBJECT_TYPE_NAME)
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            Self::Primitive(p) => Some(*p),
            _ => None,
        }
    }
}

impl fmt::Display for JvmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// A method descriptor such as `(ILkotlin/coroutines/Continuation;)Ljava/lang/Object;`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub parameters: Vec<JvmType>,
    pub return_type: JvmType,
}

impl MethodDescriptor {
    /// Returns `None` for malformed descriptors, including `void` parameters.
    pub fn parse(signature: &str) -> Option<Self> {
        let mut rest = signature.strip_prefix('(')?;
        let mut parameters = Vec::new();
        loop {
            if let Some(after) = rest.strip_prefix(')') {
                let return_type = JvmType::from_descriptor(after)?;
                return Some(Self {
                    parameters,
                    return_type,
                });
            }
            let (ty, after) = JvmType::parse_prefix(rest)?;
            if ty == JvmType::Void {
                return None;
            }
            parameters.push(ty);
            rest = after;
        }
    }
}
