use std::{
    fmt,
    str::FromStr,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::Address;

/// Move type tag, variant order matches the on-chain BCS layout
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
    U16,
    U32,
    U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructTag {
    pub address: Address,
    pub module: String,
    pub name: String,
    pub type_params: Vec<TypeTag>,
}

impl TypeTag {
    pub fn as_struct(&self) -> Option<&StructTag> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }
}

impl StructTag {
    /// `true` if this is `module::name` regardless of package or type parameters
    pub fn is(&self, module: &str, name: &str) -> bool { self.module == module && self.name == name }
}

impl From<StructTag> for TypeTag {
    fn from(value: StructTag) -> Self { Self::Struct(Box::new(value)) }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::U8 => f.write_str("u8"),
            Self::U16 => f.write_str("u16"),
            Self::U32 => f.write_str("u32"),
            Self::U64 => f.write_str("u64"),
            Self::U128 => f.write_str("u128"),
            Self::U256 => f.write_str("u256"),
            Self::Address => f.write_str("address"),
            Self::Signer => f.write_str("signer"),
            Self::Vector(inner) => write!(f, "vector<{inner}>"),
            Self::Struct(s) => s.fmt(f),
        }
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if let Some((first, rest)) = self.type_params.split_first() {
            write!(f, "<{first}")?;
            rest.iter().try_for_each(|t| write!(f, ", {t}"))?;
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeTag {
    type Err = TypeTagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { input: s, rest: s };
        let tag = parser.parse_type()?;
        parser.skip_ws();
        if parser.rest.is_empty() {
            Ok(tag)
        } else {
            Err(parser.error())
        }
    }
}

impl FromStr for StructTag {
    type Err = TypeTagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse()? {
            TypeTag::Struct(tag) => Ok(*tag),
            _ => Err(TypeTagParseError(s.to_owned())),
        }
    }
}

/// Splits `pkg::module::Name<A, B>` into its two type parameters
pub fn split_type_params(type_str: &str) -> Option<(TypeTag, TypeTag)> {
    let tag: StructTag = type_str.parse().ok()?;
    match <[TypeTag; 2]>::try_from(tag.type_params) {
        Ok([a, b]) => Some((a, b)),
        Err(_) => None,
    }
}


struct Parser<'a> {
    input: &'a str,
    rest: &'a str,
}

impl<'a> Parser<'a> {
    fn error(&self) -> TypeTagParseError { TypeTagParseError(self.input.to_owned()) }

    fn skip_ws(&mut self) { self.rest = self.rest.trim_start(); }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                true
            },
            None => false,
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), TypeTagParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn ident(&mut self) -> Result<&'a str, TypeTagParseError> {
        self.skip_ws();
        let end = self
            .rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(self.error());
        }
        let (word, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(word)
    }

    fn parse_type(&mut self) -> Result<TypeTag, TypeTagParseError> {
        Ok(match self.ident()? {
            "bool" => TypeTag::Bool,
            "u8" => TypeTag::U8,
            "u16" => TypeTag::U16,
            "u32" => TypeTag::U32,
            "u64" => TypeTag::U64,
            "u128" => TypeTag::U128,
            "u256" => TypeTag::U256,
            "address" => TypeTag::Address,
            "signer" => TypeTag::Signer,
            "vector" => {
                self.expect("<")?;
                let inner = self.parse_type()?;
                self.expect(">")?;
                TypeTag::Vector(Box::new(inner))
            },
            addr => {
                let address = addr.parse().map_err(|_| self.error())?;
                self.expect("::")?;
                let module = self.ident()?.to_owned();
                self.expect("::")?;
                let name = self.ident()?.to_owned();
                let mut type_params = Vec::new();
                if self.eat("<") {
                    loop {
                        type_params.push(self.parse_type()?);
                        if !self.eat(",") {
                            break;
                        }
                    }
                    self.expect(">")?;
                }
                StructTag {
                    address,
                    module,
                    name,
                    type_params,
                }
                .into()
            },
        })
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTagParseError(String);

impl fmt::Display for TypeTagParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Invalid type: {}", self.0) }
}

impl std::error::Error for TypeTagParseError {}
