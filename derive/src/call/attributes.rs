use std::str::FromStr;

use syn::{
    parse::{
        Parse,
        ParseStream,
    },
    punctuated::Punctuated,
    Attribute,
    Ident,
    LitStr,
    Token,
};

#[derive(Clone, Copy)]
enum TargetKey {
    Module,
    Function,
}

impl FromStr for TargetKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "module" => Ok(Self::Module),
            "function" => Ok(Self::Function),
            _ => Err(()),
        }
    }
}

impl TryFrom<&Ident> for TargetKey {
    type Error = ();

    fn try_from(value: &Ident) -> Result<Self, Self::Error> { Self::from_str(&value.to_string()) }
}


struct TargetAttr {
    key: TargetKey,
    id: Ident,
    _eq: Token![=],
    value: LitStr,
}

impl Parse for TargetAttr {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let id: Ident = input.parse()?;
        let key = TargetKey::try_from(&id).map_err(|_| syn::Error::new(id.span(), "Invalid key; expected `module` or `function`"))?;

        Ok(TargetAttr {
            key,
            id,
            _eq: input.parse()?,
            value: input.parse()?,
        })
    }
}


pub(super) struct CallTarget {
    pub module: LitStr,
    pub function: LitStr,
}

pub(super) fn parse(target: &Ident, attrs: &[Attribute]) -> syn::Result<CallTarget> {
    let items = attrs
        .iter()
        .filter(|a| a.path.is_ident("move_call"))
        .map(|a| a.parse_args_with(Punctuated::<TargetAttr, Token![,]>::parse_terminated))
        .try_fold(Vec::new(), |mut v, pr| pr.map(|x| v.extend(x)).and(Ok(v)))?;

    let mut module = None;
    let mut function = None;
    for TargetAttr { key, id, value, .. } in items {
        let slot = match key {
            TargetKey::Module => &mut module,
            TargetKey::Function => &mut function,
        };
        if slot.replace(value).is_some() {
            return Err(syn::Error::new(id.span(), "Duplicate key"));
        }
    }

    match (module, function) {
        (Some(module), Some(function)) => Ok(CallTarget { module, function }),
        (None, _) => Err(syn::Error::new(target.span(), r#"missing `#[move_call(module = "...")]`"#)),
        (_, None) => Err(syn::Error::new(target.span(), r#"missing `#[move_call(function = "...")]`"#)),
    }
}
