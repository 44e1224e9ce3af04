use syn::{
    punctuated::Punctuated,
    spanned::Spanned,
    token,
    Attribute,
    Field,
    Ident,
    Result,
};

#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) enum Role {
    Pure,
    Object { mutable: bool },
    TypeArg,
    Coin,
}

pub(super) struct CallField<'f> {
    pub ident: &'f Ident,
    pub role: Role,
}

pub(super) fn process(fields: &Punctuated<Field, token::Comma>) -> Result<Vec<CallField<'_>>> {
    fields
        .iter()
        .map(|field| {
            let mut tagged: Option<(Role, &Attribute)> = None;
            for attr in &field.attrs {
                let Some(role) = role_of(attr)? else { continue };
                if let Some((_, prev)) = tagged.replace((role, attr)) {
                    const MSG: &str = "Only one of `object`, `type_arg`, or `coin` allowed on a single field";
                    let mut e = syn::Error::new(attr.span(), MSG);
                    e.combine(syn::Error::new(prev.span(), MSG));
                    return Err(e);
                }
            }

            let ident = field
                .ident
                .as_ref()
                .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
            Ok(CallField {
                ident,
                role: tagged.map_or(Role::Pure, |(role, _)| role),
            })
        })
        .collect()
}

fn role_of(attr: &Attribute) -> Result<Option<Role>> {
    let Some(id) = attr.path.get_ident() else { return Ok(None) };
    let no_args = |role| {
        if attr.tokens.is_empty() {
            Ok(Some(role))
        } else {
            Err(syn::Error::new(attr.tokens.span(), format!("`{id}` takes no arguments")))
        }
    };

    match id.to_string().as_str() {
        "object" if attr.tokens.is_empty() => Ok(Some(Role::Object { mutable: true })),
        "object" => {
            let flag: Ident = attr.parse_args()?;
            if flag == "read_only" {
                Ok(Some(Role::Object { mutable: false }))
            } else {
                Err(syn::Error::new(flag.span(), "Invalid flag; expected `read_only`"))
            }
        },
        "type_arg" => no_args(Role::TypeArg),
        "coin" => no_args(Role::Coin),
        "move_call" => Err(syn::Error::new(attr.span(), "Not allowed on fields. Must be placed on outer struct")),
        _ => Ok(None),
    }
}
