use convert_case::Case;
use convert_case::Casing;
use darling::FromDeriveInput;
use darling::FromField;
use proc_macro2::Ident;
use proc_macro2::TokenStream as TokenStream2;
use quote::format_ident;
use quote::quote;
use syn::DeriveInput;
use syn::Type;

#[derive(Debug, FromField)]
#[darling(attributes(tsqlorm))]
struct FieldReceiver {
    pub ident: Option<Ident>,
    pub ty:    Type,

    #[darling(default)]
    pub primary_key: bool,

    #[darling(default)]
    pub auto_increment: bool,

    #[darling(default)]
    pub column_name: Option<String>,

    #[darling(default)]
    pub foreign_key: bool,

    #[darling(default)]
    pub many_to_many: bool,

    #[darling(default)]
    pub junction: Option<syn::Path>,
}

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(tsqlorm), supports(struct_named))]
struct TableReceiver {
    pub ident: Ident,
    pub data:  darling::ast::Data<(), FieldReceiver>,

    #[darling(default)]
    pub table_name: Option<String>,

    #[darling(default)]
    pub schema: Option<String>,
}

#[derive(Debug)]
enum FieldKind {
    Scalar { column_type: TokenStream2, nullable: bool },
    ForeignKey { target: Type },
    ManyToMany { target: Type, junction: syn::Path },
}

#[derive(Debug)]
struct FieldInfo {
    pub field_name:        Ident,
    pub variant_name:      Ident,
    pub column_name:       String,
    pub field_type:        Type,
    pub is_primary_key:    bool,
    pub is_auto_increment: bool,
    pub kind:              FieldKind,
}

impl FieldInfo {
    fn is_nullable(&self) -> bool {
        match &self.kind {
            FieldKind::Scalar { nullable, .. } => *nullable && !self.is_primary_key,
            FieldKind::ForeignKey { .. } => !self.is_primary_key,
            FieldKind::ManyToMany { .. } => false,
        }
    }

    fn column_type(&self) -> TokenStream2 {
        match &self.kind {
            FieldKind::Scalar { column_type, .. } => column_type.clone(),
            FieldKind::ForeignKey { .. } => quote! { tsqlorm::ColumnType::Integer },
            FieldKind::ManyToMany { .. } => quote! { tsqlorm::ColumnType::Null },
        }
    }
}

#[derive(Debug)]
struct TableInfo {
    pub struct_name: Ident,
    pub table_name:  String,
    pub schema:      Option<String>,
    pub fields:      Vec<FieldInfo>,
}

impl FieldReceiver {
    pub fn to_field_info(self) -> darling::Result<FieldInfo> {
        let field_name = self.ident.ok_or_else(|| darling::Error::custom("Expected named field"))?;
        let variant_name = format_ident!("{}", field_name.to_string().to_case(Case::Pascal));
        let column_name = self.column_name.unwrap_or_else(|| field_name.to_string());

        let kind = if self.many_to_many {
            let junction = self.junction.ok_or_else(|| {
                darling::Error::custom("many_to_many requires a junction attribute").with_span(&field_name)
            })?;
            let target = extract_generic_inner_type(&self.ty, "Vec")
                .ok_or_else(|| darling::Error::custom("many_to_many field must be a Vec<T>").with_span(&self.ty))?;
            if self.primary_key || self.foreign_key {
                return Err(darling::Error::custom("many_to_many cannot be combined with primary_key or foreign_key")
                    .with_span(&field_name));
            }
            FieldKind::ManyToMany { target: target.clone(), junction }
        } else if self.foreign_key {
            let target = extract_generic_inner_type(&self.ty, "Option")
                .ok_or_else(|| darling::Error::custom("foreign_key field must be an Option<T>").with_span(&self.ty))?;
            FieldKind::ForeignKey { target: target.clone() }
        } else {
            let nullable = extract_generic_inner_type(&self.ty, "Option").is_some();
            FieldKind::Scalar { column_type: rust_type_to_column_type(&self.ty), nullable }
        };

        if self.auto_increment && !self.primary_key {
            return Err(darling::Error::custom("auto_increment requires primary_key").with_span(&field_name));
        }

        Ok(FieldInfo {
            field_name,
            variant_name,
            column_name,
            field_type: self.ty,
            is_primary_key: self.primary_key,
            is_auto_increment: self.auto_increment,
            kind,
        })
    }
}

impl TableReceiver {
    pub fn to_table_info(self) -> darling::Result<TableInfo> {
        let table_name = self.table_name.unwrap_or_else(|| self.ident.to_string());

        let fields = self.data.take_struct().ok_or_else(|| darling::Error::custom("Expected struct"))?.fields;

        let mut errors = darling::Error::accumulator();
        let fields: Vec<FieldInfo> = fields.into_iter().filter_map(|f| errors.handle(f.to_field_info())).collect();
        errors.finish()?;

        Ok(TableInfo { struct_name: self.ident, table_name, schema: self.schema, fields })
    }
}

#[proc_macro_derive(Table, attributes(tsqlorm))]
pub fn derive_table(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    let table_info = match TableReceiver::from_derive_input(&input).and_then(TableReceiver::to_table_info) {
        Ok(info) => info,
        Err(e) => return e.write_errors().into(),
    };

    let expanded = impl_table(&table_info);
    proc_macro::TokenStream::from(expanded)
}

fn impl_table(table_info: &TableInfo) -> TokenStream2 {
    let name = &table_info.struct_name;
    let type_name = name.to_string();
    let column_enum_name = format_ident!("{}Column", name);
    let table_name = &table_info.table_name;

    let column_variants: Vec<_> = table_info.fields.iter().map(|f| &f.variant_name).collect();

    let property_arms = variant_arms(&table_info.fields, |f| {
        let property = f.field_name.to_string();
        quote! { #property }
    });
    let column_name_arms = variant_arms(&table_info.fields, |f| {
        let column = &f.column_name;
        quote! { #column }
    });
    let column_type_arms = variant_arms(&table_info.fields, |f| f.column_type());
    let is_nullable_arms = variant_arms(&table_info.fields, |f| {
        let nullable = f.is_nullable();
        quote! { #nullable }
    });
    let is_primary_key_arms = variant_arms(&table_info.fields, |f| {
        let pk = f.is_primary_key;
        quote! { #pk }
    });
    let is_auto_increment_arms = variant_arms(&table_info.fields, |f| {
        let auto = f.is_auto_increment;
        quote! { #auto }
    });
    let is_foreign_key_arms = variant_arms(&table_info.fields, |f| {
        let fk = matches!(f.kind, FieldKind::ForeignKey { .. });
        quote! { #fk }
    });
    let is_many_to_many_arms = variant_arms(&table_info.fields, |f| {
        let m2m = matches!(f.kind, FieldKind::ManyToMany { .. });
        quote! { #m2m }
    });

    let definition_parts: Vec<_> = table_info
        .fields
        .iter()
        .map(|f| {
            let property = f.field_name.to_string();
            match &f.kind {
                FieldKind::ManyToMany { target, junction } => quote! {
                    .many_to_many(tsqlorm::ManyToManyDefinition::new(
                        #property,
                        tsqlorm::RelationTarget::of::<#junction>(),
                        tsqlorm::RelationTarget::of::<#target>(),
                    ))
                },
                kind => {
                    let column = &f.column_name;
                    let column_type = f.column_type();
                    let nullable = f.is_nullable();
                    let primary_key = f.is_primary_key;
                    let auto_increment = f.is_auto_increment;
                    let references = match kind {
                        FieldKind::ForeignKey { target } => {
                            quote! { .references(tsqlorm::RelationTarget::of::<#target>()) }
                        }
                        _ => quote! {},
                    };
                    quote! {
                        .field(
                            tsqlorm::FieldDefinition::new(#property, #column, #column_type)
                                .nullable(#nullable)
                                .primary_key(#primary_key)
                                .auto_increment(#auto_increment)
                                #references
                        )
                    }
                }
            }
        })
        .collect();

    let with_schema = match &table_info.schema {
        Some(schema) => quote! { .with_schema(#schema) },
        None => quote! {},
    };

    let from_entity_fields: Vec<_> = table_info
        .fields
        .iter()
        .map(|f| {
            let field_name = &f.field_name;
            let property = field_name.to_string();
            let field_type = &f.field_type;
            match &f.kind {
                FieldKind::Scalar { .. } => quote! {
                    #field_name: tsqlorm::read_value::<#field_type>(entity, #property)?
                },
                FieldKind::ForeignKey { target } => quote! {
                    #field_name: tsqlorm::read_reference::<#target>(entity, #property)?
                },
                FieldKind::ManyToMany { target, .. } => quote! {
                    #field_name: tsqlorm::read_related::<#target>(entity, #property)?
                },
            }
        })
        .collect();

    quote! {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum #column_enum_name {
            #(#column_variants),*
        }

        impl tsqlorm::ColumnTrait for #column_enum_name {
            fn property(&self) -> &'static str {
                match self {
                    #(#property_arms),*
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    #(#column_name_arms),*
                }
            }

            fn column_type(&self) -> tsqlorm::ColumnType {
                match self {
                    #(#column_type_arms),*
                }
            }

            fn is_nullable(&self) -> bool {
                match self {
                    #(#is_nullable_arms),*
                }
            }

            fn is_primary_key(&self) -> bool {
                match self {
                    #(#is_primary_key_arms),*
                }
            }

            fn is_auto_increment(&self) -> bool {
                match self {
                    #(#is_auto_increment_arms),*
                }
            }

            fn is_foreign_key(&self) -> bool {
                match self {
                    #(#is_foreign_key_arms),*
                }
            }

            fn is_many_to_many(&self) -> bool {
                match self {
                    #(#is_many_to_many_arms),*
                }
            }

            fn all() -> &'static [Self] {
                &[#(Self::#column_variants),*]
            }
        }

        impl std::fmt::Display for #column_enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", tsqlorm::ColumnTrait::name(self))
            }
        }

        impl From<#column_enum_name> for tsqlorm::Expr {
            fn from(column: #column_enum_name) -> Self {
                tsqlorm::Expr::col(tsqlorm::ColumnTrait::property(&column))
            }
        }

        impl tsqlorm::Table for #name {
            type Column = #column_enum_name;

            fn definition() -> tsqlorm::TableDefinition {
                tsqlorm::TableDefinition::new::<Self>(#type_name, #table_name)
                    #with_schema
                    #(#definition_parts)*
            }
        }

        impl tsqlorm::FromEntity for #name {
            fn from_entity(entity: &tsqlorm::Entity) -> tsqlorm::Result<Self> {
                Ok(Self {
                    #(#from_entity_fields),*
                })
            }
        }
    }
}

fn variant_arms(fields: &[FieldInfo], value: impl Fn(&FieldInfo) -> TokenStream2) -> Vec<TokenStream2> {
    fields
        .iter()
        .map(|f| {
            let variant_name = &f.variant_name;
            let value = value(f);
            quote! { Self::#variant_name => #value }
        })
        .collect()
}

fn rust_type_to_column_type(ty: &Type) -> TokenStream2 {
    let inner_type = extract_generic_inner_type(ty, "Option").unwrap_or(ty);

    let Type::Path(type_path) = inner_type else {
        return quote! { tsqlorm::ColumnType::Text };
    };
    let Some(segment) = type_path.path.segments.last() else {
        return quote! { tsqlorm::ColumnType::Text };
    };

    match segment.ident.to_string().as_str() {
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" => quote! { tsqlorm::ColumnType::Integer },
        "f32" | "f64" => quote! { tsqlorm::ColumnType::Float },
        "String" | "str" | "Uuid" => quote! { tsqlorm::ColumnType::Text },
        "bool" => quote! { tsqlorm::ColumnType::Boolean },
        "NaiveDateTime" | "NaiveDate" | "DateTime" => quote! { tsqlorm::ColumnType::DateTime },
        "Vec" if is_byte_vec(inner_type) => quote! { tsqlorm::ColumnType::Blob },
        _ => quote! { tsqlorm::ColumnType::Text },
    }
}

fn is_byte_vec(ty: &Type) -> bool {
    matches!(
        extract_generic_inner_type(ty, "Vec"),
        Some(Type::Path(inner)) if inner.path.segments.last().is_some_and(|s| s.ident == "u8")
    )
}

fn extract_generic_inner_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else { return None };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else { return None };
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
