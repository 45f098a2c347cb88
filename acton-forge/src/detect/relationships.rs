//! Relationship accessor detection
//!
//! An accessor is a method of an inherent `impl Entity` block that
//!
//! - is `pub`, takes only `&self`, has no generics, and does not start with `_`
//! - returns one of `BelongsTo<R>`, `HasOne<R>`, `HasMany<R>`,
//!   `BelongsToMany<R>`, `MorphTo`, `MorphOne<R>`, `MorphMany<R>`,
//!   `MorphToMany<R>`
//! - has a body whose value is a matching relationship call on `self`,
//!   e.g. `self.belongs_to::<Customer>("customer_id")`, optionally followed by
//!   chained calls
//!
//! String arguments of the call override the conventional keys.

use syn::{Expr, ExprMethodCall, FnArg, GenericArgument, ImplItem, ImplItemFn, Lit, ReturnType, Stmt, Visibility};
use tracing::debug;

use super::source::{first_type_argument, last_ident, SourceFile};
use super::{MorphKeys, PivotKeys, RelationshipDescriptor, RelationshipKind};
use crate::naming::Naming;

/// Relationship declared by one accessor, before the related entity is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    /// Method name
    pub method: String,
    /// Relationship kind
    pub kind: RelationshipKind,
    /// Related type as written, `None` for `MorphTo`
    pub related: Option<String>,
    /// String arguments of the relationship call, in order
    pub arguments: Vec<String>,
}

/// Eligible relationship accessors of `entity`
#[must_use]
pub fn accessors(source: &SourceFile, entity: &str) -> Vec<Accessor> {
    source
        .inherent_impls(entity)
        .flat_map(|item| item.items.iter())
        .filter_map(|item| match item {
            ImplItem::Fn(function) => accessor(function),
            _ => None,
        })
        .collect()
}

fn accessor(function: &ImplItemFn) -> Option<Accessor> {
    let signature = &function.sig;
    let method = signature.ident.to_string();

    if !matches!(function.vis, Visibility::Public(_))
        || method.starts_with('_')
        || !signature.generics.params.is_empty()
        || signature.inputs.len() != 1
    {
        return None;
    }
    let Some(FnArg::Receiver(receiver)) = signature.inputs.first() else {
        return None;
    };
    if receiver.reference.is_none() || receiver.mutability.is_some() {
        return None;
    }

    let ReturnType::Type(_, return_type) = &signature.output else {
        return None;
    };
    let kind = RelationshipKind::from_type_name(&last_ident(return_type)?)?;
    let declared_related = first_type_argument(return_type).and_then(last_ident);

    let Some(call) = relationship_call(function) else {
        debug!(method = %method, "Relationship accessor without a recognizable call, skipping");
        return None;
    };
    if call.method != kind.call_name() {
        debug!(method = %method, call = %call.method, "Relationship call does not match return type");
        return None;
    }

    let related = if kind == RelationshipKind::MorphTo {
        None
    } else {
        Some(call.turbofish.or(declared_related)?)
    };

    Some(Accessor {
        method,
        kind,
        related,
        arguments: call.arguments,
    })
}

struct RelationshipCall {
    method: String,
    turbofish: Option<String>,
    arguments: Vec<String>,
}

/// The call on `self` that produces the accessor's value
fn relationship_call(function: &ImplItemFn) -> Option<RelationshipCall> {
    let value = function.block.stmts.iter().rev().find_map(|stmt| match stmt {
        Stmt::Expr(expr, None) => Some(expr),
        Stmt::Expr(Expr::Return(ret), _) => ret.expr.as_deref(),
        _ => None,
    })?;

    let mut current = value;
    loop {
        match current {
            Expr::MethodCall(call) if is_self(&call.receiver) => return Some(describe(call)),
            Expr::MethodCall(call) => current = &*call.receiver,
            Expr::Paren(paren) => current = &*paren.expr,
            Expr::Return(ret) => current = ret.expr.as_deref()?,
            _ => return None,
        }
    }
}

fn is_self(expr: &Expr) -> bool {
    matches!(expr, Expr::Path(path) if path.path.is_ident("self"))
}

fn describe(call: &ExprMethodCall) -> RelationshipCall {
    let turbofish = call.turbofish.as_ref().and_then(|generics| {
        generics.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => last_ident(ty),
            _ => None,
        })
    });

    let arguments = call
        .args
        .iter()
        .filter_map(|arg| match arg {
            Expr::Lit(lit) => match &lit.lit {
                Lit::Str(text) => Some(text.value()),
                _ => None,
            },
            _ => None,
        })
        .collect();

    RelationshipCall {
        method: call.method.to_string(),
        turbofish,
        arguments,
    }
}

/// Apply conventional keys to an accessor
///
/// `related` is the resolved related entity name (`None` for `MorphTo`).
#[must_use]
pub fn describe_accessor(
    entity: &str,
    accessor: &Accessor,
    related: Option<String>,
    related_folder: Option<String>,
) -> RelationshipDescriptor {
    let arg = |index: usize| accessor.arguments.get(index).cloned();
    let entity_key = Naming::to_foreign_key(entity);
    let related_name = related.clone().unwrap_or_default();

    let (foreign_key, pivot, morph) = match accessor.kind {
        RelationshipKind::BelongsTo => (
            arg(0).unwrap_or_else(|| Naming::to_foreign_key(&accessor.method)),
            None,
            None,
        ),
        RelationshipKind::HasOne | RelationshipKind::HasMany => {
            (arg(0).unwrap_or(entity_key), None, None)
        }
        RelationshipKind::BelongsToMany => {
            let pivot = PivotKeys {
                table: arg(0).unwrap_or_else(|| Naming::to_pivot_table(entity, &related_name)),
                foreign_pivot_key: arg(1).unwrap_or(entity_key),
                related_pivot_key: arg(2)
                    .unwrap_or_else(|| Naming::to_foreign_key(&related_name)),
            };
            (pivot.foreign_pivot_key.clone(), Some(pivot), None)
        }
        RelationshipKind::MorphTo => {
            let morph = MorphKeys::named(
                &arg(0).unwrap_or_else(|| Naming::to_snake_case(&accessor.method)),
            );
            (morph.id_column.clone(), None, Some(morph))
        }
        RelationshipKind::MorphOne | RelationshipKind::MorphMany => {
            let morph = MorphKeys::named(&arg(0).unwrap_or_else(|| morph_name(entity)));
            (morph.id_column.clone(), None, Some(morph))
        }
        RelationshipKind::MorphToMany => {
            let morph = MorphKeys::named(&arg(0).unwrap_or_else(|| morph_name(&related_name)));
            let pivot = PivotKeys {
                table: arg(1).unwrap_or_else(|| Naming::pluralize(&morph.name)),
                foreign_pivot_key: morph.id_column.clone(),
                related_pivot_key: Naming::to_foreign_key(&related_name),
            };
            (morph.id_column.clone(), Some(pivot), Some(morph))
        }
    };

    RelationshipDescriptor {
        name: accessor.method.clone(),
        kind: accessor.kind,
        foreign_key,
        related,
        related_folder,
        pivot,
        morph,
    }
}

/// Conventional polymorphic name, e.g. `Comment` becomes `commentable`
fn morph_name(entity: &str) -> String {
    format!("{}able", Naming::to_snake_case(entity))
}
