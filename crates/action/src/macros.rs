//! Declarative macro for closed user error sets.

/// Declares the user errors an action may return.
///
/// Generates:
/// - an enum with one struct variant per error, serialized with a `type`
///   field holding the given literal,
/// - one constructor per variant (the error factory), taking each field as
///   `impl Into<FieldType>`,
/// - a [`UserError`](crate::UserError) implementation returning the literal.
///
/// `Debug`, `Clone`, `PartialEq` and `Serialize` are always derived.
///
/// # Examples
///
/// ```rust
/// use warden_action::{UserError, action_errors};
///
/// action_errors! {
///     pub enum TodoError {
///         /// No todo with this id.
///         NotFound = "NOT_FOUND" => fn not_found(id: String),
///         Unauthorized = "UNAUTHORIZED" => fn unauthorized(),
///     }
/// }
///
/// let err = TodoError::not_found("42");
/// assert_eq!(err.kind(), "NOT_FOUND");
/// assert_eq!(
///     serde_json::to_value(&err).unwrap(),
///     serde_json::json!({ "type": "NOT_FOUND", "id": "42" })
/// );
/// ```
#[macro_export]
macro_rules! action_errors {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $kind:literal => fn $ctor:ident ( $( $field:ident : $fty:ty ),* $(,)? )
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            ::core::fmt::Debug,
            ::core::clone::Clone,
            ::core::cmp::PartialEq,
            $crate::__private::serde::Serialize
        )]
        #[serde(crate = "warden_action::__private::serde", tag = "type")]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $kind)]
                $variant { $( $field: $fty ),* },
            )*
        }

        #[allow(dead_code)]
        impl $name {
            $(
                #[doc = concat!("Creates the `", $kind, "` error.")]
                #[must_use]
                $vis fn $ctor( $( $field: impl ::core::convert::Into<$fty> ),* ) -> Self {
                    Self::$variant { $( $field: $field.into() ),* }
                }
            )*
        }

        impl $crate::UserError for $name {
            fn kind(&self) -> &'static str {
                match self {
                    $( Self::$variant { .. } => $kind, )*
                }
            }
        }
    };
}
