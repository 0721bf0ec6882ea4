// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros for reducing boilerplate.
//!
//! - [`simple_display!`]: `Display` for fieldless enums from string literals
//! - [`builder!`]: test builders for state and entry values

/// Implement `Display` for a fieldless enum, one literal per variant.
///
/// ```ignore
/// crate::simple_display! {
///     AggregateScope {
///         NodeFanout => "node",
///         StepSequence => "step",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident => $text:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let text = match self {
                    $( Self::$variant => $text, )+
                };
                f.write_str(text)
            }
        }
    };
}

/// Generate a builder for test values: the struct, `Default`, one setter
/// per field, `build()`, and `Target::builder()`.
///
/// Everything is compiled only under `cfg(any(test, feature = "test-support"))`.
///
/// Field groups, in this order, each optional:
/// - `into { field: Type = default }`: the setter takes `impl Into<Type>`
/// - `set { field: Type = default }`: the setter takes `Type`
/// - `option { field: Type = None }`: the target field is `Option<Type>`;
///   the setter takes `impl Into<Type>` and wraps it in `Some`
///
/// ```ignore
/// crate::builder! {
///     pub struct OutputEntryBuilder => OutputEntry {
///         into { message: String = "line" }
///         set { level: LogLevel = LogLevel::Normal }
///         option { node: String = None }
///     }
/// }
/// ```
#[macro_export]
macro_rules! builder {
    (
        pub struct $builder:ident => $target:ident {
            $(into { $( $i_field:ident : $i_ty:ty = $i_default:expr ),* $(,)? })?
            $(set { $( $s_field:ident : $s_ty:ty = $s_default:expr ),* $(,)? })?
            $(option { $( $o_field:ident : $o_ty:ty = $o_default:expr ),* $(,)? })?
        }
    ) => {
        #[cfg(any(test, feature = "test-support"))]
        #[derive(Debug, Clone)]
        pub struct $builder {
            $($( $i_field: $i_ty, )*)?
            $($( $s_field: $s_ty, )*)?
            $($( $o_field: Option<$o_ty>, )*)?
        }

        #[cfg(any(test, feature = "test-support"))]
        impl Default for $builder {
            fn default() -> Self {
                Self {
                    $($( $i_field: $i_default.into(), )*)?
                    $($( $s_field: $s_default, )*)?
                    $($( $o_field: $o_default, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $builder {
            $($(
                pub fn $i_field(mut self, value: impl Into<$i_ty>) -> Self {
                    self.$i_field = value.into();
                    self
                }
            )*)?
            $($(
                pub fn $s_field(mut self, value: $s_ty) -> Self {
                    self.$s_field = value;
                    self
                }
            )*)?
            $($(
                pub fn $o_field(mut self, value: impl Into<$o_ty>) -> Self {
                    self.$o_field = Some(value.into());
                    self
                }
            )*)?

            pub fn build(self) -> $target {
                $target {
                    $($( $i_field: self.$i_field, )*)?
                    $($( $s_field: self.$s_field, )*)?
                    $($( $o_field: self.$o_field, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $target {
            /// Start from test defaults.
            pub fn builder() -> $builder {
                $builder::default()
            }
        }
    };
}
