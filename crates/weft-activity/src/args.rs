//! Positional binding of payload inputs to typed parameter tuples.

use serde::de::DeserializeOwned;
use weft_protocols::{Converter, Payload};

use crate::error::ActivityError;

/// A parameter list an activity can be called with.
///
/// Implemented for tuples of up to six deserializable values; `()` is the
/// empty parameter list.
pub trait ActivityArgs: Sized + Send + 'static {
    /// Number of parameters.
    const ARITY: usize;

    /// Type names of the parameters, in order.
    fn param_types() -> Vec<&'static str>;

    /// Bind `inputs` positionally, converting each one.
    fn from_inputs<C: Converter>(converter: &C, inputs: &[Payload]) -> Result<Self, ActivityError>;
}

fn bind<C: Converter, T: DeserializeOwned>(
    converter: &C,
    inputs: &[Payload],
    index: usize,
) -> Result<T, ActivityError> {
    let payload = inputs
        .get(index)
        .ok_or(ActivityError::MissingInput { index })?;
    converter
        .from_payload(payload)
        .map_err(|source| ActivityError::InputConversion { index, source })
}

macro_rules! impl_activity_args {
    ($arity:expr; $($ty:ident : $index:tt),*) => {
        impl<$($ty),*> ActivityArgs for ($($ty,)*)
        where
            $($ty: DeserializeOwned + Send + 'static,)*
        {
            const ARITY: usize = $arity;

            fn param_types() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$ty>()),*]
            }

            #[allow(unused_variables)]
            fn from_inputs<C: Converter>(
                converter: &C,
                inputs: &[Payload],
            ) -> Result<Self, ActivityError> {
                Ok(($(bind::<C, $ty>(converter, inputs, $index)?,)*))
            }
        }
    };
}

impl_activity_args!(0;);
impl_activity_args!(1; A: 0);
impl_activity_args!(2; A: 0, B: 1);
impl_activity_args!(3; A: 0, B: 1, D: 2);
impl_activity_args!(4; A: 0, B: 1, D: 2, E: 3);
impl_activity_args!(5; A: 0, B: 1, D: 2, E: 3, F: 4);
impl_activity_args!(6; A: 0, B: 1, D: 2, E: 3, F: 4, G: 5);
