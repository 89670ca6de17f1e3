//! Invocation of wrapped operations with their original parameter shape
//!
//! A retried call passes its arguments as a tuple. The tuple is cloned for
//! every attempt and spread back into the operation's parameters, so a
//! function of two arguments is called as `retrying.call((a, b))`.

/// A callable that can be invoked repeatedly with an argument tuple
///
/// Implemented for every `Fn` of up to four parameters.
pub trait Operation<Args> {
    type Output;

    fn invoke(&self, args: Args) -> Self::Output;
}

macro_rules! impl_operation {
    ($($arg:ident),*) => {
        impl<Func, Out, $($arg,)*> Operation<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Out,
        {
            type Output = Out;

            #[inline]
            #[allow(non_snake_case)]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> Out {
                (self)($($arg),*)
            }
        }
    };
}

impl_operation!();
impl_operation!(A1);
impl_operation!(A1, A2);
impl_operation!(A1, A2, A3);
impl_operation!(A1, A2, A3, A4);
