//! Handlers: type-erased native functions.
//!
//! A `Handler` owns everything needed to serve one native call: it decodes
//! the arguments it expects from positions 1..=n, invokes the host function
//! and pushes the results. Typed Rust functions become handlers through
//! `NativeFunction`, which is implemented for every `Fn(A1, .., An) -> R` with
//! `n <= 12`, `Ai: FromStackOwned` and `R: IntoResults`.
//!
//! ```ignore
//! fn add(a: i64, b: i64) -> i64 { a + b }
//!
//! let handler = FnHandler::new(add);
//! ```

use std::any::type_name;
use std::borrow::Cow;
use std::marker::PhantomData;

use scriptbind_core::{FromStack, FromStackOwned, IntoResults, ScriptState, StackIndex};

use crate::error::CallError;

/// A native call target stored in a handler slot.
pub trait Handler: Send + Sync + 'static {
    /// Serve one call and return the number of results pushed.
    fn handle(&self, state: &mut dyn ScriptState) -> Result<u32, CallError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "<anonymous>"
    }
}

/// Host functions callable with arguments decoded from the stack.
///
/// `Args` is the tuple of parameter types; it only selects the impl.
pub trait NativeFunction<Args>: Send + Sync + 'static {
    fn call_native(&self, state: &mut dyn ScriptState) -> Result<u32, CallError>;
}

macro_rules! impl_native_function {
    ($($arg:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
        impl<Func, Ret, $($arg,)*> NativeFunction<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Ret + Send + Sync + 'static,
            Ret: IntoResults,
            $($arg: FromStackOwned,)*
        {
            fn call_native(&self, state: &mut dyn ScriptState) -> Result<u32, CallError> {
                let mut index: StackIndex = 0;
                $(
                    index += 1;
                    let $arg = <$arg as FromStack>::from_stack(&mut *state, index)?;
                )*
                (self)($($arg),*).push_results(state).map_err(CallError::Native)
            }
        }
    };
}

impl_native_function!();
impl_native_function!(A1);
impl_native_function!(A1, A2);
impl_native_function!(A1, A2, A3);
impl_native_function!(A1, A2, A3, A4);
impl_native_function!(A1, A2, A3, A4, A5);
impl_native_function!(A1, A2, A3, A4, A5, A6);
impl_native_function!(A1, A2, A3, A4, A5, A6, A7);
impl_native_function!(A1, A2, A3, A4, A5, A6, A7, A8);
impl_native_function!(A1, A2, A3, A4, A5, A6, A7, A8, A9);
impl_native_function!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);
impl_native_function!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11);
impl_native_function!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12);

/// Handler wrapping a typed host function.
pub struct FnHandler<F, Args> {
    func: F,
    name: Cow<'static, str>,
    _args: PhantomData<fn(Args)>,
}

impl<F, Args> FnHandler<F, Args>
where
    F: NativeFunction<Args>,
{
    /// Wrap `func`, naming the handler after its Rust type.
    pub fn new(func: F) -> Self {
        Self::named(type_name::<F>(), func)
    }

    pub fn named(name: impl Into<Cow<'static, str>>, func: F) -> Self {
        Self { func, name: name.into(), _args: PhantomData }
    }
}

impl<F, Args> Handler for FnHandler<F, Args>
where
    F: NativeFunction<Args>,
    Args: 'static,
{
    #[inline]
    fn handle(&self, state: &mut dyn ScriptState) -> Result<u32, CallError> {
        self.func.call_native(state)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handler with direct stack access, for variadic arguments or zero-copy
/// `ByteView` reads.
pub struct RawHandler<F> {
    func: F,
    name: Cow<'static, str>,
}

impl<F> RawHandler<F>
where
    F: Fn(&mut dyn ScriptState) -> Result<u32, CallError> + Send + Sync + 'static,
{
    pub fn new(func: F) -> Self {
        Self::named(type_name::<F>(), func)
    }

    pub fn named(name: impl Into<Cow<'static, str>>, func: F) -> Self {
        Self { func, name: name.into() }
    }
}

impl<F> Handler for RawHandler<F>
where
    F: Fn(&mut dyn ScriptState) -> Result<u32, CallError> + Send + Sync + 'static,
{
    #[inline]
    fn handle(&self, state: &mut dyn ScriptState) -> Result<u32, CallError> {
        (self.func)(state)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
