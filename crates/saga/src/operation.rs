//! Reversible units of remote work.

use std::fmt;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::ResultBundle;

/// Future returned by an operation's action.
pub type ActionFuture<'a, T, E> = BoxFuture<'a, Result<T, E>>;

/// Future returned by an operation's compensation.
pub type CompensateFuture<'a, E> = BoxFuture<'a, Result<(), E>>;

type ActionFn<T, E> =
    Box<dyn for<'a> Fn(&'a ResultBundle<T>) -> ActionFuture<'a, T, E> + Send + Sync>;

type CompensateFn<T, E> =
    Box<dyn for<'a> Fn(&'a ResultBundle<T>) -> CompensateFuture<'a, E> + Send + Sync>;

/// A named action paired with the compensation that undoes it.
///
/// Both functions receive the results collected so far in the run. The
/// compensation is only ever invoked after this operation's own action
/// succeeded, so it can rely on its own result being present.
pub struct Operation<T, E> {
    name: String,
    action: ActionFn<T, E>,
    compensate: CompensateFn<T, E>,
}

impl<T: 'static, E: 'static> Operation<T, E> {
    /// Creates an operation from an action and its compensation.
    pub fn new<A, C>(name: impl Into<String>, action: A, compensate: C) -> Self
    where
        A: for<'a> Fn(&'a ResultBundle<T>) -> ActionFuture<'a, T, E> + Send + Sync + 'static,
        C: for<'a> Fn(&'a ResultBundle<T>) -> CompensateFuture<'a, E> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            action: Box::new(action),
            compensate: Box::new(compensate),
        }
    }

    /// Creates an operation whose effect needs no undo.
    pub fn without_compensation<A>(name: impl Into<String>, action: A) -> Self
    where
        A: for<'a> Fn(&'a ResultBundle<T>) -> ActionFuture<'a, T, E> + Send + Sync + 'static,
    {
        Self::new(name, action, |_| async { Ok::<(), E>(()) }.boxed())
    }
}

impl<T, E> Operation<T, E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn act<'a>(&'a self, results: &'a ResultBundle<T>) -> ActionFuture<'a, T, E> {
        (self.action)(results)
    }

    pub(crate) fn undo<'a>(&'a self, results: &'a ResultBundle<T>) -> CompensateFuture<'a, E> {
        (self.compensate)(results)
    }
}

impl<T, E> fmt::Debug for Operation<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
