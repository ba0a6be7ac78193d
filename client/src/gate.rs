//! Session gating and in-flight request coalescing.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    collections::HashMap,
    error::Error as StdError,
    fmt,
    future::Future,
    rc::Rc,
    str::FromStr,
};

use derive_more::{AsRef, Display, Error};
use futures::{
    future::{LocalBoxFuture, Shared},
    FutureExt as _,
};
use tracerr::Traced;

use crate::domain::user;

/// Checkpoint all data-fetching code consults before touching the network.
///
/// Tracks the current authentication [`Session`] snapshot and coalesces
/// concurrent operations by [`Key`], so that at most one underlying network
/// operation per [`Key`] is ever in flight, with every caller sharing its
/// outcome.
///
/// Cheap to clone: clones share the same [`Session`] snapshot and in-flight
/// bookkeeping. Constructed once by the hosting application's composition
/// root, and single-threaded by design, matching the event-loop-cooperative
/// execution model the hosting application runs under.
#[derive(Clone, Default)]
pub struct Gate(Rc<Inner>);

/// State of a [`Gate`], shared by its clones.
#[derive(Default)]
struct Inner {
    /// Current [`Session`] snapshot.
    session: Cell<Session>,

    /// In-flight operations, keyed by their [`Key`].
    in_flight: RefCell<HashMap<Key, InFlight>>,
}

/// Type-erased outcome of an in-flight operation.
type Outcome = Result<Rc<dyn Any>, Rc<dyn StdError>>;

/// Single coalesced unit of work.
type InFlight = Shared<LocalBoxFuture<'static, Outcome>>;

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("session", &self.session())
            .finish_non_exhaustive()
    }
}

impl Gate {
    /// Replaces the stored [`Session`] snapshot.
    ///
    /// Callable at any time, any number of times; last write wins.
    pub fn set_session(&self, session: Session) {
        self.0.session.set(session);
    }

    /// Returns the current [`Session`] snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.0.session.get()
    }

    /// Returns the authenticated principal of the current [`Session`].
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::SessionNotReady`] if the [`Session`] resolution
    ///   has not completed yet.
    /// - [`ExecutionError::AuthenticationRequired`] if the current
    ///   [`Session`] is anonymous.
    pub fn principal(&self) -> Result<user::Id, Traced<ExecutionError>> {
        use ExecutionError as E;

        let session = self.session();
        if !session.is_loaded {
            return Err(tracerr::new!(E::SessionNotReady));
        }
        session
            .principal
            .ok_or_else(|| tracerr::new!(E::AuthenticationRequired))
    }

    /// Executes the provided `operation` under the given [`Key`].
    ///
    /// If an operation is already in flight under the same [`Key`], the
    /// `operation` is not invoked at all: the caller joins the in-flight one
    /// and observes its exact outcome, value or failure. Otherwise the
    /// `operation` is invoked and tracked under the [`Key`] until it
    /// settles; the tracking entry is removed on every settlement path.
    ///
    /// No timeout is enforced here: an `operation` that never settles pins
    /// its [`Key`] until [`Gate::forget()`]. Operations bound their own
    /// latency before entering the gate.
    ///
    /// # Errors
    ///
    /// - [`ExecutionError::SessionNotReady`] if the [`Session`] resolution
    ///   has not completed yet, whatever `requires_auth` is.
    /// - [`ExecutionError::AuthenticationRequired`] if `requires_auth` and
    ///   the current [`Session`] is anonymous.
    /// - [`ExecutionError::Operation`] if the `operation` itself (or the
    ///   in-flight one being joined) fails.
    /// - [`ExecutionError::MismatchedOutcome`] if the joined outcome is not
    ///   a `T`.
    ///
    /// In the first two cases the `operation` is never invoked.
    pub async fn execute<F, Fut, T, E>(
        &self,
        key: Key,
        requires_auth: bool,
        operation: F,
    ) -> Result<T, Traced<ExecutionError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + 'static,
        T: Clone + 'static,
        E: StdError + 'static,
    {
        let session = self.session();
        if !session.is_loaded {
            tracing::debug!(%key, "rejecting: session not loaded yet");
            return Err(tracerr::new!(ExecutionError::SessionNotReady));
        }
        if requires_auth && session.principal.is_none() {
            tracing::warn!(%key, "rejecting: authentication required");
            return Err(tracerr::new!(ExecutionError::AuthenticationRequired));
        }

        // The lookup borrow is released before the `operation` factory runs,
        // so the factory may consult this `Gate` synchronously.
        let existing = self.0.in_flight.borrow().get(&key).cloned();
        let shared = if let Some(existing) = existing {
            tracing::debug!(%key, "joining an in-flight operation");
            existing
        } else {
            let inner = Rc::clone(&self.0);
            let k = key.clone();
            let operation = operation();
            let created = async move {
                let out = operation.await;
                // Removed on every settlement path, so a failing operation
                // never leaves a stale entry behind.
                drop(inner.in_flight.borrow_mut().remove(&k));
                match out {
                    Ok(v) => {
                        let v: Rc<dyn Any> = Rc::new(v);
                        Ok(v)
                    }
                    Err(e) => {
                        let e: Rc<dyn StdError> = Rc::new(e);
                        Err(e)
                    }
                }
            }
            .boxed_local()
            .shared();
            // Still no suspension point since the lookup above, so two
            // callers can never both miss the same key.
            drop(
                self.0
                    .in_flight
                    .borrow_mut()
                    .insert(key.clone(), created.clone()),
            );
            created
        };

        match shared.await {
            Ok(v) => v.downcast::<T>().map(|v| (*v).clone()).map_err(|_| {
                tracerr::new!(ExecutionError::MismatchedOutcome(key))
            }),
            Err(e) => Err(tracerr::new!(ExecutionError::Operation(e))),
        }
    }

    /// Forgets the in-flight operation tracked under the provided [`Key`].
    ///
    /// Bookkeeping only: an already-started operation keeps running, this
    /// merely makes a subsequent [`Gate::execute()`] with the same [`Key`]
    /// start a fresh, independent one.
    pub fn forget(&self, key: &Key) {
        drop(self.0.in_flight.borrow_mut().remove(key));
    }

    /// Forgets all the in-flight operations tracked by this [`Gate`].
    pub fn forget_all(&self) {
        self.0.in_flight.borrow_mut().clear();
    }

    /// Indicates whether an operation is in flight under the provided
    /// [`Key`].
    #[must_use]
    pub fn is_in_flight(&self, key: &Key) -> bool {
        self.0.in_flight.borrow().contains_key(key)
    }
}

/// Snapshot of the caller's authentication state.
///
/// Owned and mutated exclusively by the hosting application on every
/// upstream auth change (initial resolution, login, logout, token refresh);
/// the [`Gate`] only reads it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Session {
    /// Authenticated principal, if any.
    pub principal: Option<user::Id>,

    /// Indicator whether the session resolution has completed at least once.
    ///
    /// While `false`, every operation is rejected with
    /// [`ExecutionError::SessionNotReady`], which callers treat as "retry
    /// shortly" rather than as a failure.
    pub is_loaded: bool,
}

/// Key deterministically identifying a logical operation, together with its
/// result type.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
pub struct Key(String);

impl Key {
    /// Creates a new [`Key`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `key` must be non-empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Creates a new [`Key`] if the given `key` is non-empty.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        (!key.is_empty()).then_some(Self(key))
    }
}

impl FromStr for Key {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("empty `Key`")
    }
}

/// Error of a [`Gate`] operation execution.
#[derive(Debug, Display, Error)]
pub enum ExecutionError {
    /// [`Session`] resolution has not completed yet.
    ///
    /// Transient: the caller is expected to retry shortly, not to surface a
    /// user-facing failure.
    #[display("`Session` is not loaded yet")]
    SessionNotReady,

    /// Operation requires an authenticated principal, while the current
    /// [`Session`] is anonymous.
    #[display("operation requires authentication")]
    AuthenticationRequired,

    /// Wrapped operation failed.
    ///
    /// Shared verbatim by every caller coalesced on the same [`Key`];
    /// [`ExecutionError::as_operation()`] recovers the concrete error.
    #[display("operation failed: {_0}")]
    Operation(#[error(not(source))] Rc<dyn StdError>),

    /// Outcome coalesced under the [`Key`] has an unexpected type.
    ///
    /// Means two operations with different result types were issued under
    /// the same [`Key`].
    #[display("mismatched outcome type of operation `{_0}`")]
    MismatchedOutcome(#[error(not(source))] Key),
}

impl ExecutionError {
    /// Returns the concrete error of the wrapped operation, if this is an
    /// [`ExecutionError::Operation`] of type `E`.
    #[must_use]
    pub fn as_operation<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Operation(e) => e.downcast_ref(),
            Self::SessionNotReady
            | Self::AuthenticationRequired
            | Self::MismatchedOutcome(_) => None,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::{cell::Cell, rc::Rc};

    use derive_more::{Display, Error};

    use crate::domain::user;

    use super::{ExecutionError, Gate, Key, Session};

    /// Failure of a test operation.
    #[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
    #[display("test operation failed")]
    struct Failure;

    fn key(s: &str) -> Key {
        Key::new(s).unwrap()
    }

    fn loaded(principal: Option<user::Id>) -> Gate {
        let gate = Gate::default();
        gate.set_session(Session {
            principal,
            is_loaded: true,
        });
        gate
    }

    #[tokio::test]
    async fn rejects_everything_until_session_is_loaded() {
        let gate = Gate::default();
        let invoked = Rc::new(Cell::new(false));

        for requires_auth in [false, true] {
            let i = Rc::clone(&invoked);
            let result = gate
                .execute(key("posts:first"), requires_auth, move || async move {
                    i.set(true);
                    Ok::<_, Failure>(())
                })
                .await;
            assert!(matches!(
                result.unwrap_err().as_ref(),
                ExecutionError::SessionNotReady,
            ));
        }
        assert!(!invoked.get());
    }

    #[tokio::test]
    async fn rejects_anonymous_authenticated_operations() {
        let gate = loaded(None);
        let invoked = Rc::new(Cell::new(false));

        let i = Rc::clone(&invoked);
        let result = gate
            .execute(key("posts:insert"), true, move || async move {
                i.set(true);
                Ok::<_, Failure>(())
            })
            .await;

        assert!(matches!(
            result.unwrap_err().as_ref(),
            ExecutionError::AuthenticationRequired,
        ));
        assert!(!invoked.get());
        assert!(gate.principal().is_err());

        let gate = loaded(Some(user::Id::new()));
        assert!(gate.principal().is_ok());
    }

    #[tokio::test]
    async fn coalesces_concurrent_operations() {
        let gate = loaded(None);
        let invocations = Rc::new(Cell::new(0));
        let second_invoked = Rc::new(Cell::new(false));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let i = Rc::clone(&invocations);
        let first = gate.execute(key("posts:first"), false, move || async move {
            i.set(i.get() + 1);
            rx.await.expect("sender is alive");
            Ok::<_, Failure>(42)
        });
        let s = Rc::clone(&second_invoked);
        let second = gate.execute(key("posts:first"), false, move || async move {
            s.set(true);
            Ok::<_, Failure>(7)
        });
        let release = async move {
            tx.send(()).expect("receiver is alive");
        };

        let (first, second, ()) = futures::join!(first, second, release);

        assert_eq!(first.unwrap(), 42);
        assert_eq!(second.unwrap(), 42);
        assert_eq!(invocations.get(), 1);
        assert!(!second_invoked.get());
        assert!(!gate.is_in_flight(&key("posts:first")));
    }

    #[tokio::test]
    async fn factory_may_consult_the_gate_synchronously() {
        let gate = loaded(None);

        let g = gate.clone();
        let tracked = gate
            .execute(key("posts:first"), false, move || {
                // Runs before the entry is tracked, with no borrow held.
                let tracked = g.is_in_flight(&key("posts:first"));
                async move { Ok::<_, Failure>(tracked) }
            })
            .await
            .unwrap();

        assert!(!tracked);
        assert!(!gate.is_in_flight(&key("posts:first")));
    }

    #[tokio::test]
    async fn mismatched_outcome_types_on_a_shared_key_are_detected() {
        let gate = loaded(None);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let ints = gate.execute(key("x"), false, move || async move {
            rx.await.expect("sender is alive");
            Ok::<_, Failure>(42_i32)
        });
        let strings = gate.execute(key("x"), false, || async {
            Ok::<String, Failure>("joined".into())
        });
        let release = async move {
            tx.send(()).expect("receiver is alive");
        };

        let (ints, strings, ()) = futures::join!(ints, strings, release);

        assert_eq!(ints.unwrap(), 42);
        assert!(matches!(
            strings.unwrap_err().as_ref(),
            ExecutionError::MismatchedOutcome(_),
        ));
    }

    #[tokio::test]
    async fn shares_failures_between_coalesced_callers() {
        let gate = loaded(None);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let first = gate.execute(key("posts:first"), false, move || async move {
            rx.await.expect("sender is alive");
            Err::<i32, _>(Failure)
        });
        let second = gate
            .execute(key("posts:first"), false, || async { Ok::<_, Failure>(0) });
        let release = async move {
            tx.send(()).expect("receiver is alive");
        };

        let (first, second, ()) = futures::join!(first, second, release);

        for result in [first, second] {
            let err = result.unwrap_err();
            assert_eq!(err.as_ref().as_operation::<Failure>(), Some(&Failure));
        }
        assert!(!gate.is_in_flight(&key("posts:first")));
    }

    #[tokio::test]
    async fn clears_the_entry_on_both_settlement_paths() {
        let gate = loaded(None);
        let invocations = Rc::new(Cell::new(0));

        let i = Rc::clone(&invocations);
        drop(
            gate.execute(key("x"), false, move || async move {
                i.set(i.get() + 1);
                Err::<(), _>(Failure)
            })
            .await
            .unwrap_err(),
        );
        assert!(!gate.is_in_flight(&key("x")));

        let i = Rc::clone(&invocations);
        gate.execute(key("x"), false, move || async move {
            i.set(i.get() + 1);
            Ok::<_, Failure>(())
        })
        .await
        .unwrap();
        assert!(!gate.is_in_flight(&key("x")));

        assert_eq!(invocations.get(), 2);
    }

    #[tokio::test]
    async fn forgotten_entry_makes_the_next_call_fresh() {
        let gate = loaded(None);
        let invocations = Rc::new(Cell::new(0));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let i = Rc::clone(&invocations);
        let stuck = gate.execute(key("x"), false, move || async move {
            i.set(i.get() + 1);
            rx.await.expect("sender is alive");
            Ok::<_, Failure>(1)
        });
        let i = Rc::clone(&invocations);
        let fresh = async {
            assert!(gate.is_in_flight(&key("x")));
            gate.forget(&key("x"));
            assert!(!gate.is_in_flight(&key("x")));

            let result = gate
                .execute(key("x"), false, move || async move {
                    i.set(i.get() + 1);
                    Ok::<_, Failure>(2)
                })
                .await;
            tx.send(()).expect("receiver is alive");
            result
        };

        let (stuck, fresh) = futures::join!(stuck, fresh);

        assert_eq!(stuck.unwrap(), 1);
        assert_eq!(fresh.unwrap(), 2);
        assert_eq!(invocations.get(), 2);
    }

    #[tokio::test]
    async fn last_session_write_wins() {
        let gate = Gate::default();
        assert_eq!(gate.session(), Session::default());

        let id = user::Id::new();
        gate.set_session(Session {
            principal: Some(id),
            is_loaded: true,
        });
        gate.set_session(Session {
            principal: None,
            is_loaded: true,
        });
        assert_eq!(gate.session().principal, None);
        assert!(gate.session().is_loaded);
        assert_ne!(gate.session().principal, Some(id));
    }
}
