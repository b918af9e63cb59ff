// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Reference-counted lifetime for expensive backend handles.
//!
//! A [`SharedResource`] opens its handle on the first [`SharedResource::acquire`]
//! and tears it down when the last [`Lease`] is released. A lease is
//! released by [`Lease::release`] or when it goes out of scope, so every
//! exit path (success, error, cancellation) gives its reference back.

use diagnostics::debug;
use std::any::Any;
use std::io;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};

type Opener<T> = Box<dyn Fn() -> io::Result<T> + Send + Sync>;

struct Slot<T> {
    handle: Option<Arc<T>>,
    leases: usize,
    generation: u64,
}

struct Inner<T> {
    name: String,
    opener: Opener<T>,
    slot: Mutex<Slot<T>>,
}

impl<T> Inner<T> {
    fn slot(&self) -> MutexGuard<'_, Slot<T>> {
        // The slot holds plain counters; a panic elsewhere cannot corrupt them.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A lazily opened handle shared by every in-flight consumer.
pub struct SharedResource<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SharedResource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> SharedResource<T> {
    pub fn new<S, F>(name: S, opener: F) -> Self
    where
        S: Into<String>,
        F: Fn() -> io::Result<T> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                opener: Box::new(opener),
                slot: Mutex::new(Slot {
                    handle: None,
                    leases: 0,
                    generation: 0,
                }),
            }),
        }
    }

    /// Take a reference, opening the handle if nobody holds one.
    pub fn acquire(&self) -> io::Result<Lease<T>> {
        let mut slot = self.inner.slot();
        let handle = match &slot.handle {
            Some(handle) => handle.clone(),
            None => {
                let handle = Arc::new((self.inner.opener)()?);
                slot.generation += 1;
                let name = self.inner.name.as_str();
                let generation = slot.generation;
                debug!("Opened shared resource {name} (generation {generation})", name: name, generation: generation);
                slot.handle = Some(handle.clone());
                handle
            }
        };
        slot.leases += 1;
        Ok(Lease {
            handle: Some(handle),
            owner: self.inner.clone(),
        })
    }

    /// Whether a handle is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.slot().handle.is_some()
    }

    #[must_use]
    pub fn lease_count(&self) -> usize {
        self.inner.slot().leases
    }

    /// How many times the handle has been opened so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.slot().generation
    }
}

/// One counted reference on a [`SharedResource`].
pub struct Lease<T> {
    handle: Option<Arc<T>>,
    owner: Arc<Inner<T>>,
}

impl<T> Lease<T> {
    /// Give the reference back now instead of at scope exit.
    pub fn release(self) {
        drop(self);
    }
}

impl<T> Deref for Lease<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.handle {
            Some(handle) => handle,
            None => unreachable!("lease handle is only taken on drop"),
        }
    }
}

impl<T> Drop for Lease<T> {
    fn drop(&mut self) {
        let teardown = {
            let mut slot = self.owner.slot();
            slot.leases = slot.leases.saturating_sub(1);
            if slot.leases == 0 { slot.handle.take() } else { None }
        };
        // Ours is the last strong reference once the slot let go of its own.
        drop(self.handle.take());
        if let Some(handle) = teardown {
            drop(handle);
            let name = self.owner.name.as_str();
            debug!("Closed shared resource {name}", name: name);
        }
    }
}

/// A type-erased lease a gateway hands to long-running consumers.
///
/// Holding it keeps the gateway's backend connection open.
pub struct KeepAlive(Option<Box<dyn Any + Send + Sync>>);

impl KeepAlive {
    /// For gateways without a shared backend handle.
    #[must_use]
    pub fn none() -> Self {
        Self(None)
    }

    pub fn holding<T: Send + Sync + 'static>(lease: Lease<T>) -> Self {
        Self(Some(Box::new(lease)))
    }

    #[must_use]
    pub fn is_holding(&self) -> bool {
        self.0.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Connection {
        closed: Arc<AtomicUsize>,
    }

    impl Drop for Connection {
        fn drop(&mut self) {
            _ = self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_resource() -> (SharedResource<Connection>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let (o, c) = (opened.clone(), closed.clone());
        let resource = SharedResource::new("test-connection", move || {
            _ = o.fetch_add(1, Ordering::SeqCst);
            Ok(Connection { closed: c.clone() })
        });
        (resource, opened, closed)
    }

    #[test]
    fn test_opens_lazily_and_closes_on_last_release() {
        let (resource, opened, closed) = counting_resource();
        assert!(!resource.is_open());
        assert_eq!(opened.load(Ordering::SeqCst), 0);

        let long_lived = resource.acquire().unwrap();
        let short_lived = resource.acquire().unwrap();
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(resource.lease_count(), 2);

        short_lived.release();
        assert!(resource.is_open());
        assert_eq!(closed.load(Ordering::SeqCst), 0);

        drop(long_lived);
        assert!(!resource.is_open());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reacquire_after_teardown_reopens() {
        let (resource, opened, closed) = counting_resource();
        resource.acquire().unwrap().release();
        resource.acquire().unwrap().release();
        assert_eq!(opened.load(Ordering::SeqCst), 2);
        assert_eq!(closed.load(Ordering::SeqCst), 2);
        assert_eq!(resource.generation(), 2);
    }

    #[test]
    fn test_failed_open_takes_no_lease() {
        let resource: SharedResource<Connection> = SharedResource::new("broken", || {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "provider gone"))
        });
        assert!(resource.acquire().is_err());
        assert_eq!(resource.lease_count(), 0);
        assert!(!resource.is_open());
    }

    #[test]
    fn test_keep_alive_holds_lease() {
        let (resource, _, closed) = counting_resource();
        let keep = KeepAlive::holding(resource.acquire().unwrap());
        assert!(keep.is_holding());
        assert!(resource.is_open());
        drop(keep);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(!KeepAlive::none().is_holding());
    }
}
